use crate::logging::hash_email;
use crate::service::SimilarProductsService;
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

pub struct AppState {
    pub service: SimilarProductsService,
    pub webhook_secret: String,
}

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    pub email: String,
    #[serde(rename = "ProductID")]
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub email: String,
    #[serde(rename = "ProductID", default)]
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub status: &'static str,
    pub similar_products_count: usize,
    pub timestamp: String,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
}

fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ========== Error Handling ==========

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = format!("{:#}", self.0);
        tracing::error!("webhook error: {}", message);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                status: "error",
                message,
                timestamp: utc_timestamp(),
            }),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ========== Auth ==========

/// Constant-time token check; a naive comparison would leak the secret one
/// byte at a time through response timing.
fn token_is_valid(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|token| token.as_bytes().ct_eq(secret.as_bytes()).into())
        .unwrap_or(false)
}

fn unauthorized(addr: &SocketAddr, route: &str) -> Response {
    tracing::warn!(ip = %addr.ip(), route, "unauthorized webhook attempt");
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            status: "error",
            message: "Unauthorized".to_string(),
            timestamp: utc_timestamp(),
        }),
    )
        .into_response()
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn enrich_profile(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<EnrichRequest>,
) -> Result<Response, AppError> {
    if !token_is_valid(&headers, &state.webhook_secret) {
        return Ok(unauthorized(&addr, "/webhook/enrich"));
    }

    let start = Instant::now();
    let outcome = state.service.enrich_profile(&req.email, &req.product_id).await?;
    let duration_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        user_hash = %hash_email(&req.email),
        product_id = %req.product_id,
        similar_count = outcome.similar_count,
        duration_ms,
        "enrich webhook completed"
    );

    Ok(Json(EnrichResponse {
        status: "success",
        similar_products_count: outcome.similar_count,
        timestamp: utc_timestamp(),
        duration_ms,
    })
    .into_response())
}

async fn cleanup_profile(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CleanupRequest>,
) -> Result<Response, AppError> {
    if !token_is_valid(&headers, &state.webhook_secret) {
        return Ok(unauthorized(&addr, "/webhook/cleanup"));
    }

    state
        .service
        .cleanup_profile(&req.email, req.product_id.as_deref())
        .await?;

    tracing::info!(
        user_hash = %hash_email(&req.email),
        product_id = req.product_id.as_deref().unwrap_or("all"),
        "cleanup webhook completed"
    );

    Ok(Json(CleanupResponse {
        status: "success",
        timestamp: utc_timestamp(),
    })
    .into_response())
}

// ========== Router ==========

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook/enrich", post(enrich_profile))
        .route("/webhook/cleanup", post(cleanup_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_check_requires_exact_match() {
        let mut headers = HeaderMap::new();
        assert!(!token_is_valid(&headers, "secret"));

        headers.insert(WEBHOOK_TOKEN_HEADER, "wrong".parse().unwrap());
        assert!(!token_is_valid(&headers, "secret"));

        headers.insert(WEBHOOK_TOKEN_HEADER, "secret".parse().unwrap());
        assert!(token_is_valid(&headers, "secret"));
    }

    #[test]
    fn test_enrich_request_accepts_klaviyo_payload() {
        // Klaviyo sends extra fields; they are ignored.
        let req: EnrichRequest = serde_json::from_str(
            r#"{"email": "user@example.com", "ProductID": "4422", "ProductName": "Cookies"}"#,
        )
        .unwrap();
        assert_eq!(req.email, "user@example.com");
        assert_eq!(req.product_id, "4422");
    }

    #[test]
    fn test_cleanup_request_product_id_optional() {
        let req: CleanupRequest =
            serde_json::from_str(r#"{"email": "user@example.com"}"#).unwrap();
        assert!(req.product_id.is_none());
    }
}
