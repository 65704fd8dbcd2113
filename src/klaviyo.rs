//! Klaviyo REST API client.
//!
//! Maintains the `bis_similar_products` profile property: an array of
//! `{product_id, similar_ids, enriched_at}` objects, one entry per product
//! the user subscribed to.

use crate::logging::hash_email;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const BASE_URL: &str = "https://a.klaviyo.com/api";

/// Marketing-profile storage abstraction consumed by the service layer.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Record similar products for one subscribed product on the profile
    /// identified by `email`, replacing any previous entry for that product.
    async fn add_similar_products(
        &self,
        email: &str,
        product_id: &str,
        similar_ids: &[String],
        enriched_at: &str,
    ) -> Result<(), KlaviyoError>;

    /// Remove one product's entry, or the whole array when `product_id` is
    /// `None`.
    async fn remove_similar_products(
        &self,
        email: &str,
        product_id: Option<&str>,
    ) -> Result<(), KlaviyoError>;
}

#[derive(Debug, Error)]
pub enum KlaviyoError {
    #[error("Klaviyo API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Carries the hashed email, never the raw address.
    #[error("no Klaviyo profile for user {0}")]
    ProfileNotFound(String),
}

pub struct KlaviyoClient {
    base_url: String,
    client: reqwest::Client,
}

impl KlaviyoClient {
    pub fn new(api_key: &str, revision: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::try_from(format!("Klaviyo-API-Key {}", api_key))
            .context("Klaviyo API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "revision",
            reqwest::header::HeaderValue::try_from(revision)
                .context("Klaviyo API revision is not a valid header value")?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Klaviyo HTTP client")?;

        Ok(Self {
            base_url: BASE_URL.to_string(),
            client,
        })
    }

    /// Find a profile id by email address. `Ok(None)` when no profile exists.
    async fn get_profile_id_by_email(&self, email: &str) -> Result<Option<String>, KlaviyoError> {
        let url = format!("{}/profiles/", self.base_url);
        let filter = format!("equals(email,\"{}\")", email);

        let data: Value = self
            .client
            .get(&url)
            .query(&[("filter", filter.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let id = data
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|p| p.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(id)
    }

    async fn update_profile_properties(
        &self,
        profile_id: &str,
        properties: Value,
    ) -> Result<(), KlaviyoError> {
        let url = format!("{}/profiles/{}/", self.base_url, profile_id);
        let payload = json!({
            "data": {
                "type": "profile",
                "id": profile_id,
                "attributes": {
                    "properties": properties
                }
            }
        });

        self.client
            .patch(&url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Current `bis_similar_products` entries. Read failures degrade to an
    /// empty array so a broken read never blocks a profile update.
    async fn get_similar_products_array(&self, profile_id: &str) -> Vec<Value> {
        let url = format!("{}/profiles/{}/", self.base_url, profile_id);

        let response = self
            .client
            .get(&url)
            .query(&[("additional-fields[profile]", "properties")])
            .send()
            .await;

        let data: Value = match response.and_then(|r| r.error_for_status()) {
            Ok(response) => match response.json().await {
                Ok(data) => data,
                Err(_) => return Vec::new(),
            },
            Err(_) => return Vec::new(),
        };

        data.get("data")
            .and_then(|d| d.get("attributes"))
            .and_then(|a| a.get("properties"))
            .and_then(|p| p.get("bis_similar_products"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProfileStore for KlaviyoClient {
    async fn add_similar_products(
        &self,
        email: &str,
        product_id: &str,
        similar_ids: &[String],
        enriched_at: &str,
    ) -> Result<(), KlaviyoError> {
        let profile_id = self
            .get_profile_id_by_email(email)
            .await?
            .ok_or_else(|| KlaviyoError::ProfileNotFound(hash_email(email)))?;

        // Merge with any other subscriptions already on the profile.
        let mut entries: Vec<Value> = self
            .get_similar_products_array(&profile_id)
            .await
            .into_iter()
            .filter(|entry| entry.get("product_id").and_then(Value::as_str) != Some(product_id))
            .collect();

        entries.push(json!({
            "product_id": product_id,
            "similar_ids": similar_ids,
            "enriched_at": enriched_at,
        }));

        self.update_profile_properties(
            &profile_id,
            json!({ "bis_similar_products": entries }),
        )
        .await
    }

    async fn remove_similar_products(
        &self,
        email: &str,
        product_id: Option<&str>,
    ) -> Result<(), KlaviyoError> {
        let profile_id = self
            .get_profile_id_by_email(email)
            .await?
            .ok_or_else(|| KlaviyoError::ProfileNotFound(hash_email(email)))?;

        let properties = match product_id {
            None => json!({ "bis_similar_products": Value::Null }),
            Some(product_id) => {
                let entries: Vec<Value> = self
                    .get_similar_products_array(&profile_id)
                    .await
                    .into_iter()
                    .filter(|entry| {
                        entry.get("product_id").and_then(Value::as_str) != Some(product_id)
                    })
                    .collect();

                if entries.is_empty() {
                    json!({ "bis_similar_products": Value::Null })
                } else {
                    json!({ "bis_similar_products": entries })
                }
            }
        };

        self.update_profile_properties(&profile_id, properties).await
    }
}
