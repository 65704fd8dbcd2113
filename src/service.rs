use crate::adapter::{AdapterError, EcommerceAdapter};
use crate::engine::rank_products;
use crate::klaviyo::{KlaviyoError, ProfileStore};
use crate::logging::hash_email;
use crate::product::Product;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Category fetch size. Larger than the result limit on purpose: a bigger
/// corpus gives the BM25 model better IDF statistics.
const CANDIDATE_POOL_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Profile(#[from] KlaviyoError),
}

/// Result of a successful profile enrichment.
#[derive(Debug, Clone, Copy)]
pub struct EnrichOutcome {
    pub similar_count: usize,
}

/// Orchestrates one recommendation round trip: fetch the reference product
/// and its category pool from the shop, rank substitutes, write the ordered
/// id list to the marketing profile.
pub struct SimilarProductsService {
    adapter: Arc<dyn EcommerceAdapter>,
    profiles: Arc<dyn ProfileStore>,
    limit: usize,
}

impl SimilarProductsService {
    pub fn new(
        adapter: Arc<dyn EcommerceAdapter>,
        profiles: Arc<dyn ProfileStore>,
        limit: usize,
    ) -> Self {
        Self {
            adapter,
            profiles,
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Enrich the profile behind `email` with substitutes for `product_id`.
    ///
    /// The profile write is skipped when no substitute qualifies; that is
    /// still a success with a count of zero.
    pub async fn enrich_profile(
        &self,
        email: &str,
        product_id: &str,
    ) -> Result<EnrichOutcome, ServiceError> {
        let reference = self
            .adapter
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.to_string()))?;

        tracing::info!(
            product_id,
            product_name = %reference.name,
            category_id = %reference.category_id,
            "product found"
        );

        let similar_ids = self.find_similar_products(&reference).await?;

        if similar_ids.is_empty() {
            tracing::info!(
                user_hash = %hash_email(email),
                product_id,
                "no similar products to add, skipping profile update"
            );
            return Ok(EnrichOutcome { similar_count: 0 });
        }

        let enriched_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.profiles
            .add_similar_products(email, product_id, &similar_ids, &enriched_at)
            .await?;

        tracing::info!(
            user_hash = %hash_email(email),
            product_id,
            similar_count = similar_ids.len(),
            "profile enriched"
        );

        Ok(EnrichOutcome {
            similar_count: similar_ids.len(),
        })
    }

    /// Rank in-stock substitutes from the reference's category and return
    /// their ids, best first. An empty or fully filtered-out pool is an
    /// empty `Ok`, not an error.
    pub async fn find_similar_products(
        &self,
        reference: &Product,
    ) -> Result<Vec<String>, ServiceError> {
        let candidates = self
            .adapter
            .get_products_by_category(&reference.category_id, CANDIDATE_POOL_LIMIT)
            .await?;

        tracing::info!(
            product_id = %reference.id,
            category_id = %reference.category_id,
            total_fetched = candidates.len(),
            "fetched category products"
        );

        let ranked = rank_products(reference, &candidates, self.limit);

        if ranked.is_empty() {
            tracing::warn!(
                product_id = %reference.id,
                category_id = %reference.category_id,
                "no in-stock candidates found"
            );
            return Ok(Vec::new());
        }

        for scored in ranked.iter().take(3) {
            tracing::debug!(
                product_id = %reference.id,
                candidate_id = %scored.id,
                candidate_name = %truncate(&scored.name, 50),
                score = scored.score,
                "top match"
            );
        }

        Ok(ranked.into_iter().map(|scored| scored.id).collect())
    }

    /// Remove one product's recommendations from the profile, or all of
    /// them when `product_id` is `None`.
    pub async fn cleanup_profile(
        &self,
        email: &str,
        product_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.profiles
            .remove_similar_products(email, product_id)
            .await?;

        tracing::info!(
            user_hash = %hash_email(email),
            product_id = product_id.unwrap_or("all"),
            "profile cleaned up"
        );

        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
