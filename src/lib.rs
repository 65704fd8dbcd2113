// Re-export main components
pub mod adapter;
pub mod api;
pub mod config;
pub mod engine;
pub mod klaviyo;
pub mod logging;
pub mod prestashop;
pub mod product;
pub mod ranking;
pub mod service;
pub mod similarity;
pub mod tokenizer;

// Re-export commonly used types
pub use adapter::{AdapterError, EcommerceAdapter};
pub use engine::{rank, rank_products, ScoredProduct};
pub use klaviyo::{KlaviyoClient, KlaviyoError, ProfileStore};
pub use product::Product;
pub use ranking::{jaccard_similarity, Bm25, Bm25Model};
pub use service::{EnrichOutcome, ServiceError, SimilarProductsService};
pub use similarity::{name_similarity_fallback, similarity_score};
pub use tokenizer::tokenize;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
