// Service exports
pub mod cache;
pub mod catalog;
pub mod explainer;
pub mod postgres;
pub mod rate_limit;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use catalog::{CatalogError, CatalogSnapshot, CatalogSource, PolicyCatalog};
pub use explainer::{ExplainerClient, ExplainerError};
pub use postgres::{PostgresStore, RecommendationRecord, StoreError, StoredProfile};
pub use rate_limit::{RateDecision, RateLimiter};
