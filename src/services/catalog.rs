use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{PolicyFilter, PolicyRecord};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::postgres::{PostgresStore, StoreError};

const BUILTIN_CATALOG: &str = include_str!("../../data/fallback_policies.toml");

/// Errors that can occur while loading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid policy file: {0}")]
    Fixture(#[from] toml::de::Error),

    #[error("No policy store configured")]
    NotConfigured,
}

/// Where a catalog snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Cache,
    Database,
    Fallback,
}

/// Policies plus provenance for one request
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub policies: Vec<PolicyRecord>,
    pub source: CatalogSource,
    /// Set when the fallback was served because the store failed
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    policies: Vec<PolicyRecord>,
}

/// Read-only access to the policy catalog
///
/// Lookup order: cache, then store, then the built-in catalog. The engine
/// receives the snapshot as a plain slice and never sees where it came from.
pub struct PolicyCatalog {
    store: Option<Arc<PostgresStore>>,
    cache: Arc<CacheManager>,
}

impl PolicyCatalog {
    pub fn new(store: Option<Arc<PostgresStore>>, cache: Arc<CacheManager>) -> Self {
        Self { store, cache }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Fetch policies from cache or store
    pub async fn fetch(
        &self,
        filter: &PolicyFilter,
    ) -> Result<(Vec<PolicyRecord>, CatalogSource), CatalogError> {
        let key = CacheKey::catalog(filter);

        match self.cache.get::<Vec<PolicyRecord>>(&key).await {
            Ok(policies) => return Ok((policies, CatalogSource::Cache)),
            Err(crate::services::CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Catalog cache read failed for {}: {}", key, e),
        }

        let store = self.store.as_ref().ok_or(CatalogError::NotConfigured)?;
        let policies = store.fetch_policies(filter).await?;

        if let Err(e) = self.cache.set(&key, &policies).await {
            tracing::warn!("Catalog cache write failed for {}: {}", key, e);
        }

        Ok((policies, CatalogSource::Database))
    }

    /// Fetch policies, serving the built-in catalog if the store is unavailable
    pub async fn fetch_or_fallback(&self, filter: &PolicyFilter) -> CatalogSnapshot {
        match self.fetch(filter).await {
            Ok((policies, source)) => CatalogSnapshot {
                policies,
                source,
                error: None,
            },
            Err(e) => {
                if !matches!(e, CatalogError::NotConfigured) {
                    tracing::warn!("Policy store unavailable, serving built-in catalog: {}", e);
                }
                CatalogSnapshot {
                    policies: apply_filter(builtin_policies(), filter),
                    source: CatalogSource::Fallback,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Drop every cached catalog snapshot
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.invalidate_pattern(CacheKey::CATALOG_PATTERN).await {
            tracing::warn!("Catalog cache invalidation failed: {}", e);
        }
    }
}

/// Parse a TOML document of `[[policies]]` tables
pub fn parse_policy_file(text: &str) -> Result<Vec<PolicyRecord>, CatalogError> {
    let file: PolicyFile = toml::from_str(text)?;
    Ok(file.policies)
}

/// The catalog compiled into the binary
pub fn builtin_policies() -> Vec<PolicyRecord> {
    match parse_policy_file(BUILTIN_CATALOG) {
        Ok(policies) => policies,
        Err(e) => {
            tracing::error!("Built-in policy catalog is invalid: {}", e);
            Vec::new()
        }
    }
}

/// Keep only policies in the filter's category (case-insensitive)
pub fn apply_filter(policies: Vec<PolicyRecord>, filter: &PolicyFilter) -> Vec<PolicyRecord> {
    match filter.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => {
            let category = category.to_lowercase();
            policies
                .into_iter()
                .filter(|p| p.category.trim().to_lowercase() == category)
                .collect()
        }
        _ => policies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employment;

    fn catalog() -> PolicyCatalog {
        PolicyCatalog::new(None, Arc::new(CacheManager::in_memory(100, 60)))
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let policies = builtin_policies();
        assert!(policies.len() >= 3);
        assert!(policies.iter().all(|p| p.has_identity()));

        let job = policies.iter().find(|p| p.policy_id == "JOB_001").unwrap();
        assert_eq!(job.category, "창업");
        assert_eq!(job.target_age_min, Some(18));
        assert_eq!(job.target_age_max, Some(39));
        assert_eq!(
            job.target_employment,
            vec![Employment::JobSeeking, Employment::SelfEmployed]
        );
        assert_eq!(job.agency.as_deref(), Some("중소벤처기업부"));
    }

    #[test]
    fn test_apply_filter_case_insensitive() {
        let policies = apply_filter(builtin_policies(), &PolicyFilter::category(" 주거 "));
        assert!(!policies.is_empty());
        assert!(policies.iter().all(|p| p.category == "주거"));

        let all = apply_filter(builtin_policies(), &PolicyFilter::default());
        assert_eq!(all.len(), builtin_policies().len());
    }

    #[test]
    fn test_parse_policy_file_rejects_garbage() {
        assert!(matches!(
            parse_policy_file("policies = 3"),
            Err(CatalogError::Fixture(_))
        ));
        assert!(parse_policy_file("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_without_store() {
        let snapshot = catalog()
            .fetch_or_fallback(&PolicyFilter::category("금융"))
            .await;

        assert_eq!(snapshot.source, CatalogSource::Fallback);
        assert!(snapshot.error.is_some());
        assert!(snapshot.policies.iter().all(|p| p.category == "금융"));
        assert!(snapshot.policies.iter().any(|p| p.policy_id == "FIN_001"));
    }

    #[tokio::test]
    async fn test_cached_snapshot_served_first() {
        let cache = Arc::new(CacheManager::in_memory(100, 60));
        let filter = PolicyFilter::default();
        let cached = vec![builtin_policies().remove(0)];
        cache.set(&CacheKey::catalog(&filter), &cached).await.unwrap();

        let catalog = PolicyCatalog::new(None, cache);
        let snapshot = catalog.fetch_or_fallback(&filter).await;

        assert_eq!(snapshot.source, CatalogSource::Cache);
        assert_eq!(snapshot.policies, cached);

        catalog.invalidate().await;
        let snapshot = catalog.fetch_or_fallback(&filter).await;
        assert_eq!(snapshot.source, CatalogSource::Fallback);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CatalogSource::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
