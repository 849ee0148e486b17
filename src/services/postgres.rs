use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Employment, MatchResult, PolicyFilter, PolicyRecord, UserProfile};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// A saved citizen profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub profile_id: String,
    pub profile: UserProfile,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One completed recommendation run, kept as history
#[derive(Debug, Clone)]
pub struct RecommendationRecord<'a> {
    pub session_id: &'a str,
    pub profile_id: Option<&'a str>,
    pub profile: &'a UserProfile,
    pub results: &'a [MatchResult],
    pub processing_time_ms: f64,
}

/// PostgreSQL store for the policy catalog, saved profiles and
/// recommendation history
///
/// The matching core never sees this type; routes fetch a catalog snapshot
/// through it and hand plain records to the engine.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Load the catalog, optionally restricted to one category
    ///
    /// Rows that cannot be decoded are logged and skipped.
    pub async fn fetch_policies(
        &self,
        filter: &PolicyFilter,
    ) -> Result<Vec<PolicyRecord>, StoreError> {
        let query = r#"
            SELECT policy_id, title, category, description,
                   target_age_min, target_age_max, target_regions, target_employment,
                   target_income_max, benefit, budget_max, deadline, application_url, agency
            FROM policies
            WHERE ($1::TEXT IS NULL OR LOWER(category) = LOWER($1))
            ORDER BY policy_id
        "#;

        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let rows = sqlx::query(query)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        let total = rows.len();
        let policies: Vec<PolicyRecord> = rows
            .iter()
            .filter_map(|row| match policy_from_row(row) {
                Ok(policy) => Some(policy),
                Err(e) => {
                    tracing::warn!("Skipping undecodable policy row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Loaded {} of {} policies (category: {:?})",
            policies.len(),
            total,
            category
        );

        Ok(policies)
    }

    /// Insert or replace a policy by identifier
    pub async fn upsert_policy(&self, policy: &PolicyRecord) -> Result<(), StoreError> {
        if !policy.has_identity() {
            return Err(StoreError::InvalidInput(
                "policy_id must not be empty".to_string(),
            ));
        }

        let query = r#"
            INSERT INTO policies (
                policy_id, title, category, description,
                target_age_min, target_age_max, target_regions, target_employment,
                target_income_max, benefit, budget_max, deadline, application_url, agency,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            ON CONFLICT (policy_id)
            DO UPDATE SET
                title = EXCLUDED.title,
                category = EXCLUDED.category,
                description = EXCLUDED.description,
                target_age_min = EXCLUDED.target_age_min,
                target_age_max = EXCLUDED.target_age_max,
                target_regions = EXCLUDED.target_regions,
                target_employment = EXCLUDED.target_employment,
                target_income_max = EXCLUDED.target_income_max,
                benefit = EXCLUDED.benefit,
                budget_max = EXCLUDED.budget_max,
                deadline = EXCLUDED.deadline,
                application_url = EXCLUDED.application_url,
                agency = EXCLUDED.agency,
                updated_at = EXCLUDED.updated_at
        "#;

        let employment: Vec<String> = policy
            .target_employment
            .iter()
            .map(|e| e.label().to_string())
            .collect();
        let income_max = policy
            .target_income_max
            .map(i64::try_from)
            .transpose()
            .map_err(|_| StoreError::InvalidInput("target_income_max out of range".to_string()))?;

        sqlx::query(query)
            .bind(policy.policy_id.trim())
            .bind(&policy.title)
            .bind(&policy.category)
            .bind(&policy.description)
            .bind(policy.target_age_min)
            .bind(policy.target_age_max)
            .bind(&policy.target_regions)
            .bind(&employment)
            .bind(income_max)
            .bind(&policy.benefit)
            .bind(policy.budget_max)
            .bind(&policy.deadline)
            .bind(&policy.application_url)
            .bind(&policy.agency)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted policy {}", policy.policy_id);
        Ok(())
    }

    /// Save a validated profile under the given identifier
    pub async fn save_profile(
        &self,
        profile_id: &str,
        profile: &UserProfile,
    ) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO user_profiles (profile_id, profile, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (profile_id)
            DO UPDATE SET profile = EXCLUDED.profile
        "#;

        sqlx::query(query)
            .bind(profile_id)
            .bind(sqlx::types::Json(profile))
            .execute(&self.pool)
            .await?;

        tracing::debug!("Saved profile {}", profile_id);
        Ok(())
    }

    /// Look up a saved profile
    pub async fn get_profile(&self, profile_id: &str) -> Result<Option<StoredProfile>, StoreError> {
        let query = r#"
            SELECT profile_id, profile, created_at
            FROM user_profiles
            WHERE profile_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<StoredProfile, StoreError> {
            let profile: sqlx::types::Json<UserProfile> = row.try_get("profile")?;
            Ok(StoredProfile {
                profile_id: row.try_get("profile_id")?,
                profile: profile.0,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    /// Append a recommendation run to the history table
    pub async fn record_recommendation(
        &self,
        record: &RecommendationRecord<'_>,
    ) -> Result<uuid::Uuid, StoreError> {
        let query = r#"
            INSERT INTO recommendations (
                id, session_id, profile_id, profile, results, processing_time_ms, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
        "#;

        let id = uuid::Uuid::new_v4();
        sqlx::query(query)
            .bind(id)
            .bind(record.session_id)
            .bind(record.profile_id)
            .bind(sqlx::types::Json(record.profile))
            .bind(sqlx::types::Json(record.results))
            .bind(record.processing_time_ms)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded recommendation session {} ({} results)",
            record.session_id,
            record.results.len()
        );

        Ok(id)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn policy_from_row(row: &PgRow) -> Result<PolicyRecord, StoreError> {
    let employment: Vec<String> = row.try_get("target_employment")?;
    let income_max: Option<i64> = row.try_get("target_income_max")?;

    Ok(PolicyRecord {
        policy_id: row.try_get("policy_id")?,
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        target_age_min: row.try_get("target_age_min")?,
        target_age_max: row.try_get("target_age_max")?,
        target_regions: row.try_get("target_regions")?,
        target_employment: employment.iter().map(|e| Employment::parse(e)).collect(),
        target_income_max: income_ceiling(income_max)?,
        benefit: row.try_get("benefit")?,
        budget_max: row.try_get("budget_max")?,
        deadline: row.try_get("deadline")?,
        application_url: row.try_get("application_url")?,
        agency: row.try_get("agency")?,
    })
}

/// Decode a stored income ceiling; negative values make the row invalid
fn income_ceiling(value: Option<i64>) -> Result<Option<u64>, StoreError> {
    value
        .map(|v| {
            u64::try_from(v).map_err(|_| {
                StoreError::InvalidRow(format!("negative target_income_max: {}", v))
            })
        })
        .transpose()
}
