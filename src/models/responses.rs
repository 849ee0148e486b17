use serde::{Deserialize, Serialize};

use crate::core::presentation::FormattedResponse;
use crate::models::domain::{ExplainedMatch, MatchResult, MatchSummary, UserProfile};
use crate::services::catalog::CatalogSource;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Response for profile creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile_id: String,
    pub message: String,
    pub profile: UserProfile,
}

/// Response for profile lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfileResponse {
    pub success: bool,
    pub profile_id: String,
    pub profile: UserProfile,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Catalog listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Response for catalog listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyListResponse {
    pub policies: Vec<PolicyItem>,
    pub total: usize,
    pub source: CatalogSource,
}

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub recommendations: Vec<MatchResult>,
    pub catalog_source: CatalogSource,
}

/// Response for the explain endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub success: bool,
    pub message: String,
    pub user_profile_summary: String,
    pub total_explained: usize,
    pub policies: Vec<ExplainedMatch>,
}

/// Timing for one pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: String,
    pub success: bool,
    pub duration_ms: f64,
    pub detail: String,
}

/// Response for the full recommendation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub session_id: String,
    pub success: bool,
    pub message: String,
    pub processing_time_ms: f64,
    pub steps: Vec<StepSummary>,
    pub summary: MatchSummary,
    pub result: FormattedResponse,
    pub catalog_source: CatalogSource,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
