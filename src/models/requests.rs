use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::models::domain::MatchResult;

/// Profile fields plus matching options
///
/// The profile stays a raw JSON map so that `core::validation` owns every
/// profile check and can report which field is missing or out of range.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[serde(flatten)]
    pub profile: Map<String, Value>,
    #[validate(range(min = 0.0))]
    #[serde(default, alias = "minScore")]
    pub min_score: Option<f64>,
    #[validate(range(max = 100))]
    #[serde(default, alias = "maxResults")]
    pub max_results: Option<i64>,
    /// Previously stored profile to attach recommendation history to
    #[validate(length(min = 1, max = 64))]
    #[serde(default, alias = "profileId")]
    pub profile_id: Option<String>,
}

impl MatchRequest {
    pub fn raw_profile(&self) -> Value {
        Value::Object(self.profile.clone())
    }
}

/// Profile creation request; the body is the raw profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Explanation request over previously computed match results
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExplainRequest {
    #[serde(flatten)]
    pub profile: Map<String, Value>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub policies: Vec<MatchResult>,
}

/// Catalog listing query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PoliciesQuery {
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
}
