use std::collections::BTreeMap;

use crate::core::scoring::evaluate_policy;
use crate::models::{MatchResult, MatchSummary, PolicyRecord, ScoringWeights, UserProfile};

pub const DEFAULT_MIN_SCORE: f64 = 40.0;
pub const DEFAULT_MAX_RESULTS: i64 = 10;

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Skip structurally invalid policy records
/// 2. Score every remaining policy independently
/// 3. Drop results below the minimum score
/// 4. Stable sort by score (descending) so ties keep catalog order
/// 5. Truncate to the result cap
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank the catalog for a profile
    ///
    /// # Arguments
    /// * `profile` - Validated user profile
    /// * `policies` - Catalog snapshot, in catalog order
    /// * `min_score` - Results scoring below this are dropped
    /// * `max_results` - Result cap; zero or negative yields no results
    pub fn find_matches(
        &self,
        profile: &UserProfile,
        policies: &[PolicyRecord],
        min_score: f64,
        max_results: i64,
    ) -> Vec<MatchResult> {
        let limit = usize::try_from(max_results).unwrap_or(0);
        if limit == 0 {
            return Vec::new();
        }

        let mut skipped = 0usize;
        let mut scored: Vec<MatchResult> = policies
            .iter()
            .filter(|policy| {
                let valid = policy.has_identity();
                if !valid {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping policy without identifier (title: {:?})",
                        policy.title
                    );
                }
                valid
            })
            .map(|policy| evaluate_policy(profile, policy, &self.weights))
            .filter(|result| result.score >= min_score)
            .collect();

        // sort_by is stable, equal scores keep catalog order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        tracing::debug!(
            "Matched {} of {} policies (skipped {}, min_score {}, max_results {})",
            scored.len(),
            policies.len(),
            skipped,
            min_score,
            max_results
        );

        scored
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Aggregate a result set into summary statistics
pub fn summarize(profile: &UserProfile, results: &[MatchResult]) -> MatchSummary {
    let total_matches = results.len();
    let avg_score = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.score).sum::<f64>() / total_matches as f64
    };

    let mut category_distribution = BTreeMap::new();
    for result in results {
        *category_distribution
            .entry(result.category.clone())
            .or_insert(0usize) += 1;
    }

    let message = if total_matches == 0 {
        "조건에 맞는 정책을 찾지 못했습니다. 최소 점수를 낮춰 다시 시도해 보세요.".to_string()
    } else {
        format!("{}개의 맞춤 정책을 찾았습니다.", total_matches)
    };

    MatchSummary {
        success: true,
        message,
        user_profile_summary: profile.summary_line(),
        total_matches,
        avg_score,
        category_distribution,
    }
}
