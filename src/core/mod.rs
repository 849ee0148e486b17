// Core algorithm exports
pub mod matcher;
pub mod presentation;
pub mod sanitize;
pub mod scoring;
pub mod validation;

pub use matcher::{summarize, Matcher, DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE};
pub use presentation::{format_recommendations, FormattedResponse, ScoreGrade};
pub use scoring::{calculate_match_score, evaluate_policy, summarize_benefit};
pub use validation::{validate_profile, ProfileField, ValidationError};
