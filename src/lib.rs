//! Youth Policy Match - recommendation engine for youth support programs
//!
//! Given a citizen profile (age, region, income, employment status and an
//! optional interest) and a catalog of policies, the engine scores every
//! policy against five eligibility criteria, explains each score with
//! human-readable reasons, ranks and caps the results, and formats them for
//! display. The HTTP service, persistence and caching layers live around
//! this pure core.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    calculate_match_score, format_recommendations, summarize, validate_profile, Matcher,
    ValidationError,
};
pub use models::{
    Employment, MatchResult, MatchSummary, PolicyFilter, PolicyRecord, ScoringWeights,
    UserProfile,
};
