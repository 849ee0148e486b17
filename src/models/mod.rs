// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Employment, ExplainedMatch, ExplanationSource, MatchResult, MatchSummary, PolicyFilter,
    PolicyRecord, ScoringWeights, UserProfile, NATIONWIDE,
};
pub use requests::{ExplainRequest, MatchRequest, PoliciesQuery, ProfileRequest};
pub use responses::{
    ErrorResponse, ExplainResponse, HealthResponse, MatchResponse, PolicyItem, PolicyListResponse,
    ProfileResponse, RecommendResponse, StepSummary, StoredProfileResponse,
};
