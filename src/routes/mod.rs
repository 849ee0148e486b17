// Route exports
pub mod matches;
pub mod profiles;

use actix_web::http::{header, StatusCode};
use actix_web::{error, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::config::MatchingSettings;
use crate::core::{Matcher, ValidationError};
use crate::models::ErrorResponse;
use crate::services::{ExplainerClient, PolicyCatalog, PostgresStore, RateDecision, RateLimiter};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<PolicyCatalog>,
    pub store: Option<Arc<PostgresStore>>,
    pub matcher: Matcher,
    pub explainer: Arc<ExplainerClient>,
    pub rate_limiter: Arc<RateLimiter>,
    pub matching: MatchingSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(profiles::configure)
            .configure(matches::configure),
    );
}

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

pub(crate) fn bad_request(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: 400,
    })
}

pub(crate) fn validation_failed(err: &ValidationError) -> HttpResponse {
    tracing::info!("Profile validation failed ({}): {}", err.kind(), err);
    bad_request(err.kind(), err.to_string())
}

/// Reject the request with 429 when the client is over its limit
pub(crate) fn rate_limited(state: &AppState, req: &HttpRequest) -> Option<HttpResponse> {
    let client = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    match state.rate_limiter.check(&client) {
        RateDecision::Allowed => None,
        RateDecision::Blocked { retry_after } => {
            // Round up so clients never retry early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Some(
                HttpResponse::TooManyRequests()
                    .insert_header((header::RETRY_AFTER, secs.to_string()))
                    .json(ErrorResponse {
                        error: "rate_limited".to_string(),
                        message: "요청이 너무 많습니다. 잠시 후 다시 시도해 주세요.".to_string(),
                        status_code: 429,
                    }),
            )
        }
    }
}
