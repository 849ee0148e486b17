use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::Value;
use validator::Validate;

use crate::core::sanitize::sanitize_text;
use crate::core::validate_profile;
use crate::models::{
    ErrorResponse, HealthResponse, PoliciesQuery, PolicyFilter, PolicyItem, PolicyListResponse,
    ProfileRequest, ProfileResponse, StoredProfileResponse,
};
use crate::routes::{bad_request, rate_limited, validation_failed, AppState};

const CATEGORY_MAX_CHARS: usize = 50;

/// Configure health, profile and catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/profile", web::post().to(create_profile))
        .route("/profile/{profile_id}", web::get().to(get_profile))
        .route("/policies", web::get().to(list_policies));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (status, database) = match &state.store {
        None => ("healthy", "not_configured"),
        Some(store) => match store.health_check().await {
            Ok(true) => ("healthy", "connected"),
            _ => ("degraded", "unavailable"),
        },
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Validate and save a profile
///
/// POST /api/v1/profile
///
/// Request body:
/// ```json
/// {
///   "age": 28,
///   "region": "서울",
///   "income": 3000,
///   "employment": "재직자",
///   "interest": "창업"
/// }
/// ```
async fn create_profile(
    state: web::Data<AppState>,
    req: web::Json<ProfileRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    let profile = match validate_profile(&Value::Object(req.into_inner().profile)) {
        Ok(profile) => profile,
        Err(e) => return validation_failed(&e),
    };

    let profile_id = format!("profile_{}", uuid::Uuid::new_v4().simple());

    let message = match &state.store {
        Some(store) => match store.save_profile(&profile_id, &profile).await {
            Ok(()) => "프로필이 저장되었습니다.".to_string(),
            Err(e) => {
                tracing::warn!("Failed to persist profile {}: {}", profile_id, e);
                "프로필이 검증되었지만 저장하지 못했습니다.".to_string()
            }
        },
        None => "프로필이 검증되었습니다. (저장소 미설정)".to_string(),
    };

    tracing::info!("Profile {} accepted: {}", profile_id, profile.summary_line());

    HttpResponse::Ok().json(ProfileResponse {
        success: true,
        profile_id,
        message,
        profile,
    })
}

/// Look up a saved profile
///
/// GET /api/v1/profile/{profile_id}
async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    let profile_id = path.into_inner();

    let Some(store) = &state.store else {
        return HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: "store_unavailable".to_string(),
            message: "프로필 저장소가 설정되지 않았습니다.".to_string(),
            status_code: 503,
        });
    };

    match store.get_profile(&profile_id).await {
        Ok(Some(stored)) => HttpResponse::Ok().json(StoredProfileResponse {
            success: true,
            profile_id: stored.profile_id,
            profile: stored.profile,
            created_at: stored.created_at,
        }),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "not_found".to_string(),
            message: format!("프로필을 찾을 수 없습니다: {}", profile_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch profile {}: {}", profile_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "store_error".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// List catalog policies
///
/// GET /api/v1/policies?category={category}
async fn list_policies(
    state: web::Data<AppState>,
    query: web::Query<PoliciesQuery>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let filter = match query.category.as_deref() {
        Some(raw) => match sanitize_text(raw, CATEGORY_MAX_CHARS) {
            Ok(category) if !category.is_empty() => PolicyFilter::category(category),
            Ok(_) => PolicyFilter::default(),
            Err(e) => return bad_request("invalid_category", e.to_string()),
        },
        None => PolicyFilter::default(),
    };

    let snapshot = state.catalog.fetch_or_fallback(&filter).await;

    let policies: Vec<PolicyItem> = snapshot
        .policies
        .into_iter()
        .filter(|p| p.has_identity())
        .map(|p| PolicyItem {
            id: p.policy_id,
            title: p.title,
            description: p.description.unwrap_or_default(),
            category: p.category,
        })
        .collect();

    tracing::debug!(
        "Listing {} policies (category: {:?}, source: {:?})",
        policies.len(),
        filter.category,
        snapshot.source
    );

    HttpResponse::Ok().json(PolicyListResponse {
        total: policies.len(),
        policies,
        source: snapshot.source,
    })
}
