use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::time::Instant;
use validator::Validate;

use crate::core::{format_recommendations, summarize, validate_profile};
use crate::models::{
    ExplainRequest, ExplainResponse, MatchRequest, MatchResponse, PolicyFilter, RecommendResponse,
    StepSummary,
};
use crate::routes::{bad_request, rate_limited, validation_failed, AppState};
use crate::services::RecommendationRecord;

/// Configure matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/match", web::post().to(match_policies))
        .route("/explain", web::post().to(explain_policies))
        .route("/recommend", web::post().to(recommend));
}

/// Match endpoint
///
/// POST /api/v1/match
///
/// Request body: profile fields plus optional `min_score` and `max_results`.
async fn match_policies(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let profile = match validate_profile(&req.raw_profile()) {
        Ok(profile) => profile,
        Err(e) => return validation_failed(&e),
    };

    let (min_score, max_results) = state.matching.resolve(req.min_score, req.max_results);
    let snapshot = state.catalog.fetch_or_fallback(&PolicyFilter::default()).await;

    let recommendations = state
        .matcher
        .find_matches(&profile, &snapshot.policies, min_score, max_results);
    let summary = summarize(&profile, &recommendations);

    tracing::info!(
        "Matched {} policies for [{}] (catalog: {} from {:?})",
        recommendations.len(),
        summary.user_profile_summary,
        snapshot.policies.len(),
        snapshot.source
    );

    HttpResponse::Ok().json(MatchResponse {
        summary,
        recommendations,
        catalog_source: snapshot.source,
    })
}

/// Explain endpoint
///
/// POST /api/v1/explain
///
/// Request body: profile fields plus the `policies` previously returned by
/// the match endpoint.
async fn explain_policies(
    state: web::Data<AppState>,
    req: web::Json<ExplainRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let profile = match validate_profile(&serde_json::Value::Object(req.profile)) {
        Ok(profile) => profile,
        Err(e) => return validation_failed(&e),
    };

    let policies = state.explainer.explain_all(&req.policies, &profile).await;

    HttpResponse::Ok().json(ExplainResponse {
        success: true,
        message: format!("{}개 정책에 대한 설명을 생성했습니다.", policies.len()),
        user_profile_summary: profile.summary_line(),
        total_explained: policies.len(),
        policies,
    })
}

/// Full recommendation pipeline
///
/// POST /api/v1/recommend
///
/// # Pipeline Stages
/// 1. Validate the profile
/// 2. Load a catalog snapshot (fallback catalog if the store is down)
/// 3. Score, filter, rank and cap
/// 4. Attach explanations
/// 5. Grade and tabulate
///
/// The run is appended to the recommendation history when a store is
/// configured; failures there only get logged.
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(rejected) = rate_limited(&state, &http_req) {
        return rejected;
    }

    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let started = Instant::now();
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut steps = Vec::with_capacity(5);

    let step = Instant::now();
    let profile = match validate_profile(&req.raw_profile()) {
        Ok(profile) => profile,
        Err(e) => return validation_failed(&e),
    };
    steps.push(step_summary("validate", step, profile.summary_line()));

    let step = Instant::now();
    let snapshot = state.catalog.fetch_or_fallback(&PolicyFilter::default()).await;
    steps.push(step_summary(
        "catalog",
        step,
        format!("{} policies ({:?})", snapshot.policies.len(), snapshot.source),
    ));

    let step = Instant::now();
    let (min_score, max_results) = state.matching.resolve(req.min_score, req.max_results);
    let matches = state
        .matcher
        .find_matches(&profile, &snapshot.policies, min_score, max_results);
    let summary = summarize(&profile, &matches);
    steps.push(step_summary(
        "match",
        step,
        format!("{} matches (min_score {})", matches.len(), min_score),
    ));

    let step = Instant::now();
    let explained = state.explainer.explain_all(&matches, &profile).await;
    steps.push(step_summary(
        "explain",
        step,
        format!("{} explanations", explained.len()),
    ));

    let step = Instant::now();
    let result = format_recommendations(&profile, &explained, max_results);
    steps.push(step_summary(
        "format",
        step,
        format!("{} rows", result.comparison_table.rows.len()),
    ));

    let processing_time_ms = elapsed_ms(started);

    if let Some(store) = &state.store {
        let record = RecommendationRecord {
            session_id: &session_id,
            profile_id: req.profile_id.as_deref(),
            profile: &profile,
            results: &matches,
            processing_time_ms,
        };
        if let Err(e) = store.record_recommendation(&record).await {
            tracing::warn!("Failed to record recommendation history for {}: {}", session_id, e);
        }
    }

    tracing::info!(
        "Recommendation session {} completed in {:.2}ms ({} results)",
        session_id,
        processing_time_ms,
        result.total_count
    );

    HttpResponse::Ok().json(RecommendResponse {
        session_id,
        success: true,
        message: result.message.clone(),
        processing_time_ms,
        steps,
        summary,
        result,
        catalog_source: snapshot.source,
        generated_at: chrono::Utc::now(),
    })
}

fn step_summary(step: &str, started: Instant, detail: String) -> StepSummary {
    StepSummary {
        step: step.to_string(),
        success: true,
        duration_ms: elapsed_ms(started),
        detail,
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
