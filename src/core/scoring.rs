use crate::core::sanitize::collapse_whitespace;
use crate::models::domain::{format_thousands, is_nationwide};
use crate::models::{MatchResult, PolicyRecord, ScoringWeights, UserProfile};

/// Maximum characters kept in a benefit summary
pub const BENEFIT_SUMMARY_MAX_CHARS: usize = 80;
const EMPTY_BENEFIT: &str = "혜택 정보 없음";

/// Calculate a match score (0-100) and the reasons behind it
///
/// Each criterion awards its full weight when satisfied and nothing
/// otherwise; there are no penalties. Reasons are emitted in the fixed order
/// age, region, employment, income, interest.
///
/// ```text
/// score = age        * [min_age <= age <= max_age]
///       + region     * [nationwide | unrestricted | region listed]
///       + employment * [unrestricted | employment listed]
///       + income     * [no ceiling | income <= ceiling]
///       + interest   * [interest ~ category]
/// ```
pub fn calculate_match_score(
    profile: &UserProfile,
    policy: &PolicyRecord,
    weights: &ScoringWeights,
) -> (f64, Vec<String>) {
    let criteria = [
        (weights.age, age_reason(profile, policy)),
        (weights.region, region_reason(profile, policy)),
        (weights.employment, employment_reason(profile, policy)),
        (weights.income, income_reason(profile, policy)),
        (weights.interest, interest_reason(profile, policy)),
    ];

    let mut score = 0.0;
    let mut reasons = Vec::new();
    for (weight, reason) in criteria {
        if let Some(reason) = reason {
            score += weight;
            reasons.push(reason);
        }
    }

    (score.clamp(0.0, 100.0), reasons)
}

/// Score one policy and build the display-ready result
pub fn evaluate_policy(
    profile: &UserProfile,
    policy: &PolicyRecord,
    weights: &ScoringWeights,
) -> MatchResult {
    let (score, match_reasons) = calculate_match_score(profile, policy, weights);

    MatchResult {
        policy_id: policy.policy_id.clone(),
        title: policy.title.clone(),
        category: policy.category.clone(),
        score,
        match_reasons,
        benefit_summary: summarize_benefit(&policy.benefit),
        deadline: policy.deadline.clone(),
        agency: policy.agency.clone(),
        application_url: policy.application_url.clone(),
    }
}

/// Clean and truncate a benefit text for display
pub fn summarize_benefit(benefit: &str) -> String {
    let cleaned = collapse_whitespace(benefit);
    if cleaned.is_empty() {
        return EMPTY_BENEFIT.to_string();
    }

    if cleaned.chars().count() <= BENEFIT_SUMMARY_MAX_CHARS {
        return cleaned;
    }

    let mut truncated: String = cleaned.chars().take(BENEFIT_SUMMARY_MAX_CHARS).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str("...");
    truncated
}

#[inline]
fn age_reason(profile: &UserProfile, policy: &PolicyRecord) -> Option<String> {
    let (min, max) = (policy.target_age_min?, policy.target_age_max?);
    let age = i32::from(profile.age);

    (min <= age && age <= max).then(|| format!("연령 조건 충족 (만 {}~{}세)", min, max))
}

#[inline]
fn region_reason(profile: &UserProfile, policy: &PolicyRecord) -> Option<String> {
    if policy.target_regions.is_empty() {
        return Some("지역 제한 없음".to_string());
    }

    if policy.target_regions.iter().any(|r| is_nationwide(r)) {
        return Some("전국 대상 정책".to_string());
    }

    let region = profile.region.trim();
    policy
        .target_regions
        .iter()
        .any(|r| r.trim().eq_ignore_ascii_case(region))
        .then(|| format!("{} 거주 조건 충족", region))
}

#[inline]
fn employment_reason(profile: &UserProfile, policy: &PolicyRecord) -> Option<String> {
    if policy.target_employment.is_empty() {
        return Some("고용 상태 제한 없음".to_string());
    }

    (profile.employment.is_canonical() && policy.target_employment.contains(&profile.employment))
        .then(|| format!("{} 대상 정책", profile.employment))
}

#[inline]
fn income_reason(profile: &UserProfile, policy: &PolicyRecord) -> Option<String> {
    match policy.target_income_max {
        None => Some("소득 제한 없음".to_string()),
        Some(ceiling) => (profile.income <= ceiling).then(|| {
            format!("소득 기준 충족 (연 {}만원 이하)", format_thousands(ceiling))
        }),
    }
}

#[inline]
fn interest_reason(profile: &UserProfile, policy: &PolicyRecord) -> Option<String> {
    let interest = profile.interest.as_deref()?.trim().to_lowercase();
    let category = policy.category.trim().to_lowercase();
    if interest.is_empty() || category.is_empty() {
        return None;
    }

    (category == interest || category.contains(&interest) || interest.contains(&category))
        .then(|| format!("관심 분야 '{}' 일치", policy.category.trim()))
}
