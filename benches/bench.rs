// Criterion benchmarks for the policy matching engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use youth_policy_match::core::{calculate_match_score, validate_profile, Matcher};
use youth_policy_match::models::{Employment, PolicyRecord, ScoringWeights, UserProfile};

const REGIONS: [&str; 4] = ["전국", "서울", "부산", "경기"];
const CATEGORIES: [&str; 5] = ["창업", "금융", "주거", "취업", "교육"];

fn create_policy(id: usize) -> PolicyRecord {
    PolicyRecord {
        policy_id: format!("POL_{:05}", id),
        title: format!("정책 {}", id),
        category: CATEGORIES[id % CATEGORIES.len()].to_string(),
        description: None,
        target_age_min: Some(18 + (id % 3) as i32),
        target_age_max: Some(29 + (id % 11) as i32),
        target_regions: vec![REGIONS[id % REGIONS.len()].to_string()],
        target_employment: if id % 4 == 0 {
            vec![]
        } else {
            vec![Employment::Employed, Employment::JobSeeking]
        },
        target_income_max: if id % 5 == 0 { None } else { Some(3000 + (id % 7) as u64 * 500) },
        benefit: "최대 1천만원 지원".to_string(),
        budget_max: None,
        deadline: None,
        application_url: None,
        agency: None,
    }
}

fn create_profile() -> UserProfile {
    UserProfile {
        age: 28,
        region: "서울".to_string(),
        income: 3000,
        employment: Employment::Employed,
        interest: Some("금융".to_string()),
    }
}

fn bench_calculate_match_score(c: &mut Criterion) {
    let profile = create_profile();
    let policy = create_policy(1);
    let weights = ScoringWeights::default();

    c.bench_function("calculate_match_score", |b| {
        b.iter(|| calculate_match_score(black_box(&profile), black_box(&policy), &weights));
    });
}

fn bench_validate_profile(c: &mut Criterion) {
    let raw = json!({
        "age": 28,
        "region": "서울",
        "income": 3000,
        "employment": "재직자",
        "interest": "금융",
    });

    c.bench_function("validate_profile", |b| {
        b.iter(|| validate_profile(black_box(&raw)));
    });
}

fn bench_find_matches(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let profile = create_profile();

    let mut group = c.benchmark_group("find_matches");
    for size in [100, 1_000, 10_000] {
        let policies: Vec<PolicyRecord> = (0..size).map(create_policy).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &policies, |b, policies| {
            b.iter(|| matcher.find_matches(black_box(&profile), black_box(policies), 40.0, 10));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_calculate_match_score,
    bench_validate_profile,
    bench_find_matches
);
criterion_main!(benches);
