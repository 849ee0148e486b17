use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ExplainedMatch, ExplanationSource, MatchResult, UserProfile};

/// Comparison table columns: policy name, score, benefit, agency, deadline
pub const TABLE_HEADERS: [&str; 5] = ["정책명", "점수", "혜택", "주관기관", "마감일"];
const MISSING_CELL: &str = "-";

/// Letter tier for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreGrade {
    S,
    A,
    B,
    C,
    D,
}

impl ScoreGrade {
    /// Step function evaluated top-down; the first band reached wins
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ScoreGrade::S
        } else if score >= 80.0 {
            ScoreGrade::A
        } else if score >= 70.0 {
            ScoreGrade::B
        } else if score >= 60.0 {
            ScoreGrade::C
        } else {
            ScoreGrade::D
        }
    }
}

impl fmt::Display for ScoreGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreGrade::S => "S",
            ScoreGrade::A => "A",
            ScoreGrade::B => "B",
            ScoreGrade::C => "C",
            ScoreGrade::D => "D",
        };
        f.write_str(label)
    }
}

/// One recommendation as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRecommendation {
    pub rank: usize,
    #[serde(flatten)]
    pub result: MatchResult,
    pub score_grade: ScoreGrade,
    pub explanation: String,
    pub explanation_source: ExplanationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Final response shape for the recommendation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResponse {
    pub success: bool,
    pub message: String,
    pub user_profile_summary: String,
    pub total_count: usize,
    pub recommendations: Vec<FormattedRecommendation>,
    pub comparison_table: ComparisonTable,
}

/// Grade, rank and tabulate explained matches
///
/// Input order is preserved. Truncates to `max_results` (zero or negative
/// yields an empty response), so applying it after the orchestrator's own cap
/// changes nothing.
pub fn format_recommendations(
    profile: &UserProfile,
    explained: &[ExplainedMatch],
    max_results: i64,
) -> FormattedResponse {
    let limit = usize::try_from(max_results).unwrap_or(0);

    let recommendations: Vec<FormattedRecommendation> = explained
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, item)| FormattedRecommendation {
            rank: idx + 1,
            result: item.result.clone(),
            score_grade: ScoreGrade::from_score(item.result.score),
            explanation: item.explanation.clone(),
            explanation_source: item.explanation_source,
        })
        .collect();

    let rows = recommendations
        .iter()
        .map(|rec| table_row(&rec.result))
        .collect();

    let total_count = recommendations.len();
    let message = if total_count == 0 {
        "추천할 정책이 없습니다.".to_string()
    } else {
        format!("{}개의 맞춤 정책을 추천합니다.", total_count)
    };

    FormattedResponse {
        success: true,
        message,
        user_profile_summary: profile.summary_line(),
        total_count,
        recommendations,
        comparison_table: ComparisonTable {
            headers: TABLE_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows,
        },
    }
}

fn table_row(result: &MatchResult) -> Vec<String> {
    let or_missing = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(MISSING_CELL)
            .to_string()
    };

    vec![
        result.title.clone(),
        format!("{:.1}", result.score),
        result.benefit_summary.clone(),
        or_missing(&result.agency),
        or_missing(&result.deadline),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employment;

    fn profile() -> UserProfile {
        UserProfile {
            age: 28,
            region: "서울".to_string(),
            income: 3000,
            employment: Employment::Employed,
            interest: Some("창업".to_string()),
        }
    }

    fn explained(id: &str, score: f64) -> ExplainedMatch {
        ExplainedMatch {
            result: MatchResult {
                policy_id: id.to_string(),
                title: format!("정책 {}", id),
                category: "창업".to_string(),
                score,
                match_reasons: vec!["연령 조건 충족 (만 18~39세)".to_string()],
                benefit_summary: "최대 5천만원 지원".to_string(),
                deadline: Some("2024년 12월 31일".to_string()),
                agency: None,
                application_url: None,
            },
            explanation: "창업 관심도와 현재 조건에 적합한 정책입니다.".to_string(),
            explanation_source: ExplanationSource::Template,
        }
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(ScoreGrade::from_score(100.0), ScoreGrade::S);
        assert_eq!(ScoreGrade::from_score(90.0), ScoreGrade::S);
        assert_eq!(ScoreGrade::from_score(89.9), ScoreGrade::A);
        assert_eq!(ScoreGrade::from_score(80.0), ScoreGrade::A);
        assert_eq!(ScoreGrade::from_score(75.0), ScoreGrade::B);
        assert_eq!(ScoreGrade::from_score(60.0), ScoreGrade::C);
        assert_eq!(ScoreGrade::from_score(59.9), ScoreGrade::D);
        assert_eq!(ScoreGrade::from_score(0.0), ScoreGrade::D);
        assert_eq!(ScoreGrade::from_score(f64::NAN), ScoreGrade::D);
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&ScoreGrade::A).unwrap(), "\"A\"");
    }

    #[test]
    fn test_format_keeps_input_order() {
        let items = vec![explained("1", 65.0), explained("2", 95.0), explained("3", 85.0)];
        let response = format_recommendations(&profile(), &items, 10);

        let ids: Vec<_> = response
            .recommendations
            .iter()
            .map(|r| r.result.policy_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let grades: Vec<_> = response.recommendations.iter().map(|r| r.score_grade).collect();
        assert_eq!(grades, vec![ScoreGrade::C, ScoreGrade::S, ScoreGrade::A]);
        assert_eq!(response.recommendations[2].rank, 3);
    }

    #[test]
    fn test_comparison_table() {
        let response = format_recommendations(&profile(), &[explained("1", 89.5)], 5);
        let table = response.comparison_table;

        assert_eq!(table.headers, vec!["정책명", "점수", "혜택", "주관기관", "마감일"]);
        assert_eq!(
            table.rows,
            vec![vec![
                "정책 1".to_string(),
                "89.5".to_string(),
                "최대 5천만원 지원".to_string(),
                "-".to_string(),
                "2024년 12월 31일".to_string(),
            ]]
        );
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let items: Vec<_> = (0..6).map(|i| explained(&i.to_string(), 70.0)).collect();

        let once = format_recommendations(&profile(), &items, 3);
        assert_eq!(once.total_count, 3);
        assert_eq!(once.comparison_table.rows.len(), 3);

        let capped: Vec<_> = items.into_iter().take(3).collect();
        let twice = format_recommendations(&profile(), &capped, 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_profile_summary_included() {
        let response = format_recommendations(&profile(), &[], 5);
        assert!(response.user_profile_summary.contains("28세"));
        assert!(response.user_profile_summary.contains("서울"));
        assert!(response.user_profile_summary.contains("재직자"));
        assert!(response.user_profile_summary.contains("창업"));
        assert_eq!(response.total_count, 0);
    }
}
