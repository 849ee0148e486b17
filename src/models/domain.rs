use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Region value meaning a policy applies regardless of where the user lives
pub const NATIONWIDE: &str = "전국";
const NATIONWIDE_EN: &str = "nationwide";

/// Returns true when a target region is the nationwide sentinel
#[inline]
pub fn is_nationwide(region: &str) -> bool {
    let region = region.trim();
    region == NATIONWIDE || region.eq_ignore_ascii_case(NATIONWIDE_EN)
}

/// Employment status of a citizen
///
/// The canonical vocabulary uses the Korean labels found in policy data.
/// English keys are accepted on input. Anything else is kept verbatim as
/// `Unrecognized` and never satisfies a policy's employment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Employment {
    Employed,
    JobSeeking,
    SelfEmployed,
    Freelance,
    Student,
    Unemployed,
    Retired,
    Other,
    Unrecognized(String),
}

impl Employment {
    pub const CANONICAL: [Employment; 8] = [
        Employment::Employed,
        Employment::JobSeeking,
        Employment::SelfEmployed,
        Employment::Freelance,
        Employment::Student,
        Employment::Unemployed,
        Employment::Retired,
        Employment::Other,
    ];

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().replace('_', "-").as_str() {
            "재직자" | "employed" => Employment::Employed,
            "구직자" | "job-seeking" | "jobseeking" => Employment::JobSeeking,
            "자영업" | "self-employed" => Employment::SelfEmployed,
            "프리랜서" | "freelance" => Employment::Freelance,
            "학생" | "student" => Employment::Student,
            "무직" | "unemployed" => Employment::Unemployed,
            "은퇴" | "retired" => Employment::Retired,
            "기타" | "other" => Employment::Other,
            _ => Employment::Unrecognized(trimmed.to_string()),
        }
    }

    /// Display label (Korean for canonical values)
    pub fn label(&self) -> &str {
        match self {
            Employment::Employed => "재직자",
            Employment::JobSeeking => "구직자",
            Employment::SelfEmployed => "자영업",
            Employment::Freelance => "프리랜서",
            Employment::Student => "학생",
            Employment::Unemployed => "무직",
            Employment::Retired => "은퇴",
            Employment::Other => "기타",
            Employment::Unrecognized(raw) => raw,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Employment::Unrecognized(_))
    }
}

impl From<String> for Employment {
    fn from(value: String) -> Self {
        Employment::parse(&value)
    }
}

impl From<Employment> for String {
    fn from(value: Employment) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Employment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated citizen profile
///
/// Only produced by `core::validation::validate_profile`; all fields are
/// trimmed and range-checked. Income is expressed in units of 10,000 KRW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u8,
    pub region: String,
    pub income: u64,
    pub employment: Employment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
}

impl UserProfile {
    /// One-line synopsis, e.g. `28세, 서울 거주, 연소득 3,000만원, 재직자, 관심분야: 창업`
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{}세, {} 거주, 연소득 {}만원, {}",
            self.age,
            self.region,
            format_thousands(self.income),
            self.employment
        );
        if let Some(interest) = &self.interest {
            line.push_str(", 관심분야: ");
            line.push_str(interest);
        }
        line
    }
}

/// Format an integer with comma thousands separators
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One government support program and its eligibility targets
///
/// Read-only to the engine. Every field except `policy_id` tolerates being
/// absent so that sparse catalog rows still load; missing targets simply make
/// the corresponding criterion unsatisfiable (or unrestricted where noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    #[serde(default)]
    pub policy_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target_age_min: Option<i32>,
    #[serde(default)]
    pub target_age_max: Option<i32>,
    /// Empty means unrestricted
    #[serde(default)]
    pub target_regions: Vec<String>,
    /// Empty means unrestricted
    #[serde(default)]
    pub target_employment: Vec<Employment>,
    /// Absent means unrestricted
    #[serde(default)]
    pub target_income_max: Option<u64>,
    #[serde(default)]
    pub benefit: String,
    #[serde(default)]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
}

impl PolicyRecord {
    /// A record without an identifier cannot be reported and is skipped
    pub fn has_identity(&self) -> bool {
        !self.policy_id.trim().is_empty()
    }
}

/// Scored policy for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub policy_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub benefit_summary: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
}

/// Aggregate statistics over a result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub success: bool,
    pub message: String,
    pub user_profile_summary: String,
    pub total_matches: usize,
    pub avg_score: f64,
    pub category_distribution: BTreeMap<String, usize>,
}

/// Where an explanation text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    Remote,
    Template,
}

/// Match result paired with the opaque explanation text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedMatch {
    #[serde(flatten)]
    pub result: MatchResult,
    pub explanation: String,
    pub explanation_source: ExplanationSource,
}

/// Catalog query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyFilter {
    pub category: Option<String>,
}

impl PolicyFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Points awarded per satisfied criterion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub age: f64,
    pub region: f64,
    pub employment: f64,
    pub income: f64,
    pub interest: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.age + self.region + self.employment + self.income + self.interest
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            age: 30.0,
            region: 20.0,
            employment: 20.0,
            income: 15.0,
            interest: 15.0,
        }
    }
}
