use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::core::sanitize::{sanitize_text, SanitizeError};
use crate::models::{Employment, UserProfile};

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 39;
pub const MIN_INCOME: i64 = 0;

const REGION_MAX_LEN: usize = 20;
const EMPLOYMENT_MAX_LEN: usize = 20;
const INTEREST_MAX_LEN: usize = 50;

/// Profile fields checked by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Age,
    Region,
    Income,
    Employment,
    Interest,
}

impl ProfileField {
    pub const REQUIRED: [ProfileField; 4] = [
        ProfileField::Age,
        ProfileField::Region,
        ProfileField::Income,
        ProfileField::Employment,
    ];

    /// JSON key
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::Region => "region",
            ProfileField::Income => "income",
            ProfileField::Employment => "employment",
            ProfileField::Interest => "interest",
        }
    }

    /// Field name with its topic particle
    fn topic(self) -> &'static str {
        match self {
            ProfileField::Age => "나이는",
            ProfileField::Region => "지역은",
            ProfileField::Income => "소득은",
            ProfileField::Employment => "고용 상태는",
            ProfileField::Interest => "관심 분야는",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            ProfileField::Age => "세",
            ProfileField::Income => "만원",
            _ => "",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rejections produced while validating a raw profile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("프로필은 JSON 객체여야 합니다")]
    NotAnObject,

    #[error("필수 필드 누락: {field}")]
    MissingField { field: ProfileField },

    #[error("{field} 형식이 올바르지 않습니다 ({expected} 필요)")]
    InvalidType {
        field: ProfileField,
        expected: &'static str,
    },

    #[error("{} {min}{} 이상이어야 합니다 (입력값: {value})", .field.topic(), .field.unit())]
    BelowMinimum {
        field: ProfileField,
        min: i64,
        value: i64,
    },

    #[error("{} {max}{} 이하여야 합니다 (입력값: {value})", .field.topic(), .field.unit())]
    AboveMaximum {
        field: ProfileField,
        max: i64,
        value: i64,
    },

    #[error("{field} 값이 비어 있습니다")]
    EmptyField { field: ProfileField },

    #[error("{field} 입력값이 허용되지 않습니다: {source}")]
    UnsafeInput {
        field: ProfileField,
        #[source]
        source: SanitizeError,
    },
}

impl ValidationError {
    /// Stable machine-readable kind for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::NotAnObject => "invalid_profile",
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::BelowMinimum { .. } => "below_minimum",
            ValidationError::AboveMaximum { .. } => "above_maximum",
            ValidationError::EmptyField { .. } => "empty_field",
            ValidationError::UnsafeInput {
                source: SanitizeError::TooLong { .. },
                ..
            } => "too_long",
            ValidationError::UnsafeInput {
                source: SanitizeError::DangerousPattern,
                ..
            } => "invalid_characters",
        }
    }
}

/// Validate a raw profile mapping into a `UserProfile`
///
/// Checks run in a fixed order: presence of every required field first, then
/// age, region, income, employment and the optional interest. No side effects.
pub fn validate_profile(raw: &Value) -> Result<UserProfile, ValidationError> {
    let map = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    for field in ProfileField::REQUIRED {
        if field_value(map, field).is_none() {
            return Err(ValidationError::MissingField { field });
        }
    }

    let age = require_integer(map, ProfileField::Age)?;
    if age < MIN_AGE {
        return Err(ValidationError::BelowMinimum {
            field: ProfileField::Age,
            min: MIN_AGE,
            value: age,
        });
    }
    if age > MAX_AGE {
        return Err(ValidationError::AboveMaximum {
            field: ProfileField::Age,
            max: MAX_AGE,
            value: age,
        });
    }

    let region = require_text(map, ProfileField::Region, REGION_MAX_LEN)?;

    let income = require_integer(map, ProfileField::Income)?;
    if income < MIN_INCOME {
        return Err(ValidationError::BelowMinimum {
            field: ProfileField::Income,
            min: MIN_INCOME,
            value: income,
        });
    }

    let employment = require_text(map, ProfileField::Employment, EMPLOYMENT_MAX_LEN)?;

    let interest = match field_value(map, ProfileField::Interest) {
        None => None,
        Some(Value::String(text)) => {
            let cleaned = sanitize_text(text, INTEREST_MAX_LEN).map_err(|source| {
                ValidationError::UnsafeInput {
                    field: ProfileField::Interest,
                    source,
                }
            })?;
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Some(_) => {
            return Err(ValidationError::InvalidType {
                field: ProfileField::Interest,
                expected: "문자열",
            })
        }
    };

    Ok(UserProfile {
        // Range-checked above
        age: age as u8,
        region,
        income: income as u64,
        employment: Employment::parse(&employment),
        interest,
    })
}

/// Present and non-null value for a field
fn field_value(map: &Map<String, Value>, field: ProfileField) -> Option<&Value> {
    map.get(field.key()).filter(|value| !value.is_null())
}

fn require_integer(map: &Map<String, Value>, field: ProfileField) -> Result<i64, ValidationError> {
    let invalid = ValidationError::InvalidType {
        field,
        expected: "정수",
    };

    match field_value(map, field) {
        Some(Value::Number(number)) => {
            if let Some(int) = number.as_i64() {
                Ok(int)
            } else {
                // Accept 28.0 but not 28.5
                match number.as_f64() {
                    Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                        Ok(float as i64)
                    }
                    _ => Err(invalid),
                }
            }
        }
        Some(Value::String(text)) => text.trim().parse::<i64>().map_err(|_| invalid),
        Some(_) => Err(invalid),
        None => Err(ValidationError::MissingField { field }),
    }
}

fn require_text(
    map: &Map<String, Value>,
    field: ProfileField,
    max_len: usize,
) -> Result<String, ValidationError> {
    let text = match field_value(map, field) {
        Some(Value::String(text)) => text,
        Some(_) => {
            return Err(ValidationError::InvalidType {
                field,
                expected: "문자열",
            })
        }
        None => return Err(ValidationError::MissingField { field }),
    };

    let cleaned = sanitize_text(text, max_len)
        .map_err(|source| ValidationError::UnsafeInput { field, source })?;

    if cleaned.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_profile() {
        let profile = validate_profile(&json!({
            "age": 28,
            "region": " 서울 ",
            "income": 3000,
            "employment": "재직자",
            "interest": "창업"
        }))
        .unwrap();

        assert_eq!(profile.age, 28);
        assert_eq!(profile.region, "서울");
        assert_eq!(profile.income, 3000);
        assert_eq!(profile.employment, Employment::Employed);
        assert_eq!(profile.interest.as_deref(), Some("창업"));
    }

    #[test]
    fn test_missing_required_fields() {
        let base = json!({"age": 28, "region": "서울", "income": 3000, "employment": "재직자"});
        for field in ProfileField::REQUIRED {
            let mut raw = base.clone();
            raw.as_object_mut().unwrap().remove(field.key());

            let err = validate_profile(&raw).unwrap_err();
            assert_eq!(err, ValidationError::MissingField { field });
            assert!(err.to_string().contains("필수 필드 누락"));
        }
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = validate_profile(&json!({
            "age": null, "region": "서울", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "missing_field");
    }

    #[test]
    fn test_age_bounds_are_distinguished() {
        let under = validate_profile(&json!({
            "age": 17, "region": "서울", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(under.kind(), "below_minimum");
        assert!(under.to_string().contains("나이는 18세 이상"));

        let over = validate_profile(&json!({
            "age": 40, "region": "서울", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(over.kind(), "above_maximum");
        assert!(over.to_string().contains("39세 이하"));
    }

    #[test]
    fn test_age_boundaries_inclusive() {
        for age in [18, 39] {
            let profile = validate_profile(&json!({
                "age": age, "region": "서울", "income": 0, "employment": "학생"
            }))
            .unwrap();
            assert_eq!(i64::from(profile.age), age);
        }
    }

    #[test]
    fn test_negative_income() {
        let err = validate_profile(&json!({
            "age": 28, "region": "서울", "income": -1000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "below_minimum");
        assert!(err.to_string().contains("소득은 0만원 이상"));
    }

    #[test]
    fn test_blank_region_rejected() {
        let err = validate_profile(&json!({
            "age": 28, "region": "   ", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyField {
                field: ProfileField::Region
            }
        );
    }

    #[test]
    fn test_fractional_age_rejected() {
        let err = validate_profile(&json!({
            "age": 28.5, "region": "서울", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_type");
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let profile = validate_profile(&json!({
            "age": "28", "region": "서울", "income": "3000", "employment": "재직자"
        }))
        .unwrap();
        assert_eq!(profile.age, 28);
        assert_eq!(profile.income, 3000);
    }

    #[test]
    fn test_unknown_employment_passes_through() {
        let profile = validate_profile(&json!({
            "age": 28, "region": "서울", "income": 3000, "employment": "우주비행사"
        }))
        .unwrap();
        assert_eq!(
            profile.employment,
            Employment::Unrecognized("우주비행사".to_string())
        );
    }

    #[test]
    fn test_blank_interest_becomes_none() {
        let profile = validate_profile(&json!({
            "age": 28, "region": "서울", "income": 3000, "employment": "재직자", "interest": "  "
        }))
        .unwrap();
        assert_eq!(profile.interest, None);
    }

    #[test]
    fn test_injection_in_region_rejected() {
        let err = validate_profile(&json!({
            "age": 28, "region": "<script>", "income": 3000, "employment": "재직자"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_characters");
    }

    #[test]
    fn test_overlong_interest_reports_too_long() {
        let err = validate_profile(&json!({
            "age": 28, "region": "서울", "income": 3000, "employment": "재직자",
            "interest": "가".repeat(51)
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnsafeInput {
                field: ProfileField::Interest,
                source: SanitizeError::TooLong { len: 51, max: 50 },
            }
        ));
        assert_eq!(err.kind(), "too_long");
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            validate_profile(&json!([1, 2, 3])),
            Err(ValidationError::NotAnObject)
        );
    }
}
