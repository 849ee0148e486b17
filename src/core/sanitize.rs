use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors raised while cleaning free-text input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("입력 길이 초과 ({len}자 > {max}자)")]
    TooLong { len: usize, max: usize },

    #[error("허용되지 않는 패턴이 포함되어 있습니다")]
    DangerousPattern,
}

static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // SQL keywords as whole words
        r"(?i)\b(union|select|insert|update|delete|drop|create|alter|exec|execute)\b",
        // Document-store operators
        r"(?i)\$(where|ne|gt|lt|regex|or|and)\b",
        r"(?i)<\s*script",
        // Inline event handlers
        r"(?i)\bon[a-z]+\s*=",
        r"\.\./|\.\.\\",
        r"(?i)\b(eval|exec|system|shell_exec)\s*\(",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("sanitizer pattern is a valid regex"))
    .collect()
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Strip control characters, trim, and reject overlong or injection-like text
pub fn sanitize_text(value: &str, max_len: usize) -> Result<String, SanitizeError> {
    let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    let len = cleaned.chars().count();
    if len > max_len {
        return Err(SanitizeError::TooLong { len, max: max_len });
    }

    if DANGEROUS_PATTERNS.iter().any(|re| re.is_match(cleaned)) {
        tracing::warn!("Rejected input matching a dangerous pattern");
        return Err(SanitizeError::DangerousPattern);
    }

    Ok(cleaned.to_string())
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_korean_passes() {
        assert_eq!(sanitize_text("  서울  ", 20).unwrap(), "서울");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(sanitize_text("부\u{0007}산\n", 20).unwrap(), "부산");
    }

    #[test]
    fn test_too_long_rejected() {
        let err = sanitize_text(&"가".repeat(21), 20).unwrap_err();
        assert_eq!(err, SanitizeError::TooLong { len: 21, max: 20 });
    }

    #[test]
    fn test_injection_patterns_rejected() {
        for input in [
            "x'; DROP table--",
            "{\"$where\": 1}",
            "<script>alert(1)</script>",
            "img onerror=alert(1)",
            "../../etc/passwd",
            "eval(1)",
        ] {
            assert_eq!(
                sanitize_text(input, 100),
                Err(SanitizeError::DangerousPattern),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  월 10만원\n\t적립  "), "월 10만원 적립");
    }
}
