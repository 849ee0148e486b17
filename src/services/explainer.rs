use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ExplainedMatch, ExplanationSource, MatchResult, UserProfile};

const SYSTEM_PROMPT: &str = "당신은 청년 정책 상담사입니다. 주어진 매칭 점수와 사유를 바탕으로 \
    사용자에게 정책이 왜 적합한지 2~3문장으로 친절하게 설명하세요.";

/// Errors that can occur when calling the explanation service
#[derive(Debug, Error)]
pub enum ExplainerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Explanation service is not configured")]
    NotConfigured,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for the external explanation-text service
///
/// Speaks the OpenAI-compatible chat completions protocol. The engine's
/// score and reasons are passed through unchanged; only the free text comes
/// from the remote side. When the service is unset or fails, a template
/// built from the match reasons is used instead, so explaining never fails.
pub struct ExplainerClient {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl ExplainerClient {
    /// Create a client for the given chat completions endpoint
    pub fn new(
        endpoint: Option<String>,
        api_key: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, ExplainerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            client,
        })
    }

    /// Template-only client
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: String::new(),
            client: Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Explain one result, falling back to the template on any failure
    pub async fn explain(&self, result: &MatchResult, profile: &UserProfile) -> ExplainedMatch {
        let (explanation, explanation_source) = match self.request_explanation(result, profile).await {
            Ok(text) => (text, ExplanationSource::Remote),
            Err(ExplainerError::NotConfigured) => {
                (template_explanation(result, profile), ExplanationSource::Template)
            }
            Err(e) => {
                tracing::warn!(
                    "Explanation service failed for {}, using template: {}",
                    result.policy_id,
                    e
                );
                (template_explanation(result, profile), ExplanationSource::Template)
            }
        };

        ExplainedMatch {
            result: result.clone(),
            explanation,
            explanation_source,
        }
    }

    /// Explain every result, preserving order
    pub async fn explain_all(
        &self,
        results: &[MatchResult],
        profile: &UserProfile,
    ) -> Vec<ExplainedMatch> {
        let mut explained = Vec::with_capacity(results.len());
        for result in results {
            explained.push(self.explain(result, profile).await);
        }
        explained
    }

    async fn request_explanation(
        &self,
        result: &MatchResult,
        profile: &UserProfile,
    ) -> Result<String, ExplainerError> {
        let endpoint = self.endpoint.as_deref().ok_or(ExplainerError::NotConfigured)?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(result, profile),
                },
            ],
            max_tokens: 300,
            temperature: 0.7,
        };

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!("Requesting explanation for {} from {}", result.policy_id, endpoint);
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ExplainerError::ApiError(format!(
                "Explanation request failed: {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ExplainerError::InvalidResponse("Missing message content".into()))
    }
}

fn build_prompt(result: &MatchResult, profile: &UserProfile) -> String {
    format!(
        "사용자: {}\n정책: {} ({})\n매칭 점수: {:.1}점\n매칭 사유: {}\n혜택: {}",
        profile.summary_line(),
        result.title,
        result.category,
        result.score,
        result.match_reasons.join(", "),
        result.benefit_summary
    )
}

/// Deterministic explanation built from the match reasons
pub fn template_explanation(result: &MatchResult, profile: &UserProfile) -> String {
    let mut text = if result.match_reasons.is_empty() {
        format!(
            "'{}'은(는) {}점으로 일부 조건만 충족하는 정책입니다.",
            result.title,
            format_score(result.score)
        )
    } else {
        format!(
            "'{}'은(는) {} 조건을 충족하여 {}세 {}에게 {}점의 적합도를 보입니다.",
            result.title,
            result.match_reasons.join(", "),
            profile.age,
            profile.employment,
            format_score(result.score)
        )
    };

    text.push_str(&format!(" 주요 혜택: {}", result.benefit_summary));
    if let Some(deadline) = result.deadline.as_deref().filter(|d| !d.trim().is_empty()) {
        text.push_str(&format!(" (마감: {})", deadline.trim()));
    }
    text
}

fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}
