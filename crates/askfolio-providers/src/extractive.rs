//! Extractive span-QA backend.
//!
//! Sends `{question, context}` to a span-extraction endpoint and
//! post-processes the returned span: HTML stripped, whitespace collapsed,
//! and confident-but-short spans expanded to their containing sentence.
//! 429/5xx responses retry with exponential backoff; anything else is
//! fatal for the call.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use askfolio_core::config::ExtractiveConfig;
use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::AnswerBackend;

pub struct ExtractiveQaBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_attempts: u32,
    base_delay: Duration,
    min_answer_chars: usize,
    confidence_threshold: f32,
    max_answer_chars: usize,
}

#[derive(Deserialize)]
struct QaResponse {
    answer: String,
    #[serde(default)]
    score: f32,
}

impl ExtractiveQaBackend {
    pub fn from_config(config: &ExtractiveConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| AskfolioError::Config("no extractive-QA API key configured".into()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            min_answer_chars: config.min_answer_chars,
            confidence_threshold: config.confidence_threshold,
            max_answer_chars: config.max_answer_chars,
        })
    }

    async fn query(&self, question: &str, context: &str) -> Result<QaResponse> {
        let body = json!({
            "inputs": { "question": question, "context": context },
            "parameters": {},
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AskfolioError::Http(format!("extractive request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AskfolioError::Provider { status: status.as_u16(), body });
        }

        resp.json::<QaResponse>()
            .await
            .map_err(|e| AskfolioError::Format(format!("extractive response: {e}")))
    }
}

#[async_trait]
impl AnswerBackend for ExtractiveQaBackend {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let mut attempt = 0u32;
        let response = loop {
            match self.query(question, context).await {
                Ok(r) => break r,
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "extractive call failed, backing off: {e}"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        let span = clean_text(&response.answer);
        if span.len() < self.min_answer_chars && response.score > self.confidence_threshold {
            return Ok(expand_answer(&span, context, self.max_answer_chars));
        }
        Ok(span)
    }
}

/// Strip HTML tags and collapse whitespace/newline runs to single spaces.
fn clean_text(raw: &str) -> String {
    let mut without_tags = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => without_tags.push(c),
            _ => {}
        }
    }
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand a short, confident span to the sentence containing it, appending
/// at most one following sentence when the budget allows. Case-insensitive
/// substring location, known to mis-fire on short/common spans; that
/// precision/recall tradeoff is accepted.
fn expand_answer(span: &str, context: &str, max_chars: usize) -> String {
    if span.is_empty() {
        return span.to_string();
    }

    let sentences: Vec<String> = context
        .split(['.', '!', '?'])
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect();

    let span_lower = span.to_lowercase();
    let Some(idx) = sentences.iter().position(|s| s.to_lowercase().contains(&span_lower)) else {
        return span.to_string();
    };

    let mut expanded = format!("{}.", sentences[idx]);
    if let Some(next) = sentences.get(idx + 1) {
        if expanded.len() + next.len() + 2 <= max_chars {
            expanded.push(' ');
            expanded.push_str(next);
            expanded.push('.');
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_and_collapses_whitespace() {
        assert_eq!(clean_text("<b>six  years</b>\n of \t work"), "six years of work");
        assert_eq!(clean_text("plain"), "plain");
    }

    #[test]
    fn short_span_expands_to_containing_sentence() {
        let context = "The studio opened in 2014. It ships small tools. Nothing else here.";
        let expanded = expand_answer("2014", context, 600);
        assert_eq!(expanded, "The studio opened in 2014. It ships small tools.");
    }

    #[test]
    fn expansion_respects_length_budget() {
        let context = "The studio opened in 2014. It ships small tools for the open web.";
        let expanded = expand_answer("2014", context, 30);
        assert_eq!(expanded, "The studio opened in 2014.");
    }

    #[test]
    fn expansion_is_case_insensitive() {
        let context = "Rust powers the BACKEND here. A second sentence.";
        let expanded = expand_answer("backend", context, 600);
        assert!(expanded.starts_with("Rust powers the BACKEND here."));
    }

    #[test]
    fn unlocatable_span_passes_through() {
        let expanded = expand_answer("absent phrase", "Completely unrelated text.", 600);
        assert_eq!(expanded, "absent phrase");
    }

    #[test]
    fn qa_response_defaults_score() {
        let parsed: QaResponse = serde_json::from_str(r#"{"answer":"x"}"#).unwrap();
        assert_eq!(parsed.score, 0.0);
        assert_eq!(parsed.answer, "x");
    }
}
