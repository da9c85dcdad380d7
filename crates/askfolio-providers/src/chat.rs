//! Generative chat backend with an ordered model-fallback list.
//!
//! Free-tier completion models fail often (rate limits, deprecations), so
//! the backend walks a fixed candidate list in order and only the last
//! candidate's failure reaches the caller. The first model that answers
//! becomes the preferred model for subsequent calls.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use askfolio_core::config::LlmConfig;
use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::AnswerBackend;

/// Instruction pinning answers to the retrieved context.
const SYSTEM_PROMPT: &str = "You are a helpful assistant that only answers using the provided \
context. If the answer is not in the context, say: \"I cannot find that in the site \
knowledge.\" Keep answers concise.";

/// The model remembered as preferred after a successful call.
///
/// An explicit, injectable holder rather than process-global state, so
/// tests control and assert on it without restarts. Shared across requests
/// on purpose; a race only costs a redundant fallback iteration.
#[derive(Clone, Default)]
pub struct PreferredModel(Arc<Mutex<Option<String>>>);

impl PreferredModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn set(&self, model: &str) {
        *self.0.lock().unwrap() = Some(model.to_string());
    }
}

pub struct ChatBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    models: Vec<String>,
    preferred: PreferredModel,
    max_tokens: u32,
    temperature: f32,
}

impl ChatBackend {
    pub fn from_config(config: &LlmConfig, preferred: PreferredModel) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| AskfolioError::Config("no chat API key configured".into()))?;

        let mut models = vec![config.model.clone()];
        for m in &config.fallback_models {
            if !models.contains(m) {
                models.push(m.clone());
            }
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key,
            models,
            preferred,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Candidates in try order: the sticky preference first when present,
    /// then the configured list minus duplicates.
    fn candidate_order(&self) -> Vec<String> {
        let mut order = Vec::with_capacity(self.models.len() + 1);
        if let Some(sticky) = self.preferred.get() {
            order.push(sticky);
        }
        for m in &self.models {
            if !order.contains(m) {
                order.push(m.clone());
            }
        }
        order
    }

    async fn try_model(&self, model: &str, question: &str, context: &str) -> Result<String> {
        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Context:\n{context}\n\nQuestion: {question}") },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AskfolioError::Http(format!("chat request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AskfolioError::Provider { status: status.as_u16(), body });
        }

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| AskfolioError::Format(format!("chat response: {e}")))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AskfolioError::Format("completion missing choices[0].message.content".into()))
    }
}

#[async_trait]
impl AnswerBackend for ChatBackend {
    fn name(&self) -> &str {
        "chat"
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let candidates = self.candidate_order();
        let mut last_error = None;

        for model in &candidates {
            match self.try_model(model, question, context).await {
                Ok(answer) => {
                    if self.preferred.get().as_deref() != Some(model.as_str()) {
                        tracing::info!(%model, "switching preferred chat model");
                    }
                    self.preferred.set(model);
                    return Ok(answer);
                }
                Err(e) => {
                    tracing::warn!(%model, "chat model failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AskfolioError::Config("no chat models configured".into())))
    }
}
