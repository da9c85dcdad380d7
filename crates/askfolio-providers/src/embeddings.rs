//! Batch embedding client for OpenAI-family endpoints.
//!
//! One POST per request covering the whole batch; the caller appends the
//! query text as the final element so chunks and question share a single
//! round trip. No retry at this layer: the retrieval pipeline treats an
//! embedding failure as fatal for the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use askfolio_core::config::EmbeddingConfig;
use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::Embedder;

pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpEmbedder {
    /// Build from configuration. Fails when no credential resolves; the
    /// operator must fix that, the visitor cannot.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            AskfolioError::Config("no embedding API key configured".into())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest { model: &self.model, input: texts };
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AskfolioError::Http(format!("embedding request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AskfolioError::Provider { status: status.as_u16(), body });
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| AskfolioError::Format(format!("embedding response: {e}")))?;

        // Providers may reorder entries; the index field restores input order.
        parsed.data.sort_by_key(|d| d.index);
        if parsed.data.len() != texts.len() {
            return Err(AskfolioError::Format(format!(
                "{} embeddings returned for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_config_error() {
        let config = EmbeddingConfig {
            provider: "unknown-provider".into(),
            api_key: String::new(),
            ..Default::default()
        };
        let err = HttpEmbedder::from_config(&config).unwrap_err();
        assert!(matches!(err, AskfolioError::Config(_)));
    }

    #[test]
    fn endpoint_has_no_double_slash() {
        let config = EmbeddingConfig {
            api_key: "sk-test".into(),
            endpoint: "https://api.openai.com/v1/".into(),
            ..Default::default()
        };
        let embedder = HttpEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.endpoint, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn response_entries_resort_by_index() {
        let raw = r#"{"data":[
            {"embedding":[0.5],"index":1},
            {"embedding":[0.1],"index":0}
        ]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.1]);
        assert_eq!(parsed.data[1].embedding, vec![0.5]);
    }
}
