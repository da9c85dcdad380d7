//! Provider-side pairwise similarity scoring.
//!
//! Sends the question together with every chunk text to a
//! sentence-similarity endpoint and gets one score per chunk back. Used
//! instead of batch embedding when the configured embedding provider is
//! of the inference-API family. Calls retry on 429/5xx with exponential
//! backoff since these endpoints rate-limit aggressively.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use askfolio_core::config::EmbeddingConfig;
use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::PairwiseScorer;

const MAX_ATTEMPTS: u32 = 4;
const BASE_DELAY: Duration = Duration::from_millis(500);

pub struct RemoteSimilarityScorer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RemoteSimilarityScorer {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            AskfolioError::Config("no similarity API key configured".into())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn request_scores(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let request = SimilarityRequest {
            inputs: SimilarityInputs { source_sentence: query, sentences: candidates },
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AskfolioError::Http(format!("similarity request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AskfolioError::Provider { status: status.as_u16(), body });
        }

        // The endpoint returns a bare numeric array, one score per sentence.
        resp.json::<Vec<f32>>()
            .await
            .map_err(|e| AskfolioError::Format(format!("similarity response: {e}")))
    }
}

#[derive(Serialize)]
struct SimilarityRequest<'a> {
    inputs: SimilarityInputs<'a>,
}

#[derive(Serialize)]
struct SimilarityInputs<'a> {
    source_sentence: &'a str,
    sentences: &'a [String],
}

#[async_trait]
impl PairwiseScorer for RemoteSimilarityScorer {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0u32;
        loop {
            match self.request_scores(query, candidates).await {
                Ok(scores) => return Ok(scores),
                Err(e) if e.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                    let delay = BASE_DELAY * 2u32.pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "similarity call failed, backing off: {e}"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
