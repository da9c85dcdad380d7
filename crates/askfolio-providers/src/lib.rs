//! # Askfolio Providers
//!
//! Outbound HTTP clients for the external services the pipeline consumes:
//! batch embeddings, provider-side pairwise similarity, generative chat
//! completion (with model fallback and a sticky preferred model), and
//! extractive span QA (with retry/backoff). Every generation backend is
//! wrapped in a degraded-answer fallback so a provider outage never
//! reaches the visitor as a raw error.

pub mod chat;
pub mod embeddings;
pub mod extractive;
pub mod fallback;
pub mod similarity;

use askfolio_core::config::AskfolioConfig;
use askfolio_core::error::Result;
use askfolio_core::traits::AnswerBackend;

pub use chat::{ChatBackend, PreferredModel};
pub use embeddings::HttpEmbedder;
pub use extractive::ExtractiveQaBackend;
pub use fallback::FallbackAnswer;
pub use similarity::RemoteSimilarityScorer;

/// Create the configured answer backend, wrapped in the degraded-answer
/// fallback of last resort.
pub fn create_backend(config: &AskfolioConfig) -> Result<Box<dyn AnswerBackend>> {
    let inner: Box<dyn AnswerBackend> = match config.llm.strategy.as_str() {
        "extractive" => Box::new(ExtractiveQaBackend::from_config(&config.extractive)?),
        _ => Box::new(ChatBackend::from_config(&config.llm, PreferredModel::new())?),
    };
    Ok(Box::new(FallbackAnswer::new(inner)))
}
