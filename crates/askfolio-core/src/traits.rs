//! Provider traits: the seams between the pipeline and external services.
//!
//! Both traits are object-safe so the retriever and gateway hold
//! `Box<dyn ...>` and tests substitute hand-rolled mocks.

use async_trait::async_trait;

use crate::error::Result;

/// Obtains vector representations for arbitrary text from an external
/// provider. Order-preserving: `result[i]` corresponds to `texts[i]`.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Scores candidate texts against a query on the provider side, returning
/// one relevance score per candidate. The alternative to shared-query batch
/// embedding plus local cosine.
#[async_trait]
pub trait PairwiseScorer: Send + Sync {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

/// Produces a natural-language answer for a question grounded in a context
/// string, via an external completion or span-extraction endpoint.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Backend identifier for logs.
    fn name(&self) -> &str;

    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}
