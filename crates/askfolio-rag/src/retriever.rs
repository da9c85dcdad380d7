//! The retrieval orchestrator, one invocation per question.
//!
//! Fixed protocol: load corpus → chunk → score → assemble context →
//! generate. The corpus is read fresh on every request; at the expected
//! corpus size a cache layer buys nothing.

use std::path::PathBuf;

use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::{AnswerBackend, Embedder, PairwiseScorer};

use crate::chunker::chunk;
use crate::ranker::{ScoredChunk, rank, select_top};

/// Canned success answer for an empty or missing knowledge file.
pub const NO_KNOWLEDGE_ANSWER: &str =
    "No knowledge added yet. Please add content to the knowledge file and redeploy.";

/// Visible separator between selected chunks in the assembled context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// How chunks are scored against the question.
pub enum Scoring {
    /// One batch embedding call covering `[chunks..., question]`, cosine
    /// computed locally. The primary variant.
    Embedding(Box<dyn Embedder>),
    /// Provider-side pairwise similarity, one score per chunk.
    Remote(Box<dyn PairwiseScorer>),
}

/// Tunable pipeline behavior. Defaults reproduce the primary variant:
/// top-5, no similarity floor, relevance order.
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub min_score: Option<f32>,
    /// Re-sort survivors into document order before joining.
    pub document_order: bool,
    pub max_chunk_chars: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { top_k: 5, min_score: None, document_order: false, max_chunk_chars: 1200 }
    }
}

/// Answers questions from the knowledge file.
pub struct Retriever {
    knowledge_path: PathBuf,
    scoring: Scoring,
    backend: Box<dyn AnswerBackend>,
    options: RetrievalOptions,
}

impl Retriever {
    pub fn new(
        knowledge_path: impl Into<PathBuf>,
        scoring: Scoring,
        backend: Box<dyn AnswerBackend>,
        options: RetrievalOptions,
    ) -> Self {
        Self { knowledge_path: knowledge_path.into(), scoring, backend, options }
    }

    /// Answer a question from the knowledge corpus. An empty corpus is not
    /// an error; the visitor gets a canned explanation instead.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskfolioError::Input("empty question".into()));
        }

        let corpus = std::fs::read_to_string(&self.knowledge_path).unwrap_or_default();
        if corpus.trim().is_empty() {
            tracing::info!(path = %self.knowledge_path.display(), "knowledge file empty or missing");
            return Ok(NO_KNOWLEDGE_ANSWER.to_string());
        }

        let chunks = chunk(&corpus, self.options.max_chunk_chars);
        let mut selected = self.score_chunks(question, chunks).await?;

        if self.options.document_order {
            selected.sort_by_key(|s| s.chunk.source_offset);
        }

        let context = selected
            .iter()
            .map(|s| s.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        tracing::debug!(
            backend = self.backend.name(),
            chunks = selected.len(),
            context_chars = context.len(),
            "context assembled"
        );

        self.backend.generate(question, &context).await
    }

    async fn score_chunks(
        &self,
        question: &str,
        chunks: Vec<crate::chunker::Chunk>,
    ) -> Result<Vec<ScoredChunk>> {
        match &self.scoring {
            Scoring::Embedding(embedder) => {
                // Query appended last so one network round trip covers both
                // the chunks and the question.
                let mut texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
                texts.push(question.to_string());
                let mut vectors = embedder.embed(&texts).await?;
                if vectors.len() != chunks.len() + 1 {
                    return Err(AskfolioError::Format(format!(
                        "expected {} embeddings, got {}",
                        chunks.len() + 1,
                        vectors.len()
                    )));
                }
                let query = vectors.pop().unwrap_or_default();
                let candidates: Vec<_> = chunks.into_iter().zip(vectors).collect();
                Ok(rank(&query, candidates, self.options.top_k, self.options.min_score))
            }
            Scoring::Remote(scorer) => {
                let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
                let scores = scorer.score(question, &texts).await?;
                if scores.len() != chunks.len() {
                    return Err(AskfolioError::Format(format!(
                        "expected {} scores, got {}",
                        chunks.len(),
                        scores.len()
                    )));
                }
                let scored = chunks
                    .into_iter()
                    .zip(scores)
                    .map(|(chunk, score)| ScoredChunk { chunk, score })
                    .collect();
                Ok(select_top(scored, self.options.top_k, self.options.min_score))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askfolio_providers::fallback::FallbackAnswer;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Hands out canned vectors in call order: one per chunk, query last.
    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            assert_eq!(texts.len(), self.vectors.len());
            Ok(self.vectors.clone())
        }
    }

    struct FixedScorer {
        scores: Vec<f32>,
    }

    #[async_trait]
    impl PairwiseScorer for FixedScorer {
        async fn score(&self, _query: &str, candidates: &[String]) -> Result<Vec<f32>> {
            assert_eq!(candidates.len(), self.scores.len());
            Ok(self.scores.clone())
        }
    }

    /// Echoes a canned answer and records the context it was given through
    /// a handle the test keeps after the backend is boxed away.
    struct RecordingBackend {
        seen_context: Arc<Mutex<Option<String>>>,
        reply: String,
    }

    impl RecordingBackend {
        fn new(reply: &str) -> (Self, Arc<Mutex<Option<String>>>) {
            let seen = Arc::new(Mutex::new(None));
            (Self { seen_context: seen.clone(), reply: reply.into() }, seen)
        }
    }

    #[async_trait]
    impl AnswerBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }
        async fn generate(&self, _question: &str, context: &str) -> Result<String> {
            *self.seen_context.lock().unwrap() = Some(context.to_string());
            Ok(self.reply.clone())
        }
    }

    struct AlwaysFailingBackend;

    #[async_trait]
    impl AnswerBackend for AlwaysFailingBackend {
        fn name(&self) -> &str {
            "failing"
        }
        async fn generate(&self, _q: &str, _c: &str) -> Result<String> {
            Err(AskfolioError::Provider { status: 503, body: "model overloaded".into() })
        }
    }

    fn write_corpus(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn end_to_end_wiring_selects_best_chunk() {
        let corpus = write_corpus("Cats are mammals.\n\nDogs are loyal.");
        let embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.05, 0.95]],
        };
        let (backend, seen) = RecordingBackend::new("Dogs are loyal companions.");

        let retriever = Retriever::new(
            corpus.path(),
            Scoring::Embedding(Box::new(embedder)),
            Box::new(backend),
            // small chunk budget keeps each paragraph its own chunk
            RetrievalOptions { top_k: 1, max_chunk_chars: 20, ..Default::default() },
        );
        let answer = retriever.answer("What are dogs?").await.unwrap();
        assert_eq!(answer, "Dogs are loyal companions.");
        assert_eq!(seen.lock().unwrap().as_deref(), Some("Dogs are loyal."));
    }

    #[tokio::test]
    async fn empty_corpus_yields_canned_answer() {
        let corpus = write_corpus("   \n\n  ");
        let (backend, _) = RecordingBackend::new("unused");
        let retriever = Retriever::new(
            corpus.path(),
            Scoring::Embedding(Box::new(FixedEmbedder { vectors: vec![] })),
            Box::new(backend),
            RetrievalOptions::default(),
        );
        let answer = retriever.answer("anything?").await.unwrap();
        assert_eq!(answer, NO_KNOWLEDGE_ANSWER);
    }

    #[tokio::test]
    async fn missing_corpus_yields_canned_answer() {
        let (backend, _) = RecordingBackend::new("unused");
        let retriever = Retriever::new(
            "/nonexistent/knowledge.md",
            Scoring::Embedding(Box::new(FixedEmbedder { vectors: vec![] })),
            Box::new(backend),
            RetrievalOptions::default(),
        );
        let answer = retriever.answer("anything?").await.unwrap();
        assert_eq!(answer, NO_KNOWLEDGE_ANSWER);
    }

    #[tokio::test]
    async fn empty_question_rejected_before_io() {
        let (backend, _) = RecordingBackend::new("unused");
        let retriever = Retriever::new(
            "/nonexistent/knowledge.md",
            Scoring::Embedding(Box::new(FixedEmbedder { vectors: vec![] })),
            Box::new(backend),
            RetrievalOptions::default(),
        );
        let err = retriever.answer("   ").await.unwrap_err();
        assert!(matches!(err, AskfolioError::Input(_)));
    }

    #[tokio::test]
    async fn degraded_answer_when_every_model_fails() {
        let corpus = write_corpus("Dogs are loyal.\n\nCats are mammals.");
        let retriever = Retriever::new(
            corpus.path(),
            Scoring::Remote(Box::new(FixedScorer { scores: vec![0.9, 0.1] })),
            Box::new(FallbackAnswer::new(Box::new(AlwaysFailingBackend))),
            RetrievalOptions { max_chunk_chars: 20, ..Default::default() },
        );
        let answer = retriever.answer("Tell me about cats").await.unwrap();
        assert!(!answer.is_empty());
    }

    #[tokio::test]
    async fn document_order_resorts_survivors() {
        let corpus = write_corpus("first passage\n\nsecond passage\n\nthird passage");
        let (backend, seen) = RecordingBackend::new("done");
        let retriever = Retriever::new(
            corpus.path(),
            // third scores highest, first second-highest, second lowest
            Scoring::Remote(Box::new(FixedScorer { scores: vec![0.8, 0.2, 0.9] })),
            Box::new(backend),
            RetrievalOptions {
                top_k: 2,
                document_order: true,
                max_chunk_chars: 15,
                ..Default::default()
            },
        );
        retriever.answer("which passages?").await.unwrap();
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("first passage\n\n---\n\nthird passage")
        );
    }

    #[tokio::test]
    async fn remote_scoring_respects_floor() {
        let corpus = write_corpus("alpha\n\nbeta\n\ngamma");
        let (backend, seen) = RecordingBackend::new("ok");
        let retriever = Retriever::new(
            corpus.path(),
            Scoring::Remote(Box::new(FixedScorer { scores: vec![0.9, 0.05, 0.6] })),
            Box::new(backend),
            RetrievalOptions { min_score: Some(0.5), max_chunk_chars: 6, ..Default::default() },
        );
        let answer = retriever.answer("query").await.unwrap();
        assert_eq!(answer, "ok");
        assert_eq!(seen.lock().unwrap().as_deref(), Some("alpha\n\n---\n\ngamma"));
    }
}
