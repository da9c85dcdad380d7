//! # Askfolio RAG
//!
//! The knowledge-file retrieval pipeline: split the corpus into bounded
//! passages on paragraph boundaries, rank them against the question by
//! cosine similarity, and hand the top passages to an answer backend.
//!
//! ```text
//! Visitor: "What are dogs?"
//!   ↓
//! Retriever::answer()
//!   ↓ chunk corpus → embed [chunks..., question] → cosine rank → top 5
//! Context = selected chunks joined with a visible separator
//!   ↓
//! AnswerBackend produces the grounded answer
//! ```

pub mod chunker;
pub mod ranker;
pub mod retriever;

pub use chunker::{Chunk, chunk};
pub use ranker::{ScoredChunk, cosine_similarity, rank};
pub use retriever::{NO_KNOWLEDGE_ANSWER, RetrievalOptions, Retriever, Scoring};
