//! Askfolio configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AskfolioError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskfolioConfig {
    /// Which pipeline answers `/ask`: "knowledge" or "resume".
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub extractive: ExtractiveConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub resume: ResumeConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_mode() -> String { "knowledge".into() }

impl Default for AskfolioConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            llm: LlmConfig::default(),
            extractive: ExtractiveConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            resume: ResumeConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl AskfolioConfig {
    /// Load config from the default path (~/.askfolio/config.toml), or
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AskfolioError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AskfolioError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path, honoring the ASKFOLIO_CONFIG override.
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var("ASKFOLIO_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".askfolio")
            .join("config.toml")
    }
}

/// Generation (chat-completion) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider family: "openrouter" or "openai".
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    /// Bearer token. Resolved config-then-environment; never logged.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the chat-completion API.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Primary model, tried first unless a stickier preference exists.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Candidate models tried in order when the primary fails.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Answer strategy: "chat" (generative) or "extractive" (span QA).
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_llm_provider() -> String { "openrouter".into() }
fn default_llm_endpoint() -> String { "https://openrouter.ai/api/v1".into() }
fn default_llm_model() -> String { "microsoft/phi-3-mini-128k-instruct:free".into() }
fn default_fallback_models() -> Vec<String> {
    vec![
        "google/gemma-2-9b-it:free".into(),
        "meta-llama/llama-3.1-8b-instruct:free".into(),
        "mistralai/mistral-7b-instruct:free".into(),
        "huggingfaceh4/zephyr-7b-beta:free".into(),
    ]
}
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f32 { 0.2 }
fn default_strategy() -> String { "chat".into() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            fallback_models: default_fallback_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            strategy: default_strategy(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: config value first, then the provider's
    /// conventional environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, &self.provider)
    }
}

/// Extractive span-QA configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractiveConfig {
    /// Full model inference URL (HF inference API family).
    #[serde(default = "default_extractive_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Attempts for 429/5xx responses before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds, doubled per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Spans shorter than this may be expanded to their sentence.
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
    /// Confidence score required before expanding a short span.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Length budget for an expanded answer.
    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,
}

fn default_extractive_endpoint() -> String {
    "https://api-inference.huggingface.co/models/deepset/roberta-base-squad2".into()
}
fn default_max_attempts() -> u32 { 4 }
fn default_base_delay_ms() -> u64 { 500 }
fn default_min_answer_chars() -> usize { 40 }
fn default_confidence_threshold() -> f32 { 0.15 }
fn default_max_answer_chars() -> usize { 600 }

impl Default for ExtractiveConfig {
    fn default() -> Self {
        Self {
            endpoint: default_extractive_endpoint(),
            api_key: String::new(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            min_answer_chars: default_min_answer_chars(),
            confidence_threshold: default_confidence_threshold(),
            max_answer_chars: default_max_answer_chars(),
        }
    }
}

impl ExtractiveConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, "huggingface")
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider family: "openai" (batch embeddings) or "huggingface"
    /// (remote pairwise similarity scoring).
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_provider() -> String { "openai".into() }
fn default_embedding_endpoint() -> String { "https://api.openai.com/v1".into() }
fn default_embedding_model() -> String { "text-embedding-3-small".into() }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: String::new(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
        }
    }
}

impl EmbeddingConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, &self.provider)
    }
}

/// Retrieval pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Knowledge corpus file, read fresh on every request.
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Optional similarity floor. None reproduces the primary variant.
    #[serde(default)]
    pub min_score: Option<f32>,
    /// Re-sort surviving chunks into document order before joining,
    /// trading ranking purity for narrative coherence.
    #[serde(default)]
    pub document_order: bool,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Scoring strategy: "embedding" (batch embed + local cosine) or
    /// "remote" (provider-side pairwise similarity with backoff).
    #[serde(default = "default_scoring")]
    pub scoring: String,
}

fn default_knowledge_path() -> String { "data/knowledge.md".into() }
fn default_top_k() -> usize { 5 }
fn default_max_chunk_chars() -> usize { 1200 }
fn default_scoring() -> String { "embedding".into() }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_path: default_knowledge_path(),
            top_k: default_top_k(),
            min_score: None,
            document_order: false,
            max_chunk_chars: default_max_chunk_chars(),
            scoring: default_scoring(),
        }
    }
}

/// Resume mode configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeConfig {
    /// Resume document path (.txt or .md; extraction from PDF/DOCX is the
    /// uploader's job).
    #[serde(default)]
    pub path: String,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8787 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn resolve_key(configured: &str, provider: &str) -> Option<String> {
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    let env_key = match provider {
        "openai" => "OPENAI_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        "huggingface" => "HF_API_TOKEN",
        _ => return None,
    };
    std::env::var(env_key).ok().filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_from_empty_toml() {
        let config: AskfolioConfig = toml::from_str("").unwrap();
        assert_eq!(config.mode, "knowledge");
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.retrieval.min_score.is_none());
        assert!(!config.retrieval.document_order);
        assert_eq!(config.llm.strategy, "chat");
        assert_eq!(config.gateway.port, 8787);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: AskfolioConfig = toml::from_str(
            r#"
            mode = "resume"

            [retrieval]
            top_k = 3
            min_score = 0.25
            document_order = true
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, "resume");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.min_score, Some(0.25));
        assert!(config.retrieval.document_order);
        // untouched section keeps its defaults
        assert_eq!(config.retrieval.max_chunk_chars, 1200);
    }

    #[test]
    fn configured_key_wins_over_env() {
        let llm = LlmConfig { api_key: "sk-test".into(), ..Default::default() };
        assert_eq!(llm.resolve_api_key().as_deref(), Some("sk-test"));
    }
}
