//! Degraded answer of last resort.
//!
//! When every generation attempt fails, the visitor still gets a usable
//! reply: a verbatim excerpt of the retrieved context when the question
//! text appears literally inside it, otherwise a fixed no-information
//! message. Raw provider failures never cross the `/ask` boundary when a
//! degraded answer exists.

use async_trait::async_trait;

use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::AnswerBackend;

/// Fixed reply when no excerpt applies.
pub const NO_INFORMATION_ANSWER: &str =
    "I could not find information about that in the available knowledge.";

/// Upper bound on a degraded excerpt.
const MAX_EXCERPT_CHARS: usize = 400;

/// Wraps an answer backend and converts its provider-side failures into a
/// degraded answer. Configuration and input errors still propagate; those
/// are operator problems, not provider weather.
pub struct FallbackAnswer {
    inner: Box<dyn AnswerBackend>,
}

impl FallbackAnswer {
    pub fn new(inner: Box<dyn AnswerBackend>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AnswerBackend for FallbackAnswer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        match self.inner.generate(question, context).await {
            Ok(answer) => Ok(answer),
            Err(
                e @ (AskfolioError::Provider { .. }
                | AskfolioError::Format(_)
                | AskfolioError::Http(_)),
            ) => {
                tracing::warn!(backend = self.inner.name(), "generation failed, degrading: {e}");
                Ok(degraded_answer(question, context))
            }
            Err(e) => Err(e),
        }
    }
}

/// The degraded answer itself: a context segment quoting the question
/// literally when one exists, else the fixed message.
fn degraded_answer(question: &str, context: &str) -> String {
    let needle = question.trim().to_lowercase();
    if needle.is_empty() {
        return NO_INFORMATION_ANSWER.to_string();
    }

    for segment in context.split("\n\n") {
        let segment = segment.trim();
        if segment == "---" || segment.is_empty() {
            continue;
        }
        if segment.to_lowercase().contains(&needle) {
            return truncate_chars(segment, MAX_EXCERPT_CHARS);
        }
    }
    NO_INFORMATION_ANSWER.to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailWith(AskfolioError);

    impl FailWith {
        fn provider() -> Self {
            Self(AskfolioError::Provider { status: 502, body: "bad gateway".into() })
        }
    }

    #[async_trait]
    impl AnswerBackend for FailWith {
        fn name(&self) -> &str {
            "failing"
        }
        async fn generate(&self, _q: &str, _c: &str) -> Result<String> {
            match &self.0 {
                AskfolioError::Provider { status, body } => {
                    Err(AskfolioError::Provider { status: *status, body: body.clone() })
                }
                AskfolioError::Config(msg) => Err(AskfolioError::Config(msg.clone())),
                _ => unreachable!(),
            }
        }
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_excerpt() {
        let wrapper = FallbackAnswer::new(Box::new(FailWith::provider()));
        let context = "Unrelated passage.\n\n---\n\nThe phrase ship early appears here.";
        let answer = wrapper.generate("ship early", context).await.unwrap();
        assert_eq!(answer, "The phrase ship early appears here.");
    }

    #[tokio::test]
    async fn provider_failure_without_match_uses_fixed_message() {
        let wrapper = FallbackAnswer::new(Box::new(FailWith::provider()));
        let answer = wrapper.generate("missing topic", "Some context.").await.unwrap();
        assert_eq!(answer, NO_INFORMATION_ANSWER);
    }

    #[tokio::test]
    async fn config_errors_still_propagate() {
        let wrapper =
            FallbackAnswer::new(Box::new(FailWith(AskfolioError::Config("no key".into()))));
        let err = wrapper.generate("q", "c").await.unwrap_err();
        assert!(matches!(err, AskfolioError::Config(_)));
    }

    #[test]
    fn excerpt_matching_is_case_insensitive() {
        let answer = degraded_answer("RUST TOOLING", "We write rust tooling daily.");
        assert_eq!(answer, "We write rust tooling daily.");
    }

    #[test]
    fn long_excerpts_truncate() {
        let long = format!("needle {}", "word ".repeat(200));
        let answer = degraded_answer("needle", &long);
        assert!(answer.ends_with("..."));
        assert!(answer.chars().count() <= MAX_EXCERPT_CHARS + 3);
    }
}
