//! API route handlers for the gateway.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::AnswerBackend;
use askfolio_core::types::{Message, latest_user_question};
use askfolio_resume::ResumeEngine;

use super::server::{AppState, AskPipeline};

/// `POST /ask` request body, as sent by the chat widget.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "askfolio-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// The `/ask` contract: answer the most recent user message.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Response {
    let Some(question) = latest_user_question(&request.messages) else {
        return error_response(StatusCode::BAD_REQUEST, "no user message provided");
    };

    let result = match &state.pipeline {
        AskPipeline::Knowledge(retriever) => retriever.answer(question).await,
        AskPipeline::Resume { engine, backend } => {
            answer_resume(engine, backend.as_deref(), question).await
        }
    };

    match result {
        Ok(answer) => Json(serde_json::json!({ "answer": answer })).into_response(),
        Err(e) => {
            let status = match &e {
                AskfolioError::Input(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::error!(%status, "ask failed: {e}");
            error_response(status, &e.to_string())
        }
    }
}

/// Resume mode: prefer the generative backend over the formatted profile
/// context when one is configured; the rule engine answers when it fails
/// or when no credential exists. The rule engine itself never fails.
pub async fn answer_resume(
    engine: &ResumeEngine,
    backend: Option<&dyn AnswerBackend>,
    question: &str,
) -> Result<String> {
    if let Some(backend) = backend {
        let context = engine.format_context();
        match backend.generate(question, &context).await {
            Ok(answer) => return Ok(answer),
            Err(e) => {
                tracing::warn!("chat backend failed for resume question, using rule engine: {e}");
            }
        }
    }
    Ok(engine.answer(question))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
