//! HTTP server implementation using Axum.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use askfolio_core::config::AskfolioConfig;
use askfolio_core::error::{AskfolioError, Result};
use askfolio_core::traits::AnswerBackend;
use askfolio_providers::{HttpEmbedder, RemoteSimilarityScorer, create_backend};
use askfolio_rag::{RetrievalOptions, Retriever, Scoring};
use askfolio_resume::{ResumeEngine, ResumeProfile};

/// The pipeline answering `/ask`, chosen once at startup.
pub enum AskPipeline {
    Knowledge(Retriever),
    /// Rule engine always available; the chat backend is used first when a
    /// credential is configured, with the rule engine as its fallback.
    Resume { engine: ResumeEngine, backend: Option<Box<dyn AnswerBackend>> },
}

/// Shared state for the gateway server.
pub struct AppState {
    pub pipeline: AskPipeline,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(pipeline: AskPipeline) -> Self {
        Self { pipeline, start_time: std::time::Instant::now() }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Assemble the configured pipeline. Missing credentials surface here as
/// configuration errors, before the server binds.
pub fn build_state(config: &AskfolioConfig) -> Result<AppState> {
    let pipeline = match config.mode.as_str() {
        "resume" => {
            if config.resume.path.is_empty() {
                return Err(AskfolioError::Config(
                    "resume mode requires resume.path to be set".into(),
                ));
            }
            let profile = ResumeProfile::load(Path::new(&config.resume.path))?;
            let backend = if config.llm.resolve_api_key().is_some() {
                Some(create_backend(config)?)
            } else {
                tracing::info!("no chat credential configured, resume mode is rule-engine only");
                None
            };
            AskPipeline::Resume { engine: ResumeEngine::new(profile), backend }
        }
        _ => {
            let scoring = match config.retrieval.scoring.as_str() {
                "remote" => Scoring::Remote(Box::new(RemoteSimilarityScorer::from_config(
                    &config.embedding,
                )?)),
                _ => Scoring::Embedding(Box::new(HttpEmbedder::from_config(&config.embedding)?)),
            };
            let options = RetrievalOptions {
                top_k: config.retrieval.top_k,
                min_score: config.retrieval.min_score,
                document_order: config.retrieval.document_order,
                max_chunk_chars: config.retrieval.max_chunk_chars,
            };
            AskPipeline::Knowledge(Retriever::new(
                &config.retrieval.knowledge_path,
                scoring,
                create_backend(config)?,
                options,
            ))
        }
    };
    Ok(AppState::new(pipeline))
}

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask", post(super::routes::ask))
        .route("/health", get(super::routes::health_check))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the browser widget. Origins are restricted via env in
/// production, wide open for development.
/// Example: ASKFOLIO_CORS_ORIGINS=https://example.dev,https://www.example.dev
fn cors_layer() -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    if let Ok(origins_str) = std::env::var("ASKFOLIO_CORS_ORIGINS") {
        let origins: Vec<_> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    } else {
        cors.allow_origin(Any)
    }
}

/// Start the HTTP server.
pub async fn start(config: &AskfolioConfig) -> anyhow::Result<()> {
    let state = Arc::new(build_state(config)?);
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on http://{addr} (mode={})", config.mode);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askfolio_core::types::Message;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn resume_state() -> Arc<AppState> {
        let profile = ResumeProfile::from_text(
            "Jordan Reyes\nSKILLS\npython, postgresql\n",
        );
        Arc::new(AppState::new(AskPipeline::Resume {
            engine: ResumeEngine::new(profile),
            backend: None,
        }))
    }

    fn ask_body(messages: Vec<Message>) -> Body {
        Body::from(serde_json::json!({ "messages": messages }).to_string())
    }

    #[tokio::test]
    async fn ask_answers_latest_user_message() {
        let app = build_router(resume_state());
        let request = Request::post("/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(ask_body(vec![
                Message::user("old question"),
                Message::assistant("old answer"),
                Message::user("list your technical skills"),
            ]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let answer = json["answer"].as_str().unwrap();
        assert!(answer.contains("python"), "unexpected answer: {answer}");
    }

    #[tokio::test]
    async fn missing_user_message_is_bad_request() {
        let app = build_router(resume_state());
        let request = Request::post("/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(ask_body(vec![Message::assistant("only me here")]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preflight_is_answered_before_business_logic() {
        let app = build_router(resume_state());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .header(header::ORIGIN, "https://example.dev")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_router(resume_state());
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn resume_mode_without_path_is_config_error() {
        let config = AskfolioConfig { mode: "resume".into(), ..Default::default() };
        let err = build_state(&config).unwrap_err();
        assert!(matches!(err, AskfolioError::Config(_)));
    }
}
