//! # Askfolio Gateway
//!
//! The HTTP surface called by the browser chat widget: `POST /ask` with a
//! message list, `{ "answer": ... }` back. CORS headers are part of the
//! contract (the caller is a cross-origin browser page) and the OPTIONS
//! preflight is answered before any business logic runs.

pub mod routes;
pub mod server;

pub use server::{AppState, AskPipeline, build_router, build_state, start};
