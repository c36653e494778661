#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! HTTP transport for the counsel backend.
//!
//! Two endpoints: `POST /chat` runs one orchestration turn, and
//! `GET /chat-history` replays a session's audit log. Everything else is
//! the orchestrator's business.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use counsel_conversation::Orchestrator;
use counsel_core::MessageStore;

mod error;
mod handler;

pub use error::ApiError;
pub use handler::{ChatRequest, ChatResponse};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn MessageStore>,
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handler::chat))
        .route("/chat-history", get(handler::chat_history))
        .with_state(state)
}
