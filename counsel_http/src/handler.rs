//! Request handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use counsel_core::ChatError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub session_id: String,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    // A body that fails to parse gets the same {detail} shape as every
    // other error, not the extractor's plain-text rejection.
    let Json(request) = payload.map_err(|rejection| {
        ChatError::Validation(rejection.body_text())
    })?;

    if request.question.trim().is_empty() {
        return Err(ChatError::Validation("question must not be empty".to_string()).into());
    }

    let outcome = state
        .orchestrator
        .handle(&request.question, request.session_id.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        session_id: outcome.session_id,
    }))
}

/// Replay a session's audit log as `"{role}: {content}"` strings, oldest
/// first. Unknown sessions yield an empty list, not an error.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    info!("Listing history for session: {}", params.session_id);

    let turns = state.store.list(&params.session_id).await?;
    let lines = turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect();

    Ok(Json(lines))
}
