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

//! Shared types and trait seams for the counsel chatbot backend.
//!
//! The three traits defined here — [`MessageStore`], [`HistoryProvider`]
//! and [`ModelGateway`] — are the seams the orchestrator is wired against;
//! concrete implementations live in `counsel_store` and `counsel_providers`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod error;

pub use error::{ChatError, GenerationError, StorageError};

/// Session id used when a request carries no session identifier.
///
/// All unidentified callers share this one conversation. That is the
/// documented behavior, not an accident.
pub const DEFAULT_SESSION_ID: &str = "default_session";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(anyhow::anyhow!("unknown role: {other}")),
        }
    }
}

/// One message of the prompt handed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One role-tagged utterance as recorded in the audit log.
///
/// Immutable once written. `id` is assigned by the store and strictly
/// increases in insertion order; the session id is the storage key rather
/// than a field of the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Durable append-only audit log of all turns across all sessions.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a turn with a server-assigned timestamp and id.
    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError>;

    /// All turns for a session, id ascending. Unknown sessions yield an
    /// empty vec, not an error.
    async fn list(&self, session_id: &str) -> Result<Vec<Turn>, StorageError>;
}

/// Per-session context window handed to the model.
///
/// Two interchangeable strategies implement this: a durable one that
/// survives restarts and a volatile process-local one. The orchestrator
/// must not care which is active.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Return the session's context, registering an empty one if the
    /// session is unknown. Repeated calls for the same id never duplicate
    /// or lose turns.
    async fn get_context(&self, session_id: &str) -> Result<Vec<ChatMessage>, StorageError>;

    /// Append one message to the end of the session's context.
    async fn append(&self, session_id: &str, role: Role, content: &str)
    -> Result<(), StorageError>;
}

/// Adapter issuing a single completion request to an external provider.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Produce a completion for system instruction + context + new user
    /// text. No retries happen at this layer.
    async fn generate(
        &self,
        system_prompt: &str,
        context: &[ChatMessage],
        user_text: &str,
    ) -> Result<String, GenerationError>;
}
