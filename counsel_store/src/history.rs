//! Durable history provider: one `chat_history` row per session holding the
//! context as a JSON array, upserted on append.

use async_trait::async_trait;
use chrono::Utc;
use counsel_core::{ChatMessage, HistoryProvider, Role, StorageError};
use counsel_entities::chat_history;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

pub struct SqlHistory {
    db: DatabaseConnection,
}

impl SqlHistory {
    /// Set up the `chat_history` table on an existing connection.
    pub async fn new(db: DatabaseConnection) -> anyhow::Result<Self> {
        super::ensure_table(&db, chat_history::Entity).await?;

        info!("SqlHistory initialized");
        Ok(Self { db })
    }

    async fn find(&self, session_id: &str) -> Result<Option<chat_history::Model>, StorageError> {
        chat_history::Entity::find_by_id(session_id.to_owned())
            .one(&self.db)
            .await
            .map_err(StorageError::new)
    }
}

fn decode_messages(raw: &str) -> Result<Vec<ChatMessage>, StorageError> {
    serde_json::from_str(raw).map_err(StorageError::new)
}

#[async_trait]
impl HistoryProvider for SqlHistory {
    async fn get_context(&self, session_id: &str) -> Result<Vec<ChatMessage>, StorageError> {
        if let Some(model) = self.find(session_id).await? {
            return decode_messages(&model.messages);
        }

        // Register the empty context so repeated lookups share one row.
        let now = Utc::now().naive_utc();
        chat_history::ActiveModel {
            session_id: Set(session_id.to_owned()),
            messages: Set("[]".to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(StorageError::new)?;

        info!("Registered new session: {session_id}");
        Ok(Vec::new())
    }

    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), StorageError> {
        let now = Utc::now().naive_utc();
        let existing = self.find(session_id).await?;

        if let Some(model) = existing {
            let mut messages = decode_messages(&model.messages)?;
            messages.push(ChatMessage::new(role, content));
            let encoded = serde_json::to_string(&messages).map_err(StorageError::new)?;

            chat_history::Entity::update(chat_history::ActiveModel {
                session_id: Set(model.session_id),
                messages: Set(encoded),
                created_at: Set(model.created_at),
                updated_at: Set(now),
            })
            .exec(&self.db)
            .await
            .map_err(StorageError::new)?;
        } else {
            let messages = vec![ChatMessage::new(role, content)];
            let encoded = serde_json::to_string(&messages).map_err(StorageError::new)?;

            chat_history::ActiveModel {
                session_id: Set(session_id.to_owned()),
                messages: Set(encoded),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map_err(StorageError::new)?;
        }

        info!("Appended {role} message to history for session: {session_id}");
        Ok(())
    }
}
