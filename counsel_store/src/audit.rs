//! Durable audit log: one `messages` row per turn, append-only.

use async_trait::async_trait;
use chrono::Utc;
use counsel_core::{MessageStore, Role, StorageError, Turn};
use counsel_entities::messages;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

pub struct SqlMessageStore {
    db: DatabaseConnection,
}

impl SqlMessageStore {
    /// Set up the `messages` table and its session index on an existing
    /// connection.
    pub async fn new(db: DatabaseConnection) -> anyhow::Result<Self> {
        super::ensure_table(&db, messages::Entity).await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages (session_id)",
        )
        .await?;

        info!("SqlMessageStore initialized");
        Ok(Self { db })
    }
}

fn turn_from_row(row: messages::Model) -> Result<Turn, StorageError> {
    let role: Role = row.role.parse().map_err(StorageError::new)?;
    Ok(Turn {
        id: row.id,
        role,
        content: row.content,
        created_at: row.timestamp.and_utc(),
    })
}

#[async_trait]
impl MessageStore for SqlMessageStore {
    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError> {
        let now = Utc::now().naive_utc();

        let inserted = messages::ActiveModel {
            session_id: Set(session_id.to_owned()),
            role: Set(role.to_string()),
            content: Set(content.to_owned()),
            timestamp: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(StorageError::new)?;

        info!("Appended {role} turn to audit log for session: {session_id}");
        turn_from_row(inserted)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Turn>, StorageError> {
        let rows = messages::Entity::find()
            .filter(messages::Column::SessionId.eq(session_id))
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await
            .map_err(StorageError::new)?;

        rows.into_iter().map(turn_from_row).collect()
    }
}
