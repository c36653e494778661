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

//! Storage backends for the audit log and the per-session history.
//!
//! `Sql*` types persist to Postgres through sea-orm and survive restarts;
//! `Memory*` types are process-local and vanish with the process. Both sides
//! implement the same `counsel_core` traits, so the orchestrator cannot tell
//! them apart.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

mod audit;
mod history;
mod memory;

pub use audit::SqlMessageStore;
pub use history::SqlHistory;
pub use memory::{MemoryHistory, MemoryMessageStore};

fn is_table_already_exists_error(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("already exists") && (msg.contains("table") || msg.contains("relation"))
}

/// Create an entity's table if it is not there yet.
async fn ensure_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema.create_table_from_entity(entity);

    match db.execute_unprepared(&backend.build(&stmt).to_string()).await {
        Ok(_) => Ok(()),
        Err(e) if is_table_already_exists_error(&e) => {
            info!("Table already exists, skipping creation");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
