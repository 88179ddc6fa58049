// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite).

use async_trait::async_trait;

use crate::error::KindredError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageRecord, Session};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections and
/// provide typed operations on the session and message-log tables.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection pool, etc.).
    async fn initialize(&self) -> Result<(), KindredError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), KindredError>;

    // --- Session operations ---

    async fn create_session(&self, session: &Session) -> Result<(), KindredError>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>, KindredError>;

    async fn list_sessions(&self, state: Option<&str>) -> Result<Vec<Session>, KindredError>;

    async fn update_session_state(&self, id: &str, state: &str) -> Result<(), KindredError>;

    // --- Message-log operations ---

    async fn insert_message(&self, message: &MessageRecord) -> Result<(), KindredError>;

    /// Returns the most recent messages for a session in chronological
    /// order, optionally capped at `limit`.
    async fn get_messages(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MessageRecord>, KindredError>;
}
