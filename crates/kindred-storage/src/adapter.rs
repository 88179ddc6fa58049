// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use kindred_config::model::StorageConfig;
use kindred_core::types::{MessageRecord, Session};
use kindred_core::{
    AdapterType, HealthStatus, KindredError, PluginAdapter, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, KindredError> {
        self.db.get().ok_or_else(|| KindredError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Find the active session belonging to a (channel, sender) pair.
    pub async fn find_session_for_sender(
        &self,
        channel: &str,
        user_id: &str,
    ) -> Result<Option<Session>, KindredError> {
        queries::sessions::find_session_for_sender(self.db()?, channel, user_id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KindredError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KindredError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), KindredError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| KindredError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), KindredError> {
        self.db()?.close().await
    }

    // --- Session operations ---

    async fn create_session(&self, session: &Session) -> Result<(), KindredError> {
        queries::sessions::create_session(self.db()?, session).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, KindredError> {
        queries::sessions::get_session(self.db()?, id).await
    }

    async fn list_sessions(&self, state: Option<&str>) -> Result<Vec<Session>, KindredError> {
        queries::sessions::list_sessions(self.db()?, state).await
    }

    async fn update_session_state(&self, id: &str, state: &str) -> Result<(), KindredError> {
        queries::sessions::update_session_state(self.db()?, id, state).await
    }

    // --- Message-log operations ---

    async fn insert_message(&self, message: &MessageRecord) -> Result<(), KindredError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn get_messages(
        &self,
        session_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MessageRecord>, KindredError> {
        queries::messages::get_messages_for_session(self.db()?, session_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::types::Modality;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn adapter_metadata() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(
            dir.path().join("t.db").to_str().unwrap(),
        ));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(
            dir.path().join("t.db").to_str().unwrap(),
        ));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(
            dir.path().join("t.db").to_str().unwrap(),
        ));
        assert!(storage.health_check().await.is_err());

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn full_session_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(
            dir.path().join("lifecycle.db").to_str().unwrap(),
        ));
        storage.initialize().await.unwrap();

        let session = Session {
            id: "sess-1".to_string(),
            channel: "whatsapp".to_string(),
            user_id: Some("15551230001".to_string()),
            state: "active".to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:00.000Z".to_string(),
            updated_at: "2026-05-01T00:00:00.000Z".to_string(),
        };
        storage.create_session(&session).await.unwrap();

        let found = storage
            .find_session_for_sender("whatsapp", "15551230001")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "sess-1");

        let m1 = MessageRecord {
            id: "m1".to_string(),
            session_id: "sess-1".to_string(),
            direction: "inbound".to_string(),
            modality: Modality::Text,
            content: "hello".to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:01.000Z".to_string(),
        };
        let m2 = MessageRecord {
            id: "m2".to_string(),
            session_id: "sess-1".to_string(),
            direction: "outbound".to_string(),
            modality: Modality::Text,
            content: "hey there".to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:02.000Z".to_string(),
        };
        storage.insert_message(&m1).await.unwrap();
        storage.insert_message(&m2).await.unwrap();

        let messages = storage.get_messages("sess-1", None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].direction, "inbound");
        assert_eq!(messages[1].direction, "outbound");

        storage.update_session_state("sess-1", "closed").await.unwrap();
        let updated = storage.get_session("sess-1").await.unwrap().unwrap();
        assert_eq!(updated.state, "closed");

        storage.close().await.unwrap();
    }
}
