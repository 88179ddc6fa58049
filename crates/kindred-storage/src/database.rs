// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use kindred_core::KindredError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into [`KindredError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> KindredError {
    KindredError::Storage {
        source: Box::new(e),
    }
}

/// A handle to the SQLite database backing the companion.
///
/// Opening runs all pending migrations and applies connection PRAGMAs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`.
    ///
    /// Creates parent directories, applies WAL mode and related PRAGMAs,
    /// and runs embedded migrations.
    pub async fn open(path: &str) -> Result<Self, KindredError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| KindredError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| KindredError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| {
            migrations::run_migrations(conn).map_err(|e| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(
                    e.to_string(),
                )))
            })?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = path, "database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database with migrations applied (tests).
    pub async fn open_in_memory() -> Result<Self, KindredError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| KindredError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| {
            migrations::run_migrations(conn).map_err(|e| {
                rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(
                    e.to_string(),
                )))
            })?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Returns the underlying connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(&self) -> Result<(), KindredError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("kindred.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn migrations_create_tables() {
        let db = Database::open_in_memory().await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<Vec<String>, rusqlite::Error>(names)
            })
            .await
            .unwrap();

        assert!(tables.iter().any(|t| t == "sessions"));
        assert!(tables.iter().any(|t| t == "messages"));
        assert!(tables.iter().any(|t| t == "memories"));
        assert!(tables.iter().any(|t| t == "memories_fts"));
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kindred.db");
        let path_str = path.to_str().unwrap();

        let db = Database::open(path_str).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Migrations are tracked; a second open must not fail.
        let db = Database::open(path_str).await.unwrap();
        db.close().await.unwrap();
    }
}
