// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage and FTS5 for BM25.

use kindred_core::KindredError;
use tokio_rusqlite::Connection;

use crate::types::{blob_to_vec, vec_to_blob, Memory, MemoryStatus};

/// Convert tokio_rusqlite errors into KindredError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> KindredError {
    KindredError::Storage {
        source: Box::new(e),
    }
}

const MEMORY_COLUMNS: &str =
    "id, content, embedding, status, session_id, created_at, updated_at";

/// Persistent store for memories in SQLite.
///
/// Stores embeddings as little-endian f32 BLOBs and relies on the FTS5
/// shadow table (kept in sync by triggers from migration V2) for BM25
/// keyword search.
pub struct MemoryStore {
    conn: Connection,
}

impl MemoryStore {
    /// Creates a MemoryStore wrapping an existing connection.
    ///
    /// The connection must point at a database with migration V2 applied
    /// (memories table + memories_fts virtual table).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens a store on the database at `path`.
    pub async fn open(path: &str) -> Result<Self, KindredError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| KindredError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self::new(conn))
    }

    /// Save a memory to the store.
    pub async fn save(&self, memory: &Memory) -> Result<(), KindredError> {
        let id = memory.id.clone();
        let content = memory.content.clone();
        let embedding_blob = vec_to_blob(&memory.embedding);
        let status = memory.status.as_str().to_string();
        let session_id = memory.session_id.clone();
        let created_at = memory.created_at.clone();
        let updated_at = memory.updated_at.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO memories (id, content, embedding, status, session_id, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![id, content, embedding_blob, status, session_id, created_at, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Get a memory by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Memory>, KindredError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"
                ))?;
                match stmt.query_row(rusqlite::params![id], |row| Ok(row_to_memory(row))) {
                    Ok(memory) => Ok(Some(memory)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(storage_err)
    }

    /// Get all active memories, newest first.
    pub async fn get_active(&self) -> Result<Vec<Memory>, KindredError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE status = 'active' ORDER BY created_at DESC"
                ))?;
                let memories = stmt
                    .query_map([], |row| Ok(row_to_memory(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(memories)
            })
            .await
            .map_err(storage_err)
    }

    /// Get all active memory embeddings as (id, vector) pairs.
    ///
    /// Lightweight variant for vector search and dedup checks.
    pub async fn get_active_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>, KindredError> {
        self.conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT id, embedding FROM memories WHERE status = 'active'")?;
                let results = stmt
                    .query_map([], |row| {
                        let id: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((id, blob_to_vec(&blob)))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    /// Search memories using BM25 via FTS5.
    ///
    /// Returns (memory_id, bm25_score) pairs most relevant first. BM25
    /// scores are negative (more negative = more relevant).
    pub async fn search_bm25(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<(String, f64)>, KindredError> {
        let query = fts_quote(query);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT m.id, bm25(memories_fts) AS score
                     FROM memories_fts
                     JOIN memories m ON m.rowid = memories_fts.rowid
                     WHERE memories_fts MATCH ?1 AND m.status = 'active'
                     ORDER BY bm25(memories_fts) LIMIT ?2",
                )?;
                let results = stmt
                    .query_map(rusqlite::params![query, limit as i64], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    /// Mark a memory as forgotten (excluded from retrieval, kept for audit).
    pub async fn forget(&self, id: &str) -> Result<(), KindredError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE memories SET status = 'forgotten',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1",
                    rusqlite::params![id],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Get active memories by IDs (batch retrieval after hybrid search).
    pub async fn get_memories_by_ids(&self, ids: &[String]) -> Result<Vec<Memory>, KindredError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = ids.to_vec();
        self.conn
            .call(move |conn| {
                let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories
                     WHERE id IN ({}) AND status = 'active'",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;
                let params: Vec<&dyn rusqlite::types::ToSql> =
                    ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
                let memories = stmt
                    .query_map(params.as_slice(), |row| Ok(row_to_memory(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(memories)
            })
            .await
            .map_err(storage_err)
    }
}

/// Quote a free-text query for FTS5 MATCH, stripping operator syntax.
///
/// User text is arbitrary; wrapping each token in double quotes prevents
/// characters like `-` or `:` from being parsed as FTS5 operators.
fn fts_quote(query: &str) -> String {
    query
        .split_whitespace()
        .map(|tok| format!("\"{}\"", tok.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a rusqlite Row to a Memory struct.
fn row_to_memory(row: &rusqlite::Row) -> Memory {
    let embedding_blob: Vec<u8> = row.get(2).unwrap_or_default();
    let status_str: String = row.get(3).unwrap_or_default();

    Memory {
        id: row.get(0).unwrap_or_default(),
        content: row.get(1).unwrap_or_default(),
        embedding: blob_to_vec(&embedding_blob),
        status: MemoryStatus::from_str_value(&status_str),
        session_id: row.get(4).unwrap_or(None),
        created_at: row.get(5).unwrap_or_default(),
        updated_at: row.get(6).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS memories (
                    id TEXT PRIMARY KEY NOT NULL,
                    content TEXT NOT NULL,
                    embedding BLOB NOT NULL,
                    status TEXT NOT NULL DEFAULT 'active',
                    session_id TEXT,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                );

                CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
                    content,
                    content='memories',
                    content_rowid='rowid'
                );

                CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
                    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
                END;

                CREATE TRIGGER IF NOT EXISTS memories_au AFTER UPDATE ON memories BEGIN
                    INSERT INTO memories_fts(memories_fts, rowid, content)
                        VALUES('delete', old.rowid, old.content);
                    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
                END;",
            )?;
            Ok::<(), rusqlite::Error>(())
        })
        .await
        .unwrap();
        conn
    }

    fn make_memory(id: &str, content: &str) -> Memory {
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            embedding: vec![0.05; 384],
            status: MemoryStatus::Active,
            session_id: Some("sess-test".to_string()),
            created_at: "2026-05-01T00:00:00.000Z".to_string(),
            updated_at: "2026-05-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_get_by_id() {
        let store = MemoryStore::new(setup_test_db().await);
        store
            .save(&make_memory("m1", "Has a cat named Miso"))
            .await
            .unwrap();

        let got = store.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(got.content, "Has a cat named Miso");
        assert_eq!(got.embedding.len(), 384);
        assert_eq!(got.session_id.as_deref(), Some("sess-test"));
    }

    #[tokio::test]
    async fn get_by_id_missing_returns_none() {
        let store = MemoryStore::new(setup_test_db().await);
        assert!(store.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn forget_excludes_from_active() {
        let store = MemoryStore::new(setup_test_db().await);
        store.save(&make_memory("m1", "Lives in Lisbon")).await.unwrap();
        store.save(&make_memory("m2", "Plays bass")).await.unwrap();
        store.forget("m1").await.unwrap();

        let active = store.get_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "m2");

        let forgotten = store.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(forgotten.status, MemoryStatus::Forgotten);
    }

    #[tokio::test]
    async fn embedding_blob_roundtrips_through_sqlite() {
        let store = MemoryStore::new(setup_test_db().await);
        let mut memory = make_memory("m1", "roundtrip");
        memory.embedding = (0..384).map(|i| (i as f32).sin()).collect();
        let expected = memory.embedding.clone();
        store.save(&memory).await.unwrap();

        let got = store.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(got.embedding, expected);
    }

    #[tokio::test]
    async fn bm25_finds_keyword_match() {
        let store = MemoryStore::new(setup_test_db().await);
        store
            .save(&make_memory("m1", "Has a golden retriever named Max"))
            .await
            .unwrap();
        store.save(&make_memory("m2", "Likes pizza")).await.unwrap();

        let results = store.search_bm25("golden retriever", 10).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0, "m1");
    }

    #[tokio::test]
    async fn bm25_skips_forgotten_memories() {
        let store = MemoryStore::new(setup_test_db().await);
        store
            .save(&make_memory("m1", "Collects vinyl records"))
            .await
            .unwrap();
        store.forget("m1").await.unwrap();

        let results = store.search_bm25("vinyl", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn bm25_tolerates_operator_characters() {
        let store = MemoryStore::new(setup_test_db().await);
        store.save(&make_memory("m1", "Works at a bakery")).await.unwrap();
        // Raw `-` or `:` would be FTS5 syntax errors without quoting.
        let results = store.search_bm25("bakery - what: where?", 10).await.unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn get_memories_by_ids_batch() {
        let store = MemoryStore::new(setup_test_db().await);
        for (id, text) in [("m1", "Fact one"), ("m2", "Fact two"), ("m3", "Fact three")] {
            store.save(&make_memory(id, text)).await.unwrap();
        }

        let got = store
            .get_memories_by_ids(&["m1".to_string(), "m3".to_string()])
            .await
            .unwrap();
        assert_eq!(got.len(), 2);

        assert!(store.get_memories_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_active_embeddings_shape() {
        let store = MemoryStore::new(setup_test_db().await);
        store.save(&make_memory("m1", "Shape check")).await.unwrap();

        let embeddings = store.get_active_embeddings().await.unwrap();
        assert_eq!(embeddings.len(), 1);
        assert_eq!(embeddings[0].0, "m1");
        assert_eq!(embeddings[0].1.len(), 384);
    }
}
