// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use kindred_core::types::Session;
use kindred_core::KindredError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

fn row_to_session(row: &rusqlite::Row) -> Result<Session, rusqlite::Error> {
    Ok(Session {
        id: row.get(0)?,
        channel: row.get(1)?,
        user_id: row.get(2)?,
        state: row.get(3)?,
        metadata: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const SESSION_COLUMNS: &str = "id, channel, user_id, state, metadata, created_at, updated_at";

/// Create a new session.
pub async fn create_session(db: &Database, session: &Session) -> Result<(), KindredError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, channel, user_id, state, metadata, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id,
                    session.channel,
                    session.user_id,
                    session.state,
                    session.metadata,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, KindredError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Find the session belonging to a (channel, sender) pair.
pub async fn find_session_for_sender(
    db: &Database,
    channel: &str,
    user_id: &str,
) -> Result<Option<Session>, KindredError> {
    let channel = channel.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE channel = ?1 AND user_id = ?2 AND state = 'active'
                 ORDER BY created_at DESC LIMIT 1"
            ))?;
            match stmt.query_row(params![channel, user_id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List sessions, optionally filtered by state.
pub async fn list_sessions(
    db: &Database,
    state: Option<&str>,
) -> Result<Vec<Session>, KindredError> {
    let state = state.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let (sql, filter) = match &state {
                Some(s) => (
                    format!(
                        "SELECT {SESSION_COLUMNS} FROM sessions WHERE state = ?1 ORDER BY created_at DESC"
                    ),
                    Some(s.clone()),
                ),
                None => (
                    format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at DESC"),
                    None,
                ),
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = match filter {
                Some(f) => stmt.query_map(params![f], row_to_session)?.collect::<Result<Vec<_>, _>>()?,
                None => stmt.query_map([], row_to_session)?.collect::<Result<Vec<_>, _>>()?,
            };
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Update a session's state and updated_at timestamp.
pub async fn update_session_state(
    db: &Database,
    id: &str,
    state: &str,
) -> Result<(), KindredError> {
    let id = id.to_string();
    let state = state.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET state = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![state, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn make_session(id: &str, channel: &str, user: &str) -> Session {
        Session {
            id: id.to_string(),
            channel: channel.to_string(),
            user_id: Some(user.to_string()),
            state: "active".to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:00.000Z".to_string(),
            updated_at: "2026-05-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrips() {
        let db = setup_db().await;
        let session = make_session("s1", "whatsapp", "15551230001");

        create_session(&db, &session).await.unwrap();
        let got = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(got.id, "s1");
        assert_eq!(got.channel, "whatsapp");
        assert_eq!(got.user_id.as_deref(), Some("15551230001"));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let db = setup_db().await;
        assert!(get_session(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_session_for_sender_matches_channel_and_user() {
        let db = setup_db().await;
        create_session(&db, &make_session("s1", "whatsapp", "15551230001"))
            .await
            .unwrap();
        create_session(&db, &make_session("s2", "api", "15551230001"))
            .await
            .unwrap();

        let found = find_session_for_sender(&db, "whatsapp", "15551230001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "s1");

        let missing = find_session_for_sender(&db, "whatsapp", "15559999999")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_session_skips_closed() {
        let db = setup_db().await;
        create_session(&db, &make_session("s1", "whatsapp", "15551230001"))
            .await
            .unwrap();
        update_session_state(&db, "s1", "closed").await.unwrap();

        let found = find_session_for_sender(&db, "whatsapp", "15551230001")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn list_sessions_filters_by_state() {
        let db = setup_db().await;
        create_session(&db, &make_session("s1", "whatsapp", "u1"))
            .await
            .unwrap();
        create_session(&db, &make_session("s2", "whatsapp", "u2"))
            .await
            .unwrap();
        update_session_state(&db, "s2", "closed").await.unwrap();

        assert_eq!(list_sessions(&db, None).await.unwrap().len(), 2);
        let active = list_sessions(&db, Some("active")).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "s1");
    }
}
