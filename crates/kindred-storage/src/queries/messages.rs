// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-log operations.

use std::str::FromStr;

use kindred_core::types::{MessageRecord, Modality};
use kindred_core::KindredError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

const MESSAGE_COLUMNS: &str = "id, session_id, direction, modality, content, metadata, created_at";

fn row_to_message(row: &rusqlite::Row) -> Result<MessageRecord, rusqlite::Error> {
    let modality_str: String = row.get(3)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        direction: row.get(2)?,
        modality: Modality::from_str(&modality_str).unwrap_or(Modality::Text),
        content: row.get(4)?,
        metadata: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a new message envelope.
pub async fn insert_message(db: &Database, msg: &MessageRecord) -> Result<(), KindredError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, direction, modality, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.session_id,
                    msg.direction,
                    msg.modality.to_string(),
                    msg.content,
                    msg.metadata,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the most recent messages for a session in chronological order.
///
/// With a `limit`, returns the NEWEST `limit` messages (the window the
/// context assembler wants), still ordered oldest-first.
pub async fn get_messages_for_session(
    db: &Database,
    session_id: &str,
    limit: Option<i64>,
) -> Result<Vec<MessageRecord>, KindredError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1
                         ORDER BY created_at DESC, rowid DESC LIMIT ?2"
                    ))?;
                    let rows = stmt
                        .query_map(params![session_id, lim], row_to_message)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    let rows = stmt
                        .query_map(params![session_id], row_to_message)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
            };
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::create_session;
    use kindred_core::types::Session;

    async fn setup_db_with_session() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let session = Session {
            id: "sess-1".to_string(),
            channel: "whatsapp".to_string(),
            user_id: Some("15551230001".to_string()),
            state: "active".to_string(),
            metadata: None,
            created_at: "2026-05-01T00:00:00.000Z".to_string(),
            updated_at: "2026-05-01T00:00:00.000Z".to_string(),
        };
        create_session(&db, &session).await.unwrap();
        db
    }

    fn make_msg(id: &str, direction: &str, content: &str, timestamp: &str) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            session_id: "sess-1".to_string(),
            direction: direction.to_string(),
            modality: Modality::Text,
            content: content.to_string(),
            metadata: None,
            created_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_in_chronological_order() {
        let db = setup_db_with_session().await;

        insert_message(&db, &make_msg("m1", "inbound", "hello", "2026-05-01T00:00:01.000Z"))
            .await
            .unwrap();
        insert_message(&db, &make_msg("m2", "outbound", "hey!", "2026-05-01T00:00:02.000Z"))
            .await
            .unwrap();
        insert_message(&db, &make_msg("m3", "inbound", "how are you?", "2026-05-01T00:00:03.000Z"))
            .await
            .unwrap();

        let messages = get_messages_for_session(&db, "sess-1", None).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
        assert_eq!(messages[2].id, "m3");
        assert_eq!(messages[0].direction, "inbound");
        assert_eq!(messages[1].direction, "outbound");
    }

    #[tokio::test]
    async fn limit_keeps_the_newest_window() {
        let db = setup_db_with_session().await;
        for i in 0..5 {
            insert_message(
                &db,
                &make_msg(
                    &format!("m{i}"),
                    "inbound",
                    &format!("msg {i}"),
                    &format!("2026-05-01T00:00:0{i}.000Z"),
                ),
            )
            .await
            .unwrap();
        }

        let messages = get_messages_for_session(&db, "sess-1", Some(3)).await.unwrap();
        assert_eq!(messages.len(), 3);
        // The newest three, oldest-first.
        assert_eq!(messages[0].id, "m2");
        assert_eq!(messages[2].id, "m4");
    }

    #[tokio::test]
    async fn modality_roundtrips() {
        let db = setup_db_with_session().await;
        let mut msg = make_msg("m1", "inbound", "[voice]", "2026-05-01T00:00:01.000Z");
        msg.modality = Modality::Voice;
        insert_message(&db, &msg).await.unwrap();

        let messages = get_messages_for_session(&db, "sess-1", None).await.unwrap();
        assert_eq!(messages[0].modality, Modality::Voice);
    }

    #[tokio::test]
    async fn invalid_direction_is_rejected_by_schema() {
        let db = setup_db_with_session().await;
        let mut msg = make_msg("m1", "sideways", "x", "2026-05-01T00:00:01.000Z");
        msg.direction = "sideways".to_string();
        assert!(insert_message(&db, &msg).await.is_err());
    }

    #[tokio::test]
    async fn empty_session_returns_empty() {
        let db = setup_db_with_session().await;
        let messages = get_messages_for_session(&db, "sess-1", None).await.unwrap();
        assert!(messages.is_empty());
    }
}
