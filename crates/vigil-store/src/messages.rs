use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use vigil_shared::{Address, Message, PairKey};

use crate::database::Database;
use crate::Result;

impl Database {
    /// Insert a message, replacing any cached copy with the same id.
    /// Record-id equality is the dedup key across stores.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO messages
                 (id, pair_key, sender, receiver, text, timestamp, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                message.id.to_string(),
                message.pair_key().as_str(),
                message.sender.as_str(),
                message.receiver.as_str(),
                message.text,
                message.timestamp.to_rfc3339(),
                message.latitude,
                message.longitude,
            ],
        )?;
        Ok(())
    }

    /// Cached conversation history, oldest first.
    pub fn messages_for_pair(&self, pair: &PairKey) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender, receiver, text, timestamp, latitude, longitude
             FROM messages
             WHERE pair_key = ?1
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt.query_map(params![pair.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Replace the cached conversation wholesale from a remote snapshot.
    pub fn replace_conversation(&mut self, pair: &PairKey, messages: &[Message]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "DELETE FROM messages WHERE pair_key = ?1",
            params![pair.as_str()],
        )?;
        for message in messages {
            tx.execute(
                "INSERT OR REPLACE INTO messages
                     (id, pair_key, sender, receiver, text, timestamp, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.id.to_string(),
                    pair.as_str(),
                    message.sender.as_str(),
                    message.receiver.as_str(),
                    message.text,
                    message.timestamp.to_rfc3339(),
                    message.latitude,
                    message.longitude,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop every cached message of the pair. Irreversible.
    pub fn delete_conversation(&self, pair: &PairKey) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE pair_key = ?1",
            params![pair.as_str()],
        )?;
        Ok(affected)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(1)?;
    let receiver_str: String = row.get(2)?;
    let text: String = row.get(3)?;
    let ts_str: String = row.get(4)?;
    let latitude: Option<f64> = row.get(5)?;
    let longitude: Option<f64> = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let sender = Address::from_normalized(&sender_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let receiver = Address::from_normalized(&receiver_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id,
        sender,
        receiver,
        text,
        timestamp,
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn conversation_is_sorted_by_timestamp_ascending() {
        let (_dir, db) = open_db();
        let ana = addr("ana@mail.com");
        let bo = addr("bo@mail.com");
        let pair = PairKey::new(&ana, &bo);

        let base = Utc::now();
        // Inserted out of order: 3, 1, 2.
        for offset in [3, 1, 2] {
            let mut m = Message::new(ana.clone(), bo.clone(), &format!("m{offset}"));
            m.timestamp = base + chrono::Duration::seconds(offset);
            db.insert_message(&m).unwrap();
        }

        let texts: Vec<String> = db
            .messages_for_pair(&pair)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn reinserting_same_id_does_not_duplicate() {
        let (_dir, db) = open_db();
        let m = Message::new(addr("a@x.com"), addr("b@x.com"), "hi");

        db.insert_message(&m).unwrap();
        db.insert_message(&m).unwrap();

        assert_eq!(db.messages_for_pair(&m.pair_key()).unwrap().len(), 1);
    }

    #[test]
    fn replace_conversation_swaps_cached_history() {
        let (_dir, mut db) = open_db();
        let ana = addr("ana@mail.com");
        let bo = addr("bo@mail.com");
        let pair = PairKey::new(&ana, &bo);

        db.insert_message(&Message::new(ana.clone(), bo.clone(), "stale"))
            .unwrap();

        let fresh = vec![
            Message::new(ana.clone(), bo.clone(), "one"),
            Message::new(bo.clone(), ana.clone(), "two"),
        ];
        db.replace_conversation(&pair, &fresh).unwrap();

        let cached = db.messages_for_pair(&pair).unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|m| m.text != "stale"));
    }

    #[test]
    fn delete_conversation_empties_the_pair() {
        let (_dir, db) = open_db();
        let m = Message::new(addr("a@x.com"), addr("b@x.com"), "bye");
        let pair = m.pair_key();

        db.insert_message(&m).unwrap();
        assert_eq!(db.delete_conversation(&pair).unwrap(), 1);
        assert!(db.messages_for_pair(&pair).unwrap().is_empty());
    }
}
