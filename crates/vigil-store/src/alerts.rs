use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use vigil_shared::{Address, Alert, AlertReason};

use crate::database::Database;
use crate::Result;

impl Database {
    /// Insert an alert, replacing any cached copy with the same id.
    pub fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO alerts
                 (id, recipient, sender, reason, timestamp, latitude, longitude, acknowledged)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                alert.id.to_string(),
                alert.receiver.as_str(),
                alert.sender.as_str(),
                alert.reason.code(),
                alert.timestamp.to_rfc3339(),
                alert.latitude,
                alert.longitude,
                alert.acknowledged as i64,
            ],
        )?;
        Ok(())
    }

    /// Cached inbox for a recipient, newest first.
    pub fn alerts_for_recipient(&self, recipient: &Address) -> Result<Vec<Alert>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender, reason, timestamp, latitude, longitude, acknowledged
             FROM alerts
             WHERE recipient = ?1
             ORDER BY timestamp DESC",
        )?;

        let recipient_addr = recipient.clone();
        let rows = stmt.query_map(params![recipient.as_str()], move |row| {
            row_to_alert(row, recipient_addr.clone())
        })?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }
        Ok(alerts)
    }

    /// Replace the cached inbox wholesale from a remote snapshot.
    pub fn replace_inbox(&mut self, recipient: &Address, alerts: &[Alert]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "DELETE FROM alerts WHERE recipient = ?1",
            params![recipient.as_str()],
        )?;
        for alert in alerts {
            tx.execute(
                "INSERT OR REPLACE INTO alerts
                     (id, recipient, sender, reason, timestamp, latitude, longitude, acknowledged)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    alert.id.to_string(),
                    recipient.as_str(),
                    alert.sender.as_str(),
                    alert.reason.code(),
                    alert.timestamp.to_rfc3339(),
                    alert.latitude,
                    alert.longitude,
                    alert.acknowledged as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn row_to_alert(row: &rusqlite::Row<'_>, receiver: Address) -> rusqlite::Result<Alert> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(1)?;
    let reason_str: String = row.get(2)?;
    let ts_str: String = row.get(3)?;
    let latitude: Option<f64> = row.get(4)?;
    let longitude: Option<f64> = row.get(5)?;
    let acknowledged: bool = row.get::<_, i64>(6)? != 0;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let sender = Address::from_normalized(&sender_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Alert {
        id,
        sender,
        receiver,
        reason: AlertReason::from(reason_str),
        timestamp,
        latitude,
        longitude,
        acknowledged,
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
    fn inbox_round_trip_newest_first() {
        let (_dir, db) = open_db();
        let ana = addr("ana@mail.com");
        let bo = addr("bo@mail.com");

        let mut old = Alert::new(ana.clone(), bo.clone(), AlertReason::Manual);
        old.timestamp = Utc::now() - chrono::Duration::minutes(3);
        let new = Alert::new(ana.clone(), bo.clone(), AlertReason::TimerExpired);

        db.insert_alert(&old).unwrap();
        db.insert_alert(&new).unwrap();

        let inbox = db.alerts_for_recipient(&bo).unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, new.id);
        assert_eq!(inbox[0].reason, AlertReason::TimerExpired);
    }

    #[test]
    fn inboxes_are_isolated_per_recipient() {
        let (_dir, db) = open_db();
        let ana = addr("ana@mail.com");
        let bo = addr("bo@mail.com");
        let cy = addr("cy@mail.com");

        db.insert_alert(&Alert::new(ana.clone(), bo.clone(), AlertReason::Manual))
            .unwrap();

        assert_eq!(db.alerts_for_recipient(&bo).unwrap().len(), 1);
        assert!(db.alerts_for_recipient(&cy).unwrap().is_empty());
    }

    #[test]
    fn replace_inbox_swaps_cached_alerts() {
        let (_dir, mut db) = open_db();
        let ana = addr("ana@mail.com");
        let bo = addr("bo@mail.com");

        db.insert_alert(&Alert::new(ana.clone(), bo.clone(), AlertReason::Manual))
            .unwrap();

        let fresh = vec![Alert::new(ana.clone(), bo.clone(), AlertReason::PhraseDetected)];
        db.replace_inbox(&bo, &fresh).unwrap();

        let inbox = db.alerts_for_recipient(&bo).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].reason, AlertReason::PhraseDetected);
    }
}
