use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use vigil_shared::{Address, User};

use crate::database::Database;
use crate::{Result, StoreError};

impl Database {
    /// Insert or replace a user record. Last local write wins.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let guardians = serde_json::to_string(&user.guardians)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO users (address, id, name, secret, danger_phrase, guardians)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.address.as_str(),
                user.id.to_string(),
                user.name,
                user.secret,
                user.danger_phrase,
                guardians,
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, address: &Address) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT address, id, name, secret, danger_phrase, guardians
                 FROM users WHERE address = ?1",
                params![address.as_str()],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    pub fn user_exists(&self, address: &Address) -> Result<bool> {
        Ok(self.get_user(address)?.is_some())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT address, id, name, secret, danger_phrase, guardians
             FROM users ORDER BY address ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let address_str: String = row.get(0)?;
    let id_str: String = row.get(1)?;
    let name: String = row.get(2)?;
    let secret: String = row.get(3)?;
    let danger_phrase: String = row.get(4)?;
    let guardians_json: String = row.get(5)?;

    let address = Address::from_normalized(&address_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let guardians: Vec<Address> = serde_json::from_str(&guardians_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id,
        address,
        name,
        secret,
        danger_phrase,
        guardians,
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

    #[test]
    fn upsert_and_read_back() {
        let (_dir, db) = open_db();
        let mut user = User::new("Ana", Address::parse("ana@mail.com").unwrap(), "s3cret");
        user.guardians.push(Address::parse("bo@mail.com").unwrap());

        db.upsert_user(&user).unwrap();
        let loaded = db.get_user(&user.address).unwrap().unwrap();
        assert_eq!(loaded, user);
    }

    #[test]
    fn replace_overwrites_whole_record() {
        let (_dir, db) = open_db();
        let mut user = User::new("Ana", Address::parse("ana@mail.com").unwrap(), "s3cret");
        db.upsert_user(&user).unwrap();

        user.danger_phrase = "code red".to_string();
        db.upsert_user(&user).unwrap();

        let loaded = db.get_user(&user.address).unwrap().unwrap();
        assert_eq!(loaded.danger_phrase, "code red");
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn missing_user_is_none() {
        let (_dir, db) = open_db();
        let addr = Address::parse("ghost@mail.com").unwrap();
        assert!(db.get_user(&addr).unwrap().is_none());
        assert!(!db.user_exists(&addr).unwrap());
    }
}
