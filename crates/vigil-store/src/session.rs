//! Single-slot session pointer.
//!
//! The signed-in account is recorded as an address referencing the
//! `users` shadow, so the session survives restarts and works offline.

use rusqlite::{params, OptionalExtension};

use vigil_shared::{Address, User};

use crate::database::Database;
use crate::{Result, StoreError};

impl Database {
    /// Point the session slot at the given address.
    pub fn set_session(&self, address: &Address) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO session (id, address) VALUES (1, ?1)",
            params![address.as_str()],
        )?;
        Ok(())
    }

    /// Address of the signed-in account, if any.
    pub fn session_address(&self) -> Result<Option<Address>> {
        let addr: Option<String> = self
            .conn()
            .query_row("SELECT address FROM session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match addr {
            None => Ok(None),
            Some(s) => Address::from_normalized(&s)
                .map(Some)
                .map_err(|_| StoreError::NotFound),
        }
    }

    /// Full user record of the signed-in account, if any.
    pub fn session_user(&self) -> Result<Option<User>> {
        match self.session_address()? {
            None => Ok(None),
            Some(addr) => self.get_user(&addr),
        }
    }

    /// Clear the session slot. Idempotent.
    pub fn clear_session(&self) -> Result<()> {
        self.conn().execute("DELETE FROM session WHERE id = 1", [])?;
        Ok(())
    }
}
