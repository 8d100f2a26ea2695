//! SQLite connection wrapper for a single tenant content database.

use crate::Result;
use rusqlite::Connection;
use std::path::Path;

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens the database at `path`, creating the file and any missing
    /// relations on first use. Tenant files are created lazily here, not when
    /// the registry entry is made.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Closes the underlying connection, surfacing any flush failure.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}
