use std::path::Path;

use rusqlite::{Connection, params};
use uuid::Uuid;

use vigil_core::{MemoryBackend, MemoryEntry, VigilError};

use crate::error::{Result, StoreError};
use crate::schema;

/// One SQLite database holding one memory log.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Entries ---

    /// All entries, oldest first.
    pub fn load_entries(&self) -> Result<Vec<MemoryEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, timestamp, text, score FROM memory_entries ORDER BY seq")?;

        let rows: Vec<(String, String, String, f64)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(id, timestamp, text, score)| {
                Ok(MemoryEntry {
                    id: parse_uuid(&id)?,
                    timestamp,
                    text,
                    score,
                })
            })
            .collect()
    }

    /// Replace the stored log with `entries` in one transaction.
    pub fn replace_entries(&self, entries: &[MemoryEntry]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM memory_entries", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO memory_entries (id, seq, timestamp, text, score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, entry) in entries.iter().enumerate() {
                stmt.execute(params![
                    entry.id.to_string(),
                    seq as i64,
                    entry.timestamp,
                    entry.text,
                    entry.score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn entry_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM memory_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl MemoryBackend for Store {
    fn load(&self) -> vigil_core::Result<Vec<MemoryEntry>> {
        self.load_entries().map_err(VigilError::from)
    }

    fn save(&self, entries: &[MemoryEntry]) -> vigil_core::Result<()> {
        self.replace_entries(entries).map_err(VigilError::from)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}
