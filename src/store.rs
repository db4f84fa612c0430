use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;

pub const DB_FILE: &str = "portal.sqlite3";

/// Synchronous, namespaced key/value byte store backing every repository.
pub trait KvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
    /// Write several keys as one unit: either every entry lands or none does.
    fn set_many(&self, entries: &[(&str, &[u8])]) -> anyhow::Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace).with_context(|| {
            format!(
                "failed to create workspace {}",
                workspace.to_string_lossy()
            )
        })?;
        let db_path = workspace.join(DB_FILE);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv(
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )?;
        // Workspaces created before timestamps were tracked lack updated_at.
        ensure_kv_updated_at(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Make every later write to `key` fail, to exercise partial-write paths.
    #[cfg(test)]
    pub fn reject_writes_to(&self, key: &str) -> anyhow::Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TRIGGER reject_insert_{key} BEFORE INSERT ON kv
               WHEN NEW.key = '{key}' BEGIN SELECT RAISE(ABORT, 'write rejected'); END;
             CREATE TRIGGER reject_update_{key} BEFORE UPDATE ON kv
               WHEN NEW.key = '{key}' BEGIN SELECT RAISE(ABORT, 'write rejected'); END;"
        ))?;
        Ok(())
    }
}

fn upsert_kv(conn: &Connection, key: &str, value: &[u8], updated_at: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv(key, value, updated_at)
         VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (key, value, updated_at),
    )
    .with_context(|| format!("failed to write key {key}"))?;
    Ok(())
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| {
                r.get::<_, Vec<u8>>(0)
            })
            .optional()
            .with_context(|| format!("failed to read key {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        upsert_kv(&self.conn, key, value, &chrono::Utc::now().to_rfc3339())
    }

    fn set_many(&self, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to begin batch write")?;
        for (key, value) in entries {
            upsert_kv(&tx, key, value, &updated_at)?;
        }
        tx.commit().context("failed to commit batch write")?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?", [key])
            .with_context(|| format!("failed to remove key {key}"))?;
        Ok(())
    }
}

fn ensure_kv_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "kv", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE kv ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Process-local store used by unit tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HashMap<String, Vec<u8>> {
        self.entries.borrow().clone()
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_store_round_trips_and_removes() {
        let store = SqliteStore::in_memory().expect("open");
        assert_eq!(store.get("users").expect("get"), None);
        store.set("users", b"[]").expect("set");
        store.set("users", b"[1]").expect("overwrite");
        assert_eq!(store.get("users").expect("get"), Some(b"[1]".to_vec()));
        store.remove("users").expect("remove");
        assert_eq!(store.get("users").expect("get"), None);
        // Removing an absent key is not an error.
        store.remove("users").expect("remove absent");
    }

    #[test]
    fn legacy_kv_table_gains_updated_at() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute(
            "CREATE TABLE kv(key TEXT PRIMARY KEY, value BLOB NOT NULL)",
            [],
        )
        .expect("legacy table");
        let store = SqliteStore::from_connection(conn).expect("migrate");
        assert!(table_has_column(&store.conn, "kv", "updated_at").expect("pragma"));
        store.set("books", b"[]").expect("set after migration");
    }

    #[test]
    fn batch_write_is_all_or_nothing() {
        let store = SqliteStore::in_memory().expect("open");
        store.set("books", b"[1]").expect("set");
        store.reject_writes_to("bookBorrows").expect("trigger");

        let books: &[u8] = b"[0]";
        let loans: &[u8] = b"[2]";
        let res = store.set_many(&[("books", books), ("bookBorrows", loans)]);
        assert!(res.is_err());
        assert_eq!(store.get("books").expect("get"), Some(b"[1]".to_vec()));
        assert_eq!(store.get("bookBorrows").expect("get"), None);

        store
            .set_many(&[("books", books), ("users", loans)])
            .expect("batch");
        assert_eq!(store.get("books").expect("get"), Some(b"[0]".to_vec()));
        assert_eq!(store.get("users").expect("get"), Some(b"[2]".to_vec()));
    }
}
