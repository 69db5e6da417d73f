use crate::app::ports::StorePort;
use crate::error::{Result, SummaryError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS summary_hash (
        key    TEXT NOT NULL,
        field  TEXT NOT NULL,
        value  TEXT NOT NULL,
        PRIMARY KEY (key, field)
    );
    CREATE TABLE IF NOT EXISTS summary_zset (
        key     TEXT NOT NULL,
        member  TEXT NOT NULL,
        score   REAL NOT NULL,
        PRIMARY KEY (key, member)
    );
    CREATE INDEX IF NOT EXISTS summary_zset_rank
        ON summary_zset (key, score DESC, member);
"#;

/// SQLite-backed store shared by every process pointed at the same file.
///
/// Increments are single upsert statements, so concurrent writers never lose
/// updates.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("Opening summary store at {}", db_path.display());
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SummaryError::Store("sqlite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl StorePort for SqliteStore {
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT value FROM summary_hash WHERE key = ?1 AND field = ?2")?;
        let mut rows = stmt.query(params![key, field])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO summary_hash (key, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(key, field) DO UPDATE SET value=excluded.value",
            params![key, field, value],
        )?;
        Ok(())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<()> {
        self.conn()?.execute(
            "DELETE FROM summary_hash WHERE key = ?1 AND field = ?2",
            params![key, field],
        )?;
        Ok(())
    }

    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> Result<i64> {
        // The conflict branch only fires for canonical integer text; anything
        // else leaves the row untouched and returns no row.
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "INSERT INTO summary_hash (key, field, value) VALUES (?1, ?2, CAST(?3 AS TEXT))
                 ON CONFLICT(key, field) DO UPDATE
                    SET value = CAST(CAST(value AS INTEGER) + ?3 AS TEXT)
                    WHERE CAST(CAST(value AS INTEGER) AS TEXT) = value
                 RETURNING value",
                params![key, field, by],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Err(SummaryError::Store(format!(
                "{}:{} is not an integer",
                key, field
            )));
        };
        raw.parse::<i64>().map_err(|_| {
            SummaryError::Store(format!("{}:{} is not an integer: '{}'", key, field, raw))
        })
    }

    async fn zset_incr(&self, key: &str, member: &str, by: f64) -> Result<f64> {
        let score = self.conn()?.query_row(
            "INSERT INTO summary_zset (key, member, score) VALUES (?1, ?2, ?3)
             ON CONFLICT(key, member) DO UPDATE SET score = score + excluded.score
             RETURNING score",
            params![key, member, by],
            |row| row.get(0),
        )?;
        Ok(score)
    }

    async fn zset_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT score FROM summary_zset WHERE key = ?1 AND member = ?2")?;
        let mut rows = stmt.query(params![key, member])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    async fn zset_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT member, score FROM summary_zset WHERE key = ?1
             ORDER BY score DESC, member ASC",
        )?;
        let rows = stmt
            .query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, f64)>>>()?;
        Ok(rows)
    }

    async fn zset_range_desc(&self, key: &str, limit: Option<usize>) -> Result<Vec<String>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT member FROM summary_zset WHERE key = ?1
             ORDER BY score DESC, member ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![key, limit], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
    }

    async fn zset_clear(&self, key: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM summary_zset WHERE key = ?1", params![key])?;
        Ok(())
    }
}
