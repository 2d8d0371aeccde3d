use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{Asset, Sample, SampleStore, TIMESTAMP_FORMAT};

/// SQLite-backed sample store: one table per [`Asset`].
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create db dir: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Opened sample store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sample store mutex poisoned"))
    }

    /// Names of the asset tables currently present.
    pub fn tables(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name LIKE '%\\_data' ESCAPE '\\' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

impl SampleStore for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for asset in Asset::ALL {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL UNIQUE,
                    price REAL,
                    market_cap REAL,
                    volume REAL
                )",
                asset.table()
            ))
            .with_context(|| format!("Failed to create table {}", asset.table()))?;
        }
        Ok(())
    }

    fn insert_samples(&self, asset: Asset, samples: &[Sample]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {} (timestamp, price, market_cap, volume) \
                 VALUES (?1, ?2, ?3, ?4)",
                asset.table()
            ))?;
            for s in samples {
                inserted += stmt.execute(params![s.timestamp, s.price, s.market_cap, s.volume])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn dedupe(&self, asset: Asset) -> Result<usize> {
        let conn = self.lock()?;
        let table = asset.table();
        let removed = conn
            .execute(
                &format!(
                    "DELETE FROM {table} WHERE rowid NOT IN \
                     (SELECT MAX(rowid) FROM {table} GROUP BY timestamp)"
                ),
                [],
            )
            .with_context(|| format!("Failed to dedupe {table}"))?;
        Ok(removed)
    }

    fn query_since(&self, asset: Asset, since: NaiveDateTime) -> Result<Vec<Sample>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT timestamp, price, market_cap, volume FROM {} \
             WHERE timestamp >= ?1 ORDER BY timestamp",
            asset.table()
        ))?;
        let since = since.format(TIMESTAMP_FORMAT).to_string();
        let rows = stmt
            .query_map([since], |row| {
                Ok(Sample {
                    timestamp: row.get(0)?,
                    price: row.get(1)?,
                    market_cap: row.get(2)?,
                    volume: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn count(&self, asset: Asset) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", asset.table()), [], |r| {
            r.get(0)
        })?;
        Ok(n as usize)
    }
}
