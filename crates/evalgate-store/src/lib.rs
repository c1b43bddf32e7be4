//! SQLite-backed run tracking: runs, params, metrics and artifact paths,
//! one row per logged value. The store holds at most one open run at a time;
//! the orchestrator opens and closes runs explicitly.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use evalgate_types::AggregateMetrics;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    current_run: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntity {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SqliteStore {
    /// Open a store at the given path (e.g. "evalgate.db"), creating the
    /// schema on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn, current_run: None };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                ended_at TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS params (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                value REAL NOT NULL,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS artifacts (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                path TEXT NOT NULL,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Open a new run and make it current.
    pub fn create_run(&mut self, name: &str) -> Result<i64> {
        if self.current_run.is_some() {
            bail!("a run is already open");
        }
        self.conn.execute(
            "INSERT INTO runs (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        self.current_run = Some(id);
        Ok(id)
    }

    pub fn log_param(&mut self, key: &str, value: &str) -> Result<()> {
        let run_id = self.active_run()?;
        self.conn.execute(
            "INSERT INTO params (run_id, key, value) VALUES (?1, ?2, ?3)",
            params![run_id, key, value],
        )?;
        Ok(())
    }

    pub fn log_metric(&mut self, name: &str, value: f64) -> Result<()> {
        let run_id = self.active_run()?;
        self.conn.execute(
            "INSERT INTO metrics (run_id, name, value) VALUES (?1, ?2, ?3)",
            params![run_id, name, value],
        )?;
        Ok(())
    }

    pub fn log_artifact_path(&mut self, path: &str) -> Result<()> {
        let run_id = self.active_run()?;
        self.conn.execute(
            "INSERT INTO artifacts (run_id, path) VALUES (?1, ?2)",
            params![run_id, path],
        )?;
        Ok(())
    }

    /// Close the current run, stamping its end time.
    pub fn finish_run(&mut self) -> Result<()> {
        let run_id = self.active_run()?;
        self.conn.execute(
            "UPDATE runs SET ended_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), run_id],
        )?;
        self.current_run = None;
        Ok(())
    }

    fn active_run(&self) -> Result<i64> {
        self.current_run.ok_or_else(|| anyhow::anyhow!("no open run"))
    }

    pub fn list_runs(&self) -> Result<Vec<RunEntity>> {
        let mut stmt =
            self.conn.prepare("SELECT id, name, created_at, ended_at FROM runs ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (id, name, created_at, ended_at) = row?;
            runs.push(RunEntity {
                id,
                name,
                created_at: created_at.parse()?,
                ended_at: ended_at.map(|t| t.parse()).transpose()?,
            });
        }
        Ok(runs)
    }

    pub fn run_metrics(&self, run_id: i64) -> Result<AggregateMetrics> {
        let mut stmt = self.conn.prepare("SELECT name, value FROM metrics WHERE run_id = ?1")?;
        let rows =
            stmt.query_map([run_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;
        let mut metrics = AggregateMetrics::new();
        for row in rows {
            let (name, value) = row?;
            metrics.insert(name, value);
        }
        Ok(metrics)
    }

    pub fn run_params(&self, run_id: i64) -> Result<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM params WHERE run_id = ?1")?;
        let rows = stmt
            .query_map([run_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut params = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            params.insert(key, value);
        }
        Ok(params)
    }

    pub fn run_artifacts(&self, run_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT path FROM artifacts WHERE run_id = ?1")?;
        let rows = stmt.query_map([run_id], |row| row.get::<_, String>(0))?;
        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }
}
