//! SQLite run backend.

#![cfg(feature = "sqlite")]

use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use apiprobe_core::{EvaluationRun, RunSummary};

use super::RunBackend;

const MIG_0001: &str = include_str!("migrations/0001_init.sql");

pub struct SqliteBackend {
    #[allow(dead_code)]
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let this = Self {
            path,
            conn: Mutex::new(conn),
        };
        this.migrate()?;
        Ok(this)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(MIG_0001)?;
        let v: i64 = conn.query_row("PRAGMA user_version;", [], |r| r.get(0))?;
        if v < 1 {
            conn.execute_batch("PRAGMA user_version = 1;")?;
        }
        Ok(())
    }
}

impl RunBackend for SqliteBackend {
    fn save(&mut self, run: &EvaluationRun) -> Result<()> {
        let body = serde_json::to_string(run)?;
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO runs(id, created_at, success_rate, total_endpoints, successful_endpoints, body)
               VALUES(?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET
                   created_at = excluded.created_at,
                   success_rate = excluded.success_rate,
                   total_endpoints = excluded.total_endpoints,
                   successful_endpoints = excluded.successful_endpoints,
                   body = excluded.body"#,
            params![
                run.id,
                run.timestamp,
                run.success_rate,
                run.total_endpoints as i64,
                run.successful_endpoints as i64,
                body
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<EvaluationRun>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT body FROM runs WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&body)?))
        } else {
            Ok(None)
        }
    }

    fn recent(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT id, created_at, success_rate, total_endpoints, successful_endpoints
               FROM runs
               ORDER BY created_at DESC, id ASC
               LIMIT ?1"#,
        )?;
        let rows = stmt.query_map(params![limit as i64], |r| {
            Ok(RunSummary {
                id: r.get(0)?,
                timestamp: r.get(1)?,
                success_rate: r.get(2)?,
                total_endpoints: r.get::<_, i64>(3)? as usize,
                successful_endpoints: r.get::<_, i64>(4)? as usize,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
