//! Run persistence for apiprobe.
//!
//! The store receives completed [`EvaluationRun`]s from the orchestrator
//! and answers history queries. Backends: in-memory (tests, ephemeral
//! deployments) and SQLite behind the `sqlite` feature.

pub mod backend;

use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::RwLock;

use apiprobe_core::{EvaluationRun, RunSummary};

use crate::backend::{MemoryBackend, RunBackend, RunBackendKind};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root_dir: PathBuf,
    pub backend: RunBackendKind,
}

impl StoreConfig {
    pub fn local_dev<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root = root_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root_dir: root,
            backend: RunBackendKind::default(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            root_dir: PathBuf::new(),
            backend: RunBackendKind::Memory,
        }
    }
}

pub struct Store {
    inner: RwLock<Box<dyn RunBackend + Send + Sync>>,
}

impl Store {
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        let backend: Box<dyn RunBackend + Send + Sync> = match &cfg.backend {
            RunBackendKind::Memory => Box::new(MemoryBackend::default()),
            #[cfg(feature = "sqlite")]
            RunBackendKind::Sqlite { path } => {
                Box::new(backend::SqliteBackend::open(cfg.root_dir.join(path))?)
            }
        };
        Ok(Self {
            inner: RwLock::new(backend),
        })
    }

    pub fn save_run(&self, run: &EvaluationRun) -> Result<()> {
        self.inner.write().save(run)
    }

    pub fn get_run(&self, id: &str) -> Result<Option<EvaluationRun>> {
        self.inner.read().get(id)
    }

    /// Up to `limit` run summaries, newest first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        self.inner.read().recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe_core::EvaluationRun;
    use tempfile::TempDir;

    fn run_with_timestamp(ts: i64) -> EvaluationRun {
        let mut run = EvaluationRun::from_results(vec![]);
        run.timestamp = ts;
        run
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = Store::open(StoreConfig::in_memory()).unwrap();

        let run = EvaluationRun::from_results(vec![]);
        store.save_run(&run).unwrap();

        let got = store.get_run(&run.id).unwrap().unwrap();
        assert_eq!(got.id, run.id);
        assert!(store.get_run("missing").unwrap().is_none());
    }

    #[test]
    fn recent_runs_newest_first_with_limit() {
        let store = Store::open(StoreConfig::in_memory()).unwrap();
        for ts in [100, 300, 200] {
            store.save_run(&run_with_timestamp(ts)).unwrap();
        }

        let recent = store.recent_runs(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, 300);
        assert_eq!(recent[1].timestamp, 200);
    }

    #[test]
    #[cfg(feature = "sqlite")]
    fn sqlite_store_roundtrip() {
        let td = TempDir::new().unwrap();
        let cfg = StoreConfig::local_dev(td.path()).unwrap();
        let store = Store::open(cfg).unwrap();

        let run = EvaluationRun::from_results(vec![]);
        store.save_run(&run).unwrap();
        assert_eq!(store.get_run(&run.id).unwrap().unwrap().id, run.id);
        assert_eq!(store.recent_runs(10).unwrap().len(), 1);
    }
}
