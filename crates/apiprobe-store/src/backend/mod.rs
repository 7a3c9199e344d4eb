//! Run storage backends.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

use anyhow::Result;

use apiprobe_core::{EvaluationRun, RunSummary};

pub use memory::MemoryBackend;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

/// Which backend a store opens.
#[derive(Debug, Clone)]
pub enum RunBackendKind {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite { path: String },
}

impl Default for RunBackendKind {
    fn default() -> Self {
        #[cfg(feature = "sqlite")]
        {
            return RunBackendKind::Sqlite {
                path: "runs.sqlite3".to_string(),
            };
        }
        #[cfg(not(feature = "sqlite"))]
        {
            RunBackendKind::Memory
        }
    }
}

/// Persistence contract for completed evaluation runs.
pub trait RunBackend {
    /// Persist a run; saving the same id again replaces it.
    fn save(&mut self, run: &EvaluationRun) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<EvaluationRun>>;
    /// Up to `limit` summaries, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<RunSummary>>;
}
