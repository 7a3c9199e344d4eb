//! In-memory run backend.

use std::collections::BTreeMap;

use anyhow::Result;

use apiprobe_core::{EvaluationRun, RunSummary};

use super::RunBackend;

#[derive(Default)]
pub struct MemoryBackend {
    runs: BTreeMap<String, EvaluationRun>,
}

impl RunBackend for MemoryBackend {
    fn save(&mut self, run: &EvaluationRun) -> Result<()> {
        self.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<EvaluationRun>> {
        Ok(self.runs.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let mut summaries: Vec<RunSummary> = self.runs.values().map(|r| r.summary()).collect();
        // Newest first; id breaks timestamp ties deterministically.
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        summaries.truncate(limit);
        Ok(summaries)
    }
}
