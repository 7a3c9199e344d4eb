use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppConfig>,
    pub store: Arc<apiprobe_store::Store>,
}

impl AppState {
    pub fn new(cfg: AppConfig, store: apiprobe_store::Store) -> Result<Self> {
        Ok(Self {
            cfg: Arc::new(cfg),
            store: Arc::new(store),
        })
    }
}
