use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use apiprobe_core::invoke::InvokeConfig;
use apiprobe_core::{EvalConfig, SynthConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub listen_addr: String,
    pub log_level: String,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    pub store_root: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            cors: CorsConfig::default(),
            telemetry: TelemetryConfig::default(),
            evaluator: EvaluatorConfig::default(),
            store_root: ".apiprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_any_origin: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "TelemetryConfig::default_format")]
    pub format: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: Self::default_format(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    fn default_format() -> String {
        "pretty".to_string()
    }
}

/// Knobs forwarded into the evaluation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluatorConfig {
    #[serde(default = "EvaluatorConfig::default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "EvaluatorConfig::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "EvaluatorConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "EvaluatorConfig::default_backoff_ms")]
    pub backoff_ms: u64,
    /// RNG seed for reproducible runs; omit for entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "EvaluatorConfig::default_optional_probability")]
    pub optional_probability: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            concurrency: Self::default_concurrency(),
            max_retries: Self::default_max_retries(),
            timeout_secs: Self::default_timeout_secs(),
            backoff_ms: Self::default_backoff_ms(),
            seed: None,
            optional_probability: Self::default_optional_probability(),
        }
    }
}

impl EvaluatorConfig {
    fn default_concurrency() -> usize {
        4
    }

    fn default_max_retries() -> u32 {
        3
    }

    fn default_timeout_secs() -> u64 {
        30
    }

    fn default_backoff_ms() -> u64 {
        1000
    }

    fn default_optional_probability() -> f64 {
        0.7
    }

    pub fn to_eval_config(&self) -> EvalConfig {
        EvalConfig {
            concurrency: self.concurrency,
            invoke: InvokeConfig {
                max_retries: self.max_retries,
                backoff_base: Duration::from_millis(self.backoff_ms),
                timeout: Duration::from_secs(self.timeout_secs),
            },
            synth: SynthConfig {
                seed: self.seed,
                optional_probability: self.optional_probability,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub config: Option<String>,
}

impl Args {
    pub fn parse() -> Self {
        let mut config: Option<String> = None;
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--config" => {
                    if let Some(v) = it.next() {
                        config = Some(v);
                    }
                }
                _ => {}
            }
        }
        Self { config }
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        None => Ok(AppConfig::default()),
        Some(p) => {
            let raw = fs::read_to_string(Path::new(p))?;
            let mut cfg: AppConfig =
                serde_json::from_str(&raw).map_err(|e| anyhow!("invalid config json: {e}"))?;
            if cfg.listen_addr.trim().is_empty() {
                cfg.listen_addr = AppConfig::default().listen_addr;
            }
            if cfg.log_level.trim().is_empty() {
                cfg.log_level = AppConfig::default().log_level;
            }
            Ok(cfg)
        }
    }
}
