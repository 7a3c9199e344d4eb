//! Evaluation results: per-endpoint outcomes and the aggregated run.
//!
//! A run is created once per evaluate call and is immutable after creation;
//! the orchestrator owns it until it is handed to persistence. Field names
//! serialize in camelCase to match the wire format consumed by clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::document::EndpointDescriptor;

/// Snapshot of the request exactly as it was sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Snapshot of the response as received, any status accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// The two judgements feeding the success flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub schema_valid: bool,
    pub status_valid: bool,
}

/// Outcome of evaluating one (path, method) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResult {
    pub path: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
    pub validation: Validation,
}

impl EndpointResult {
    /// A terminal per-endpoint failure: the error is captured, the run
    /// continues with the next endpoint.
    pub fn failure(endpoint: &EndpointDescriptor, error: String) -> Self {
        Self {
            path: endpoint.path.clone(),
            method: endpoint.method.clone(),
            request: None,
            response: None,
            error: Some(error),
            success: false,
            validation: Validation {
                schema_valid: false,
                status_valid: false,
            },
        }
    }
}

/// One completed evaluate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRun {
    pub id: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub results: Vec<EndpointResult>,
    /// `100 * successful / total` when total > 0, else 0.
    pub success_rate: f64,
    pub total_endpoints: usize,
    pub successful_endpoints: usize,
}

impl EvaluationRun {
    pub fn from_results(results: Vec<EndpointResult>) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let success_rate = if total > 0 {
            100.0 * successful as f64 / total as f64
        } else {
            0.0
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
            results,
            success_rate,
            total_endpoints: total,
            successful_endpoints: successful,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id.clone(),
            timestamp: self.timestamp,
            success_rate: self.success_rate,
            total_endpoints: self.total_endpoints,
            successful_endpoints: self.successful_endpoints,
        }
    }
}

/// Listing view of a run, returned by history queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: String,
    pub timestamp: i64,
    pub success_rate: f64,
    pub total_endpoints: usize,
    pub successful_endpoints: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool) -> EndpointResult {
        EndpointResult {
            path: "/x".to_string(),
            method: "GET".to_string(),
            request: None,
            response: None,
            error: None,
            success,
            validation: Validation {
                schema_valid: false,
                status_valid: success,
            },
        }
    }

    #[test]
    fn success_rate_is_percentage() {
        let run = EvaluationRun::from_results(vec![result(true), result(false), result(true), result(true)]);
        assert_eq!(run.total_endpoints, 4);
        assert_eq!(run.successful_endpoints, 3);
        assert_eq!(run.success_rate, 75.0);
        assert!((0.0..=100.0).contains(&run.success_rate));
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let run = EvaluationRun::from_results(vec![]);
        assert_eq!(run.success_rate, 0.0);
        assert_eq!(run.total_endpoints, 0);
    }

    #[test]
    fn serializes_camel_case() {
        let run = EvaluationRun::from_results(vec![result(true)]);
        let v = serde_json::to_value(&run).unwrap();
        assert!(v.get("successRate").is_some());
        assert!(v.get("totalEndpoints").is_some());
        assert!(v["results"][0].get("validation").is_some());
    }
}
