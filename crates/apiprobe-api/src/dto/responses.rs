use serde::{Deserialize, Serialize};

use apiprobe_core::{EndpointResult, EvaluationRun};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub evaluation_id: String,
    pub results: Vec<EndpointResult>,
    pub summary: RunAggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregate {
    pub success_rate: f64,
    pub total_endpoints: usize,
    pub successful_endpoints: usize,
    pub validation_details: ValidationDetails,
}

/// How many endpoints passed each of the two judgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub schema_validation_passed: usize,
    pub status_validation_passed: usize,
}

impl EvaluateResponse {
    pub fn from_run(run: EvaluationRun) -> Self {
        let schema_passed = run
            .results
            .iter()
            .filter(|r| r.validation.schema_valid)
            .count();
        let status_passed = run
            .results
            .iter()
            .filter(|r| r.validation.status_valid)
            .count();

        Self {
            evaluation_id: run.id.clone(),
            summary: RunAggregate {
                success_rate: run.success_rate,
                total_endpoints: run.total_endpoints,
                successful_endpoints: run.successful_endpoints,
                validation_details: ValidationDetails {
                    schema_validation_passed: schema_passed,
                    status_validation_passed: status_passed,
                },
            },
            results: run.results,
        }
    }
}
