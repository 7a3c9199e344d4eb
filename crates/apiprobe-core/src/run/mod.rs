//! The evaluation orchestrator.
//!
//! `evaluate` checks its preconditions (parseable document, a server URL,
//! at least one path) before any endpoint is touched; a violation aborts
//! the run with a structured error. Endpoints then fan out through a
//! bounded worker pool; any error raised while processing one endpoint is
//! captured into that endpoint's result and never aborts the run. Final
//! results are re-ordered to spec-declaration order regardless of
//! completion order.

pub mod events;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};
use crate::invoke::{build_url, request_headers, InvokeConfig, Invoker};
use crate::model::{
    EndpointDescriptor, EndpointResult, EvaluationRun, RequestSnapshot, SpecDocument, Validation,
};
use crate::synth::{extract_parameters, synthesize_body, SynthConfig, Synthesizer};
use crate::validate::Validator;

use events::{EvalEvent, EventSink, NullSink};

/// Bounded preflight timeout for the spec URL reachability check.
const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the specification comes from.
#[derive(Debug, Clone)]
pub enum SpecSource {
    /// Fetch and parse from a URL, with a preflight reachability check.
    Url(String),
    /// An already-parsed document.
    Inline(Value),
}

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Upper bound on endpoints evaluated at once.
    pub concurrency: usize,
    pub invoke: InvokeConfig,
    pub synth: SynthConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            invoke: InvokeConfig::default(),
            synth: SynthConfig::default(),
        }
    }
}

pub struct Evaluator {
    cfg: EvalConfig,
    invoker: Invoker,
    sink: Arc<dyn EventSink>,
}

impl Evaluator {
    pub fn new(cfg: EvalConfig) -> EngineResult<Self> {
        let invoker = Invoker::new(cfg.invoke.clone())?;
        Ok(Self {
            cfg,
            invoker,
            sink: Arc::new(NullSink),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Evaluate every GET/POST endpoint the spec declares and aggregate a
    /// run. Spec-level failures surface as errors; endpoint-level failures
    /// are recorded inside the run.
    pub async fn evaluate(&self, source: SpecSource) -> EngineResult<EvaluationRun> {
        let raw = self.load_spec(source).await?;
        let doc = SpecDocument::from_value(raw)?;

        self.sink.on_event(&EvalEvent::RunStarted {
            total_endpoints: doc.endpoints.len(),
        });

        let mut indexed: Vec<(usize, EndpointResult)> =
            stream::iter(doc.endpoints.clone().into_iter().enumerate())
                .map(|(index, endpoint)| {
                    let doc = &doc;
                    async move { (index, self.evaluate_endpoint(doc, &endpoint).await) }
                })
                .buffer_unordered(self.cfg.concurrency.max(1))
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);

        let results = indexed.into_iter().map(|(_, result)| result).collect();
        let run = EvaluationRun::from_results(results);

        self.sink.on_event(&EvalEvent::RunFinished {
            success_rate: run.success_rate,
            successful_endpoints: run.successful_endpoints,
            total_endpoints: run.total_endpoints,
        });

        Ok(run)
    }

    async fn load_spec(&self, source: SpecSource) -> EngineResult<Value> {
        match source {
            SpecSource::Inline(value) => Ok(value),
            SpecSource::Url(url) => {
                // Fail fast on an unreachable source before paying parse
                // cost. Any received response counts as reachable.
                self.invoker
                    .client()
                    .head(&url)
                    .timeout(PREFLIGHT_TIMEOUT)
                    .send()
                    .await
                    .map_err(|e| EngineError::spec_unreachable(e.to_string()))?;

                let response = self
                    .invoker
                    .client()
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| EngineError::spec_unreachable(e.to_string()))?;
                let text = response
                    .text()
                    .await
                    .map_err(|e| EngineError::spec_unreachable(e.to_string()))?;
                serde_json::from_str(&text).map_err(|e| EngineError::spec_parse(e.to_string()))
            }
        }
    }

    async fn evaluate_endpoint(
        &self,
        doc: &SpecDocument,
        endpoint: &EndpointDescriptor,
    ) -> EndpointResult {
        self.sink.on_event(&EvalEvent::EndpointStarted {
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
        });

        let result = match self.try_endpoint(doc, endpoint).await {
            Ok(result) => result,
            Err(err) => {
                debug!(method = %endpoint.method, path = %endpoint.path, error = %err, "endpoint failed");
                EndpointResult::failure(endpoint, err.to_string())
            }
        };

        self.sink.on_event(&EvalEvent::EndpointFinished {
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            success: result.success,
            status: result.response.as_ref().map(|r| r.status),
        });

        result
    }

    async fn try_endpoint(
        &self,
        doc: &SpecDocument,
        endpoint: &EndpointDescriptor,
    ) -> EngineResult<EndpointResult> {
        // Each endpoint gets its own synthesizer so there is no shared
        // mutable state across the fan-out.
        let mut synth = Synthesizer::new(doc, self.cfg.synth.clone());
        let params = extract_parameters(&mut synth, endpoint)?;
        let body = synthesize_body(&mut synth, endpoint)?;

        let url = build_url(&doc.base_url, &endpoint.path, &params)?;
        let headers = request_headers(endpoint, &params);

        let response = self
            .invoker
            .invoke(&endpoint.method, url.clone(), &headers, body.as_ref())
            .await?;

        let success_schema = endpoint.success_schema();
        let schema_valid = match success_schema {
            Some(schema) => Validator::new(doc).validate(&response.body, schema),
            None => false,
        };
        let status_valid = (200..300).contains(&response.status);
        let success = status_valid && (schema_valid || success_schema.is_none());

        Ok(EndpointResult {
            path: endpoint.path.clone(),
            method: endpoint.method.clone(),
            request: Some(RequestSnapshot {
                url: url.to_string(),
                method: endpoint.method.clone(),
                headers,
                body,
            }),
            response: Some(response),
            error: None,
            success,
            validation: Validation {
                schema_valid,
                status_valid,
            },
        })
    }
}
