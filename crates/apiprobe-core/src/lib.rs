//! apiprobe-core: schema-driven synthetic-data generation and endpoint
//! evaluation for OpenAPI (2.0 / 3.0.x) described REST APIs.
//!
//! For every declared GET/POST endpoint the engine synthesizes plausible
//! request data from the endpoint's schema, invokes the live target, and
//! judges success from HTTP status plus optional response-schema
//! conformance.

pub mod errors;
pub mod invoke;
pub mod model;
pub mod resolve;
pub mod run;
pub mod synth;
pub mod validate;

pub use errors::{EngineError, EngineResult};
pub use model::{EndpointResult, EvaluationRun, RunSummary, SpecDocument};
pub use run::events::{EvalEvent, EventSink, NullSink, TracingSink};
pub use run::{EvalConfig, Evaluator, SpecSource};
pub use synth::SynthConfig;
