//! Data model: the parsed document, lowered schemas, and run results.

pub mod document;
pub mod result;
pub mod schema;

pub use document::{EndpointDescriptor, ParamLocation, ParameterDescriptor, SpecDocument};
pub use result::{
    EndpointResult, EvaluationRun, RequestSnapshot, ResponseSnapshot, RunSummary, Validation,
};
pub use schema::{AdditionalProperties, CompositionKeyword, NumericBounds, SchemaKind, SchemaNode};
