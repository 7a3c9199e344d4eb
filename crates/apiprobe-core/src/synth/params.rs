//! Parameter extraction: synthesize path/query/header values for an
//! endpoint from its declared parameters.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::errors::EngineResult;
use crate::model::{EndpointDescriptor, ParamLocation};
use crate::synth::value::Synthesizer;

/// Synthesized parameter values routed by location.
#[derive(Debug, Clone, Default)]
pub struct ExtractedParams {
    pub path: BTreeMap<String, Value>,
    pub query: BTreeMap<String, Value>,
    pub header: BTreeMap<String, String>,
}

/// Synthesize a value for each declared parameter and route it.
///
/// Path values are always retained: omission would leave an unresolved
/// template token. Query and header values are dropped when synthesis
/// yields null. Cookie parameters are not wired into the request.
pub fn extract_parameters(
    synth: &mut Synthesizer<'_>,
    endpoint: &EndpointDescriptor,
) -> EngineResult<ExtractedParams> {
    let mut out = ExtractedParams::default();

    for param in &endpoint.parameters {
        let value = synth.synthesize(&param.schema)?;
        match param.location {
            ParamLocation::Path => {
                out.path.insert(param.name.clone(), value);
            }
            ParamLocation::Query => {
                if !value.is_null() {
                    out.query.insert(param.name.clone(), value);
                }
            }
            ParamLocation::Header => {
                if !value.is_null() {
                    out.header.insert(param.name.clone(), stringify(&value));
                }
            }
            ParamLocation::Cookie => {
                debug!(name = %param.name, "cookie parameter not wired into request");
            }
        }
    }

    Ok(out)
}

/// Plain text for strings, compact JSON for everything else.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
