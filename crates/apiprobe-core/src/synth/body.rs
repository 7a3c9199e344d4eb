//! Request-body synthesis: pick a content type, synthesize from its schema.

use serde_json::Value;

use crate::errors::EngineResult;
use crate::model::EndpointDescriptor;
use crate::synth::value::Synthesizer;

/// Content types tried in priority order before falling back to the first
/// declared one.
const PREFERRED_CONTENT_TYPES: [&str; 5] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
    "application/xml",
];

/// Synthesize a request body, or `None` when the endpoint declares none.
pub fn synthesize_body(
    synth: &mut Synthesizer<'_>,
    endpoint: &EndpointDescriptor,
) -> EngineResult<Option<Value>> {
    let Some(content) = &endpoint.request_body else {
        return Ok(None);
    };

    for preferred in PREFERRED_CONTENT_TYPES {
        let declared = content
            .iter()
            .find(|(ct, schema)| ct == preferred && schema.is_some());
        if let Some((_, Some(schema))) = declared {
            return Ok(Some(synth.synthesize(schema)?));
        }
    }

    // None of the preferred types are declared: fall back to the first
    // declared content type, if it carries a schema.
    match content.first() {
        Some((_, Some(schema))) => Ok(Some(synth.synthesize(schema)?)),
        _ => Ok(None),
    }
}
