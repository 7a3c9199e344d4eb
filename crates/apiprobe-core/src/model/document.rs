//! Parsed OpenAPI document and the endpoint descriptors lowered from it.
//!
//! The raw JSON is kept alongside the lowered view so `$ref` pointers that
//! fall outside `definitions`/`components.schemas` can still be walked.
//! Declaration order of paths, methods, parameters and content types is
//! preserved throughout.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};
use crate::model::schema::SchemaNode;

/// Only these methods are evaluated; anything else declared on a path is
/// skipped entirely and never appears in a run.
const EVALUATED_METHODS: [&str; 2] = ["get", "post"];

/// Where a declared parameter is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// One declared parameter of an endpoint.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParamLocation,
    /// Lowered from `parameter.schema` when present, else from the
    /// parameter object itself (legacy inline-constraint style).
    pub schema: SchemaNode,
}

/// One (path, method) pair drawn from the spec, in declaration order.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Upper-cased method, `GET` or `POST`.
    pub method: String,
    /// Path template; may contain `{name}` placeholders.
    pub path: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared request-body content types in declaration order. A content
    /// type without a schema is kept so fallback selection still sees it.
    pub request_body: Option<Vec<(String, Option<SchemaNode>)>>,
    /// status code -> content type -> schema.
    pub responses: BTreeMap<String, BTreeMap<String, SchemaNode>>,
    /// Names drawn from the operation's security requirements.
    pub security: Vec<String>,
}

impl EndpointDescriptor {
    /// The schema success is judged against: the `200` response's
    /// `application/json` schema. Other status codes are never consulted.
    pub fn success_schema(&self) -> Option<&SchemaNode> {
        self.responses.get("200").and_then(|by_ct| by_ct.get("application/json"))
    }
}

/// A parsed specification plus the endpoint list lowered from it.
#[derive(Debug)]
pub struct SpecDocument {
    raw: Value,
    pub base_url: String,
    pub endpoints: Vec<EndpointDescriptor>,
}

impl SpecDocument {
    /// Lower a parsed document. Fails with a structure error before any
    /// endpoint is touched when the server URL or paths are missing.
    pub fn from_value(raw: Value) -> EngineResult<Self> {
        if !raw.is_object() {
            return Err(EngineError::spec_parse("document is not a JSON object"));
        }

        let base_url = base_url(&raw).ok_or_else(|| {
            EngineError::spec_structure("specification must include at least one server URL")
        })?;

        let paths = raw
            .get("paths")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                EngineError::spec_structure("specification must include at least one path")
            })?;

        let mut endpoints = Vec::new();
        for (path, item) in paths {
            let Some(methods) = item.as_object() else {
                continue;
            };
            for (method, operation) in methods {
                let lower = method.to_ascii_lowercase();
                if !EVALUATED_METHODS.contains(&lower.as_str()) {
                    continue;
                }
                endpoints.push(lower_operation(path, &lower.to_ascii_uppercase(), operation));
            }
        }

        debug!(paths = paths.len(), endpoints = endpoints.len(), "lowered specification");

        Ok(Self {
            raw,
            base_url,
            endpoints,
        })
    }

    /// The raw document, for generic `#/...` pointer walks.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Base server URL: `servers[0].url` for 3.0.x documents, or
/// `schemes[0]://host + basePath` for legacy 2.0 documents.
fn base_url(raw: &Value) -> Option<String> {
    if let Some(url) = raw
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(|s| s.get("url"))
        .and_then(Value::as_str)
    {
        return Some(url.to_string());
    }

    let host = raw.get("host").and_then(Value::as_str)?;
    let base_path = raw.get("basePath").and_then(Value::as_str)?;
    let scheme = raw
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)?;
    Some(format!("{scheme}://{host}{base_path}"))
}

fn lower_operation(path: &str, method: &str, operation: &Value) -> EndpointDescriptor {
    let parameters = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| params.iter().filter_map(lower_parameter).collect())
        .unwrap_or_default();

    let mut request_body = operation
        .get("requestBody")
        .and_then(|rb| rb.get("content"))
        .and_then(Value::as_object)
        .map(|content| {
            content
                .iter()
                .map(|(ct, media)| {
                    let schema = media.get("schema").map(SchemaNode::from_value);
                    (ct.clone(), schema)
                })
                .collect::<Vec<_>>()
        });

    // Legacy 2.0 operations declare the body as an `in: body` parameter.
    if request_body.is_none() {
        if let Some(schema) = operation
            .get("parameters")
            .and_then(Value::as_array)
            .and_then(|params| {
                params.iter().find(|p| {
                    p.get("in").and_then(Value::as_str) == Some("body")
                })
            })
            .and_then(|p| p.get("schema"))
        {
            request_body = Some(vec![(
                "application/json".to_string(),
                Some(SchemaNode::from_value(schema)),
            )]);
        }
    }

    let mut responses = BTreeMap::new();
    if let Some(declared) = operation.get("responses").and_then(Value::as_object) {
        for (status, resp) in declared {
            let mut by_ct = BTreeMap::new();
            if let Some(content) = resp.get("content").and_then(Value::as_object) {
                for (ct, media) in content {
                    if let Some(s) = media.get("schema") {
                        by_ct.insert(ct.clone(), SchemaNode::from_value(s));
                    }
                }
            } else if let Some(s) = resp.get("schema") {
                // Legacy 2.0 responses carry the schema directly.
                by_ct.insert("application/json".to_string(), SchemaNode::from_value(s));
            }
            if !by_ct.is_empty() {
                responses.insert(status.clone(), by_ct);
            }
        }
    }

    let security = operation
        .get("security")
        .and_then(Value::as_array)
        .map(|reqs| {
            reqs.iter()
                .filter_map(Value::as_object)
                .flat_map(|req| req.keys().cloned())
                .collect()
        })
        .unwrap_or_default();

    EndpointDescriptor {
        method: method.to_string(),
        path: path.to_string(),
        parameters,
        request_body,
        responses,
        security,
    }
}

fn lower_parameter(param: &Value) -> Option<ParameterDescriptor> {
    let name = param.get("name").and_then(Value::as_str)?;
    let location = param
        .get("in")
        .and_then(Value::as_str)
        .and_then(ParamLocation::parse)?;

    // Legacy 2.0 parameters carry their constraints inline instead of
    // under a `schema` key.
    let schema = match param.get("schema") {
        Some(s) => SchemaNode::from_value(s),
        None => SchemaNode::from_value(param),
    };

    Some(ParameterDescriptor {
        name: name.to_string(),
        location,
        schema,
    })
}
