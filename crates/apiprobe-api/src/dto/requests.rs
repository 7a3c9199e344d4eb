use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluateRequest {
    /// URL of the OpenAPI document to fetch.
    #[serde(default)]
    pub url: Option<String>,
    /// An already-parsed document, as an alternative to `url`.
    #[serde(default)]
    pub spec: Option<serde_json::Value>,
}
