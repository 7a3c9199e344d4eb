//! Concrete request construction and execution.
//!
//! Retry policy: transport-level failures (connection error, timeout) are
//! retried up to `max_retries` times with exponential backoff doubling per
//! attempt. A received HTTP response, 4xx and 5xx included, is accepted
//! immediately and never retried.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{EngineError, EngineResult};
use crate::model::{EndpointDescriptor, ResponseSnapshot};
use crate::synth::params::{stringify, ExtractedParams};

/// Stub credential injected for API-key-style security requirements.
/// Placeholder only, not real credential handling.
const PLACEHOLDER_API_KEY: &str = "special-key";

#[derive(Debug, Clone)]
pub struct InvokeConfig {
    /// Retries after the first attempt, transport failures only.
    pub max_retries: u32,
    /// First backoff delay; doubles per subsequent attempt.
    pub backoff_base: Duration,
    /// Per-attempt time budget.
    pub timeout: Duration,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct Invoker {
    client: Client,
    cfg: InvokeConfig,
}

impl Invoker {
    pub fn new(cfg: InvokeConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| EngineError::invariant(format!("failed to build http client: {e}")))?;
        Ok(Self { client, cfg })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Execute the request, retrying transport failures with backoff. The
    /// last transport error becomes the terminal failure.
    pub async fn invoke(
        &self,
        method: &str,
        url: Url,
        headers: &BTreeMap<String, String>,
        body: Option<&Value>,
    ) -> EngineResult<ResponseSnapshot> {
        let method = match method {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => {
                return Err(EngineError::invariant(format!(
                    "unsupported method: {other}"
                )))
            }
        };
        let header_map = build_header_map(headers);

        let mut failures = 0u32;
        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(header_map.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => return snapshot(response).await,
                Err(err) => {
                    failures += 1;
                    if failures > self.cfg.max_retries {
                        return Err(classify(&err));
                    }
                    let delay = self.cfg.backoff_base * 2u32.pow(failures - 1);
                    warn!(
                        %url,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "transport failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Full URL: base + path template with `{name}` tokens substituted, plus a
/// query string. Query values that stringify to empty are dropped.
pub fn build_url(
    base_url: &str,
    path: &str,
    params: &ExtractedParams,
) -> EngineResult<Url> {
    let mut filled = path.to_string();
    for (name, value) in &params.path {
        filled = filled.replace(&format!("{{{name}}}"), &stringify(value));
    }

    let full = format!("{}{}", base_url.trim_end_matches('/'), filled);
    let mut url = Url::parse(&full)
        .map_err(|e| EngineError::invariant(format!("invalid request url {full}: {e}")))?;

    for (name, value) in &params.query {
        let text = stringify(value);
        if text.is_empty() {
            continue;
        }
        url.query_pairs_mut().append_pair(name, &text);
    }

    Ok(url)
}

/// Baseline JSON headers merged with extracted header parameters, plus the
/// placeholder credential when an api_key security requirement is declared.
pub fn request_headers(
    endpoint: &EndpointDescriptor,
    params: &ExtractedParams,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Accept".to_string(), "application/json".to_string());
    for (name, value) in &params.header {
        headers.insert(name.clone(), value.clone());
    }
    if endpoint.security.iter().any(|name| name == "api_key") {
        headers.insert("api_key".to_string(), PLACEHOLDER_API_KEY.to_string());
    }
    headers
}

fn build_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!(%name, "skipping invalid header name");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            debug!(name = %name, "skipping invalid header value");
            continue;
        };
        map.insert(name, value);
    }
    map
}

fn classify(err: &reqwest::Error) -> EngineError {
    if err.is_timeout() {
        EngineError::timeout(err.to_string())
    } else {
        EngineError::transport(err.to_string())
    }
}

async fn snapshot(response: reqwest::Response) -> EngineResult<ResponseSnapshot> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();

    // The response arrived; a failure reading its body is terminal, not
    // retried.
    let text = response
        .text()
        .await
        .map_err(|e| EngineError::transport(format!("failed to read response body: {e}")))?;

    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok(ResponseSnapshot {
        status,
        headers,
        body,
    })
}
