//! End-to-end evaluation runs against an in-process target server.

use std::time::Duration;

use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use apiprobe_core::invoke::InvokeConfig;
use apiprobe_core::{EngineError, EvalConfig, Evaluator, SpecSource, SynthConfig};

async fn spawn_target() -> String {
    let app = Router::new()
        .route("/test", get(|| async { Json(json!({ "ok": true })) }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/pets",
            get(|| async { Json(json!([{ "id": 1, "name": "rex" }])) }),
        )
        .route("/items", post(|Json(v): Json<Value>| async move { Json(v) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fast_evaluator(seed: u64) -> Evaluator {
    Evaluator::new(EvalConfig {
        concurrency: 4,
        invoke: InvokeConfig {
            max_retries: 3,
            backoff_base: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        },
        synth: SynthConfig {
            seed: Some(seed),
            ..SynthConfig::default()
        },
    })
    .unwrap()
}

fn spec(base: &str, paths: Value) -> Value {
    json!({
        "openapi": "3.0.0",
        "info": { "title": "target", "version": "1.0.0" },
        "servers": [{ "url": base }],
        "paths": paths
    })
}

#[tokio::test]
async fn get_with_no_schema_succeeds_on_200() {
    let base = spawn_target().await;
    let doc = spec(&base, json!({ "/test": { "get": { "responses": { "200": { "description": "ok" } } } } }));

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    assert_eq!(run.total_endpoints, 1);
    assert_eq!(run.successful_endpoints, 1);
    assert_eq!(run.success_rate, 100.0);
    let result = &run.results[0];
    assert!(result.success);
    assert!(result.validation.status_valid);
    assert!(!result.validation.schema_valid);
}

#[tokio::test]
async fn not_found_is_recorded_as_failure() {
    let base = spawn_target().await;
    let doc = spec(&base, json!({ "/missing": { "get": {} } }));

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    let result = &run.results[0];
    assert!(!result.success);
    assert_eq!(result.response.as_ref().unwrap().status, 404);
    assert_eq!(run.success_rate, 0.0);
}

#[tokio::test]
async fn response_schema_judges_semantic_success() {
    let base = spawn_target().await;
    let matching = json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": { "id": { "type": "integer" }, "name": { "type": "string" } },
            "required": ["id", "name"]
        }
    });
    let mismatching = json!({
        "type": "object",
        "properties": { "count": { "type": "integer" } },
        "required": ["count"]
    });
    let doc = spec(
        &base,
        json!({
            "/pets": {
                "get": {
                    "responses": {
                        "200": { "content": { "application/json": { "schema": matching } } }
                    }
                }
            },
            "/test": {
                "get": {
                    "responses": {
                        "200": { "content": { "application/json": { "schema": mismatching } } }
                    }
                }
            }
        }),
    );

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    assert!(run.results[0].success);
    assert!(run.results[0].validation.schema_valid);

    // 200 but the payload does not match the declared schema.
    assert!(!run.results[1].success);
    assert!(run.results[1].validation.status_valid);
    assert!(!run.results[1].validation.schema_valid);
}

#[tokio::test]
async fn post_body_is_synthesized_from_schema() {
    let base = spawn_target().await;
    let doc = spec(
        &base,
        json!({
            "/items": {
                "post": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "name": { "type": "string" },
                                        "age": { "type": "integer", "minimum": 0, "maximum": 10 }
                                    },
                                    "required": ["name"]
                                }
                            }
                        }
                    },
                    "responses": { "200": { "description": "echo" } }
                }
            }
        }),
    );

    for seed in 0..5 {
        let run = fast_evaluator(seed)
            .evaluate(SpecSource::Inline(doc.clone()))
            .await
            .unwrap();
        let result = &run.results[0];
        assert!(result.success);

        let body = result.request.as_ref().unwrap().body.as_ref().unwrap();
        assert!(body["name"].is_string());
        if let Some(age) = body.get("age") {
            assert!((0..=10).contains(&age.as_i64().unwrap()));
        }
    }
}

#[tokio::test]
async fn transport_failures_are_retried_until_a_response_arrives() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // A target that closes the first two connections without answering and
    // serves a real response on the third.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            let n = seen.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                drop(stream);
                continue;
            }
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let body = r#"{"ok":true}"#;
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
        }
    });

    let doc = spec(
        &format!("http://{addr}"),
        json!({ "/test": { "get": { "responses": { "200": { "description": "ok" } } } } }),
    );

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let result = &run.results[0];
    assert!(result.success);
    assert_eq!(result.response.as_ref().unwrap().status, 200);
    assert_eq!(result.response.as_ref().unwrap().body, json!({ "ok": true }));
}

#[tokio::test]
async fn unreachable_target_fails_after_retries_and_run_continues() {
    // Grab a free port and close it again so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let doc = spec(
        &format!("http://{addr}"),
        json!({ "/a": { "get": {} }, "/b": { "get": {} } }),
    );

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    assert_eq!(run.total_endpoints, 2);
    for result in &run.results {
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(result.response.is_none());
    }
    assert_eq!(run.results[0].path, "/a");
    assert_eq!(run.results[1].path, "/b");
}

#[tokio::test]
async fn zero_paths_is_rejected_before_synthesis() {
    let doc = json!({
        "openapi": "3.0.0",
        "servers": [{ "url": "http://localhost:1" }],
        "paths": {}
    });

    let err = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SpecStructure { .. }));
}

#[tokio::test]
async fn missing_server_url_is_rejected() {
    let doc = json!({
        "openapi": "3.0.0",
        "paths": { "/test": { "get": {} } }
    });

    let err = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SpecStructure { .. }));
}

#[tokio::test]
async fn results_keep_declaration_order_under_concurrency() {
    let base = spawn_target().await;
    let doc = spec(
        &base,
        json!({
            "/test": { "get": {} },
            "/pets": { "get": {} },
            "/missing": { "get": {} },
            "/items": { "post": {} }
        }),
    );

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Inline(doc))
        .await
        .unwrap();

    let order: Vec<&str> = run.results.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(order, vec!["/test", "/pets", "/missing", "/items"]);
}

#[tokio::test]
async fn spec_url_fetch_and_preflight() {
    let base = spawn_target().await;
    let target = base.clone();

    // Serve the spec itself over HTTP.
    let spec_app = Router::new().route(
        "/openapi.json",
        get(move || {
            let doc = spec(&target, json!({ "/test": { "get": {} } }));
            async move { Json(doc) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let spec_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, spec_app).await.unwrap();
    });

    let run = fast_evaluator(1)
        .evaluate(SpecSource::Url(format!("http://{spec_addr}/openapi.json")))
        .await
        .unwrap();
    assert_eq!(run.total_endpoints, 1);
    assert!(run.results[0].success);

    // Unreachable spec URL fails fast, before any endpoint is touched.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);
    let err = fast_evaluator(1)
        .evaluate(SpecSource::Url(format!("http://{dead}/openapi.json")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SpecUnreachable { .. }));
}
