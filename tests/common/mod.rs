//! Shared helpers for the integration suite.

#![allow(dead_code)]

use payment_mock::{ApiError, MockEngine};
use serde_json::{Value, json};

/// Fresh engine with test logging wired up.
pub fn engine() -> MockEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    MockEngine::new().expect("engine construction should succeed")
}

/// Dispatch a request expected to succeed, returning the response body.
pub fn ok(engine: &mut MockEngine, method: &str, url: &str, params: Value) -> Value {
    let (body, _) = engine
        .mock_request(method, url, Some("sk_test_mock"), params, json!({}))
        .unwrap_or_else(|e| panic!("{method} {url} should succeed, got: {e}"));
    body
}

/// Dispatch a request expected to fail, returning the error.
pub fn err(engine: &mut MockEngine, method: &str, url: &str, params: Value) -> ApiError {
    match engine.mock_request(method, url, Some("sk_test_mock"), params, json!({})) {
        Ok((body, _)) => panic!("{method} {url} should fail, got: {body}"),
        Err(error) => error,
    }
}
