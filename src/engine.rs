//! Dispatch façade for the mock API.
//!
//! [`MockEngine`] is the entry point the client-interception layer calls in
//! place of real network I/O. Each instance owns an independent registry,
//! error queue, and set of stores; parallel test workers get full isolation
//! by constructing one engine each.

use log::{debug, warn};
use serde_json::{Map, Value, json};

use crate::error::{ApiError, ApiResult};
use crate::error_queue::ErrorQueue;
use crate::handlers;
use crate::objects::Attrs;
use crate::routing::HandlerRegistry;
use crate::state::MockState;

/// Reserved verb used purely to probe wiring; never touches any store.
const PROBE_METHOD: &str = "xtest";

/// One single-threaded mock session: registry, error queue, and stores.
pub struct MockEngine {
    registry: HandlerRegistry,
    error_queue: ErrorQueue,
    state: MockState,
    debug: bool,
}

impl MockEngine {
    /// Build an engine with every handler group registered.
    pub fn new() -> ApiResult<Self> {
        let mut registry = HandlerRegistry::new();
        handlers::register_all(&mut registry)?;
        Ok(Self {
            registry,
            error_queue: ErrorQueue::new(),
            state: MockState::new(),
            debug: false,
        })
    }

    /// Dispatch one mock request.
    ///
    /// `method` is the lowercase verb, `url` the path portion only. `params`
    /// and `headers` must be JSON objects (or null). Returns the response
    /// body and echoes the api key. Unknown endpoints degrade gracefully to
    /// an empty response with a logged warning; handler errors and injected
    /// errors propagate to the caller uncaught.
    pub fn mock_request(
        &mut self,
        method: &str,
        url: &str,
        api_key: Option<&str>,
        params: Value,
        headers: Value,
    ) -> ApiResult<(Value, Option<String>)> {
        let api_key = api_key.map(str::to_string);
        if method == PROBE_METHOD {
            return Ok((json!({}), api_key));
        }

        let params = normalize_object(params, "params")?;
        let headers = normalize_object(headers, "headers")?;

        let method_url = format!("{} {}", method.to_lowercase(), url);
        if self.debug {
            debug!("[mock req] {method_url} params={}", Value::Object(params.clone()));
        }

        let Some((handler, route)) = self.registry.resolve(&method_url) else {
            warn!("unrecognized method + url: [{method_url}]");
            return Ok((json!({}), api_key));
        };

        // A matching queue head fires instead of the handler, exactly once.
        if self.error_queue.error_for_handler(route.name()).is_some() {
            if let Some(error) = self.error_queue.dequeue() {
                return Err(error);
            }
        }

        let response = handler(&mut self.state, &route, params, &headers)?;
        if self.debug {
            debug!("[mock res] {response}");
        }
        Ok((response, api_key))
    }

    /// Script the next matching call to `handler_name` to fail with `error`.
    pub fn enqueue_error(&mut self, handler_name: impl Into<String>, error: ApiError) {
        self.error_queue.enqueue(handler_name, error);
    }

    /// Whether missing-resource lookups fail (`true`, the default) or
    /// synthesize a placeholder.
    pub fn strict(&self) -> bool {
        self.state.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.state.strict = strict;
    }

    /// Diagnostic logging of every dispatched request and response. Purely
    /// observational.
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Direct read access to the stores, for test assertions.
    pub fn state(&self) -> &MockState {
        &self.state
    }

    /// Direct mutable access to the stores, for test seeding.
    pub fn state_mut(&mut self) -> &mut MockState {
        &mut self.state
    }
}

fn normalize_object(value: Value, what: &str) -> ApiResult<Attrs> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::invalid_request(format!(
            "expected {what} to be an object, got: {other}"
        ))),
    }
}
