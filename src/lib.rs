//! In-process mock of a payment processor's HTTP API.
//!
//! Lets client code exercise real API-shaped request/response flows without
//! network calls: requests that would hit the live service are handed to
//! [`MockEngine::mock_request`], dispatched to handler logic keyed by HTTP
//! method and URL pattern, and answered with responses shaped like the real
//! service's JSON objects, backed by in-memory stores.
//!
//! # Core Components
//!
//! - [`MockEngine`] - Dispatch façade owning all per-session state
//! - [`HandlerRegistry`] - Ordered route-pattern matching
//! - [`MockState`] - Resource stores with cross-entity consistency helpers
//! - [`ErrorQueue`] - Scripted failures, consumed in FIFO order
//!
//! # Quick Start
//!
//! ```rust
//! use payment_mock::MockEngine;
//! use serde_json::json;
//!
//! # fn example() -> payment_mock::ApiResult<()> {
//! let mut engine = MockEngine::new()?;
//! let (customer, _) = engine.mock_request(
//!     "post",
//!     "/v1/customers",
//!     Some("sk_test_123"),
//!     json!({ "email": "jo@example.com" }),
//!     json!({}),
//! )?;
//! assert_eq!(customer["object"], json!("customer"));
//! # Ok(())
//! # }
//! ```
//!
//! Each engine instance is single-threaded and fully isolated: independent
//! stores, id counters, and error queue. Tests that run in parallel construct
//! one engine each.

pub mod engine;
pub mod error;
pub mod error_queue;
pub mod handlers;
pub mod ids;
pub mod objects;
pub mod routing;
pub mod state;

// Re-export commonly used types for convenience
pub use engine::MockEngine;
pub use error::{ApiError, ApiResult};
pub use error_queue::ErrorQueue;
pub use ids::IdGenerator;
pub use objects::{Attrs, PageParams};
pub use routing::{HandlerRegistry, RouteMatch};
pub use state::{MockState, Store};
