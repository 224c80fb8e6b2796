//! Resource handler groups.
//!
//! Each group is an independent module exposing `register(registry)`; the
//! engine composes them into one registry at construction time. A handler is
//! a plain function of the shared state, the matched route's captures, the
//! request params, and the request headers.

pub mod charges;
pub mod coupons;
pub mod customers;
pub mod invoices;
pub mod plans;

use serde_json::Value;

use crate::error::ApiResult;
use crate::objects::Attrs;
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::MockState;

/// Capability interface implemented by every endpoint function.
pub type Handler = fn(&mut MockState, &RouteMatch, Attrs, &Attrs) -> ApiResult<Value>;

/// Register every handler group. Ordering matters only within a group, where
/// literal-suffix routes must precede wildcard routes sharing a prefix.
pub fn register_all(registry: &mut HandlerRegistry) -> ApiResult<()> {
    customers::register(registry)?;
    coupons::register(registry)?;
    invoices::register(registry)?;
    charges::register(registry)?;
    plans::register(registry)?;
    Ok(())
}
