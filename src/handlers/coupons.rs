//! Coupon endpoints.
//!
//! Coupons are the one store where deletion removes the key entirely, the
//! way the real API forgets them, instead of leaving a tombstone.

use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::objects::{self, Attrs, PageParams};
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::{self, MockState};

pub fn register(registry: &mut HandlerRegistry) -> ApiResult<()> {
    registry.register("post /v1/coupons", "new_coupon", new_coupon)?;
    registry.register("get /v1/coupons/(.*)", "get_coupon", get_coupon)?;
    registry.register("delete /v1/coupons/(.*)", "delete_coupon", delete_coupon)?;
    registry.register("get /v1/coupons", "list_coupons", list_coupons)?;
    Ok(())
}

fn new_coupon(
    state: &mut MockState,
    _route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = match params.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => state.new_id("coupon"),
    };
    params.insert("id".into(), json!(id));

    let coupon = objects::mock_coupon(&params);
    state.coupons.insert(id.clone(), coupon.clone());
    Ok(coupon)
}

fn get_coupon(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let strict = state.strict;
    state::retrieve_or_synthesize(&mut state.coupons, strict, "coupon", &id, || {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(id));
        objects::mock_coupon(&overrides)
    })
}

fn delete_coupon(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0);
    state::assert_existence(&state.coupons, "coupon", id)?;

    // Full removal; later list calls keep creation order for the survivors.
    state
        .coupons
        .shift_remove(id)
        .map(|coupon| json!({ "id": coupon["id"], "deleted": true }))
        .ok_or_else(|| ApiError::not_found("coupon", id))
}

fn list_coupons(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let page = PageParams::from_params(&params);
    let values: Vec<Value> = state.coupons.values().cloned().collect();
    Ok(objects::list_envelope(values, &page))
}
