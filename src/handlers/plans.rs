//! Plan endpoints.

use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::objects::{self, Attrs, PageParams};
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::{self, MockState};

pub fn register(registry: &mut HandlerRegistry) -> ApiResult<()> {
    registry.register("post /v1/plans", "new_plan", new_plan)?;
    registry.register("get /v1/plans/(.*)", "get_plan", get_plan)?;
    registry.register("delete /v1/plans/(.*)", "delete_plan", delete_plan)?;
    registry.register("get /v1/plans", "list_plans", list_plans)?;
    Ok(())
}

fn new_plan(
    state: &mut MockState,
    _route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = match params.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => state.new_id("plan"),
    };
    params.insert("id".into(), json!(id));

    let plan = objects::mock_plan(&params);
    state.plans.insert(id.clone(), plan.clone());
    Ok(plan)
}

fn get_plan(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let strict = state.strict;
    state::retrieve_or_synthesize(&mut state.plans, strict, "plan", &id, || {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(id));
        objects::mock_plan(&overrides)
    })
}

fn delete_plan(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0);
    state::assert_existence(&state.plans, "plan", id)?;

    let record = state::tombstone(id);
    state.plans.insert(id.to_string(), record.clone());
    Ok(record)
}

fn list_plans(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let page = PageParams::from_params(&params);
    let values: Vec<Value> = state.plans.values().cloned().collect();
    Ok(objects::list_envelope(values, &page))
}
