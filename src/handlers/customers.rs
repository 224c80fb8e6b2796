//! Customer endpoints.
//!
//! Creation is the busiest path: a `source` token attaches a card, a `plan`
//! spins up an embedded subscription (with a payment-source precondition for
//! paid, non-trial plans), and a `coupon` attaches a discount. All
//! preconditions run before the first store write so a rejected request
//! leaves no partial state behind.

use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::objects::{self, Attrs, PageParams};
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::{self, MockState};

pub fn register(registry: &mut HandlerRegistry) -> ApiResult<()> {
    registry.register("post /v1/customers", "new_customer", new_customer)?;
    registry.register("post /v1/customers/(.*)", "update_customer", update_customer)?;
    registry.register("get /v1/customers/(.*)", "get_customer", get_customer)?;
    registry.register("delete /v1/customers/(.*)", "delete_customer", delete_customer)?;
    registry.register("get /v1/customers", "list_customers", list_customers)?;
    Ok(())
}

fn new_customer(
    state: &mut MockState,
    _route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = match params.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => state.new_id("cus"),
    };
    params.insert("id".into(), json!(id));

    let mut sources = Vec::new();
    if let Some(token) = params.shift_remove("source") {
        let token = token.as_str().unwrap_or_default().to_string();
        let card = state.card_for_token(&token, &id);
        params.insert("default_source".into(), card["id"].clone());
        sources.push(card);
    }

    // Preconditions, all before the first store write.
    let plan = match params.get("plan").and_then(Value::as_str) {
        Some(plan_id) => {
            let plan = state::assert_existence(&state.plans, "plan", plan_id)?.clone();
            let free = plan.get("amount").and_then(Value::as_i64) == Some(0);
            let has_trial = plan
                .get("trial_period_days")
                .is_some_and(|days| !days.is_null());
            if params.get("default_source").is_none() && !has_trial && !free {
                return Err(ApiError::invalid_request("You must supply a valid card"));
            }
            Some(plan)
        }
        None => {
            if params.contains_key("trial_end") {
                return Err(ApiError::invalid_request(
                    "Received unknown parameter: trial_end",
                ));
            }
            None
        }
    };

    let coupon = match params.get("coupon").and_then(Value::as_str) {
        Some(coupon_id) => {
            Some(state::assert_existence(&state.coupons, "coupon", coupon_id)?.clone())
        }
        None => None,
    };

    let customer = objects::mock_customer(&sources, &params);
    state.customers.insert(id.clone(), customer);

    if let Some(plan) = plan {
        let subscription = build_subscription(state, &id, plan, &params);
        state.add_subscription_to_customer(&id, subscription);
    }

    if let Some(coupon) = coupon {
        state.attach_discount(&id, &coupon);
    }

    Ok(state.customers.get(&id).cloned().unwrap_or(Value::Null))
}

/// Subscription defaults plus the customer-create params that carry over
/// (trial end, application fee percent, quantity).
fn build_subscription(state: &mut MockState, customer_id: &str, plan: Value, params: &Attrs) -> Value {
    let mut overrides = Attrs::new();
    overrides.insert("id".into(), json!(state.new_id("su")));
    overrides.insert("customer".into(), json!(customer_id));
    for key in ["trial_end", "application_fee_percent", "quantity"] {
        if let Some(value) = params.get(key) {
            overrides.insert(key.into(), value.clone());
        }
    }
    if plan
        .get("trial_period_days")
        .is_some_and(|days| !days.is_null())
        || params.contains_key("trial_end")
    {
        overrides.insert("status".into(), json!("trialing"));
    }
    overrides.insert("plan".into(), plan);
    objects::mock_subscription(&overrides)
}

fn update_customer(
    state: &mut MockState,
    route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    state::assert_existence(&state.customers, "customer", &id)?;

    let source = params
        .shift_remove("source")
        .or_else(|| params.shift_remove("card"));
    let coupon = match params.get("coupon").and_then(Value::as_str) {
        Some(coupon_id) => {
            Some(state::assert_existence(&state.coupons, "coupon", coupon_id)?.clone())
        }
        None => None,
    };

    if let Some(record) = state.customers.get_mut(&id) {
        state::merge_record(record, params);
    }
    if let Some(token) = source {
        let token = token.as_str().unwrap_or_default().to_string();
        state.replace_default_source(&id, &token);
    }
    if let Some(coupon) = coupon {
        state.attach_discount(&id, &coupon);
    }

    Ok(state.customers.get(&id).cloned().unwrap_or(Value::Null))
}

fn get_customer(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let strict = state.strict;
    state::retrieve_or_synthesize(&mut state.customers, strict, "customer", &id, || {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(id));
        objects::mock_customer(&[], &overrides)
    })
}

fn delete_customer(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0);
    state::assert_existence(&state.customers, "customer", id)?;

    let record = state::tombstone(id);
    state.customers.insert(id.to_string(), record.clone());
    Ok(record)
}

fn list_customers(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let page = PageParams::from_params(&params);
    let values: Vec<Value> = state.customers.values().cloned().collect();
    Ok(objects::list_envelope(values, &page))
}
