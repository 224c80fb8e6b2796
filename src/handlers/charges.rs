//! Charge endpoints.

use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::objects::{self, Attrs, PageParams};
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::{self, MockState};

pub fn register(registry: &mut HandlerRegistry) -> ApiResult<()> {
    registry.register("post /v1/charges", "new_charge", new_charge)?;
    registry.register("get /v1/charges/(.*)", "get_charge", get_charge)?;
    registry.register("post /v1/charges/(.*)", "update_charge", update_charge)?;
    registry.register("get /v1/charges", "list_charges", list_charges)?;
    Ok(())
}

fn new_charge(
    state: &mut MockState,
    _route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    if !params.contains_key("amount") {
        return Err(ApiError::invalid_param(
            "Missing required param: amount",
            "amount",
        ));
    }

    let id = match params.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => state.new_id("ch"),
    };
    params.insert("id".into(), json!(id));

    let charge = objects::mock_charge(&params);
    state.charges.insert(id.clone(), charge);

    // Every charge gets a ledger entry with the default processing fee.
    let amount = params.get("amount").and_then(Value::as_i64).unwrap_or(0);
    let mut transaction = Attrs::new();
    transaction.insert("amount".into(), json!(amount));
    transaction.insert("source".into(), json!(id));
    let transaction_id = state.new_balance_transaction("txn", transaction);
    if let Some(charge) = state.charges.get_mut(&id).and_then(Value::as_object_mut) {
        charge.insert("balance_transaction".into(), json!(transaction_id));
    }

    Ok(state.charges.get(&id).cloned().unwrap_or(Value::Null))
}

fn get_charge(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let strict = state.strict;
    state::retrieve_or_synthesize(&mut state.charges, strict, "charge", &id, || {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(id));
        objects::mock_charge(&overrides)
    })
}

fn update_charge(
    state: &mut MockState,
    route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    state::assert_existence(&state.charges, "charge", &id)?;

    if let Some(record) = state.charges.get_mut(&id) {
        state::merge_record(record, params);
    }
    Ok(state.charges.get(&id).cloned().unwrap_or(Value::Null))
}

fn list_charges(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let page = PageParams::from_params(&params);
    let customer = params.get("customer").and_then(Value::as_str);
    let values: Vec<Value> = state
        .charges
        .values()
        .filter(|charge| match customer {
            Some(customer) => charge.get("customer").and_then(Value::as_str) == Some(customer),
            None => true,
        })
        .cloned()
        .collect();
    Ok(objects::list_envelope(values, &page))
}
