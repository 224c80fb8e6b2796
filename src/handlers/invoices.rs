//! Invoice endpoints, including the pay action.
//!
//! Paying an invoice is the most state-sensitive operation in the engine: it
//! touches the invoice, charge, balance-transaction, and application-fee
//! stores in one call and must leave all four mutually consistent. The only
//! precondition (invoice existence) is checked before the first store write,
//! so a failed pay never commits partial state.

use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::objects::{self, Attrs, PageParams};
use crate::routing::{HandlerRegistry, RouteMatch};
use crate::state::{self, MockState};

pub fn register(registry: &mut HandlerRegistry) -> ApiResult<()> {
    registry.register("post /v1/invoices", "new_invoice", new_invoice)?;
    registry.register("get /v1/invoices/upcoming", "upcoming_invoice", upcoming_invoice)?;
    registry.register("get /v1/invoices/(.*)/lines", "get_invoice_line_items", get_invoice_line_items)?;
    registry.register("get /v1/invoices/(.*)", "get_invoice", get_invoice)?;
    registry.register("get /v1/invoices", "list_invoices", list_invoices)?;
    registry.register("post /v1/invoices/(.*)/pay", "pay_invoice", pay_invoice)?;
    registry.register("post /v1/invoices/(.*)", "update_invoice", update_invoice)?;
    Ok(())
}

fn new_invoice(
    state: &mut MockState,
    _route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = state.new_id("in");
    params.insert("id".into(), json!(id));

    let lines = vec![objects::mock_line_item(&Attrs::new())];
    let invoice = objects::mock_invoice(lines, &params);
    state.invoices.insert(id.clone(), invoice.clone());
    Ok(invoice)
}

fn update_invoice(
    state: &mut MockState,
    route: &RouteMatch,
    mut params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    // Line items are managed by the engine, never written through.
    params.shift_remove("lines");
    state::assert_existence(&state.invoices, "invoice", &id)?;

    if let Some(record) = state.invoices.get_mut(&id) {
        state::merge_record(record, params);
    }
    Ok(state.invoices.get(&id).cloned().unwrap_or(Value::Null))
}

fn get_invoice(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let strict = state.strict;
    state::retrieve_or_synthesize(&mut state.invoices, strict, "invoice", &id, || {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(id));
        objects::mock_invoice(vec![objects::mock_line_item(&Attrs::new())], &overrides)
    })
}

fn get_invoice_line_items(
    state: &mut MockState,
    route: &RouteMatch,
    _params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0);
    let invoice = state::assert_existence(&state.invoices, "invoice", id)?;
    Ok(invoice.get("lines").cloned().unwrap_or(Value::Null))
}

fn list_invoices(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let page = PageParams::from_params(&params);
    let customer = params.get("customer").and_then(Value::as_str);
    let values: Vec<Value> = state
        .invoices
        .values()
        .filter(|invoice| match customer {
            Some(customer) => invoice.get("customer").and_then(Value::as_str) == Some(customer),
            None => true,
        })
        .cloned()
        .collect();
    Ok(objects::list_envelope(values, &page))
}

/// Composite action: create a charge for the invoice's due amount, allocate
/// its balance transaction, fold in an application fee when the invoice's
/// subscription carries a non-zero `application_fee_percent`, then flip the
/// invoice's payment flags.
fn pay_invoice(
    state: &mut MockState,
    route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let id = route.capture(0).to_string();
    let invoice = state::assert_existence(&state.invoices, "invoice", &id)?.clone();

    let amount = invoice
        .get("amount_due")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let charge_id = state.new_id("ch");
    let mut charge_overrides = Attrs::new();
    charge_overrides.insert("id".into(), json!(charge_id));
    charge_overrides.insert("customer".into(), invoice["customer"].clone());
    charge_overrides.insert("amount".into(), json!(amount));
    charge_overrides.insert("invoice".into(), json!(id));
    let charge = objects::mock_charge(&charge_overrides);
    state.charges.insert(charge_id.clone(), charge);

    let mut transaction_overrides = Attrs::new();
    transaction_overrides.insert("amount".into(), json!(amount));
    transaction_overrides.insert("source".into(), json!(charge_id));
    if let Some(fee) = params.get("fee").and_then(Value::as_i64) {
        transaction_overrides.insert("fee".into(), json!(fee));
    }
    let transaction_id = state.new_balance_transaction("txn", transaction_overrides);
    if let Some(charge) = state
        .charges
        .get_mut(&charge_id)
        .and_then(Value::as_object_mut)
    {
        charge.insert("balance_transaction".into(), json!(transaction_id));
    }

    let mut invoice_updates = Attrs::new();
    invoice_updates.insert("paid".into(), json!(true));
    invoice_updates.insert("attempted".into(), json!(true));
    invoice_updates.insert("closed".into(), json!(true));
    invoice_updates.insert("charge".into(), json!(charge_id));

    let subscription_id = invoice
        .get("subscription")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if let Some(subscription) = state.subscriptions.get(&subscription_id).cloned() {
        let percent = subscription
            .get("application_fee_percent")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let mut application_fee = 0;
        if percent != 0.0 {
            application_fee = state::application_fee_amount(percent, amount);
            apply_application_fee(
                state,
                &subscription,
                &charge_id,
                &transaction_id,
                application_fee,
            );
        }
        invoice_updates.insert("application_fee".into(), json!(application_fee));
    }

    if let Some(record) = state.invoices.get_mut(&id) {
        state::merge_record(record, invoice_updates);
    }
    Ok(state.invoices.get(&id).cloned().unwrap_or(Value::Null))
}

/// Allocate the application fee record and its own ledger entry, point the
/// charge at the fee, and retroactively patch the charge's balance
/// transaction totals.
fn apply_application_fee(
    state: &mut MockState,
    subscription: &Value,
    charge_id: &str,
    transaction_id: &str,
    amount: i64,
) {
    let account = subscription
        .get("customer")
        .and_then(Value::as_str)
        .and_then(|customer_id| state.customers.get(customer_id))
        .and_then(|customer| customer.get("account"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut fee_overrides = Attrs::new();
    fee_overrides.insert("amount".into(), json!(amount));
    fee_overrides.insert("charge".into(), json!(charge_id));
    fee_overrides.insert("account".into(), account);
    let fee_id = state.new_application_fee("fee", fee_overrides);

    // The fee's own ledger entry carries the full amount, no processing fee.
    let mut fee_transaction = Attrs::new();
    fee_transaction.insert("amount".into(), json!(amount));
    fee_transaction.insert("source".into(), json!(fee_id));
    fee_transaction.insert("type".into(), json!("application_fee"));
    fee_transaction.insert("fee".into(), json!(0));
    let fee_transaction_id = state.new_balance_transaction("txn", fee_transaction);
    if let Some(fee) = state
        .application_fees
        .get_mut(&fee_id)
        .and_then(Value::as_object_mut)
    {
        fee.insert("balance_transaction".into(), json!(fee_transaction_id));
    }

    if let Some(charge) = state
        .charges
        .get_mut(charge_id)
        .and_then(Value::as_object_mut)
    {
        charge.insert("application_fee".into(), json!(fee_id));
    }

    state.apply_application_fee_to_transaction(transaction_id, amount, &fee_id);
}

fn upcoming_invoice(
    state: &mut MockState,
    _route: &RouteMatch,
    params: Attrs,
    _headers: &Attrs,
) -> ApiResult<Value> {
    let customer_id = params
        .get("customer")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::invalid_param("Missing required param: customer", "customer"))?
        .to_string();
    let customer = state::assert_existence(&state.customers, "customer", &customer_id)?;

    let subscriptions = customer
        .pointer("/subscriptions/data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    // The soonest-renewing subscription drives the upcoming invoice.
    let most_recent = subscriptions
        .iter()
        .min_by_key(|sub| {
            sub.get("current_period_end")
                .and_then(Value::as_i64)
                .unwrap_or(i64::MAX)
        })
        .ok_or_else(|| ApiError::not_found("upcoming invoice for customer", &customer_id))?
        .clone();

    let period_start = most_recent
        .get("current_period_start")
        .cloned()
        .unwrap_or(Value::Null);
    let period_end = most_recent
        .get("current_period_end")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let mut line_overrides = Attrs::new();
    line_overrides.insert("id".into(), most_recent["id"].clone());
    line_overrides.insert("type".into(), json!("subscription"));
    line_overrides.insert("plan".into(), most_recent["plan"].clone());
    line_overrides.insert(
        "amount".into(),
        most_recent
            .pointer("/plan/amount")
            .cloned()
            .unwrap_or(json!(0)),
    );
    line_overrides.insert("discountable".into(), json!(true));
    line_overrides.insert("quantity".into(), json!(1));
    let line = objects::mock_line_item(&line_overrides);

    let id = state.new_id("in");
    let mut overrides = Attrs::new();
    overrides.insert("id".into(), json!(id));
    overrides.insert("customer".into(), json!(customer_id));
    overrides.insert("subscription".into(), most_recent["id"].clone());
    overrides.insert("period_start".into(), period_start);
    overrides.insert("period_end".into(), json!(period_end));
    overrides.insert("next_payment_attempt".into(), json!(period_end + 3600));
    let invoice = objects::mock_invoice(vec![line], &overrides);
    state.invoices.insert(id, invoice.clone());
    Ok(invoice)
}
