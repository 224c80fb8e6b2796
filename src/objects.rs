//! Canonical default attribute mappings for each entity kind.
//!
//! Each builder returns a complete, realistic-looking JSON object for its
//! kind, shallow-merged with caller overrides (overrides win). Every record
//! carries at minimum an `id` and an `object` discriminator naming its kind.
//! No entity has a schema enforced by the type system; the builder defines
//! the canonical shape.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Attribute mapping: the dynamically-typed record and parameter shape used
/// throughout the crate. Insertion-ordered so that list endpoints observe
/// creation order.
pub type Attrs = Map<String, Value>;

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Shallow-merge `overrides` onto `base`; incoming keys overwrite.
pub fn merge(mut base: Value, overrides: &Attrs) -> Value {
    if let Some(map) = base.as_object_mut() {
        for (key, value) in overrides {
            map.insert(key.clone(), value.clone());
        }
    }
    base
}

/// Pagination window parsed from list-endpoint params. Unknown params are
/// ignored; a malformed window falls back to the defaults.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

impl PageParams {
    pub fn from_params(params: &Attrs) -> Self {
        serde_json::from_value(Value::Object(params.clone())).unwrap_or_default()
    }
}

/// Wrap already-filtered values in the list envelope, applying pagination.
pub fn list_envelope(values: Vec<Value>, page: &PageParams) -> Value {
    let total = values.len();
    let data: Vec<Value> = values
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();
    let has_more = page.offset.saturating_add(page.limit) < total;
    json!({
        "object": "list",
        "total_count": total,
        "has_more": has_more,
        "data": data,
    })
}

pub fn mock_customer(sources: &[Value], overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_cus_default",
            "object": "customer",
            "created": now(),
            "email": "mock@example.com",
            "description": null,
            "account_balance": 0,
            "currency": "usd",
            "delinquent": false,
            "livemode": false,
            "discount": null,
            "default_source": null,
            "sources": {
                "object": "list",
                "total_count": sources.len(),
                "data": sources,
            },
            "subscriptions": {
                "object": "list",
                "total_count": 0,
                "data": [],
            },
        }),
        overrides,
    )
}

pub fn mock_card(overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_cc_default",
            "object": "card",
            "brand": "Visa",
            "funding": "credit",
            "last4": "4242",
            "exp_month": 4,
            "exp_year": 2028,
            "country": "US",
            "name": null,
            "customer": null,
        }),
        overrides,
    )
}

pub fn mock_charge(overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_ch_default",
            "object": "charge",
            "created": now(),
            "amount": 0,
            "currency": "usd",
            "paid": true,
            "captured": true,
            "refunded": false,
            "status": "succeeded",
            "customer": null,
            "invoice": null,
            "balance_transaction": null,
            "application_fee": null,
            "description": null,
            "failure_code": null,
            "failure_message": null,
            "livemode": false,
        }),
        overrides,
    )
}

pub fn mock_coupon(overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_co_default",
            "object": "coupon",
            "created": now(),
            "percent_off": 25,
            "amount_off": null,
            "currency": "usd",
            "duration": "repeating",
            "duration_in_months": 3,
            "max_redemptions": null,
            "times_redeemed": 0,
            "redeem_by": null,
            "valid": true,
            "livemode": false,
        }),
        overrides,
    )
}

pub fn mock_plan(overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_plan_default",
            "object": "plan",
            "created": now(),
            "name": "Mock Plan",
            "amount": 2300,
            "currency": "usd",
            "interval": "month",
            "interval_count": 1,
            "trial_period_days": null,
            "statement_descriptor": null,
            "livemode": false,
        }),
        overrides,
    )
}

pub fn mock_subscription(overrides: &Attrs) -> Value {
    let start = now();
    merge(
        json!({
            "id": "test_su_default",
            "object": "subscription",
            "plan": null,
            "customer": null,
            "status": "active",
            "quantity": 1,
            "start": start,
            "current_period_start": start,
            // One nominal billing month.
            "current_period_end": start + 30 * 24 * 3600,
            "trial_start": null,
            "trial_end": null,
            "canceled_at": null,
            "ended_at": null,
            "cancel_at_period_end": false,
            "application_fee_percent": null,
            "discount": null,
        }),
        overrides,
    )
}

pub fn mock_line_item(overrides: &Attrs) -> Value {
    let start = now();
    merge(
        json!({
            "id": "test_li_default",
            "object": "line_item",
            "type": "invoiceitem",
            "amount": 1000,
            "currency": "usd",
            "description": "Mock invoice item",
            "discountable": false,
            "proration": false,
            "quantity": null,
            "plan": null,
            "period": { "start": start, "end": start },
            "livemode": false,
        }),
        overrides,
    )
}

/// Invoice defaults derive their totals from the supplied line items;
/// overrides may still replace any of them.
pub fn mock_invoice(lines: Vec<Value>, overrides: &Attrs) -> Value {
    let subtotal: i64 = lines
        .iter()
        .filter_map(|line| line.get("amount").and_then(Value::as_i64))
        .sum();
    let created = now();
    merge(
        json!({
            "id": "test_in_default",
            "object": "invoice",
            "date": created,
            "customer": null,
            "subscription": null,
            "charge": null,
            "paid": false,
            "attempted": false,
            "closed": false,
            "forgiven": false,
            "currency": "usd",
            "subtotal": subtotal,
            "total": subtotal,
            "amount_due": subtotal,
            "application_fee": null,
            "starting_balance": 0,
            "ending_balance": null,
            "attempt_count": 0,
            "period_start": created,
            "period_end": created,
            "next_payment_attempt": created + 3600,
            "lines": {
                "object": "list",
                "total_count": lines.len(),
                "data": lines,
            },
            "livemode": false,
        }),
        overrides,
    )
}

pub fn mock_balance_transaction(overrides: &Attrs) -> Value {
    let created = now();
    merge(
        json!({
            "id": "test_txn_default",
            "object": "balance_transaction",
            "created": created,
            "available_on": created,
            "amount": 0,
            "currency": "usd",
            "fee": 0,
            "fee_details": [],
            "net": 0,
            "status": "pending",
            "type": "charge",
            "source": null,
            "description": null,
        }),
        overrides,
    )
}

pub fn mock_application_fee(overrides: &Attrs) -> Value {
    merge(
        json!({
            "id": "test_fee_default",
            "object": "application_fee",
            "created": now(),
            "amount": 0,
            "currency": "usd",
            "charge": null,
            "account": null,
            "balance_transaction": null,
            "refunded": false,
            "amount_refunded": 0,
            "livemode": false,
        }),
        overrides,
    )
}
