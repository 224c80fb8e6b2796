//! Per-instance resource stores and cross-entity consistency helpers.
//!
//! Every engine instance owns one [`MockState`]: an independent set of
//! insertion-ordered stores, id counters, and the strict-mode flag. Handlers
//! read and mutate the stores directly; the helpers here cover the operations
//! that must touch more than one store in a single request (embedded
//! subscriptions, ledger entries, application fees).

use serde_json::{Map, Value, json};

use crate::error::{ApiError, ApiResult};
use crate::ids::IdGenerator;
use crate::objects::{self, Attrs};

/// Insertion-ordered store of one entity kind, id → record.
pub type Store = Map<String, Value>;

/// Processing fee in cents: 30 plus 2.9% of the amount, rounded up.
pub fn processing_fee(amount: i64) -> i64 {
    30 + (amount * 29 + 999) / 1000
}

/// Application fee in cents: `percent` of the amount, rounded half-up.
pub fn application_fee_amount(percent: f64, amount: i64) -> i64 {
    (percent * amount as f64 / 100.0).round() as i64
}

/// Return the stored record or a `NotFound` error. Strict mode does not
/// apply here; retrieval handlers that honor it use
/// [`retrieve_or_synthesize`] instead, and composite actions require
/// existence unconditionally so that no store is mutated on a failed
/// precondition.
pub fn assert_existence<'a>(store: &'a Store, resource_type: &str, id: &str) -> ApiResult<&'a Value> {
    store
        .get(id)
        .ok_or_else(|| ApiError::not_found(resource_type, id))
}

/// Retrieval contract: a missing id fails under strict mode; otherwise a
/// plausible record is synthesized, stored, and returned.
pub fn retrieve_or_synthesize(
    store: &mut Store,
    strict: bool,
    resource_type: &str,
    id: &str,
    synthesize: impl FnOnce() -> Value,
) -> ApiResult<Value> {
    if !store.contains_key(id) {
        if strict {
            return Err(ApiError::not_found(resource_type, id));
        }
        store.insert(id.to_string(), synthesize());
    }
    Ok(store.get(id).cloned().unwrap_or(Value::Null))
}

/// Shallow-merge `params` into the stored record; incoming keys overwrite.
pub fn merge_record(record: &mut Value, params: Attrs) {
    if let Some(map) = record.as_object_mut() {
        for (key, value) in params {
            map.insert(key, value);
        }
    }
}

/// Minimal record left behind after deletion.
pub fn tombstone(id: &str) -> Value {
    json!({ "id": id, "deleted": true })
}

/// The mutable mock state for one engine instance.
pub struct MockState {
    pub customers: Store,
    pub charges: Store,
    pub coupons: Store,
    pub plans: Store,
    pub invoices: Store,
    pub subscriptions: Store,
    pub balance_transactions: Store,
    pub application_fees: Store,
    /// When off, retrieval handlers synthesize records for unknown ids
    /// instead of failing.
    pub strict: bool,
    ids: IdGenerator,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    pub fn new() -> Self {
        Self {
            customers: Store::new(),
            charges: Store::new(),
            coupons: Store::new(),
            plans: Store::new(),
            invoices: Store::new(),
            subscriptions: Store::new(),
            balance_transactions: Store::new(),
            application_fees: Store::new(),
            strict: true,
            ids: IdGenerator::new(),
        }
    }

    /// Allocate a general entity id.
    pub fn new_id(&mut self, prefix: &str) -> String {
        self.ids.new_id(prefix)
    }

    /// Build a card record for a client-supplied source token. The token is
    /// opaque at this layer; the card gets a fresh id of its own.
    pub fn card_for_token(&mut self, _token: &str, customer_id: &str) -> Value {
        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!(self.ids.new_id("cc")));
        overrides.insert("customer".into(), json!(customer_id));
        objects::mock_card(&overrides)
    }

    /// Replace the customer's payment sources with the card built from
    /// `token` and point `default_source` at it.
    pub fn replace_default_source(&mut self, customer_id: &str, token: &str) {
        let card = self.card_for_token(token, customer_id);
        let card_id = card.get("id").cloned().unwrap_or(Value::Null);
        if let Some(customer) = self
            .customers
            .get_mut(customer_id)
            .and_then(Value::as_object_mut)
        {
            customer.insert(
                "sources".into(),
                json!({ "object": "list", "total_count": 1, "data": [card] }),
            );
            customer.insert("default_source".into(), card_id);
        }
    }

    /// Keep the dual index consistent: the subscription lives in the
    /// top-level store and embedded in the owning customer's `subscriptions`
    /// collection.
    pub fn add_subscription_to_customer(&mut self, customer_id: &str, subscription: Value) {
        let subscription_id = subscription
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.subscriptions
            .insert(subscription_id, subscription.clone());

        if let Some(collection) = self
            .customers
            .get_mut(customer_id)
            .and_then(|c| c.pointer_mut("/subscriptions"))
            .and_then(Value::as_object_mut)
        {
            let count = match collection.get_mut("data").and_then(Value::as_array_mut) {
                Some(data) => {
                    data.push(subscription);
                    data.len()
                }
                None => 0,
            };
            collection.insert("total_count".into(), json!(count));
        }
    }

    /// Attach the coupon to the customer as a discount.
    pub fn attach_discount(&mut self, customer_id: &str, coupon: &Value) {
        let discount = json!({
            "object": "discount",
            "coupon": coupon,
            "customer": customer_id,
            "start": chrono::Utc::now().timestamp(),
            "end": null,
            "subscription": null,
        });
        if let Some(customer) = self
            .customers
            .get_mut(customer_id)
            .and_then(Value::as_object_mut)
        {
            customer.insert("discount".into(), discount);
        }
    }

    /// Create a balance transaction and return its id. `fee` defaults to the
    /// processing fee for the transaction amount; `net` is always
    /// `amount - fee`.
    pub fn new_balance_transaction(&mut self, prefix: &str, overrides: Attrs) -> String {
        let id = self.ids.new_transaction_id(prefix);
        let amount = overrides.get("amount").and_then(Value::as_i64).unwrap_or(0);
        let fee = overrides
            .get("fee")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| processing_fee(amount));

        let mut transaction = objects::mock_balance_transaction(&overrides);
        if let Some(map) = transaction.as_object_mut() {
            map.insert("id".into(), json!(id));
            map.insert("fee".into(), json!(fee));
            map.insert("net".into(), json!(amount - fee));
            map.insert(
                "fee_details".into(),
                json!([{
                    "amount": fee,
                    "currency": "usd",
                    "type": "processing_fee",
                    "application": null,
                    "description": "Processing fees",
                }]),
            );
        }
        self.balance_transactions.insert(id.clone(), transaction);
        id
    }

    /// Create an application fee record and return its id.
    pub fn new_application_fee(&mut self, prefix: &str, overrides: Attrs) -> String {
        let id = self.ids.new_fee_id(prefix);
        let mut fee = objects::mock_application_fee(&overrides);
        if let Some(map) = fee.as_object_mut() {
            map.insert("id".into(), json!(id));
        }
        self.application_fees.insert(id.clone(), fee);
        id
    }

    /// Retroactively fold an application fee into a charge's ledger entry:
    /// append a fee-detail line and adjust the fee/net totals by the fee
    /// amount.
    pub fn apply_application_fee_to_transaction(
        &mut self,
        transaction_id: &str,
        fee_amount: i64,
        fee_id: &str,
    ) {
        if let Some(transaction) = self
            .balance_transactions
            .get_mut(transaction_id)
            .and_then(Value::as_object_mut)
        {
            let fee = transaction.get("fee").and_then(Value::as_i64).unwrap_or(0) + fee_amount;
            let net = transaction.get("net").and_then(Value::as_i64).unwrap_or(0) - fee_amount;
            transaction.insert("fee".into(), json!(fee));
            transaction.insert("net".into(), json!(net));
            if let Some(details) = transaction
                .get_mut("fee_details")
                .and_then(Value::as_array_mut)
            {
                details.push(json!({
                    "amount": fee_amount,
                    "currency": "usd",
                    "type": "application_fee",
                    "application": fee_id,
                    "description": "Application fee",
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_fee_rounds_up() {
        assert_eq!(processing_fee(1000), 59); // 30 + ceil(29.0)
        assert_eq!(processing_fee(1001), 60); // 30 + ceil(29.029)
        assert_eq!(processing_fee(0), 30);
    }

    #[test]
    fn application_fee_rounds_half_up() {
        assert_eq!(application_fee_amount(10.0, 2000), 200);
        assert_eq!(application_fee_amount(2.5, 100), 3); // 2.5 rounds away from zero
        assert_eq!(application_fee_amount(1.0, 149), 1);
    }

    #[test]
    fn assert_existence_reports_missing() {
        let store = Store::new();
        let err = assert_existence(&store, "invoice", "in_1").unwrap_err();
        assert_eq!(err.to_string(), "No such invoice: in_1");
    }

    #[test]
    fn retrieve_or_synthesize_honors_strict() {
        let mut store = Store::new();
        let strict = retrieve_or_synthesize(&mut store, true, "coupon", "co_1", || json!({}));
        assert!(strict.is_err());
        assert!(store.is_empty());

        let lax = retrieve_or_synthesize(&mut store, false, "coupon", "co_1", || {
            json!({ "id": "co_1" })
        })
        .unwrap();
        assert_eq!(lax["id"], json!("co_1"));
        assert!(store.contains_key("co_1"));
    }

    #[test]
    fn balance_transaction_defaults_fee_and_net() {
        let mut state = MockState::new();
        let mut overrides = Attrs::new();
        overrides.insert("amount".into(), json!(1000));
        overrides.insert("source".into(), json!("test_ch_1"));
        let id = state.new_balance_transaction("txn", overrides);

        let transaction = &state.balance_transactions[&id];
        assert_eq!(transaction["fee"], json!(59));
        assert_eq!(transaction["net"], json!(941));
        assert_eq!(transaction["source"], json!("test_ch_1"));
        assert_eq!(
            transaction["fee_details"][0]["type"],
            json!("processing_fee")
        );
    }

    #[test]
    fn application_fee_patch_adjusts_totals() {
        let mut state = MockState::new();
        let mut overrides = Attrs::new();
        overrides.insert("amount".into(), json!(2000));
        let id = state.new_balance_transaction("txn", overrides);

        state.apply_application_fee_to_transaction(&id, 200, "test_fee_1");
        let transaction = &state.balance_transactions[&id];
        assert_eq!(transaction["fee"], json!(88 + 200)); // 30 + ceil(58.0) = 88
        assert_eq!(transaction["net"], json!(2000 - 88 - 200));
        assert_eq!(transaction["fee_details"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn embedded_subscription_stays_in_step_with_store() {
        let mut state = MockState::new();
        let customer = objects::mock_customer(&[], &{
            let mut o = Attrs::new();
            o.insert("id".into(), json!("test_cus_1"));
            o
        });
        state.customers.insert("test_cus_1".into(), customer);

        let mut overrides = Attrs::new();
        overrides.insert("id".into(), json!("test_su_1"));
        overrides.insert("customer".into(), json!("test_cus_1"));
        let subscription = objects::mock_subscription(&overrides);
        state.add_subscription_to_customer("test_cus_1", subscription);

        assert!(state.subscriptions.contains_key("test_su_1"));
        let embedded = &state.customers["test_cus_1"]["subscriptions"];
        assert_eq!(embedded["total_count"], json!(1));
        assert_eq!(embedded["data"][0]["id"], json!("test_su_1"));
    }
}
