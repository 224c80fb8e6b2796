//! Invoice endpoints, centered on the pay action's cross-store consistency.

mod common;

use common::{engine, err, ok};
use serde_json::json;

#[test]
fn pay_creates_mutually_referencing_records() {
    let mut engine = engine();
    let invoice = ok(
        &mut engine,
        "post",
        "/v1/invoices",
        json!({ "customer": "test_cus_1", "amount_due": 1000 }),
    );
    let invoice_id = invoice["id"].as_str().unwrap().to_string();
    assert_eq!(invoice["paid"], json!(false));

    let paid = ok(
        &mut engine,
        "post",
        &format!("/v1/invoices/{invoice_id}/pay"),
        json!({}),
    );
    assert_eq!(paid["paid"], json!(true));
    assert_eq!(paid["attempted"], json!(true));
    assert_eq!(paid["closed"], json!(true));

    let charge_id = paid["charge"].as_str().expect("charge id recorded");
    let state = engine.state();
    assert_eq!(state.charges.len(), 1);
    let charge = &state.charges[charge_id];
    assert_eq!(charge["amount"], json!(1000));
    assert_eq!(charge["customer"], json!("test_cus_1"));
    assert_eq!(charge["invoice"], json!(invoice_id));

    // fee = 30 + ceil(1000 * 0.029) = 59
    let transaction_id = charge["balance_transaction"].as_str().unwrap();
    let transaction = &state.balance_transactions[transaction_id];
    assert_eq!(transaction["amount"], json!(1000));
    assert_eq!(transaction["fee"], json!(59));
    assert_eq!(transaction["net"], json!(941));
    assert_eq!(transaction["source"], json!(charge_id));
}

#[test]
fn pay_honors_an_explicit_fee_override() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/invoices", json!({ "amount_due": 1000 }));

    let paid = ok(&mut engine, "post", "/v1/invoices/test_in_1/pay", json!({ "fee": 10 }));
    let charge_id = paid["charge"].as_str().unwrap();
    let transaction_id = engine.state().charges[charge_id]["balance_transaction"]
        .as_str()
        .unwrap()
        .to_string();
    let transaction = &engine.state().balance_transactions[&transaction_id];
    assert_eq!(transaction["fee"], json!(10));
    assert_eq!(transaction["net"], json!(990));
}

#[test]
fn application_fee_percent_propagates_through_payment() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/plans", json!({ "id": "gold", "amount": 2000 }));
    let customer = ok(
        &mut engine,
        "post",
        "/v1/customers",
        json!({ "plan": "gold", "source": "tok_visa", "application_fee_percent": 10.0 }),
    );
    let subscription_id = customer["subscriptions"]["data"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let invoice = ok(
        &mut engine,
        "post",
        "/v1/invoices",
        json!({
            "customer": customer["id"],
            "subscription": subscription_id,
            "amount_due": 2000,
        }),
    );
    let invoice_id = invoice["id"].as_str().unwrap().to_string();

    let paid = ok(&mut engine, "post", &format!("/v1/invoices/{invoice_id}/pay"), json!({}));
    // round(10 * 2000 / 100) = 200
    assert_eq!(paid["application_fee"], json!(200));

    let state = engine.state();
    assert_eq!(state.application_fees.len(), 1);
    let charge_id = paid["charge"].as_str().unwrap();
    let charge = &state.charges[charge_id];
    let fee_id = charge["application_fee"].as_str().unwrap();

    let fee = &state.application_fees[fee_id];
    assert_eq!(fee["amount"], json!(200));
    assert_eq!(fee["charge"], json!(charge_id));

    // The charge's ledger entry absorbed the fee: +200 fee, -200 net over the
    // no-fee baseline of fee=88, net=1912.
    let transaction = &state.balance_transactions[charge["balance_transaction"].as_str().unwrap()];
    assert_eq!(transaction["fee"], json!(88 + 200));
    assert_eq!(transaction["net"], json!(1912 - 200));
    let details = transaction["fee_details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[1]["type"], json!("application_fee"));
    assert_eq!(details[1]["amount"], json!(200));

    // The fee has a ledger entry of its own.
    let fee_transaction = &state.balance_transactions[fee["balance_transaction"].as_str().unwrap()];
    assert_eq!(fee_transaction["type"], json!("application_fee"));
    assert_eq!(fee_transaction["amount"], json!(200));
    assert_eq!(fee_transaction["net"], json!(200));
}

#[test]
fn subscription_without_fee_percent_pays_fee_free() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/plans", json!({ "id": "free", "amount": 0 }));
    let customer = ok(&mut engine, "post", "/v1/customers", json!({ "plan": "free" }));
    let subscription_id = customer["subscriptions"]["data"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    ok(
        &mut engine,
        "post",
        "/v1/invoices",
        json!({ "subscription": subscription_id, "amount_due": 500 }),
    );
    let paid = ok(&mut engine, "post", "/v1/invoices/test_in_1/pay", json!({}));

    assert_eq!(paid["application_fee"], json!(0));
    assert!(engine.state().application_fees.is_empty());
}

#[test]
fn pay_of_missing_invoice_commits_nothing() {
    let mut engine = engine();
    let error = err(&mut engine, "post", "/v1/invoices/in_ghost/pay", json!({}));
    assert_eq!(error.http_status(), 404);

    let state = engine.state();
    assert!(state.charges.is_empty());
    assert!(state.balance_transactions.is_empty());
    assert!(state.application_fees.is_empty());
}

#[test]
fn literal_suffix_route_wins_over_the_update_catch_all() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/invoices", json!({ "amount_due": 100 }));

    // Dispatches to pay, not to update with a stray path segment.
    let paid = ok(&mut engine, "post", "/v1/invoices/test_in_1/pay", json!({}));
    assert_eq!(paid["paid"], json!(true));

    // The plain wildcard still reaches update.
    let updated = ok(
        &mut engine,
        "post",
        "/v1/invoices/test_in_1",
        json!({ "description": "note" }),
    );
    assert_eq!(updated["description"], json!("note"));
}

#[test]
fn update_drops_caller_supplied_lines() {
    let mut engine = engine();
    let invoice = ok(&mut engine, "post", "/v1/invoices", json!({}));
    let original_lines = invoice["lines"].clone();

    let updated = ok(
        &mut engine,
        "post",
        "/v1/invoices/test_in_1",
        json!({ "lines": [], "description": "kept" }),
    );
    assert_eq!(updated["lines"], original_lines);
    assert_eq!(updated["description"], json!("kept"));
}

#[test]
fn line_items_endpoint_returns_the_lines_envelope() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/invoices", json!({}));

    let lines = ok(&mut engine, "get", "/v1/invoices/test_in_1/lines", json!({}));
    assert_eq!(lines["object"], json!("list"));
    assert_eq!(lines["data"][0]["object"], json!("line_item"));

    let error = err(&mut engine, "get", "/v1/invoices/in_ghost/lines", json!({}));
    assert_eq!(error.http_status(), 404);
}

#[test]
fn list_filters_by_customer() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/invoices", json!({ "customer": "cus_a" }));
    ok(&mut engine, "post", "/v1/invoices", json!({ "customer": "cus_b" }));
    ok(&mut engine, "post", "/v1/invoices", json!({ "customer": "cus_a" }));

    let listed = ok(&mut engine, "get", "/v1/invoices", json!({ "customer": "cus_a" }));
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(listed["total_count"], json!(2));

    let all = ok(&mut engine, "get", "/v1/invoices", json!({}));
    assert_eq!(all["total_count"], json!(3));
}

#[test]
fn charge_creation_requires_an_amount() {
    let mut engine = engine();
    let error = err(&mut engine, "post", "/v1/charges", json!({}));
    assert_eq!(error.http_status(), 400);
    assert_eq!(error.param(), Some("amount"));
    assert!(engine.state().charges.is_empty());
}

#[test]
fn charge_update_merges_and_retrieval_sees_it() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/charges", json!({ "amount": 900 }));

    let updated = ok(
        &mut engine,
        "post",
        "/v1/charges/test_ch_1",
        json!({ "description": "order 42" }),
    );
    assert_eq!(updated["description"], json!("order 42"));
    assert_eq!(updated["amount"], json!(900));

    let fetched = ok(&mut engine, "get", "/v1/charges/test_ch_1", json!({}));
    assert_eq!(fetched, updated);
}

#[test]
fn upcoming_requires_a_customer_param() {
    let mut engine = engine();
    let error = err(&mut engine, "get", "/v1/invoices/upcoming", json!({}));
    assert_eq!(error.http_status(), 400);
    assert_eq!(error.param(), Some("customer"));
}

#[test]
fn upcoming_needs_an_active_subscription() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/customers", json!({}));

    let error = err(
        &mut engine,
        "get",
        "/v1/invoices/upcoming",
        json!({ "customer": "test_cus_1" }),
    );
    assert_eq!(error.http_status(), 404);
}

#[test]
fn upcoming_projects_the_soonest_renewing_subscription() {
    let mut engine = engine();
    ok(&mut engine, "post", "/v1/plans", json!({ "id": "gold", "amount": 2500 }));
    let customer = ok(
        &mut engine,
        "post",
        "/v1/customers",
        json!({ "plan": "gold", "source": "tok_visa" }),
    );
    let subscription_id = customer["subscriptions"]["data"][0]["id"].clone();

    let upcoming = ok(
        &mut engine,
        "get",
        "/v1/invoices/upcoming",
        json!({ "customer": customer["id"] }),
    );
    assert_eq!(upcoming["object"], json!("invoice"));
    assert_eq!(upcoming["customer"], customer["id"]);
    assert_eq!(upcoming["subscription"], subscription_id);

    let line = &upcoming["lines"]["data"][0];
    assert_eq!(line["type"], json!("subscription"));
    assert_eq!(line["amount"], json!(2500));
    assert_eq!(upcoming["amount_due"], json!(2500));
}
