mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

use common::{read_json, TestApp};

async fn seed_item(app: &TestApp, name: &str, price: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/items",
            Some(json!({"name": name, "category": "pizza", "price": price})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["id"].as_i64().unwrap()
}

fn invoice_payload(invoice_number: &str, customer: &str, items: Value) -> Value {
    json!({
        "invoice_number": invoice_number,
        "customer_name": customer,
        "customer_phone": "555-0100",
        "date": Utc::now().to_rfc3339(),
        "items": items,
    })
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal as string")).expect("parse decimal")
}

#[tokio::test]
async fn create_returns_invoice_with_all_line_items() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "9.50").await;
    let cola = seed_item(&app, "Cola", "2.50").await;

    let payload = invoice_payload(
        "INV-001",
        "Ada Lovelace",
        json!([
            {"item_id": margherita, "quantity": 2, "price": "9.50"},
            {"item_id": cola, "quantity": 3, "price": "2.50"},
        ]),
    );

    let response = app.request(Method::POST, "/invoices", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = read_json(response).await;
    let invoice_id = created["id"].as_i64().expect("generated id");
    assert_eq!(created["invoice_number"], "INV-001");
    assert_eq!(created["customer_name"], "Ada Lovelace");
    // Total is recomputed server-side: 2 x 9.50 + 3 x 2.50
    assert_eq!(decimal(&created["total"]), dec!(26.50));

    let items = created["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for line in items {
        assert_eq!(line["invoice_id"].as_i64().unwrap(), invoice_id);
    }

    let fetched = read_json(
        app.request(Method::GET, &format!("/invoices/{}", invoice_id), None)
            .await,
    )
    .await;
    assert_eq!(fetched["items"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&fetched["total"]), dec!(26.50));
}

#[tokio::test]
async fn get_missing_invoice_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/invoices/9999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rolls_back_when_a_line_references_a_missing_item() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "9.50").await;

    let payload = invoice_payload(
        "INV-001",
        "Ada Lovelace",
        json!([
            {"item_id": margherita, "quantity": 1, "price": "9.50"},
            // No such item: the foreign key rejects this line.
            {"item_id": 9999, "quantity": 1, "price": "1.00"},
        ]),
    );

    let response = app.request(Method::POST, "/invoices", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The whole transaction rolled back: no invoice, no orphan lines.
    let listed = read_json(app.request(Method::GET, "/invoices", None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn duplicate_invoice_numbers_are_rejected_and_the_first_survives() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "9.50").await;

    let first = read_json(
        app.request(
            Method::POST,
            "/invoices",
            Some(invoice_payload(
                "INV-001",
                "Ada Lovelace",
                json!([{"item_id": margherita, "quantity": 1, "price": "9.50"}]),
            )),
        )
        .await,
    )
    .await;
    let first_id = first["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/invoices",
            Some(invoice_payload(
                "INV-001",
                "Grace Hopper",
                json!([{"item_id": margherita, "quantity": 2, "price": "9.50"}]),
            )),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Store failures surface as a generic message only.
    let body = read_json(response).await;
    assert_eq!(body["message"], "Database error");

    let fetched = read_json(
        app.request(Method::GET, &format!("/invoices/{}", first_id), None)
            .await,
    )
    .await;
    assert_eq!(fetched["customer_name"], "Ada Lovelace");
    assert_eq!(fetched["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_fully_replaces_line_items_and_preserves_invoice_number() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "9.50").await;
    let cola = seed_item(&app, "Cola", "2.50").await;
    let tiramisu = seed_item(&app, "Tiramisu", "5.00").await;

    let created = read_json(
        app.request(
            Method::POST,
            "/invoices",
            Some(invoice_payload(
                "INV-001",
                "Ada Lovelace",
                json!([
                    {"item_id": margherita, "quantity": 1, "price": "9.50"},
                    {"item_id": cola, "quantity": 1, "price": "2.50"},
                ]),
            )),
        )
        .await,
    )
    .await;
    let invoice_id = created["id"].as_i64().unwrap();
    assert_eq!(created["version"], 1);

    // Replacement payload carries a different invoice_number; it must be ignored.
    let update = json!({
        "invoice_number": "INV-999",
        "customer_name": "Ada L.",
        "customer_phone": null,
        "date": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "items": [
            {"item_id": tiramisu, "quantity": 2, "price": "5.00"},
        ],
    });

    let response = app
        .request(Method::PUT, &format!("/invoices/{}", invoice_id), Some(update))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = read_json(response).await;
    assert_eq!(updated["invoice_number"], "INV-001");
    assert_eq!(updated["customer_name"], "Ada L.");
    assert_eq!(updated["version"], 2);
    assert_eq!(decimal(&updated["total"]), dec!(10.00));

    let fetched = read_json(
        app.request(Method::GET, &format!("/invoices/{}", invoice_id), None)
            .await,
    )
    .await;
    let items = fetched["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["item_id"].as_i64().unwrap(), tiramisu);
    assert_eq!(items[0]["invoice_id"].as_i64().unwrap(), invoice_id);
}

#[tokio::test]
async fn update_missing_invoice_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/invoices/9999",
            Some(invoice_payload("INV-001", "Ada Lovelace", json!([]))),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_invoice_and_its_lines() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "9.50").await;

    let created = read_json(
        app.request(
            Method::POST,
            "/invoices",
            Some(invoice_payload(
                "INV-001",
                "Ada Lovelace",
                json!([{"item_id": margherita, "quantity": 1, "price": "9.50"}]),
            )),
        )
        .await,
    )
    .await;
    let invoice_id = created["id"].as_i64().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/invoices/{}", invoice_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Invoice deleted successfully");

    let response = app
        .request(Method::GET, &format!("/invoices/{}", invoice_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed = read_json(app.request(Method::GET, "/invoices", None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn delete_missing_invoice_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request(Method::DELETE, "/invoices/9999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
