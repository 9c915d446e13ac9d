mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
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

async fn seed_invoice(
    app: &TestApp,
    invoice_number: &str,
    date: DateTime<Utc>,
    items: Value,
) -> Value {
    let response = app
        .request(
            Method::POST,
            "/invoices",
            Some(json!({
                "invoice_number": invoice_number,
                "customer_name": "Ada Lovelace",
                "date": date.to_rfc3339(),
                "items": items,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal as string")).expect("parse decimal")
}

#[tokio::test]
async fn metrics_with_no_data_are_all_zero() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/dashboard/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let metrics = read_json(response).await;
    assert_eq!(metrics["totalOrders"], 0);
    assert_eq!(metrics["totalItems"], 0);
    assert_eq!(metrics["recentOrders"], 0);
    assert_eq!(decimal(&metrics["totalRevenue"]), Decimal::ZERO);
    // No division by zero: both derived values fall back to 0.
    assert_eq!(decimal(&metrics["averageOrderValue"]), Decimal::ZERO);
    assert_eq!(decimal(&metrics["growthRate"]), Decimal::ZERO);
}

#[tokio::test]
async fn metrics_cover_the_recent_window_with_zero_growth_guard() {
    let app = TestApp::new().await;
    let item_a = seed_item(&app, "Margherita", "10.00").await;
    let item_b = seed_item(&app, "Diavola", "20.00").await;
    let item_c = seed_item(&app, "Quattro", "30.00").await;

    // Three invoices dated today with totals 10, 20, and 30; nothing in the
    // prior seven days.
    let now = Utc::now();
    seed_invoice(
        &app,
        "INV-001",
        now,
        json!([{"item_id": item_a, "quantity": 1, "price": "10.00"}]),
    )
    .await;
    seed_invoice(
        &app,
        "INV-002",
        now,
        json!([{"item_id": item_b, "quantity": 1, "price": "20.00"}]),
    )
    .await;
    seed_invoice(
        &app,
        "INV-003",
        now,
        json!([{"item_id": item_c, "quantity": 1, "price": "30.00"}]),
    )
    .await;

    let metrics = read_json(app.request(Method::GET, "/dashboard/metrics", None).await).await;

    assert_eq!(metrics["totalOrders"], 3);
    assert_eq!(metrics["totalItems"], 3);
    assert_eq!(decimal(&metrics["totalRevenue"]), dec!(60));
    assert_eq!(decimal(&metrics["averageOrderValue"]), dec!(20));
    assert_eq!(metrics["recentOrders"], 3);
    assert_eq!(decimal(&metrics["recentRevenue"]), dec!(60));
    // previousWeekRevenue is 0, so the growth rate guard applies.
    assert_eq!(decimal(&metrics["growthRate"]), Decimal::ZERO);
}

#[tokio::test]
async fn growth_rate_compares_the_two_trailing_weeks() {
    let app = TestApp::new().await;
    let item_a = seed_item(&app, "Margherita", "10.00").await;
    let item_b = seed_item(&app, "Quattro", "30.00").await;

    let now = Utc::now();
    seed_invoice(
        &app,
        "INV-001",
        now,
        json!([{"item_id": item_a, "quantity": 6, "price": "10.00"}]),
    )
    .await;
    seed_invoice(
        &app,
        "INV-002",
        now - Duration::days(10),
        json!([{"item_id": item_b, "quantity": 1, "price": "30.00"}]),
    )
    .await;

    let metrics = read_json(app.request(Method::GET, "/dashboard/metrics", None).await).await;

    assert_eq!(metrics["totalOrders"], 2);
    assert_eq!(decimal(&metrics["totalRevenue"]), dec!(90));
    assert_eq!(metrics["recentOrders"], 1);
    assert_eq!(decimal(&metrics["recentRevenue"]), dec!(60));
    // (60 - 30) / 30 * 100
    assert_eq!(decimal(&metrics["growthRate"]), dec!(100));
}

#[tokio::test]
async fn top_items_rank_by_units_sold_across_invoices() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "10.00").await;
    let cola = seed_item(&app, "Cola", "2.50").await;

    let now = Utc::now();
    seed_invoice(
        &app,
        "INV-001",
        now,
        json!([
            {"item_id": margherita, "quantity": 2, "price": "10.00"},
            {"item_id": cola, "quantity": 3, "price": "2.50"},
        ]),
    )
    .await;
    seed_invoice(
        &app,
        "INV-002",
        now,
        json!([{"item_id": margherita, "quantity": 3, "price": "10.00"}]),
    )
    .await;

    let response = app.request(Method::GET, "/dashboard/top-items", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let top = read_json(response).await;
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 2);

    assert_eq!(top[0]["itemName"], "Margherita");
    assert_eq!(top[0]["quantity"], 5);
    assert_eq!(decimal(&top[0]["revenue"]), dec!(50));

    assert_eq!(top[1]["itemName"], "Cola");
    assert_eq!(top[1]["quantity"], 3);
    assert_eq!(decimal(&top[1]["revenue"]), dec!(7.50));
}

#[tokio::test]
async fn recent_orders_return_at_most_five_newest_first() {
    let app = TestApp::new().await;
    let margherita = seed_item(&app, "Margherita", "10.00").await;

    let now = Utc::now();
    for i in 0..6 {
        seed_invoice(
            &app,
            &format!("INV-{:03}", i + 1),
            now - Duration::days(i),
            json!([
                {"item_id": margherita, "quantity": 1, "price": "10.00"},
                {"item_id": margherita, "quantity": 2, "price": "10.00"},
            ]),
        )
        .await;
    }

    let response = app
        .request(Method::GET, "/dashboard/recent-orders", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let orders = read_json(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 5);

    // Strictly descending by date: INV-001 is today, INV-006 fell off.
    assert_eq!(orders[0]["invoiceNumber"], "INV-001");
    assert_eq!(orders[4]["invoiceNumber"], "INV-005");
    let dates: Vec<&str> = orders
        .iter()
        .map(|o| o["date"].as_str().unwrap())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);

    for order in orders {
        assert_eq!(order["itemCount"], 2);
        assert_eq!(order["customerName"], "Ada Lovelace");
        assert_eq!(decimal(&order["total"]), dec!(30));
    }
}
