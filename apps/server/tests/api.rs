//! Router contract tests: real handlers, in-memory SQLite, no network.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tavola_core::{Allergen, Category, MenuItem, NewTable};
use tavola_db::{Database, DbConfig};
use tavola_server::{
    build_router, sign_confirmation, AppState, CheckoutRequest, CheckoutSession,
    PaymentConfirmation, PaymentError, PaymentGateway, ServerConfig,
};
use tower::ServiceExt;

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    router: Router,
    table_id: String,
}

/// Gateway whose provider is always down.
struct DownGateway;

#[async_trait]
impl PaymentGateway for DownGateway {
    async fn create_checkout(&self, _: CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError::Unavailable("connection refused".into()))
    }

    async fn confirm_payment(&self, _: &PaymentConfirmation) -> Result<(), PaymentError> {
        Err(PaymentError::Unavailable("connection refused".into()))
    }
}

/// Menu: nachos 850, wings 900, burger 1200, special 1500 (unavailable).
/// One active table, number 7.
async fn seeded_db() -> (Database, String) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let menu = db.menu();

    menu.insert_category(&Category {
        id: "cat-food".into(),
        slug: "appetizers".into(),
        name: "Appetizers".into(),
        name_it: "Stuzzicherie".into(),
        display_order: 1,
    })
    .await
    .unwrap();

    for (id, price, available) in [
        ("nachos", 850, true),
        ("wings", 900, true),
        ("burger", 1200, true),
        ("special", 1500, false),
    ] {
        menu.insert_item(&MenuItem {
            id: id.into(),
            category_id: "cat-food".into(),
            name: format!("Item {}", id),
            name_it: format!("Piatto {}", id),
            description: None,
            description_it: None,
            price_cents: price,
            allergens: vec![Allergen::Gluten],
            available,
            featured: false,
            abv: None,
            origin: None,
            style: None,
        })
        .await
        .unwrap();
    }

    let table = db
        .tables()
        .create(
            &NewTable {
                number: "7".into(),
                capacity: None,
            },
            "http://localhost:3000",
        )
        .await
        .unwrap();

    (db, table.id)
}

const SIGNING_SECRET: &str = "whsec_test_0123456789abcdef";

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.payments.signing_secret = SIGNING_SECRET.to_string();
    config
}

async fn app() -> TestApp {
    let (db, table_id) = seeded_db().await;
    let state = AppState::new(db, test_config()).unwrap();
    TestApp {
        router: build_router(state),
        table_id,
    }
}

async fn app_with_gateway(gateway: Arc<dyn PaymentGateway>) -> TestApp {
    let (db, table_id) = seeded_db().await;
    let state = AppState::with_gateway(db, test_config(), gateway);
    TestApp {
        router: build_router(state),
        table_id,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    async fn open_session(&self) -> String {
        let (status, body) = self
            .post("/api/sessions", json!({ "tableId": self.table_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["sessionId"].as_str().unwrap().to_string()
    }

    async fn add(&self, sid: &str, item: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/sessions/{}/cart/items", sid),
                json!({ "menuItemId": item }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    /// Places a counter order for one burger and returns its id.
    async fn place_order(&self) -> String {
        let (status, body) = self.post("/api/orders", burger_order(None)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["orderId"].as_str().unwrap().to_string()
    }
}

fn burger_order(key: Option<&str>) -> Value {
    json!({
        "items": [{ "menuItemId": "burger", "quantity": 1, "unitPriceCents": 1200 }],
        "subtotalCents": 1200,
        "taxCents": 264,
        "tipCents": 200,
        "totalCents": 1664,
        "idempotencyKey": key,
    })
}

// =============================================================================
// Health & Menu
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["migrations"]["applied"], body["migrations"]["total"]);
}

#[tokio::test]
async fn test_menu_hides_unavailable_items() {
    let app = app().await;
    let (status, body) = app.get("/api/menu").await;

    assert_eq!(status, StatusCode::OK);
    let items = body["sections"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i["id"] != "special"));

    let (status, _) = app.get("/api/menu/items/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Sessions & Cart
// =============================================================================

#[tokio::test]
async fn test_cart_totals_scenario() {
    let app = app().await;
    let sid = app.open_session().await;

    app.add(&sid, "nachos").await;
    app.add(&sid, "wings").await;
    let body = app.add(&sid, "wings").await;

    let cart = &body["cart"];
    assert_eq!(cart["itemCount"], 2);
    assert_eq!(cart["totalQuantity"], 3);
    assert_eq!(cart["subtotalCents"], 2650);
    assert_eq!(cart["taxCents"], 583);
    assert_eq!(cart["tipCents"], 0);
    assert_eq!(cart["totalCents"], 3233);
}

#[tokio::test]
async fn test_cart_operations() {
    let app = app().await;
    let sid = app.open_session().await;

    let line_id = app.add(&sid, "burger").await["lineId"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, cart) = app
        .send(
            Method::PUT,
            &format!("/api/sessions/{}/cart/tip", sid),
            Some(json!({ "tipCents": 200 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotalCents"], 1200);
    assert_eq!(cart["taxCents"], 264);
    assert_eq!(cart["totalCents"], 1664);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/sessions/{}/cart/tip", sid),
            Some(json!({ "tipCents": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, cart) = app
        .patch(
            &format!("/api/sessions/{}/cart/items/{}", sid, line_id),
            json!({ "quantity": 3 }),
        )
        .await;
    assert_eq!(cart["subtotalCents"], 3600);

    // Unknown line is a no-op
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/sessions/{}/cart/items/missing", sid),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, cart) = app
        .patch(
            &format!("/api/sessions/{}/cart/items/{}", sid, line_id),
            json!({ "quantity": 0 }),
        )
        .await;
    assert_eq!(cart["itemCount"], 0);
    assert_eq!(cart["subtotalCents"], 0);
    assert_eq!(cart["totalCents"], 200);

    let (_, cart) = app
        .send(Method::DELETE, &format!("/api/sessions/{}/cart", sid), None)
        .await;
    assert_eq!(cart["tipCents"], 0);
    assert_eq!(cart["totalCents"], 0);
}

#[tokio::test]
async fn test_oversized_tip_is_rejected_and_other_carts_keep_working() {
    let app = app().await;
    let sid = app.open_session().await;
    let other = app.open_session().await;
    app.add(&sid, "burger").await;
    app.add(&other, "nachos").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/sessions/{}/cart/tip", sid),
            Some(json!({ "tipCents": i64::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, cart) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["tipCents"], 0);
    assert_eq!(cart["totalCents"], 1464);

    let (status, cart) = app.get(&format!("/api/sessions/{}/cart", other)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotalCents"], 850);

    let (status, cart) = app
        .send(
            Method::PUT,
            &format!("/api/sessions/{}/cart/tip", sid),
            Some(json!({ "tipCents": 100_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totalCents"], 1464 + 100_000);
}

#[tokio::test]
async fn test_add_item_rejects_unavailable_and_unknown() {
    let app = app().await;
    let sid = app.open_session().await;

    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/cart/items", sid),
            json!({ "menuItemId": "special" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .post(
            &format!("/api/sessions/{}/cart/items", sid),
            json!({ "menuItemId": "ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_need_known_table() {
    let app = app().await;

    let (status, body) = app
        .post("/api/sessions", json!({ "tableId": "no-such-table" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app.get("/api/sessions/unknown/cart").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let sid = app.open_session().await;
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/sessions/{}", sid), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_counter_checkout_creates_order_and_clears_cart() {
    let app = app().await;
    let sid = app.open_session().await;
    app.add(&sid, "burger").await;

    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "counter" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["replayed"], false);
    assert!(body.get("checkout").is_none());
    assert_eq!(body["order"]["status"], "PENDING");
    assert_eq!(body["order"]["paymentStatus"], "UNPAID");
    assert_eq!(body["order"]["tableId"], app.table_id.as_str());
    assert_eq!(body["order"]["totalCents"], 1464);

    let (_, cart) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(cart["itemCount"], 0);

    // Nothing left to submit
    let (status, _) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "counter" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gateway_failure_keeps_cart_and_retry_reuses_order() {
    let app = app_with_gateway(Arc::new(DownGateway)).await;
    let sid = app.open_session().await;
    app.add(&sid, "burger").await;

    for _ in 0..2 {
        let (status, body) = app
            .post(
                &format!("/api/sessions/{}/checkout", sid),
                json!({ "payment": "online" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "PAYMENT_ERROR");
    }

    let (_, cart) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(cart["itemCount"], 1);

    let (_, orders) = app.get("/api/orders").await;
    assert_eq!(orders["orders"].as_array().unwrap().len(), 1);
    assert_eq!(orders["orders"][0]["paymentStatus"], "UNPAID");

    // Fall back to paying at the counter: same order, cart cleared
    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "counter" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replayed"], true);
    assert_eq!(body["orderId"], orders["orders"][0]["id"]);

    let (_, cart) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_online_checkout_and_payment_confirmation() {
    let app = app().await;
    let sid = app.open_session().await;
    app.add(&sid, "burger").await;

    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "online", "idempotencyKey": "guest-attempt-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let order_id = body["orderId"].as_str().unwrap().to_string();
    let session_id = body["checkout"]["sessionId"].as_str().unwrap().to_string();
    let redirect = body["checkout"]["redirectUrl"].as_str().unwrap();
    assert!(redirect.starts_with("http://localhost:3000/pay?"));
    assert!(redirect.contains("amount=1464"));

    // What the hosted page sends back after charging 14.64
    let signature = sign_confirmation(SIGNING_SECRET, &session_id, &order_id, 1464).unwrap();

    let (status, _) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": "cs_forged", "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": session_id, "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["order"]["paymentStatus"], "PAID");

    // A repeated callback is harmless
    let (status, body) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": session_id, "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["paymentStatus"], "PAID");

    // Paid orders cannot be checked out again
    let (status, body) = app
        .post(&format!("/api/orders/{}/checkout", order_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_guest_cannot_confirm_own_payment() {
    let app = app().await;
    let sid = app.open_session().await;
    app.add(&sid, "burger").await;

    let (_, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "online" }),
        )
        .await;
    let order_id = body["orderId"].as_str().unwrap().to_string();
    let session_id = body["checkout"]["sessionId"].as_str().unwrap().to_string();

    // Everything the checkout response gave the guest, without a signature
    let (status, _) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": session_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let forged = sign_confirmation("not-the-real-secret", &session_id, &order_id, 1464).unwrap();
    let (status, body) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": session_id, "signature": forged }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PAYMENT_ERROR");

    // Signed for a smaller amount than the order's total
    let cheap = sign_confirmation(SIGNING_SECRET, &session_id, &order_id, 1).unwrap();
    let (status, _) = app
        .post(
            "/api/payments/confirm",
            json!({ "orderId": order_id, "sessionId": session_id, "signature": cheap }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/orders/{}", order_id)).await;
    assert_eq!(body["order"]["paymentStatus"], "UNPAID");
}

#[tokio::test]
async fn test_key_of_another_order_does_not_clear_cart() {
    let app = app().await;
    let (status, _) = app.post("/api/orders", burger_order(Some("shared-key"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let sid = app.open_session().await;
    app.add(&sid, "wings").await;

    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "counter", "idempotencyKey": "shared-key" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, cart) = app.get(&format!("/api/sessions/{}/cart", sid)).await;
    assert_eq!(cart["itemCount"], 1);

    // Without the borrowed key the guest's own order goes through
    let (status, body) = app
        .post(
            &format!("/api/sessions/{}/checkout", sid),
            json!({ "payment": "counter" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["replayed"], false);
    assert_eq!(body["order"]["items"][0]["menuItemId"], "wings");

    let (_, orders) = app.get("/api/orders").await;
    assert_eq!(orders["orders"].as_array().unwrap().len(), 2);
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_create_order_contract() {
    let app = app().await;

    let (status, body) = app
        .post(
            "/api/orders",
            json!({ "items": [], "subtotalCents": 0, "taxCents": 0, "totalCents": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let mut tampered = burger_order(None);
    tampered["items"][0]["unitPriceCents"] = json!(1);
    let (status, body) = app.post("/api/orders", tampered).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRICE_MISMATCH");

    let (status, first) = app.post("/api/orders", burger_order(Some("k-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let number = first["orderNumber"].as_str().unwrap();
    assert!(number.starts_with("ORD-"));
    assert!(number.ends_with("-0001"));
    assert_eq!(first["order"]["items"][0]["name"], "Item burger");

    let (status, again) = app.post("/api/orders", burger_order(Some("k-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["replayed"], true);
    assert_eq!(again["orderNumber"], first["orderNumber"]);

    let mut different = burger_order(Some("k-1"));
    different["tipCents"] = json!(0);
    different["totalCents"] = json!(1464);
    let (status, body) = app.post("/api/orders", different).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let mut huge_tip = burger_order(Some("k-huge"));
    huge_tip["tipCents"] = json!(i64::MAX);
    huge_tip["totalCents"] = json!(i64::MAX);
    let (status, body) = app.post("/api/orders", huge_tip).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, second) = app.post("/api/orders", burger_order(Some("k-2"))).await;
    assert!(second["orderNumber"].as_str().unwrap().ends_with("-0002"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let app = app().await;
    let id = app.place_order().await;
    let uri = format!("/api/orders/{}", id);

    let (status, body) = app.patch(&uri, json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, _) = app.patch(&uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for next in ["CONFIRMED", "PREPARING", "READY", "DELIVERED"] {
        let (status, body) = app.patch(&uri, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["order"]["status"], next);
        assert!(body["order"]["completedAt"].is_null());
    }

    let (_, body) = app
        .patch(&uri, json!({ "status": "COMPLETED", "paymentStatus": "PAID" }))
        .await;
    assert_eq!(body["order"]["status"], "COMPLETED");
    assert_eq!(body["order"]["paymentStatus"], "PAID");
    assert!(!body["order"]["completedAt"].is_null());

    let (status, _) = app.patch(&uri, json!({ "status": "CANCELLED" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .patch("/api/orders/missing", json!({ "status": "CONFIRMED" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_filters() {
    let app = app().await;
    let first = app.place_order().await;
    let second = app.place_order().await;

    app.patch(&format!("/api/orders/{}", first), json!({ "status": "CONFIRMED" }))
        .await;

    let (_, all) = app.get("/api/orders").await;
    let ids: Vec<&str> = all["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);

    let (_, confirmed) = app.get("/api/orders?status=CONFIRMED").await;
    assert_eq!(confirmed["orders"].as_array().unwrap().len(), 1);
    assert_eq!(confirmed["orders"][0]["id"], first.as_str());

    let (status, _) = app.get("/api/orders?status=SHIPPED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let number = all["orders"][1]["orderNumber"].as_str().unwrap().to_string();
    let (status, found) = app.get(&format!("/api/orders?orderNumber={}", number)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["orders"].as_array().unwrap().len(), 1);
    assert_eq!(found["orders"][0]["id"], first.as_str());

    let (status, body) = app.get("/api/orders?orderNumber=ORDER-7").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.get(&format!("/api/orders/{}", second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["id"], second.as_str());
}

// =============================================================================
// Tables & Reservations
// =============================================================================

#[tokio::test]
async fn test_tables_and_links() {
    let app = app().await;

    let (status, body) = app
        .post("/api/tables", json!({ "number": "12", "capacity": 6 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["table"]["id"].as_str().unwrap().to_string();
    assert_eq!(
        body["table"]["orderingUrl"],
        format!("http://localhost:3000/qr-menu/{}", id)
    );

    let (status, body) = app.post("/api/tables", json!({ "number": "12" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = app.post("/api/tables", json!({ "number": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/tables").await;
    let numbers: Vec<&str> = body["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["7", "12"]);

    let (status, link) = app.get(&format!("/api/tables/{}/link", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(link["number"], "12");
    assert_eq!(link["orderingUrl"], format!("http://localhost:3000/qr-menu/{}", id));
}

#[tokio::test]
async fn test_reservations() {
    let app = app().await;

    let (status, body) = app
        .post("/api/reservations", json!({ "name": "Rossi", "email": "r@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post(
            "/api/reservations",
            json!({
                "name": "Rossi",
                "email": "rossi@example.com",
                "phone": "+39 055 123456",
                "date": "2099-06-01",
                "time": "20:00",
                "guests": 4,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["reservation"]["status"], "PENDING");
    let id = body["reservationId"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/api/reservations/{}", id),
            json!({ "status": "CONFIRMED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservation"]["status"], "CONFIRMED");

    let (_, body) = app.get("/api/reservations?date=2099-06-01").await;
    assert_eq!(body["reservations"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/reservations?status=CANCELLED").await;
    assert!(body["reservations"].as_array().unwrap().is_empty());
}
