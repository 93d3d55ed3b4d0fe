use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::{json, Value};
use upi_payment_engine::{
    db_types::{Order, OrderItem, OrderStatusType, Paise, Product},
    payment_objects::PaymentLink,
    traits::{OrderManagementError, UtrBindResult},
    BridgeError,
    OrderFlowApi,
    PAYMENT_LINK_UNAVAILABLE,
};

use super::{
    helpers::{bearer, configure_customer_auth, customer, order, send, CUSTOMER_TOKEN},
    mocks::{MockBackend, MockBridge},
};
use crate::{
    middleware::CustomerAuthMiddlewareFactory,
    routes::{CreateOrderRoute, MyOrdersRoute, SubmitUtrRoute},
};

#[actix_web::test]
async fn create_order_without_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").set_json(cart());
    let (status, body) = send(req, configure_untouched_backend).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication is required."}"#);
}

#[actix_web::test]
async fn create_order_with_unknown_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").insert_header(bearer("not-a-real-token")).set_json(cart());
    let (status, body) = send(req, configure_untouched_backend).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"The access token is invalid or has expired."}"#);
}

#[actix_web::test]
async fn create_order_reprices_from_catalog() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").insert_header(bearer(CUSTOMER_TOKEN)).set_json(cart());
    let (status, body) = send(req, configure_happy_order).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["order"]["id"], json!(42));
    assert_eq!(created["order"]["total_amount"], json!(299.0));
    assert_eq!(created["order"]["status"], json!("pending"));
    assert_eq!(created["order"]["transaction_id"], json!("ORD42-1791018000"));
    assert_eq!(created["items"][0]["product_name"], json!("Masala chai"));
    assert_eq!(created["payment"]["pay_url"], json!("/payment/ORD42-1791018000"));
    assert!(created["payment_note"].is_null());
}

#[actix_web::test]
async fn create_order_survives_bridge_failure() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").insert_header(bearer(CUSTOMER_TOKEN)).set_json(cart());
    let (status, body) = send(req, configure_unreachable_bridge).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["order"]["id"], json!(42));
    assert!(created["order"]["transaction_id"].is_null());
    assert!(created["payment"].is_null());
    assert_eq!(created["payment_note"], json!(PAYMENT_LINK_UNAVAILABLE));
}

#[actix_web::test]
async fn create_order_needs_shipping_profile() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").insert_header(bearer(CUSTOMER_TOKEN)).set_json(cart());
    let (status, body) = send(req, configure_customer_without_profile).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(body.contains("shipping address"));
}

#[actix_web::test]
async fn create_order_with_empty_cart() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/orders").insert_header(bearer(CUSTOMER_TOKEN)).set_json(json!({ "items": [] }));
    let (status, body) = send(req, configure_untouched_backend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"An order must contain at least one item."}"#);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders").insert_header(bearer(CUSTOMER_TOKEN));
    let (status, body) = send(req, configure_my_orders).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["id"], json!(42));
    assert_eq!(orders[0]["items"], json!([]));
}

#[actix_web::test]
async fn submit_utr() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders/42/confirm")
        .insert_header(bearer(CUSTOMER_TOKEN))
        .set_json(json!({ "utr_number": "407123456789" }));
    let (status, body) = send(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["already_submitted"], json!(false));
    assert_eq!(result["order"]["status"], json!("awaiting_verification"));
    assert_eq!(result["order"]["utr_number"], json!("407123456789"));
}

#[actix_web::test]
async fn submit_malformed_utr() {
    let _ = env_logger::try_init().ok();
    for utr in ["12345678901", "40712345678X", "4071 2345 6789"] {
        let req = TestRequest::post()
            .uri("/orders/42/confirm")
            .insert_header(bearer(CUSTOMER_TOKEN))
            .set_json(json!({ "utr_number": utr }));
        let (status, body) = send(req, configure_pending_order).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{utr} should be rejected");
        assert!(body.contains("exactly 12 digits"), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn resubmit_utr_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders/42/confirm")
        .insert_header(bearer(CUSTOMER_TOKEN))
        .set_json(json!({ "utr_number": "407123456789" }));
    let (status, body) = send(req, configure_awaiting_order).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["already_submitted"], json!(true));
    assert_eq!(result["message"], json!("Payment details were already submitted for this order."));
}

#[actix_web::test]
async fn submit_utr_used_elsewhere() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders/42/confirm")
        .insert_header(bearer(CUSTOMER_TOKEN))
        .set_json(json!({ "utr_number": "407123456789" }));
    let (status, body) = send(req, configure_utr_conflict).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"UTR 407123456789 has already been used for a different payment."}"#);
}

#[actix_web::test]
async fn submit_utr_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders/43/confirm")
        .insert_header(bearer(CUSTOMER_TOKEN))
        .set_json(json!({ "utr_number": "407123456789" }));
    let (status, body) = send(req, configure_pending_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Order 43 was not found."}"#);
}

#[actix_web::test]
async fn submit_utr_for_cancelled_order() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/orders/42/confirm")
        .insert_header(bearer(CUSTOMER_TOKEN))
        .set_json(json!({ "utr_number": "407123456789" }));
    let (status, _) = send(req, configure_cancelled_order).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn cart() -> Value {
    // The client's total is wrong on purpose
    json!({ "items": [{ "product_id": 1, "quantity": 2 }], "total_amount": 1.0 })
}

fn chai() -> Product {
    Product {
        id: 1,
        name: "Masala chai".into(),
        description: "Assam CTC with cardamom".into(),
        price: Paise::from(14950),
        image_url: String::default(),
        is_available: true,
    }
}

fn link_for(transaction_id: &str) -> PaymentLink {
    PaymentLink {
        transaction_id: transaction_id.to_string(),
        upi_uri: format!("upi://pay?pa=chai.shop%40okicici&pn=Chai%20Shop&am=299.00&cu=INR&tn=Order%20%2342&tr={transaction_id}"),
        intent_url: String::default(),
        pay_url: format!("/payment/{transaction_id}"),
        qr_url: format!("/payment/{transaction_id}/qr"),
    }
}

fn awaiting(order_id: i64) -> Order {
    Order { utr_number: Some("407123456789".into()), ..order(order_id, OrderStatusType::AwaitingVerification) }
}

fn mount(cfg: &mut ServiceConfig, backend: MockBackend, bridge: MockBridge) {
    cfg.app_data(web::Data::new(OrderFlowApi::new(backend, bridge))).service(
        web::scope("/orders")
            .wrap(CustomerAuthMiddlewareFactory::<MockBackend>::new())
            .service(CreateOrderRoute::<MockBackend, MockBridge>::new())
            .service(MyOrdersRoute::<MockBackend, MockBridge>::new())
            .service(SubmitUtrRoute::<MockBackend, MockBridge>::new()),
    );
}

/// No expectations are set, so any backend or bridge call fails the test.
fn configure_untouched_backend(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    mount(cfg, MockBackend::new(), MockBridge::new());
}

fn configure_customer_without_profile(cfg: &mut ServiceConfig) {
    let mut user = customer();
    user.phone = None;
    configure_customer_auth(cfg, user);
    mount(cfg, MockBackend::new(), MockBridge::new());
}

fn priced_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_products().returning(|_| Ok(vec![chai()]));
    backend
        .expect_insert_order()
        .withf(|o| o.user_id == 7 && o.total_amount == Paise::from(29900))
        .times(1)
        .returning(|o| Ok(Order { total_amount: o.total_amount, transaction_id: None, ..order(42, OrderStatusType::Pending) }));
    backend.expect_fetch_order_items().returning(|order_id| {
        Ok(vec![OrderItem {
            id: 1,
            order_id,
            product_id: 1,
            product_name: "Masala chai".into(),
            quantity: 2,
            price: Paise::from(14950),
        }])
    });
    backend
}

fn configure_happy_order(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = priced_backend();
    backend.expect_attach_transaction_id().times(1).returning(|order_id, transaction_id| {
        Ok(Order { transaction_id: Some(transaction_id.to_string()), ..order(order_id, OrderStatusType::Pending) })
    });
    let mut bridge = MockBridge::new();
    bridge
        .expect_request_payment_link()
        .withf(|req| req.order_id == 42 && req.amount == Paise::from(29900) && req.transaction_id.starts_with("ORD42-"))
        .returning(|_| Ok(link_for("ORD42-1791018000")));
    mount(cfg, backend, bridge);
}

fn configure_unreachable_bridge(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = priced_backend();
    backend.expect_attach_transaction_id().never();
    let mut bridge = MockBridge::new();
    bridge.expect_request_payment_link().returning(|_| Err(BridgeError::Unreachable("connection refused".into())));
    mount(cfg, backend, bridge);
}

fn configure_my_orders(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = MockBackend::new();
    backend.expect_fetch_orders_for_user().withf(|user_id| *user_id == 7).returning(|_| {
        Ok(vec![upi_payment_engine::order_objects::OrderView {
            order: order(42, OrderStatusType::Pending),
            customer: None,
            items: vec![],
        }])
    });
    mount(cfg, backend, MockBridge::new());
}

/// Order 42 is pending and belongs to the customer. Every other order id belongs to somebody else.
fn configure_pending_order(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_for_user()
        .returning(|order_id, user_id| Ok((order_id == 42 && user_id == 7).then(|| order(42, OrderStatusType::Pending))));
    backend
        .expect_bind_utr_to_order()
        .withf(|order_id, user_id, utr| *order_id == 42 && *user_id == 7 && utr.as_str() == "407123456789")
        .returning(|order_id, _, _| Ok(UtrBindResult::Bound(awaiting(order_id))));
    mount(cfg, backend, MockBridge::new());
}

fn configure_awaiting_order(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_for_user().returning(|order_id, _| Ok(Some(awaiting(order_id))));
    backend.expect_bind_utr_to_order().never();
    mount(cfg, backend, MockBridge::new());
}

fn configure_utr_conflict(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_for_user().returning(|order_id, _| Ok(Some(order(order_id, OrderStatusType::Pending))));
    backend
        .expect_bind_utr_to_order()
        .returning(|_, _, utr| Err(OrderManagementError::UtrAlreadyBound(utr.to_string())));
    mount(cfg, backend, MockBridge::new());
}

fn configure_cancelled_order(cfg: &mut ServiceConfig) {
    configure_customer_auth(cfg, customer());
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_for_user()
        .returning(|order_id, _| Ok(Some(order(order_id, OrderStatusType::Cancelled))));
    backend.expect_bind_utr_to_order().never();
    mount(cfg, backend, MockBridge::new());
}
