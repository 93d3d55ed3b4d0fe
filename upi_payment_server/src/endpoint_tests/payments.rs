use actix_web::{
    http::{header::CONTENT_TYPE, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use serde_json::{json, Value};
use upi_payment_engine::{
    db_types::{PaymentSession, PaymentStatus},
    helpers::PayeeConfig,
    traits::PaymentSessionError,
    PaymentSessionApi,
};

use super::{
    helpers::{operator, operator_key, send, session, webhook_secret, OPERATOR_KEY, WEBHOOK_SECRET},
    mocks::MockBackend,
};
use crate::{
    auth::{OperatorKey, WebhookSecret},
    routes::{CreatePaymentRoute, PaymentPageRoute, PaymentQrRoute, PaymentStatusRoute, PaymentWebhookRoute},
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[actix_web::test]
async fn create_payment_rounds_to_paise() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/payment/create").set_json(json!({ "amount": 99.995, "note": "Chai" }));
    let (status, body) = send(req, configure_new_sessions).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_str(&body).unwrap();
    let id = created["transaction_id"].as_str().unwrap();
    assert!(id.starts_with("TXN-") && id.len() == 16, "unexpected transaction id {id}");
    assert_eq!(created["amount"], json!(100.0));
    assert_eq!(created["currency"], json!("INR"));
    assert_eq!(created["status"], json!("PENDING"));
    assert_eq!(
        created["upi_uri"],
        json!(format!("upi://pay?pa=chai.shop%40okicici&pn=Chai%20Shop&am=100.00&cu=INR&tn=Chai&tr={id}"))
    );
    assert_eq!(created["pay_url"], json!(format!("/payment/{id}")));
    assert_eq!(created["qr_url"], json!(format!("/payment/{id}/qr")));
}

#[actix_web::test]
async fn create_payment_with_bad_amount() {
    let _ = env_logger::try_init().ok();
    for amount in [json!(0), json!(-5), json!(0.004)] {
        let req = TestRequest::post().uri("/payment/create").set_json(json!({ "amount": amount }));
        let (status, body) = send(req, configure_untouched).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount} should be rejected");
        assert!(body.starts_with(r#"{"error":"Invalid amount."#), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn create_payment_with_duplicate_transaction_id() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/payment/create").set_json(json!({ "amount": 10, "transaction_id": "INV-2026-0042" }));
    let (status, _) = send(req, configure_new_sessions).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn create_payment_cannot_claim_gateway_ids() {
    let _ = env_logger::try_init().ok();
    for id in ["ORD1-1791018000", "TXN-0123456789AB"] {
        let req = TestRequest::post().uri("/payment/create").set_json(json!({ "amount": 1, "transaction_id": id }));
        let (status, body) = send(req, configure_untouched).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{id} should be rejected");
        assert!(body.contains("is reserved for identifiers issued by the gateway"), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn operator_creates_payment_for_order() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/payment/create")
        .insert_header(operator(OPERATOR_KEY))
        .set_json(json!({ "amount": 299, "note": "Order #1", "transaction_id": "ORD1-1791018000" }));
    let (status, body) = send(req, configure_new_sessions).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["transaction_id"], json!("ORD1-1791018000"));
    assert_eq!(created["amount"], json!(299.0));
}

#[actix_web::test]
async fn create_payment_with_wrong_operator_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/payment/create")
        .insert_header(operator("guess"))
        .set_json(json!({ "amount": 299, "transaction_id": "ORD1-1791018000" }));
    let (status, body) = send(req, configure_untouched).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Invalid credentials."}"#);
}

#[actix_web::test]
async fn payment_status() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/payment/TXN-0123456789AB/status");
    let (status, body) = send(req, configure_existing_session).await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        view,
        json!({
            "transaction_id": "TXN-0123456789AB",
            "amount": 299.0,
            "status": "PENDING",
            "upi_transaction_id": null,
            "message": "Awaiting payment from customer."
        })
    );
}

#[actix_web::test]
async fn unknown_payment_status() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/payment/TXN-FFFFFFFFFFFF/status");
    let (status, body) = send(req, configure_existing_session).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Payment TXN-FFFFFFFFFFFF was not found."}"#);
}

#[actix_web::test]
async fn payment_qr_code() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().configure(configure_existing_session)).await;
    let req = TestRequest::get().uri("/payment/TXN-0123456789AB/qr").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "image/png");
    let body = test::read_body(res).await;
    assert_eq!(&body[..8], &PNG_SIGNATURE);
}

#[actix_web::test]
async fn payment_page() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/payment/TXN-0123456789AB");
    let (status, body) = send(req, configure_existing_session).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("₹299.00"));
    assert!(body.contains(r#"src="/payment/TXN-0123456789AB/qr""#));
    assert!(body.contains("upi://pay?pa=chai.shop%40okicici&amp;pn=Chai%20Shop&amp;am=299.00"));
    assert!(body.contains("Order #42"));
}

#[actix_web::test]
async fn webhook_without_secret() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/webhook/payment").set_json(webhook(None, Some("407123456789")));
    let (status, _) = send(req, configure_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn webhook_with_wrong_secret() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/webhook/payment").set_json(webhook(Some("guess"), Some("407123456789")));
    let (status, body) = send(req, configure_untouched).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Invalid credentials."}"#);
}

#[actix_web::test]
async fn webhook_marks_payment_successful() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/webhook/payment").set_json(webhook(Some(WEBHOOK_SECRET), Some("407123456789")));
    let (status, body) = send(req, configure_webhook_updates).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        result,
        json!({
            "message": "Transaction TXN-0123456789AB updated to SUCCESS",
            "transaction_id": "TXN-0123456789AB",
            "status": "SUCCESS"
        })
    );
}

#[actix_web::test]
async fn webhook_with_malformed_utr() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/webhook/payment").set_json(webhook(Some(WEBHOOK_SECRET), Some("UTR-12")));
    let (status, body) = send(req, configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("exactly 12 digits"));
}

#[actix_web::test]
async fn webhook_with_claimed_utr() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/webhook/payment").set_json(webhook(Some(WEBHOOK_SECRET), Some("555555555555")));
    let (status, _) = send(req, configure_webhook_updates).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn webhook(secret: Option<&str>, utr: Option<&str>) -> Value {
    json!({
        "transaction_id": "TXN-0123456789AB",
        "status": "SUCCESS",
        "upi_transaction_id": utr,
        "payer_vpa": "asha@okaxis",
        "secret_key": secret,
    })
}

fn mount(cfg: &mut ServiceConfig, backend: MockBackend) {
    let payee = PayeeConfig::new("chai.shop@okicici", "Chai Shop");
    cfg.app_data(web::Data::new(PaymentSessionApi::new(backend, payee)))
        .app_data(web::Data::new(OperatorKey(operator_key())))
        .app_data(web::Data::new(WebhookSecret(webhook_secret())))
        .service(CreatePaymentRoute::<MockBackend>::new())
        .service(PaymentQrRoute::<MockBackend>::new())
        .service(PaymentStatusRoute::<MockBackend>::new())
        .service(PaymentPageRoute::<MockBackend>::new())
        .service(PaymentWebhookRoute::<MockBackend>::new());
}

fn configure_untouched(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_session().never();
    backend.expect_update_session().never();
    mount(cfg, backend);
}

/// Stores whatever it is given, unless the transaction id is already taken.
fn configure_new_sessions(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_session().returning(|new| {
        if new.transaction_id == "INV-2026-0042" {
            return Err(PaymentSessionError::TransactionIdExists(new.transaction_id));
        }
        Ok(PaymentSession {
            transaction_id: new.transaction_id,
            amount: new.amount,
            note: new.note,
            payer_name: new.payer_name,
            payment_uri: new.payment_uri,
            status: PaymentStatus::Pending,
            utr: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        })
    });
    mount(cfg, backend);
}

fn configure_existing_session(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_session().returning(|transaction_id| {
        Ok((transaction_id == "TXN-0123456789AB").then(|| session(transaction_id, PaymentStatus::Pending, None)))
    });
    mount(cfg, backend);
}

fn configure_webhook_updates(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend
        .expect_update_session()
        .withf(|transaction_id, status, _| transaction_id == "TXN-0123456789AB" && *status == PaymentStatus::Success)
        .returning(|transaction_id, status, utr| match utr.as_ref().map(|u| u.as_str()) {
            Some("555555555555") => Err(PaymentSessionError::UtrAlreadyBound("555555555555".into())),
            utr => Ok(session(transaction_id, status, utr)),
        });
    mount(cfg, backend);
}
