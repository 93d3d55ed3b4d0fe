use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use upg_common::Secret;
use upi_payment_engine::{
    db_types::{Order, OrderStatusType, Paise, PaymentSession, PaymentStatus, User},
    hash_token,
    AuthApi,
    SharedSecret,
    OPERATOR_KEY_HEADER,
};

use super::mocks::MockBackend;

pub const CUSTOMER_TOKEN: &str = "Qk7vTn2c9RfXw4LpZs8HdJ3mYb6GaE1tUo5NiKq0Vr";
pub const OPERATOR_KEY: &str = "operator-key-for-endpoint-tests";
pub const WEBHOOK_SECRET: &str = "webhook-secret-for-endpoint-tests";

pub fn customer() -> User {
    User {
        id: 7,
        email: "asha@example.com".into(),
        full_name: "Asha Rao".into(),
        phone: Some("9876543210".into()),
        shipping_address: Some("14 MG Road, Bengaluru 560001".into()),
        created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap(),
    }
}

pub fn order(id: i64, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2026, 10, 2, 11, 0, 0).unwrap();
    Order {
        id,
        user_id: 7,
        total_amount: Paise::from(29900),
        status,
        transaction_id: Some(format!("ORD{id}-1791018000")),
        utr_number: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn session(transaction_id: &str, status: PaymentStatus, utr: Option<&str>) -> PaymentSession {
    let created_at = Utc.with_ymd_and_hms(2026, 10, 2, 11, 0, 0).unwrap();
    PaymentSession {
        transaction_id: transaction_id.to_string(),
        amount: Paise::from(29900),
        note: "Order #42".into(),
        payer_name: None,
        payment_uri: format!(
            "upi://pay?pa=chai.shop%40okicici&pn=Chai%20Shop&am=299.00&cu=INR&tn=Order%20%2342&tr={transaction_id}"
        ),
        status,
        utr: utr.map(String::from),
        created_at,
        updated_at: created_at,
    }
}

pub fn operator_key() -> SharedSecret {
    SharedSecret::new("operator key", Secret::new(OPERATOR_KEY.to_string()))
}

pub fn webhook_secret() -> SharedSecret {
    SharedSecret::new("webhook secret", Secret::new(WEBHOOK_SECRET.to_string()))
}

/// Registers an `AuthApi` that knows exactly one token, [`CUSTOMER_TOKEN`], belonging to `user`.
pub fn configure_customer_auth(cfg: &mut ServiceConfig, user: User) {
    let mut backend = MockBackend::new();
    let known_hash = hash_token(CUSTOMER_TOKEN);
    backend
        .expect_fetch_user_for_token()
        .returning(move |hash, _| Ok((hash == known_hash).then(|| user.clone())));
    cfg.app_data(web::Data::new(AuthApi::new(backend)));
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn operator(key: &str) -> (&'static str, String) {
    (OPERATOR_KEY_HEADER, key.to_string())
}

pub async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}
