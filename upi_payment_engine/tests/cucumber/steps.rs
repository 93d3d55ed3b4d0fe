use cucumber::{then, when};
use upi_payment_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    order_objects::OrderLineRequest,
    payment_objects::PaymentUpdate,
    traits::OrderManagement,
};

use crate::cucumber::UpgWorld;

#[when(expr = "{string} orders {int} x {string} as order {word}")]
async fn place_order(world: &mut UpgWorld, email: String, quantity: i64, product: String, label: String) {
    let customer = world.customer(&email).clone();
    let line = OrderLineRequest::new(world.product(&product).id, quantity);
    let result = world.system().orders.create_order(&customer, &[line]).await;
    world.last_result = Some(match result {
        Ok(created) => {
            let summary = format!("order #{} placed", created.order.id);
            world.orders.insert(label, created.order);
            Ok(summary)
        },
        Err(e) => Err(e.to_string()),
    });
}

#[when(expr = "{string} submits UTR {string} for order {word}")]
async fn submit_utr(world: &mut UpgWorld, email: String, utr: String, label: String) {
    let customer = world.customer(&email).clone();
    let order_id = world.order(&label).id;
    let result = world.system().orders.submit_utr(order_id, &customer, &utr).await;
    world.last_result = Some(result.map(|s| s.message().to_string()).map_err(|e| e.to_string()));
}

#[when(expr = "the operator sets order {word} to {string}")]
async fn operator_sets_status(world: &mut UpgWorld, label: String, status: String) {
    let sys = world.system();
    let order_id = world.order(&label).id;
    let result = sys.orders.set_order_status(&sys.grant(), order_id, &status).await;
    world.last_result = Some(result.map(|o| format!("order is {}", o.status)).map_err(|e| e.to_string()));
}

#[when(expr = "someone with key {string} sets order {word} to {string}")]
async fn unauthorised_status_change(world: &mut UpgWorld, key: String, label: String, status: String) {
    let sys = world.system();
    let order_id = world.order(&label).id;
    let result = match sys.operator.authorize(Some(&key)) {
        Ok(grant) => sys.orders.set_order_status(&grant, order_id, &status).await.map(|o| format!("order is {}", o.status)),
        Err(e) => {
            world.last_result = Some(Err(e.to_string()));
            return;
        },
    };
    world.last_result = Some(result.map_err(|e| e.to_string()));
}

#[when(expr = "the payment provider reports {word} with UTR {string} for order {word}")]
async fn provider_webhook(world: &mut UpgWorld, status: String, utr: String, label: String) {
    let sys = world.system();
    let status = status.parse::<PaymentStatus>().expect("Not a payment status");
    let transaction_id = world.order(&label).transaction_id.clone().expect("Order has no payment session");
    let update = PaymentUpdate { transaction_id, status, utr: Some(utr) };
    let result = sys.payments.apply_update(&sys.grant(), update).await;
    world.last_result = Some(result.map(|s| format!("payment is {}", s.status)).map_err(|e| e.to_string()));
}

#[then(expr = "order {word} totals {word} rupees")]
async fn order_total(world: &mut UpgWorld, label: String, total: String) {
    assert_eq!(world.order(&label).total_amount.to_string(), total);
}

#[then(expr = "order {word} is {string}")]
async fn order_status(world: &mut UpgWorld, label: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    let order = world.order(&label);
    let stored = world
        .system()
        .db
        .fetch_order_for_user(order.id, order.user_id)
        .await
        .expect("Error fetching order")
        .expect("Order has disappeared");
    assert_eq!(stored.status, expected);
}

#[then(expr = "order {word} has UTR {string}")]
async fn order_utr(world: &mut UpgWorld, label: String, utr: String) {
    let order = world.order(&label);
    let stored = world.system().db.fetch_order_for_user(order.id, order.user_id).await.unwrap().unwrap();
    assert_eq!(stored.utr_number.as_deref(), Some(utr.as_str()));
}

#[then(expr = "order {word} has no UTR")]
async fn order_without_utr(world: &mut UpgWorld, label: String) {
    let order = world.order(&label);
    let stored = world.system().db.fetch_order_for_user(order.id, order.user_id).await.unwrap().unwrap();
    assert!(stored.utr_number.is_none());
}

#[then(expr = "the request succeeds with {string}")]
async fn request_succeeds(world: &mut UpgWorld, message: String) {
    match &world.last_result {
        Some(Ok(summary)) => assert!(summary.contains(&message), "'{summary}' does not mention '{message}'"),
        other => panic!("Expected success, got {other:?}"),
    }
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut UpgWorld, message: String) {
    match &world.last_result {
        Some(Err(err)) => assert!(err.contains(&message), "'{err}' does not mention '{message}'"),
        other => panic!("Expected failure, got {other:?}"),
    }
}
