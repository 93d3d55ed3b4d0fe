//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs; every decision
//! about orders, payments and UTRs is made in `upi_payment_engine`.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current thread stops that
//! worker from taking new requests. Database calls and the payment bridge are all async, and handlers must keep it
//! that way. QR rendering is CPU-bound but small.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use serde_json::json;
use upi_payment_engine::{
    payment_objects::{PaymentCreated, PaymentRequest},
    traits::{AuthManagement, OrderFlowDatabase, PaymentSessionManagement},
    AuthApi,
    OrderFlowApi,
    PaymentBridge,
    PaymentSessionApi,
};

use crate::{
    auth::{AuthenticatedUser, OperatorAccess, OperatorKey, WebhookSecret},
    data_objects::{
        ConfirmPaymentParams,
        CreateOrderRequest,
        PaymentConfirmedResponse,
        PaymentUpdateResponse,
        RegisterRequest,
        RegisterResponse,
        StatusUpdateRequest,
        UtrSubmissionRequest,
        UtrSubmissionResponse,
        WebhookPayload,
    },
    errors::ServerError,
    helpers::{operator_key, render_payment_page},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `route!(name => Method "path" impl BoundA, BoundB)` creates a `NameRoute<TBoundA, TBoundB>` service factory that
// registers the generic handler `name::<TBoundA, TBoundB>`.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(json!({ "status": "ok", "timestamp": Utc::now() }))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl AuthManagement);
/// Creates a customer account and returns a bearer token for it.
///
/// The token is only ever returned here. Clients send it back in the `Authorization: Bearer` header.
pub async fn register<A: AuthManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let (user, access_token) = api.register(body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(RegisterResponse { user, access_token }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "" impl OrderFlowDatabase, PaymentBridge);
/// Places an order for the authenticated customer.
///
/// Prices always come from the catalog. If the payment link cannot be generated, the order is still created and the
/// response carries a `payment_note` instead of a `payment` link.
pub async fn create_order<B: OrderFlowDatabase, P: PaymentBridge>(
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedUser(user) = user;
    debug!("💻️ Order request from user #{} with {} lines", user.id, body.items.len());
    let created = api.create_order(&user, &body.items).await?;
    Ok(HttpResponse::Created().json(created))
}

route!(my_orders => Get "" impl OrderFlowDatabase, PaymentBridge);
pub async fn my_orders<B: OrderFlowDatabase, P: PaymentBridge>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET my orders for user #{}", user.0.id);
    let orders = api.orders_for_user(&user.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(submit_utr => Post "/{order_id}/confirm" impl OrderFlowDatabase, PaymentBridge);
/// Records the customer's proof of payment. Resubmitting for an order that already has a UTR is a no-op success.
pub async fn submit_utr<B: OrderFlowDatabase, P: PaymentBridge>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<UtrSubmissionRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ UTR submission for order #{order_id} from user #{}", user.0.id);
    let submission = api.submit_utr(order_id, &user.0, &body.utr_number).await?;
    Ok(HttpResponse::Ok().json(UtrSubmissionResponse::from(submission)))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(list_orders => Get "/orders" impl OrderFlowDatabase, PaymentBridge);
pub async fn list_orders<B: OrderFlowDatabase, P: PaymentBridge>(
    access: OperatorAccess,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all orders");
    let orders = api.list_orders(&access.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(set_order_status => Patch "/orders/{order_id}/status" impl OrderFlowDatabase, PaymentBridge);
pub async fn set_order_status<B: OrderFlowDatabase, P: PaymentBridge>(
    access: OperatorAccess,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Operator request to set order #{order_id} to '{}'", body.status);
    let order = api.set_order_status(&access.0, order_id, &body.status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_payment => Post "/confirm/{transaction_id}" impl PaymentSessionManagement);
/// Marks a payment as received. The optional `utr_number` query parameter records the bank reference.
pub async fn confirm_payment<B: PaymentSessionManagement>(
    access: OperatorAccess,
    path: web::Path<String>,
    query: web::Query<ConfirmPaymentParams>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = path.into_inner();
    info!("💻️ Operator confirmation for payment {transaction_id}");
    let session = api.confirm(&access.0, &transaction_id, query.into_inner().utr_number).await?;
    Ok(HttpResponse::Ok().json(PaymentConfirmedResponse::from(session)))
}

route!(list_transactions => Get "/transactions" impl PaymentSessionManagement);
pub async fn list_transactions<B: PaymentSessionManagement>(
    access: OperatorAccess,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all payments");
    let sessions = api.list(&access.0).await?;
    Ok(HttpResponse::Ok().json(sessions))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payment/create" impl PaymentSessionManagement);
/// Creates a standalone payment session.
///
/// A request that carries the operator key may use an order transaction id (`ORD<id>-<epoch>`). That is how another
/// gateway instance creates the payment for one of its orders. A wrong key is rejected even though the key is
/// optional.
pub async fn create_payment<B: PaymentSessionManagement>(
    req: HttpRequest,
    body: web::Json<PaymentRequest>,
    operator: web::Data<OperatorKey>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received payment request for {}", body.amount);
    let session = match operator_key(req.headers()) {
        Some(key) => {
            let grant = operator.0.authorize(Some(key))?;
            api.create_for_order(&grant, body.into_inner()).await?
        },
        None => api.create(body.into_inner()).await?,
    };
    let link = api.payment_link(&session);
    Ok(HttpResponse::Ok().json(PaymentCreated::new(&session, link)))
}

route!(payment_page => Get "/payment/{transaction_id}" impl PaymentSessionManagement);
pub async fn payment_page<B: PaymentSessionManagement>(
    path: web::Path<String>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let session = api.get(&path).await?;
    let link = api.payment_link(&session);
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(render_payment_page(&session, &link)))
}

route!(payment_qr => Get "/payment/{transaction_id}/qr" impl PaymentSessionManagement);
pub async fn payment_qr<B: PaymentSessionManagement>(
    path: web::Path<String>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let png = api.render_proof(&path).await?;
    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}

route!(payment_status => Get "/payment/{transaction_id}/status" impl PaymentSessionManagement);
pub async fn payment_status<B: PaymentSessionManagement>(
    path: web::Path<String>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let view = api.status_view(&path).await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(payment_webhook => Post "/webhook/payment" impl PaymentSessionManagement);
/// Status notifications from the payment provider. The payload must carry the webhook secret in `secret_key`.
///
/// The secret is checked before the transaction is looked up.
pub async fn payment_webhook<B: PaymentSessionManagement>(
    body: web::Json<WebhookPayload>,
    secret: web::Data<WebhookSecret>,
    api: web::Data<PaymentSessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    let grant = secret.0.authorize(payload.secret_key.as_deref())?;
    debug!("💻️ Webhook: payment {} is now {}", payload.transaction_id, payload.status);
    let session = api.apply_update(&grant, payload.into()).await?;
    Ok(HttpResponse::Ok().json(PaymentUpdateResponse::from(session)))
}
