use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use upi_payment_engine::{
    AuthApi,
    ConfiguredBridge,
    InProcessBridge,
    OrderFlowApi,
    PaymentSessionApi,
    RemoteGatewayBridge,
    SharedSecret,
    SqliteDatabase,
};

use crate::{
    auth::{OperatorKey, WebhookSecret},
    config::{BridgeConfig, ServerConfig},
    errors::ServerError,
    middleware::{CustomerAuthMiddlewareFactory, OperatorKeyMiddlewareFactory},
    routes::{
        health,
        ConfirmPaymentRoute,
        CreateOrderRoute,
        CreatePaymentRoute,
        ListOrdersRoute,
        ListTransactionsRoute,
        MyOrdersRoute,
        PaymentPageRoute,
        PaymentQrRoute,
        PaymentStatusRoute,
        PaymentWebhookRoute,
        RegisterRoute,
        SetOrderStatusRoute,
        SubmitUtrRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

type ServerOrderFlowApi = OrderFlowApi<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = connect(&config).await?;
    let srv = create_server_instance(config, db)?;
    srv.await?;
    Ok(())
}

/// Applies any outstanding schema migrations and exits. The server itself never changes the schema.
pub async fn run_migrations(config: &ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = connect(config).await?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))
}

async fn connect(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let remote_bridge = match &config.bridge {
        BridgeConfig::InProcess => None,
        BridgeConfig::Remote { base_url, timeout, operator_key } => Some(
            RemoteGatewayBridge::new(base_url, *timeout, operator_key.clone())
                .map_err(|e| ServerError::InitializeError(e.to_string()))?,
        ),
    };
    let operator_key = SharedSecret::new("operator key", config.operator_key.clone());
    let webhook_secret = WebhookSecret(SharedSecret::new("webhook secret", config.webhook_secret.clone()));
    let srv = HttpServer::new(move || {
        let bridge = match &remote_bridge {
            Some(remote) => ConfiguredBridge::Remote(remote.clone()),
            None => ConfiguredBridge::InProcess(InProcessBridge::new(PaymentSessionApi::new(
                db.clone(),
                config.payee.clone(),
            ))),
        };
        let orders_api: ServerOrderFlowApi = OrderFlowApi::new(db.clone(), bridge);
        let payments_api = PaymentSessionApi::new(db.clone(), config.payee.clone());
        let auth_api = AuthApi::new(db.clone()).with_token_ttl(config.access_token_ttl);
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        // Customer routes. The bearer token is resolved to a user before any handler runs.
        let orders_scope = web::scope("/orders")
            .wrap(CustomerAuthMiddlewareFactory::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>::new())
            .service(MyOrdersRoute::<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>::new())
            .service(SubmitUtrRoute::<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>::new());
        // Operator routes. Nothing in here runs without the operator key.
        let admin_scope = web::scope("/admin")
            .wrap(OperatorKeyMiddlewareFactory::new(operator_key.clone()))
            .service(ListOrdersRoute::<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>::new())
            .service(SetOrderStatusRoute::<SqliteDatabase, ConfiguredBridge<SqliteDatabase>>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(ListTransactionsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("upg::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(OperatorKey(operator_key.clone())))
            .app_data(web::Data::new(webhook_secret.clone()))
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(orders_scope)
            .service(admin_scope)
            .service(CreatePaymentRoute::<SqliteDatabase>::new())
            .service(PaymentQrRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            .service(PaymentPageRoute::<SqliteDatabase>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("🚀️ Listening on {}:{}", config.host, config.port);
    Ok(srv)
}
