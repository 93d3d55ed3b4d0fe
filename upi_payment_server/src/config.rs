use std::{env, io::Write, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;
use upg_common::{helpers::non_empty, Secret};
use upi_payment_engine::{
    helpers::{PayeeConfig, DEFAULT_INTENT_PACKAGE, DEFAULT_UPI_SCHEME},
    DEFAULT_BRIDGE_TIMEOUT,
};

const DEFAULT_UPG_HOST: &str = "127.0.0.1";
const DEFAULT_UPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/upg_store.db";
const DEFAULT_PAYEE_VPA: &str = "merchant@upi";
const DEFAULT_PAYEE_NAME: &str = "Merchant";
const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::hours(168);
const GENERATED_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret for the `/admin` routes. Presented in the `X-Operator-Key` header.
    pub operator_key: Secret<String>,
    /// Shared secret that payment webhooks carry in their `secret_key` field.
    pub webhook_secret: Secret<String>,
    pub payee: PayeeConfig,
    pub bridge: BridgeConfig,
    pub access_token_ttl: Duration,
}

/// How orders obtain their payment links.
#[derive(Clone, Debug)]
pub enum BridgeConfig {
    /// Payment sessions are created in this process, in the same database.
    InProcess,
    /// Payment sessions are created by a separate gateway service. `operator_key` is that service's operator key.
    Remote { base_url: String, timeout: StdDuration, operator_key: Secret<String> },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_UPG_HOST.to_string(),
            port: DEFAULT_UPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            operator_key: Secret::default(),
            webhook_secret: Secret::default(),
            payee: PayeeConfig::new(DEFAULT_PAYEE_VPA, DEFAULT_PAYEE_NAME),
            bridge: BridgeConfig::InProcess,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("UPG_HOST").ok().unwrap_or_else(|| DEFAULT_UPG_HOST.into());
        let port = parse_port(env::var("UPG_PORT").ok());
        let database_url = env::var("UPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ UPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let mut generated = Vec::new();
        let operator_key = secret_from_env("UPG_OPERATOR_KEY", &mut generated);
        let webhook_secret = secret_from_env("UPG_WEBHOOK_SECRET", &mut generated);
        if !generated.is_empty() {
            store_generated_secrets(&generated);
        }
        let payee = PayeeConfig {
            vpa: env_or_default("UPG_PAYEE_VPA", DEFAULT_PAYEE_VPA, true),
            name: env_or_default("UPG_PAYEE_NAME", DEFAULT_PAYEE_NAME, false),
            scheme: env_or_default("UPG_UPI_SCHEME", DEFAULT_UPI_SCHEME, false),
            intent_package: env_or_default("UPG_INTENT_PACKAGE", DEFAULT_INTENT_PACKAGE, false),
        };
        let bridge = BridgeConfig::from_values(
            env::var("UPG_PAYMENT_BRIDGE").ok().as_deref(),
            env::var("UPG_PAYMENT_GATEWAY_URL").ok().as_deref(),
            env::var("UPG_PAYMENT_GATEWAY_KEY").ok().as_deref(),
            env::var("UPG_BRIDGE_TIMEOUT_SECS").ok().as_deref(),
        );
        let access_token_ttl = parse_token_ttl(env::var("UPG_ACCESS_TOKEN_TTL_HOURS").ok().as_deref());
        Self { host, port, database_url, operator_key, webhook_secret, payee, bridge, access_token_ttl }
    }
}

impl BridgeConfig {
    /// Reads the bridge settings. Anything unusable falls back to the in-process bridge.
    pub fn from_values(
        kind: Option<&str>,
        gateway_url: Option<&str>,
        gateway_key: Option<&str>,
        timeout_secs: Option<&str>,
    ) -> Self {
        match non_empty(kind).map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("local") => Self::InProcess,
            Some("remote") => match (non_empty(gateway_url), non_empty(gateway_key)) {
                (Some(url), Some(key)) => {
                    let timeout = parse_timeout(timeout_secs);
                    info!("🪛️ Payment links will be requested from {url} (timeout {timeout:?})");
                    Self::Remote { base_url: url.to_string(), timeout, operator_key: Secret::new(key.to_string()) }
                },
                (None, _) => {
                    error!(
                        "🪛️ UPG_PAYMENT_BRIDGE is 'remote', but UPG_PAYMENT_GATEWAY_URL is not set. Payment sessions \
                         will be created in-process instead."
                    );
                    Self::InProcess
                },
                (Some(_), None) => {
                    error!(
                        "🪛️ UPG_PAYMENT_BRIDGE is 'remote', but UPG_PAYMENT_GATEWAY_KEY is not set. Payment sessions \
                         will be created in-process instead."
                    );
                    Self::InProcess
                },
            },
            Some(other) => {
                warn!("🪛️ '{other}' is not a valid value for UPG_PAYMENT_BRIDGE. Use 'local' or 'remote'. Using 'local'.");
                Self::InProcess
            },
        }
    }
}

fn parse_port(value: Option<String>) -> u16 {
    value
        .map(|s| {
            s.parse::<u16>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid port for UPG_PORT. {e} Using the default, {DEFAULT_UPG_PORT}, instead.");
                DEFAULT_UPG_PORT
            })
        })
        .unwrap_or(DEFAULT_UPG_PORT)
}

fn parse_timeout(value: Option<&str>) -> StdDuration {
    match value.map(|s| s.trim().parse::<u64>()) {
        None => DEFAULT_BRIDGE_TIMEOUT,
        Some(Ok(secs)) if secs > 0 => StdDuration::from_secs(secs),
        Some(_) => {
            warn!("🪛️ Invalid configuration value for UPG_BRIDGE_TIMEOUT_SECS. Using {DEFAULT_BRIDGE_TIMEOUT:?}.");
            DEFAULT_BRIDGE_TIMEOUT
        },
    }
}

fn parse_token_ttl(value: Option<&str>) -> Duration {
    match value.map(|s| s.trim().parse::<i64>()) {
        None => DEFAULT_ACCESS_TOKEN_TTL,
        Some(Ok(hours)) if hours > 0 => Duration::hours(hours),
        Some(_) => {
            warn!(
                "🪛️ Invalid configuration value for UPG_ACCESS_TOKEN_TTL_HOURS. Using the default value of {} hrs.",
                DEFAULT_ACCESS_TOKEN_TTL.num_hours()
            );
            DEFAULT_ACCESS_TOKEN_TTL
        },
    }
}

fn env_or_default(name: &str, default: &str, warn_if_missing: bool) -> String {
    match env::var(name).ok().as_deref().and_then(|v| non_empty(Some(v))) {
        Some(v) => v.to_string(),
        None => {
            if warn_if_missing {
                warn!("🪛️ {name} is not set. Using '{default}'. Payments will not reach you until this is configured.");
            }
            default.to_string()
        },
    }
}

fn secret_from_env(name: &'static str, generated: &mut Vec<(&'static str, String)>) -> Secret<String> {
    if let Some(value) = env::var(name).ok().as_deref().and_then(|v| non_empty(Some(v))) {
        return Secret::new(value.to_string());
    }
    warn!(
        "🚨️🚨️🚨️ {name} has not been set. I'm using a random value for this session. DO NOT operate on production \
         like this. 🚨️🚨️🚨️"
    );
    let value = random_secret();
    generated.push((name, value.clone()));
    Secret::new(value)
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(GENERATED_SECRET_LENGTH).map(char::from).collect()
}

/// Generated secrets are never logged. They are written to a temporary file so that a developer can still use them.
fn store_generated_secrets(secrets: &[(&'static str, String)]) {
    let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
    match &mut tmpfile {
        Some((f, p)) => {
            let data = secrets.iter().map(|(name, value)| (name.to_string(), json!(value))).collect::<serde_json::Map<_, _>>();
            match writeln!(f, "{}", serde_json::Value::Object(data)) {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The generated secrets for this session were written to {}. If this is a production \
                     instance, you are doing it wrong! Set the environment variables instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the generated secrets to the temporary file. {e}"),
            }
        },
        None => warn!("🪛️ Could not create a temporary file to store the generated secrets."),
    }
}
