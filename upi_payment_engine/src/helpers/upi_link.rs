use serde::{Deserialize, Serialize};
use upg_common::{Paise, INR_CURRENCY_CODE};
use urlencoding::encode;

pub const DEFAULT_UPI_SCHEME: &str = "upi";
/// Google Pay's Android package. Intent links open this app directly instead of showing a chooser.
pub const DEFAULT_INTENT_PACKAGE: &str = "com.google.android.apps.nbu.paisa.user";

/// Who receives the money, and how the deep links address the payer's app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeConfig {
    /// The receiving UPI handle (VPA), e.g. `shop@okicici`.
    pub vpa: String,
    /// Display name shown in the payer's app.
    pub name: String,
    pub scheme: String,
    pub intent_package: String,
}

impl PayeeConfig {
    pub fn new<S: Into<String>>(vpa: S, name: S) -> Self {
        Self {
            vpa: vpa.into(),
            name: name.into(),
            scheme: DEFAULT_UPI_SCHEME.to_string(),
            intent_package: DEFAULT_INTENT_PACKAGE.to_string(),
        }
    }
}

/// Builds the UPI deep link, `upi://pay?pa=..&pn=..&am=..&cu=INR&tn=..&tr=..`.
///
/// Every value is percent-encoded, and the amount always carries exactly two decimal places.
pub fn build_payment_uri(payee: &PayeeConfig, amount: Paise, note: &str, transaction_id: &str) -> String {
    let params = [
        ("pa", payee.vpa.clone()),
        ("pn", payee.name.clone()),
        ("am", amount.to_string()),
        ("cu", INR_CURRENCY_CODE.to_string()),
        ("tn", note.to_string()),
        ("tr", transaction_id.to_string()),
    ];
    let query = params.iter().map(|(k, v)| format!("{k}={}", encode(v))).collect::<Vec<_>>().join("&");
    format!("{}://pay?{query}", payee.scheme)
}

/// Wraps the query of a payment URI in an Android intent link that targets the configured payment app.
pub fn build_intent_url(payee: &PayeeConfig, payment_uri: &str) -> String {
    let query = payment_uri.split_once('?').map(|(_, q)| q).unwrap_or_default();
    format!("intent://pay?{query}#Intent;scheme={};package={};end", payee.scheme, payee.intent_package)
}
