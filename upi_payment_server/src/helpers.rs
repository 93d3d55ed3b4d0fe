use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use upi_payment_engine::{db_types::PaymentSession, payment_objects::PaymentLink, OPERATOR_KEY_HEADER};

/// Extracts the token from an `Authorization: Bearer <token>` header. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub fn operator_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(OPERATOR_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The hosted payment page: the amount, the note, a QR code to scan and buttons that open the payment app.
pub fn render_payment_page(session: &PaymentSession, link: &PaymentLink) -> String {
    let id = escape_html(&session.transaction_id);
    let note = escape_html(&session.note);
    let upi_uri = escape_html(&link.upi_uri);
    let intent_url = escape_html(&link.intent_url);
    let qr_url = escape_html(&link.qr_url);
    let status_url = escape_html(&format!("/payment/{}/status", session.transaction_id));
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Pay ₹{amount}</title>
</head>
<body>
  <main>
    <h1>₹{amount}</h1>
    <p class="note">{note}</p>
    <p class="status">Status: <span id="status">{status}</span></p>
    <img src="{qr_url}" alt="UPI QR code for {id}" width="300" height="300">
    <p><a class="pay" href="{intent_url}">Pay with Google Pay</a></p>
    <p><a class="pay" href="{upi_uri}">Pay with any UPI app</a></p>
    <p class="reference">Reference: {id}</p>
  </main>
  <script>
    setInterval(function () {{
      fetch("{status_url}").then(function (r) {{ return r.json(); }}).then(function (s) {{
        document.getElementById("status").textContent = s.status;
      }});
    }}, 5000);
  </script>
</body>
</html>
"#,
        amount = session.amount,
        status = session.status,
    )
}
