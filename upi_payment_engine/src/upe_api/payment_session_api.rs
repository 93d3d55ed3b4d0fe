use std::fmt::Debug;

use chrono::Utc;
use log::*;
use upg_common::{helpers::non_empty, Paise};

use crate::{
    db_types::{NewPaymentSession, PaymentSession, PaymentStatus},
    helpers::{build_intent_url, build_payment_uri, render_qr_png, PayeeConfig, TransactionId, Utr},
    traits::PaymentSessionManagement,
    upe_api::{
        authorization::OperatorGrant,
        errors::PaymentSessionApiError,
        payment_objects::{PaymentLink, PaymentRequest, PaymentStatusView, PaymentUpdate},
    },
};

pub const DEFAULT_PAYMENT_NOTE: &str = "Payment";

/// Who picked a session's transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdOrigin {
    /// An unauthenticated caller of `/payment/create`.
    Client,
    /// The gateway itself, for an order.
    Gateway,
}

/// `PaymentSessionApi` runs the payment side of the gateway: it creates standalone payment sessions, renders their
/// links and QR codes, and applies status updates from the payment provider or an operator.
pub struct PaymentSessionApi<B> {
    db: B,
    payee: PayeeConfig,
}

impl<B> Debug for PaymentSessionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentSessionApi ({})", self.payee.vpa)
    }
}

impl<B> PaymentSessionApi<B> {
    pub fn new(db: B, payee: PayeeConfig) -> Self {
        Self { db, payee }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn payee(&self) -> &PayeeConfig {
        &self.payee
    }

    /// The links a customer uses to pay this session. The hosted page and QR image are relative to this server.
    pub fn payment_link(&self, session: &PaymentSession) -> PaymentLink {
        let id = session.transaction_id.as_str();
        PaymentLink {
            transaction_id: id.to_string(),
            upi_uri: session.payment_uri.clone(),
            intent_url: build_intent_url(&self.payee, &session.payment_uri),
            pay_url: format!("/payment/{id}"),
            qr_url: format!("/payment/{id}/qr"),
        }
    }
}

impl<B> PaymentSessionApi<B>
where B: PaymentSessionManagement
{
    /// Validates the request and stores a new `PENDING` session.
    ///
    /// Nothing is written unless the amount is positive after rounding to paise and the transaction id (if one was
    /// given) is well-formed, unused, and not in one of the gateway's own `TXN-` or `ORD<id>-<epoch>` forms.
    pub async fn create(&self, request: PaymentRequest) -> Result<PaymentSession, PaymentSessionApiError> {
        self.insert_session(request, IdOrigin::Client).await
    }

    /// Creates the payment session for an order on behalf of another gateway instance. Unlike [`Self::create`], the
    /// transaction id may be in the `ORD<id>-<epoch>` form.
    pub async fn create_for_order(
        &self,
        _grant: &OperatorGrant,
        request: PaymentRequest,
    ) -> Result<PaymentSession, PaymentSessionApiError> {
        self.insert_session(request, IdOrigin::Gateway).await
    }

    pub(crate) async fn insert_session(
        &self,
        request: PaymentRequest,
        origin: IdOrigin,
    ) -> Result<PaymentSession, PaymentSessionApiError> {
        let amount = Paise::try_from_decimal(request.amount)?;
        let transaction_id = match (non_empty(request.transaction_id.as_deref()), origin) {
            (Some(id), IdOrigin::Client) => TransactionId::client_supplied(id)?,
            (Some(id), IdOrigin::Gateway) => id.parse::<TransactionId>()?,
            (None, _) => TransactionId::for_session(),
        };
        let note = non_empty(request.note.as_deref()).unwrap_or(DEFAULT_PAYMENT_NOTE).to_string();
        let payment_uri = build_payment_uri(&self.payee, amount, &note, transaction_id.as_str());
        let session = NewPaymentSession {
            transaction_id: transaction_id.into_inner(),
            amount,
            note,
            payer_name: non_empty(request.payer_name.as_deref()).map(String::from),
            payment_uri,
            created_at: Utc::now(),
        };
        let session = self.db.insert_session(session).await?;
        info!("💳️ Payment {} created for {}", session.transaction_id, session.amount);
        Ok(session)
    }

    pub async fn get(&self, transaction_id: &str) -> Result<PaymentSession, PaymentSessionApiError> {
        self.db
            .fetch_session(transaction_id)
            .await?
            .ok_or_else(|| PaymentSessionApiError::SessionNotFound(transaction_id.to_string()))
    }

    /// Renders the session's payment link as a PNG QR code.
    pub async fn render_proof(&self, transaction_id: &str) -> Result<Vec<u8>, PaymentSessionApiError> {
        let session = self.get(transaction_id).await?;
        let png = render_qr_png(&session.payment_uri)?;
        Ok(png)
    }

    pub async fn status_view(&self, transaction_id: &str) -> Result<PaymentStatusView, PaymentSessionApiError> {
        let session = self.get(transaction_id).await?;
        Ok(PaymentStatusView::from(session))
    }

    /// Applies a status update for a session.
    ///
    /// A UTR, if present, is always validated, but only a `SUCCESS` update registers it. If it is already registered
    /// to another payment or order, the whole update is rejected and nothing changes.
    pub async fn apply_update(
        &self,
        _grant: &OperatorGrant,
        update: PaymentUpdate,
    ) -> Result<PaymentSession, PaymentSessionApiError> {
        let utr = match non_empty(update.utr.as_deref()).map(Utr::parse).transpose()? {
            Some(utr) if update.status != PaymentStatus::Success => {
                debug!("💳️ Ignoring UTR {utr} on a {} update for payment {}", update.status, update.transaction_id);
                None
            },
            utr => utr,
        };
        let session = self.db.update_session(&update.transaction_id, update.status, utr.clone()).await?;
        info!(
            "💳️ Payment {} updated to {}{}",
            session.transaction_id,
            session.status,
            utr.map(|u| format!(" with UTR {u}")).unwrap_or_default()
        );
        Ok(session)
    }

    /// Marks a session as paid. This is the operator's manual equivalent of a `SUCCESS` webhook.
    pub async fn confirm(
        &self,
        grant: &OperatorGrant,
        transaction_id: &str,
        utr: Option<String>,
    ) -> Result<PaymentSession, PaymentSessionApiError> {
        let update = PaymentUpdate { transaction_id: transaction_id.to_string(), status: PaymentStatus::Success, utr };
        self.apply_update(grant, update).await
    }

    pub async fn list(&self, _grant: &OperatorGrant) -> Result<Vec<PaymentSession>, PaymentSessionApiError> {
        let sessions = self.db.fetch_sessions().await?;
        trace!("💳️ Fetched {} payments", sessions.len());
        Ok(sessions)
    }
}
