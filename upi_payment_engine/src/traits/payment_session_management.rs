use thiserror::Error;

use crate::{
    db_types::{NewPaymentSession, PaymentSession, PaymentStatus},
    helpers::Utr,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentSessionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A payment with transaction id {0} already exists")]
    TransactionIdExists(String),
    #[error("Payment {0} does not exist")]
    SessionNotFound(String),
    #[error("UTR {0} has already been used for a different payment")]
    UtrAlreadyBound(String),
}

impl From<sqlx::Error> for PaymentSessionError {
    fn from(e: sqlx::Error) -> Self {
        PaymentSessionError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait PaymentSessionManagement {
    async fn insert_session(&self, session: NewPaymentSession) -> Result<PaymentSession, PaymentSessionError>;

    async fn fetch_session(&self, transaction_id: &str) -> Result<Option<PaymentSession>, PaymentSessionError>;

    /// All sessions, newest first.
    async fn fetch_sessions(&self) -> Result<Vec<PaymentSession>, PaymentSessionError>;

    /// Sets the session status and, if given, registers the UTR for it, in one atomic unit.
    ///
    /// When the new status is `SUCCESS`, a UTR is given, and a `pending` order carries the same transaction id, that
    /// order moves to `awaiting_verification` with the UTR in the same unit. Orders are never confirmed here.
    async fn update_session(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
        utr: Option<Utr>,
    ) -> Result<PaymentSession, PaymentSessionError>;
}
