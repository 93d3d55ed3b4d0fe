use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;
use upi_payment_engine::{traits::AuthApiError, AuthorizationError, OrderFlowError, PaymentSessionApiError};

/// The message returned for every internal failure. The cause is logged, never returned.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authentication is required.")]
    MissingCredentials,
    #[error("The access token is invalid or has expired.")]
    InvalidToken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
}

impl ServerError {
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            error!("💻️ {self}");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderFlowError::ProfileIncomplete => Self::PreconditionFailed(e.to_string()),
            OrderFlowError::EmptyOrder |
            OrderFlowError::InvalidQuantity { .. } |
            OrderFlowError::OrderTotalTooLarge |
            OrderFlowError::ProductNotFound(_) |
            OrderFlowError::ProductUnavailable(_) |
            OrderFlowError::InvalidUtr(_) |
            OrderFlowError::InvalidStatus(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::UtrAlreadyBound(_) | OrderFlowError::OrderCancelled(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<PaymentSessionApiError> for ServerError {
    fn from(e: PaymentSessionApiError) -> Self {
        match e {
            PaymentSessionApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            PaymentSessionApiError::QrRender(_) => Self::BackendError(e.to_string()),
            PaymentSessionApiError::InvalidAmount(_) |
            PaymentSessionApiError::InvalidTransactionId(_) |
            PaymentSessionApiError::InvalidUtr(_) => Self::ValidationError(e.to_string()),
            PaymentSessionApiError::SessionNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentSessionApiError::TransactionIdExists(_) | PaymentSessionApiError::UtrAlreadyBound(_) => {
                Self::Conflict(e.to_string())
            },
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            AuthApiError::InvalidToken => Self::AuthenticationError(AuthError::InvalidToken),
            AuthApiError::EmailAlreadyRegistered(_) => Self::Conflict(e.to_string()),
            AuthApiError::InvalidRegistration(_) => Self::ValidationError(e.to_string()),
            AuthApiError::UserNotFound(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AuthorizationError> for ServerError {
    fn from(e: AuthorizationError) -> Self {
        match e {
            AuthorizationError::MissingCredentials => Self::AuthenticationError(AuthError::MissingCredentials),
            AuthorizationError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
        }
    }
}
