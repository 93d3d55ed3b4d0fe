//! Request identities.
//!
//! The middleware in [`crate::middleware`] authenticates a request and stores the result in the request extensions.
//! Handlers ask for the identity they need with one of the extractors below. If the middleware did not run (or did not
//! succeed), extraction fails and the handler is never called.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use log::warn;
use upi_payment_engine::{db_types::User, OperatorGrant, SharedSecret};

use crate::errors::{AuthError, ServerError};

/// The customer who owns the bearer token on this request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<User>().cloned().map(AuthenticatedUser).ok_or_else(|| {
            warn!("🔐️ No authenticated user found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingCredentials)
        });
        ready(user)
    }
}

/// Proof that the request carried the operator key.
#[derive(Debug, Clone)]
pub struct OperatorAccess(pub OperatorGrant);

impl FromRequest for OperatorAccess {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let grant = req.extensions().get::<OperatorGrant>().cloned().map(OperatorAccess).ok_or_else(|| {
            warn!("🔐️ No operator grant found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingCredentials)
        });
        ready(grant)
    }
}

/// The operator key, for routes outside the `/admin` scope that behave differently for operators.
#[derive(Debug, Clone)]
pub struct OperatorKey(pub SharedSecret);

/// The shared secret payment webhooks must carry.
#[derive(Debug, Clone)]
pub struct WebhookSecret(pub SharedSecret);
