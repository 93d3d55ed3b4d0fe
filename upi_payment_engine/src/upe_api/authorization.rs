//! Operator authorization.
//!
//! Operator-only operations take an [`OperatorGrant`] argument. The only way to obtain one is to present the right
//! shared secret to [`SharedSecret::authorize`], so the check cannot be skipped or reordered by a caller.
use log::warn;
use thiserror::Error;
use upg_common::Secret;

/// The header that carries the operator key.
pub const OPERATOR_KEY_HEADER: &str = "X-Operator-Key";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("No credentials were provided.")]
    MissingCredentials,
    #[error("Invalid credentials.")]
    InvalidCredentials,
}

/// Proof that the caller presented a valid operator secret.
#[derive(Debug, Clone)]
pub struct OperatorGrant {
    _private: (),
}

#[derive(Debug, Clone)]
pub struct SharedSecret {
    name: &'static str,
    secret: Secret<String>,
}

impl SharedSecret {
    pub fn new(name: &'static str, secret: Secret<String>) -> Self {
        Self { name, secret }
    }

    /// Checks `candidate` in constant time. Empty secrets never authorize anything.
    pub fn authorize(&self, candidate: Option<&str>) -> Result<OperatorGrant, AuthorizationError> {
        let candidate = candidate.ok_or(AuthorizationError::MissingCredentials)?;
        if self.secret.is_empty() || !self.secret.matches(candidate.as_bytes()) {
            warn!("🔐️ Rejected a request with an invalid {}", self.name);
            return Err(AuthorizationError::InvalidCredentials);
        }
        Ok(OperatorGrant { _private: () })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
