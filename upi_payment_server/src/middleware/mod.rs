mod customer_auth;
mod operator_key;

pub use customer_auth::{CustomerAuthMiddlewareFactory, CustomerAuthMiddlewareService};
pub use operator_key::{OperatorKeyMiddlewareFactory, OperatorKeyMiddlewareService};
