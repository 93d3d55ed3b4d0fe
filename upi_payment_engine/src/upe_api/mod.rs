pub mod auth_api;
pub mod authorization;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_bridge;
pub mod payment_objects;
pub mod payment_session_api;
