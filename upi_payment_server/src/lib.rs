//! # UPI payment gateway server
//! This crate hosts the HTTP server for the UPI payment gateway. It is responsible for:
//! * Registering customers and authenticating them with bearer tokens.
//! * Taking orders, and handing back a UPI payment link and QR code for each one.
//! * Accepting the customer's proof of payment (their UTR) and payment status webhooks.
//! * Giving operators a small admin surface to review orders and confirm or cancel them.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth/register`: Customer registration.
//! * `/orders`: Customer orders and UTR submission. Requires a bearer token.
//! * `/payment/*`: Payment sessions, the hosted payment page and QR codes.
//! * `/webhook/payment`: Payment status updates from the payment provider.
//! * `/admin/*`: Operator routes. Requires the `X-Operator-Key` header.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
