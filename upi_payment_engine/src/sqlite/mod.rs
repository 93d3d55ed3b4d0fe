//! SQLite backend for the UPI payment gateway.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
