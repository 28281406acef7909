//! Retouch Database Layer
//!
//! This crate provides the PostgreSQL repositories for transformed image records
//! and user credit balances, plus the store traits the editor depends on.

pub mod db;
pub mod store_traits;

pub use db::{ImageRepository, UserRepository};
pub use store_traits::{CreditLedger, ImageStore};
