//! Test helpers for editing sessions
//!
//! In-memory stand-ins for the persistence traits, shared by this crate's unit
//! tests and the API integration tests (via the `test-helpers` feature).

pub mod mock_stores;

pub use mock_stores::{MockCreditLedger, MockImageStore, StoreCall};
