//! Retouch Editor
//!
//! Transformation form sessions: option staging, debounced text input, deep
//! merging of pending edits into the committed config, background credit
//! deduction and saving through the image store.

pub mod credits;
pub mod debounce;
pub mod registry;
pub mod session;
pub mod state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use credits::{CreditDeduction, DeductionStatus};
pub use debounce::Debouncer;
pub use registry::SessionRegistry;
pub use session::{
    DeductionView, OpenSession, SessionSettings, SessionView, SubmitOutcome,
    TransformationSession,
};
pub use state::{Controls, DeliverySettings, ImageDraft, Phase, SessionState};
