//! Order lifecycle state management.
//!
//! Pure transition rules; persistence is handled by the engine.

pub mod order;

pub use order::{check_deletable, next_status, TransitionRejection};
