//! Core of the order management system.
//!
//! Holds the order lifecycle rules, the engine that applies them to stored
//! orders, and the builder that wires storage and payment backends from
//! configuration.

pub mod builder;
pub mod engine;
pub mod state;

pub use builder::{BuilderError, OrderEngineBuilder, OrderFactories};
pub use engine::{EngineError, OrderEngine};
pub use state::{next_status, TransitionRejection};
