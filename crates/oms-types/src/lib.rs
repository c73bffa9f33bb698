//! Common types module for the order management system.
//!
//! This module defines the core data types shared by the order store, the
//! payment status gateway, the lifecycle engine and the HTTP service. It
//! provides a centralized location for shared types to ensure consistency
//! across all components.

/// API types for HTTP endpoints and error responses.
pub mod api;
/// Order types: persisted records, creation attributes and composed views.
pub mod order;
/// Remote payment types as observed through the payment gateway.
pub mod payment;
/// Registry trait for self-registering backend implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
pub use payment::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use validation::*;
