//! Request handlers for the order API.

pub mod order;
