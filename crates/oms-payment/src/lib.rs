//! Payment status gateway for the order management system.
//!
//! Payments live in a separate service. This crate answers one question for
//! the lifecycle engine: what is the current payment status of an order? The
//! answer is always a `PaymentStatus`; lookup failures are folded into
//! `Pending` so an unreachable payment service never blocks order handling.

use async_trait::async_trait;
use oms_types::{ConfigSchema, ImplementationRegistry, PaymentRecord, PaymentStatus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod mock;
}

/// Default time budget for a single payment lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors that can occur while querying a payment backend.
///
/// These never leave `PaymentService::status_for`.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// The payment service has no payments for the order.
	#[error("No payments found for order")]
	NotFound,
	/// Error that occurs during network communication with the payment service.
	#[error("Network error: {0}")]
	Network(String),
	/// The payment service answered with something that is not a payment list.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// The lookup did not complete within its time budget.
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for payment backends.
///
/// Implementations fetch the payment records attached to an order. They are
/// free to fail; the fallback policy lives in `PaymentService`.
#[async_trait]
pub trait PaymentInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the payments recorded for an order, in the order the payment
	/// service returns them.
	async fn payments_for_order(&self, order_id: u64) -> Result<Vec<PaymentRecord>, PaymentError>;
}

/// Type alias for payment backend factory functions.
pub type PaymentFactory = fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>;

/// Registry trait for payment backend implementations.
pub trait PaymentRegistry: ImplementationRegistry<Factory = PaymentFactory> {}

/// Get all registered payment backend implementations.
pub fn get_all_implementations() -> Vec<(&'static str, PaymentFactory)> {
	use implementations::{http, mock};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Resolves the payment status of orders against a payment backend.
///
/// Policy, in priority order:
/// 1. the first payment record returned wins, its status is used verbatim;
/// 2. no payments (empty list or not-found) means `Pending`;
/// 3. any failure, including a timeout, also means `Pending`.
///
/// Statuses are fetched on every call and never cached.
#[derive(Clone)]
pub struct PaymentService {
	backend: Arc<dyn PaymentInterface>,
	timeout: Duration,
}

impl PaymentService {
	/// Creates a new PaymentService with the given backend and lookup timeout.
	pub fn new(backend: Arc<dyn PaymentInterface>, timeout: Duration) -> Self {
		Self { backend, timeout }
	}

	/// Returns the current payment status of an order. Never fails.
	pub async fn status_for(&self, order_id: u64) -> PaymentStatus {
		let lookup = self.backend.payments_for_order(order_id);
		let result = match tokio::time::timeout(self.timeout, lookup).await {
			Ok(result) => result,
			Err(_) => Err(PaymentError::Timeout(self.timeout)),
		};

		match result {
			Ok(payments) => match payments.first() {
				Some(payment) => {
					if payments.len() > 1 {
						debug!(
							order_id,
							count = payments.len(),
							"Multiple payments for order, using the first"
						);
					}
					payment.status
				},
				None => PaymentStatus::Pending,
			},
			Err(PaymentError::NotFound) => PaymentStatus::Pending,
			Err(e) => {
				warn!(order_id, error = %e, "Payment lookup failed, treating payment as pending");
				PaymentStatus::Pending
			},
		}
	}
}
