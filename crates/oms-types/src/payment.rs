//! Payment types as seen from the order side of the system.
//!
//! Payments are owned by a separate service. This crate only models the
//! read-only snapshot the order service receives when it asks for the
//! payments attached to an order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a payment as reported by the remote payment service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	/// Payment has not been made yet, or its state could not be determined.
	Pending,
	/// Payment has been captured.
	Completed,
	/// Payment was attempted and failed.
	Failed,
	/// Payment service reported an indeterminate status.
	Unknown,
}

impl PaymentStatus {
	/// Every variant, in declaration order.
	pub const ALL: [PaymentStatus; 4] = [
		PaymentStatus::Pending,
		PaymentStatus::Completed,
		PaymentStatus::Failed,
		PaymentStatus::Unknown,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentStatus::Pending => "PENDING",
			PaymentStatus::Completed => "COMPLETED",
			PaymentStatus::Failed => "FAILED",
			PaymentStatus::Unknown => "UNKNOWN",
		}
	}
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for PaymentStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		PaymentStatus::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| format!("Unknown payment status: {}", s))
	}
}

/// The part of a payment the order service relies on.
///
/// The payment service attaches more fields (ids, dates, amounts); they are
/// neither modelled nor required to be well formed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_id: Option<u64>,
	pub status: PaymentStatus,
}

impl PaymentRecord {
	/// Creates a bare record carrying only a status.
	pub fn with_status(status: PaymentStatus) -> Self {
		Self {
			order_id: None,
			status,
		}
	}
}
