//! Order lifecycle rules.
//!
//! Orders move along `Created -> Pending -> Shipped -> Delivered -> Finished`.
//! Leaving `Created` needs nothing; every later step requires the order's
//! payment to be completed. `Finished` and `Cancelled` are terminal.

use oms_types::{OrderStatus, PaymentStatus};
use serde::Serialize;
use thiserror::Error;

/// Reason a requested lifecycle change was refused.
///
/// Returned to callers as part of `InvalidTransition` errors, so it is
/// serializable with a `reason` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionRejection {
	/// The order can only move on once its payment is completed.
	#[error("Order in status {current} cannot advance while payment is {payment}")]
	PaymentNotCompleted {
		current: OrderStatus,
		payment: PaymentStatus,
	},
	/// The order is finished or cancelled.
	#[error("Order in terminal status {current} cannot advance")]
	TerminalState { current: OrderStatus },
	/// Only finished or cancelled orders can be deleted.
	#[error("Order in status {current} cannot be deleted")]
	NotDeletable { current: OrderStatus },
}

/// Computes the status an order moves to when advanced.
///
/// Total over every pair of inputs. Terminal statuses are refused before the
/// payment is looked at, so a finished order is rejected the same way
/// whatever its payment says.
pub fn next_status(
	current: OrderStatus,
	payment: PaymentStatus,
) -> Result<OrderStatus, TransitionRejection> {
	if current.is_terminal() {
		return Err(TransitionRejection::TerminalState { current });
	}
	if current == OrderStatus::Created {
		return Ok(OrderStatus::Pending);
	}
	if payment != PaymentStatus::Completed {
		return Err(TransitionRejection::PaymentNotCompleted { current, payment });
	}

	match current {
		OrderStatus::Pending => Ok(OrderStatus::Shipped),
		OrderStatus::Shipped => Ok(OrderStatus::Delivered),
		OrderStatus::Delivered => Ok(OrderStatus::Finished),
		OrderStatus::Created | OrderStatus::Finished | OrderStatus::Cancelled => {
			Err(TransitionRejection::TerminalState { current })
		},
	}
}

/// Checks that an order in `current` may be deleted.
pub fn check_deletable(current: OrderStatus) -> Result<(), TransitionRejection> {
	if current.is_deletable() {
		Ok(())
	} else {
		Err(TransitionRejection::NotDeletable { current })
	}
}
