//! Order lifecycle orchestration.
//!
//! `OrderEngine` is the only component that changes an order's status. Every
//! read composes the stored order with a payment status fetched on the spot,
//! and every status change goes through the rules in `crate::state`.

pub mod locks;

use crate::state::{check_deletable, next_status, TransitionRejection};
use futures::future::join_all;
use locks::OrderLocks;
use oms_payment::PaymentService;
use oms_storage::{OrderStore, StorageError};
use oms_types::{NewOrder, OrderView, PaymentStatus};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{field, info, instrument, Span};

/// Errors returned by order operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// No order has the requested id.
	#[error("Order not found: {0}")]
	NotFound(u64),
	/// The lifecycle rules refused the operation. Nothing was changed.
	#[error("Invalid transition: {0}")]
	InvalidTransition(#[from] TransitionRejection),
	/// The submitted order is malformed.
	#[error("Invalid order: {0}")]
	Validation(String),
	/// The order store failed.
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Maps store failures for a given order id.
fn storage_error(order_id: u64) -> impl Fn(StorageError) -> EngineError {
	move |e| match e {
		StorageError::NotFound => EngineError::NotFound(order_id),
		other => EngineError::Storage(other.to_string()),
	}
}

/// Orchestrates order reads and lifecycle changes.
pub struct OrderEngine {
	store: Arc<OrderStore>,
	payments: PaymentService,
	locks: OrderLocks,
}

impl OrderEngine {
	pub fn new(store: Arc<OrderStore>, payments: PaymentService) -> Self {
		Self {
			store,
			payments,
			locks: OrderLocks::new(),
		}
	}

	/// Registers a new order in `Created` status.
	///
	/// The payment service is not consulted: a new order has no payment yet,
	/// so the returned view always reports `Pending`.
	#[instrument(skip_all, fields(order_id = field::Empty))]
	pub async fn create(&self, new_order: NewOrder) -> Result<OrderView, EngineError> {
		if new_order.customer_name.trim().is_empty() {
			return Err(EngineError::Validation(
				"customerName must not be blank".into(),
			));
		}
		if new_order.total_amount < Decimal::ZERO {
			return Err(EngineError::Validation(format!(
				"totalAmount must not be negative, got {}",
				new_order.total_amount
			)));
		}

		let order = self
			.store
			.create(new_order)
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;

		Span::current().record("order_id", order.id);
		info!(status = %order.status, "Order created");
		Ok(OrderView::compose(order, PaymentStatus::Pending))
	}

	/// Returns one order with its current payment status.
	#[instrument(skip_all, fields(order_id = order_id))]
	pub async fn get(&self, order_id: u64) -> Result<OrderView, EngineError> {
		let order = self
			.store
			.get(order_id)
			.await
			.map_err(storage_error(order_id))?;
		let payment = self.payments.status_for(order_id).await;
		Ok(OrderView::compose(order, payment))
	}

	/// Returns every order with its current payment status, by ascending id.
	///
	/// Payment lookups run concurrently, one per order.
	#[instrument(skip_all)]
	pub async fn list(&self) -> Result<Vec<OrderView>, EngineError> {
		let orders = self
			.store
			.list()
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?;

		let payments = join_all(
			orders
				.iter()
				.map(|order| self.payments.status_for(order.id)),
		)
		.await;

		Ok(orders
			.into_iter()
			.zip(payments)
			.map(|(order, payment)| OrderView::compose(order, payment))
			.collect())
	}

	/// Moves an order one step along its lifecycle.
	///
	/// On rejection the stored order is left untouched.
	#[instrument(skip_all, fields(order_id = order_id))]
	pub async fn advance(&self, order_id: u64) -> Result<OrderView, EngineError> {
		let _guard = self.locks.acquire(order_id).await;

		let mut order = self
			.store
			.get(order_id)
			.await
			.map_err(storage_error(order_id))?;
		let payment = self.payments.status_for(order_id).await;

		let next = match next_status(order.status, payment) {
			Ok(next) => next,
			Err(rejection) => {
				info!(
					from = %order.status,
					payment = %payment,
					reason = %rejection,
					"Order transition rejected"
				);
				return Err(rejection.into());
			},
		};

		let from = order.status;
		order.status = next;
		let order = self
			.store
			.save(order)
			.await
			.map_err(storage_error(order_id))?;

		info!(from = %from, to = %next, payment = %payment, "Order transitioned");
		Ok(OrderView::compose(order, payment))
	}

	/// Deletes a finished or cancelled order.
	#[instrument(skip_all, fields(order_id = order_id))]
	pub async fn delete(&self, order_id: u64) -> Result<(), EngineError> {
		let _guard = self.locks.acquire(order_id).await;

		let order = self
			.store
			.get(order_id)
			.await
			.map_err(storage_error(order_id))?;
		check_deletable(order.status)?;

		self.store
			.delete(order_id)
			.await
			.map_err(storage_error(order_id))?;

		info!(status = %order.status, "Order deleted");
		Ok(())
	}
}
