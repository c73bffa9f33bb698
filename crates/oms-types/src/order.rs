//! Order types for the order management system.
//!
//! This module defines the persisted order record, the attributes accepted
//! when creating an order, and the composed view returned to callers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PaymentStatus;

/// Represents a persisted physical-goods order.
///
/// The id is assigned by the order store on creation and never changes.
/// Only the lifecycle engine is allowed to change `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: u64,
	/// Name of the customer who placed the order.
	pub customer_name: String,
	/// Date the order was placed.
	pub order_date: NaiveDate,
	/// Total amount of the order. Never negative. Stored as a string so no
	/// precision is lost on disk.
	#[serde(with = "rust_decimal::serde::str")]
	pub total_amount: Decimal,
	/// Number of items in the order.
	pub number_of_items: u32,
	/// Current lifecycle status.
	pub status: OrderStatus,
}

impl Order {
	/// Builds a freshly created order from its attributes.
	pub fn from_new(id: u64, new_order: NewOrder) -> Self {
		Self {
			id,
			customer_name: new_order.customer_name,
			order_date: new_order.order_date,
			total_amount: new_order.total_amount,
			number_of_items: new_order.number_of_items,
			status: OrderStatus::Created,
		}
	}
}

/// Attributes supplied by a caller to create an order.
///
/// Clients of the HTTP API post the same document they read back, so
/// `orderId`, `status` and `paymentStatus` are accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
	pub customer_name: String,
	pub order_date: NaiveDate,
	pub total_amount: Decimal,
	pub number_of_items: u32,
}

/// Status of an order in its lifecycle.
///
/// Forward edges are `Created -> Pending -> Shipped -> Delivered -> Finished`.
/// `Finished` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been registered but not yet submitted for payment.
	Created,
	/// Order is waiting for its payment to complete.
	Pending,
	/// Order has left the warehouse.
	Shipped,
	/// Order has reached the customer.
	Delivered,
	/// Order is complete.
	Finished,
	/// Order was cancelled. Never produced by the lifecycle engine.
	Cancelled,
}

impl OrderStatus {
	/// Every variant, in lifecycle order.
	pub const ALL: [OrderStatus; 6] = [
		OrderStatus::Created,
		OrderStatus::Pending,
		OrderStatus::Shipped,
		OrderStatus::Delivered,
		OrderStatus::Finished,
		OrderStatus::Cancelled,
	];

	/// Returns true if no transition leaves this status.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Finished | OrderStatus::Cancelled)
	}

	/// Returns true if an order in this status may be deleted.
	pub fn is_deletable(&self) -> bool {
		self.is_terminal()
	}

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Created => "CREATED",
			OrderStatus::Pending => "PENDING",
			OrderStatus::Shipped => "SHIPPED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Finished => "FINISHED",
			OrderStatus::Cancelled => "CANCELLED",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Order composed with the payment status observed while building it.
///
/// Never persisted. The payment status is a snapshot and may already be
/// stale when the caller reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
	pub order_id: u64,
	pub customer_name: String,
	pub order_date: NaiveDate,
	pub status: OrderStatus,
	pub number_of_items: u32,
	pub total_amount: Decimal,
	pub payment_status: PaymentStatus,
}

impl OrderView {
	/// Composes a view from a stored order and an observed payment status.
	pub fn compose(order: Order, payment_status: PaymentStatus) -> Self {
		Self {
			order_id: order.id,
			customer_name: order.customer_name,
			order_date: order.order_date,
			status: order.status,
			number_of_items: order.number_of_items,
			total_amount: order.total_amount,
			payment_status,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_new_order() -> NewOrder {
		NewOrder {
			customer_name: "Alice".to_string(),
			order_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
			total_amount: Decimal::new(4999, 2),
			number_of_items: 3,
		}
	}

	#[test]
	fn test_new_order_starts_created() {
		let order = Order::from_new(9, sample_new_order());
		assert_eq!(order.id, 9);
		assert_eq!(order.status, OrderStatus::Created);
		assert_eq!(order.total_amount, Decimal::new(4999, 2));
	}

	#[test]
	fn test_new_order_ignores_client_identity_and_status() {
		let body = r#"{
			"orderId": 77,
			"customerName": "Bob",
			"orderDate": "2024-06-10",
			"status": "FINISHED",
			"numberOfItems": 2,
			"totalAmount": 19.9,
			"paymentStatus": "COMPLETED"
		}"#;

		let new_order: NewOrder = serde_json::from_str(body).unwrap();
		let order = Order::from_new(1, new_order);
		assert_eq!(order.id, 1);
		assert_eq!(order.status, OrderStatus::Created);
		assert_eq!(order.customer_name, "Bob");
	}

	#[test]
	fn test_view_uses_api_field_names() {
		let view = OrderView::compose(Order::from_new(4, sample_new_order()), PaymentStatus::Pending);
		let json = serde_json::to_value(&view).unwrap();

		assert_eq!(json["orderId"], 4);
		assert_eq!(json["customerName"], "Alice");
		assert_eq!(json["orderDate"], "2024-05-01");
		assert_eq!(json["status"], "CREATED");
		assert_eq!(json["numberOfItems"], 3);
		assert_eq!(json["paymentStatus"], "PENDING");
	}

	#[test]
	fn test_terminal_statuses() {
		let terminal: Vec<_> = OrderStatus::ALL
			.into_iter()
			.filter(OrderStatus::is_terminal)
			.collect();
		assert_eq!(terminal, vec![OrderStatus::Finished, OrderStatus::Cancelled]);
		assert!(OrderStatus::Cancelled.is_deletable());
		assert!(!OrderStatus::Delivered.is_deletable());
	}
}
