//! In-process payment backend.
//!
//! Holds a table of order id to payment statuses instead of calling a remote
//! service. The table can be seeded from configuration and changed at
//! runtime, which makes it suitable for local runs and tests.

use crate::{PaymentError, PaymentInterface};
use async_trait::async_trait;
use oms_types::{
	BackendTable, ConfigSchema, ImplementationRegistry, PaymentRecord, PaymentStatus,
	ValidationError,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Payment backend backed by an in-memory table.
///
/// Orders absent from the table have no payments.
#[derive(Default)]
pub struct MockPayments {
	payments: RwLock<HashMap<u64, Vec<PaymentRecord>>>,
}

impl MockPayments {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the payments of an order with a single payment in `status`.
	pub async fn set_status(&self, order_id: u64, status: PaymentStatus) {
		let mut record = PaymentRecord::with_status(status);
		record.order_id = Some(order_id);
		self.payments.write().await.insert(order_id, vec![record]);
	}

	/// Appends a payment to an order.
	pub async fn add_payment(&self, order_id: u64, record: PaymentRecord) {
		self.payments
			.write()
			.await
			.entry(order_id)
			.or_default()
			.push(record);
	}

	/// Forgets every payment of an order.
	pub async fn clear(&self, order_id: u64) {
		self.payments.write().await.remove(&order_id);
	}
}

#[async_trait]
impl PaymentInterface for MockPayments {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockPaymentsSchema)
	}

	async fn payments_for_order(&self, order_id: u64) -> Result<Vec<PaymentRecord>, PaymentError> {
		let payments = self.payments.read().await;
		payments
			.get(&order_id)
			.cloned()
			.ok_or(PaymentError::NotFound)
	}
}

/// Reads the optional `statuses` seed table.
fn parse_seed(config: &toml::Value) -> Result<HashMap<u64, Vec<PaymentRecord>>, ValidationError> {
	let table = BackendTable::new(config)?;
	let mut payments = HashMap::new();
	let Some(statuses) = table.table("statuses")? else {
		return Ok(payments);
	};

	for (key, value) in statuses {
		let field = format!("statuses.{}", key);
		let order_id: u64 = key
			.parse()
			.map_err(|_| ValidationError::invalid(&field, "key is not an order id"))?;
		let status: PaymentStatus = value
			.as_str()
			.ok_or(ValidationError::TypeMismatch {
				field: field.clone(),
				expected: "string",
				actual: value.type_str(),
			})?
			.parse()
			.map_err(|e: String| ValidationError::invalid(&field, e))?;

		let mut record = PaymentRecord::with_status(status);
		record.order_id = Some(order_id);
		payments.insert(order_id, vec![record]);
	}
	Ok(payments)
}

/// Configuration schema for MockPayments.
pub struct MockPaymentsSchema;

impl ConfigSchema for MockPaymentsSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		parse_seed(config).map(|_| ())
	}
}

/// Factory function to create an in-process payment backend from configuration.
///
/// Configuration parameters:
/// - `statuses`: Optional table of order id to payment status, e.g.
///   `statuses = { "1" = "COMPLETED" }`
pub fn create_payments(config: &toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError> {
	let payments = parse_seed(config).map_err(|e| PaymentError::Configuration(e.to_string()))?;
	Ok(Box::new(MockPayments {
		payments: RwLock::new(payments),
	}))
}

/// Registry for the in-process payment backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::PaymentFactory;

	fn factory() -> Self::Factory {
		create_payments
	}
}

impl crate::PaymentRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_runtime_updates() {
		let payments = MockPayments::new();
		assert!(matches!(
			payments.payments_for_order(1).await,
			Err(PaymentError::NotFound)
		));

		payments.set_status(1, PaymentStatus::Failed).await;
		payments
			.add_payment(1, PaymentRecord::with_status(PaymentStatus::Completed))
			.await;
		let records = payments.payments_for_order(1).await.unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].status, PaymentStatus::Failed);

		payments.clear(1).await;
		assert!(payments.payments_for_order(1).await.is_err());
	}

	#[tokio::test]
	async fn test_seeded_from_config() {
		let config: toml::Value = toml::from_str(
			r#"
[statuses]
"1" = "COMPLETED"
"2" = "FAILED"
"#,
		)
		.unwrap();

		let payments = create_payments(&config).unwrap();
		assert_eq!(
			payments.payments_for_order(1).await.unwrap()[0].status,
			PaymentStatus::Completed
		);
		assert_eq!(
			payments.payments_for_order(2).await.unwrap()[0].status,
			PaymentStatus::Failed
		);
		assert!(payments.payments_for_order(3).await.is_err());
	}

	#[test]
	fn test_invalid_seed_rejected() {
		for body in [
			"[statuses]\n\"1\" = \"REFUNDED\"\n",
			"[statuses]\n\"abc\" = \"COMPLETED\"\n",
			"[statuses]\n\"1\" = 3\n",
		] {
			let config: toml::Value = toml::from_str(body).unwrap();
			assert!(
				matches!(create_payments(&config), Err(PaymentError::Configuration(_))),
				"accepted {}",
				body
			);
		}
	}
}
