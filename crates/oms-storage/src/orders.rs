//! Typed order store built on the storage service.
//!
//! Pure data access: no lifecycle rules are enforced here. Ids come from a
//! persisted sequence so they stay unique across restarts of the file backend.

use crate::{StorageError, StorageService};
use oms_types::{NewOrder, Order, StorageKey};
use std::sync::Arc;
use tokio::sync::Mutex;

const ORDER_SEQUENCE: &str = "orders";

/// Durable keyed storage of order records.
pub struct OrderStore {
	storage: Arc<StorageService>,
	/// Guards the read-increment-write of the id sequence.
	sequence_lock: Mutex<()>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			sequence_lock: Mutex::new(()),
		}
	}

	async fn next_id(&self) -> Result<u64, StorageError> {
		let _guard = self.sequence_lock.lock().await;

		let current: u64 = match self
			.storage
			.get(StorageKey::Sequences, ORDER_SEQUENCE)
			.await
		{
			Ok(value) => value,
			Err(StorageError::NotFound) => 0,
			Err(e) => return Err(e),
		};

		let next = current + 1;
		self.storage
			.put(StorageKey::Sequences, ORDER_SEQUENCE, &next)
			.await?;
		Ok(next)
	}

	/// Persists a new order and returns it with its assigned id.
	pub async fn create(&self, new_order: NewOrder) -> Result<Order, StorageError> {
		let id = self.next_id().await?;
		let order = Order::from_new(id, new_order);
		self.storage
			.put(StorageKey::Orders, &id.to_string(), &order)
			.await?;
		Ok(order)
	}

	/// Loads an order by id.
	pub async fn get(&self, id: u64) -> Result<Order, StorageError> {
		self.storage
			.get(StorageKey::Orders, &id.to_string())
			.await
	}

	/// Loads every order, sorted by id.
	pub async fn list(&self) -> Result<Vec<Order>, StorageError> {
		let mut orders: Vec<Order> = self.storage.get_all(StorageKey::Orders).await?;
		orders.sort_by_key(|order| order.id);
		Ok(orders)
	}

	/// Overwrites an existing order.
	///
	/// Fails with `NotFound` if the order was deleted in the meantime.
	pub async fn save(&self, order: Order) -> Result<Order, StorageError> {
		self.storage
			.replace(StorageKey::Orders, &order.id.to_string(), &order)
			.await?;
		Ok(order)
	}

	/// Deletes an order by id.
	pub async fn delete(&self, id: u64) -> Result<(), StorageError> {
		if self.storage.remove(StorageKey::Orders, &id.to_string()).await? {
			Ok(())
		} else {
			Err(StorageError::NotFound)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::{file::FileStorage, memory::MemoryStorage};
	use chrono::NaiveDate;
	use oms_types::OrderStatus;
	use rust_decimal::Decimal;
	use tempfile::TempDir;

	fn memory_store() -> OrderStore {
		OrderStore::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn new_order(customer: &str) -> NewOrder {
		NewOrder {
			customer_name: customer.to_string(),
			order_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
			total_amount: Decimal::new(1250, 2),
			number_of_items: 2,
		}
	}

	#[tokio::test]
	async fn test_create_assigns_increasing_ids() {
		let store = memory_store();

		let first = store.create(new_order("Alice")).await.unwrap();
		let second = store.create(new_order("Bob")).await.unwrap();

		assert_eq!(first.id, 1);
		assert_eq!(second.id, 2);
		assert_eq!(first.status, OrderStatus::Created);
		assert_eq!(store.get(2).await.unwrap().customer_name, "Bob");
	}

	#[tokio::test]
	async fn test_ids_are_not_reused_after_delete() {
		let store = memory_store();
		let first = store.create(new_order("Alice")).await.unwrap();
		store.delete(first.id).await.unwrap();

		let second = store.create(new_order("Bob")).await.unwrap();
		assert_eq!(second.id, 2);
	}

	#[tokio::test]
	async fn test_concurrent_creates_get_distinct_ids() {
		let store = Arc::new(memory_store());

		let handles: Vec<_> = (0..16)
			.map(|i| {
				let store = Arc::clone(&store);
				tokio::spawn(async move { store.create(new_order(&format!("c{}", i))).await })
			})
			.collect();

		let mut ids = Vec::new();
		for handle in handles {
			ids.push(handle.await.unwrap().unwrap().id);
		}
		ids.sort();
		assert_eq!(ids, (1..=16).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn test_list_sorted_by_id() {
		let store = memory_store();
		for name in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"] {
			store.create(new_order(name)).await.unwrap();
		}

		let ids: Vec<u64> = store.list().await.unwrap().iter().map(|o| o.id).collect();
		assert_eq!(ids, (1..=11).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn test_save_and_delete_missing_order() {
		let store = memory_store();
		let mut order = store.create(new_order("Alice")).await.unwrap();

		order.status = OrderStatus::Pending;
		store.save(order.clone()).await.unwrap();
		assert_eq!(store.get(order.id).await.unwrap().status, OrderStatus::Pending);

		store.delete(order.id).await.unwrap();
		assert!(matches!(store.get(order.id).await, Err(StorageError::NotFound)));
		assert!(matches!(store.save(order.clone()).await, Err(StorageError::NotFound)));
		assert!(matches!(store.delete(order.id).await, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_file_backend_keeps_sequence_across_instances() {
		let dir = TempDir::new().unwrap();
		let open = || {
			OrderStore::new(Arc::new(StorageService::new(Box::new(FileStorage::new(
				dir.path().to_path_buf(),
			)))))
		};

		let store = open();
		store.create(new_order("Alice")).await.unwrap();
		store.create(new_order("Bob")).await.unwrap();
		drop(store);

		let reopened = open();
		assert_eq!(reopened.list().await.unwrap().len(), 2);
		let third = reopened.create(new_order("Carol")).await.unwrap();
		assert_eq!(third.id, 3);
	}
}
