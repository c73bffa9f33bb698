//! Per-order mutual exclusion.
//!
//! Read-modify-write operations on one order run one at a time; operations on
//! different orders do not wait for each other. A mutex only stays in the
//! table while some task holds or waits for it, so ids that are never seen
//! again (deleted or nonexistent orders) leave nothing behind.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of one async mutex per order id, created on first use.
#[derive(Default)]
pub struct OrderLocks {
	locks: DashMap<u64, Arc<Mutex<()>>>,
}

/// Exclusive access to one order. The table entry is dropped with the last
/// guard or waiter.
pub struct OrderGuard<'a> {
	locks: &'a OrderLocks,
	order_id: u64,
	guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Waits for exclusive access to an order.
	pub async fn acquire(&self, order_id: u64) -> OrderGuard<'_> {
		// Clone out of the map so no shard lock is held across the await
		let lock = Arc::clone(&self.locks.entry(order_id).or_default());
		OrderGuard {
			locks: self,
			order_id,
			guard: Some(lock.lock_owned().await),
		}
	}

	/// Number of orders currently locked or awaited.
	pub fn len(&self) -> usize {
		self.locks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.locks.is_empty()
	}
}

impl Drop for OrderGuard<'_> {
	fn drop(&mut self) {
		drop(self.guard.take());
		// Any reference beyond the map's own belongs to a waiter. `entry` and
		// `remove_if` share the shard lock, so none can appear mid-check.
		self.locks
			.locks
			.remove_if(&self.order_id, |_, lock| Arc::strong_count(lock) == 1);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_same_order_is_exclusive() {
		let locks = Arc::new(OrderLocks::new());
		let guard = locks.acquire(1).await;

		let contender = {
			let locks = Arc::clone(&locks);
			tokio::spawn(async move {
				let _guard = locks.acquire(1).await;
			})
		};

		tokio::time::sleep(Duration::from_millis(20)).await;
		assert!(!contender.is_finished());

		drop(guard);
		contender.await.unwrap();
		assert!(locks.is_empty());
	}

	#[tokio::test]
	async fn test_different_orders_do_not_wait() {
		let locks = OrderLocks::new();
		let _first = locks.acquire(1).await;
		let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
		assert!(second.is_ok());
	}

	#[tokio::test]
	async fn test_entry_kept_while_waited_on() {
		let locks = Arc::new(OrderLocks::new());
		let guard = locks.acquire(7).await;

		let waiter = {
			let locks = Arc::clone(&locks);
			tokio::spawn(async move {
				let _guard = locks.acquire(7).await;
			})
		};
		tokio::time::sleep(Duration::from_millis(20)).await;

		drop(guard);
		assert_eq!(locks.len(), 1);
		waiter.await.unwrap();
		assert!(locks.is_empty());
	}

	#[tokio::test]
	async fn test_released_ids_leave_no_entry() {
		let locks = OrderLocks::new();
		for order_id in 0..1000 {
			drop(locks.acquire(order_id).await);
		}
		assert!(locks.is_empty());
	}
}
