//! Persistence for the order management system.
//!
//! Three layers, each one only talking to the one below:
//!
//! - a [`StorageInterface`] backend (memory or file) stores opaque bytes by key;
//! - [`StorageService`] stores JSON values in namespaced `namespace:id` keys;
//! - [`OrderStore`] is the order-shaped contract the engine uses.

use async_trait::async_trait;
use oms_types::{ConfigSchema, ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

mod orders;

pub use orders::OrderStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<serde_json::Error> for StorageError {
	fn from(e: serde_json::Error) -> Self {
		StorageError::Serialization(e.to_string())
	}
}

/// Byte-level key/value backend.
///
/// Writes to one key must not interleave.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Creates or replaces the value under `key`.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Removes `key`, reporting whether there was anything to remove.
	async fn delete(&self, key: &str) -> Result<bool, StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Every key starting with `prefix`, unordered.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Every storage backend shipped with this crate, by registry name.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// JSON values grouped by [`StorageKey`] namespace on top of a backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageKey, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	/// Writes a value, whether or not one was there before.
	pub async fn put<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		value: &T,
	) -> Result<(), StorageError> {
		let bytes = serde_json::to_vec(value)?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Overwrites a value that must already exist.
	pub async fn replace<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		value: &T,
	) -> Result<(), StorageError> {
		let key = Self::key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		self.backend.set_bytes(&key, serde_json::to_vec(value)?).await
	}

	pub async fn get<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Loads a whole namespace. Keys deleted while reading are skipped.
	pub async fn get_all<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
	) -> Result<Vec<T>, StorageError> {
		let prefix = Self::key(namespace, "");
		let mut values = Vec::new();
		for key in self.backend.list_keys(&prefix).await? {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => values.push(serde_json::from_slice(&bytes)?),
				Err(StorageError::NotFound) => {},
				Err(e) => return Err(e),
			}
		}
		Ok(values)
	}

	/// Returns `false` if nothing was stored under the id.
	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn test_replace_requires_existing_value() {
		let storage = service();

		let result = storage.replace(StorageKey::Sequences, "orders", &1u64).await;
		assert!(matches!(result, Err(StorageError::NotFound)));

		storage.put(StorageKey::Sequences, "orders", &1u64).await.unwrap();
		storage.replace(StorageKey::Sequences, "orders", &2u64).await.unwrap();
		let stored: u64 = storage.get(StorageKey::Sequences, "orders").await.unwrap();
		assert_eq!(stored, 2);
	}

	#[tokio::test]
	async fn test_get_all_stays_in_namespace() {
		let storage = service();
		storage.put(StorageKey::Orders, "1", &10u64).await.unwrap();
		storage.put(StorageKey::Orders, "2", &20u64).await.unwrap();
		storage.put(StorageKey::Sequences, "orders", &2u64).await.unwrap();

		let mut all: Vec<u64> = storage.get_all(StorageKey::Orders).await.unwrap();
		all.sort();
		assert_eq!(all, vec![10, 20]);
	}

	#[tokio::test]
	async fn test_remove_reports_presence() {
		let storage = service();
		storage.put(StorageKey::Orders, "1", &"x").await.unwrap();

		assert!(storage.remove(StorageKey::Orders, "1").await.unwrap());
		assert!(!storage.remove(StorageKey::Orders, "1").await.unwrap());
	}

	#[tokio::test]
	async fn test_corrupt_value_is_serialization_error() {
		let storage = service();
		storage.put(StorageKey::Orders, "1", &"not a number").await.unwrap();

		let result: Result<u64, _> = storage.get(StorageKey::Orders, "1").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
