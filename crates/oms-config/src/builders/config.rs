//! Configuration builder for tests and local runs.
//!
//! Produces a `Config` wired to the in-process backends: memory storage and
//! the mock payment backend.

use crate::{ApiConfig, Config, PaymentConfig, ServiceConfig, StorageConfig};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_config: toml::Value,
	payment_primary: String,
	payment_config: toml::Value,
	payment_timeout_ms: u64,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with in-process backends.
	pub fn new() -> Self {
		Self {
			service_id: "oms-test".to_string(),
			storage_primary: "memory".to_string(),
			storage_config: toml::Value::Table(toml::Table::new()),
			payment_primary: "mock".to_string(),
			payment_config: toml::Value::Table(toml::Table::new()),
			payment_timeout_ms: 1000,
			api: None,
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Sets the primary storage implementation and its configuration table.
	pub fn storage(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.storage_primary = primary.into();
		self.storage_config = config;
		self
	}

	/// Sets the primary payment implementation and its configuration table.
	pub fn payment(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.payment_primary = primary.into();
		self.payment_config = config;
		self
	}

	/// Sets the payment lookup timeout in milliseconds.
	pub fn payment_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.payment_timeout_ms = timeout_ms;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			storage: StorageConfig {
				implementations: HashMap::from([(
					self.storage_primary.clone(),
					self.storage_config,
				)]),
				primary: self.storage_primary,
			},
			payment: PaymentConfig {
				implementations: HashMap::from([(
					self.payment_primary.clone(),
					self.payment_config,
				)]),
				primary: self.payment_primary,
				timeout_ms: self.payment_timeout_ms,
			},
			api: self.api,
		}
	}
}
