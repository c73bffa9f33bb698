//! Builder for wiring an order engine from configuration.
//!
//! Each configured backend is created through its factory function; the one
//! named `primary` in its section is kept.

use crate::engine::OrderEngine;
use oms_config::Config;
use oms_payment::{PaymentError, PaymentInterface, PaymentService};
use oms_storage::{OrderStore, StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct OrderFactories<SF, PF> {
	pub storage_factories: HashMap<String, SF>,
	pub payment_factories: HashMap<String, PF>,
}

impl OrderFactories<oms_storage::StorageFactory, oms_payment::PaymentFactory> {
	/// Every backend shipped with the storage and payment crates.
	pub fn registered() -> Self {
		Self {
			storage_factories: oms_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			payment_factories: oms_payment::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

/// Builder for constructing an OrderEngine with pluggable backends.
pub struct OrderEngineBuilder {
	config: Config,
}

impl OrderEngineBuilder {
	/// Creates a new OrderEngineBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the OrderEngine using the factories for each backend type.
	pub fn build<SF, PF>(self, factories: OrderFactories<SF, PF>) -> Result<OrderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>,
	{
		let storage_backend: Box<dyn StorageInterface> = create_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));
		let store = Arc::new(OrderStore::new(storage));

		let payment_backend: Box<dyn PaymentInterface> = create_primary(
			"payment",
			&self.config.payment.primary,
			&self.config.payment.implementations,
			&factories.payment_factories,
		)?;
		let payments = PaymentService::new(
			Arc::from(payment_backend),
			Duration::from_millis(self.config.payment.timeout_ms),
		);

		Ok(OrderEngine::new(store, payments))
	}
}

/// Creates every configured implementation of one component and returns the
/// primary one. Any configured implementation failing to load is an error.
fn create_primary<T: ?Sized, E, F>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<Box<T>, BuilderError>
where
	E: std::fmt::Display,
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut impls = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, skipping");
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				impls.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if impls.is_empty() {
		return Err(BuilderError::MissingComponent(format!(
			"No valid {} implementations available",
			component
		)));
	}

	impls.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}
