//! Main entry point for the order management service.
//!
//! Loads the configuration, wires the order store and payment gateway
//! backends it names, and serves the order HTTP API.

use clap::Parser;
use oms_config::Config;
use oms_core::{OrderEngine, OrderEngineBuilder, OrderFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "OMS_CONFIG", default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the order service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order engine with the configured backends
/// 5. Serves the API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order service");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);

	match config.api {
		Some(api_config) if api_config.enabled => {
			server::start_server(api_config, engine).await?;
		},
		_ => {
			tracing::warn!("API server disabled in configuration, nothing to serve");
		},
	}

	tracing::info!("Stopped order service");
	Ok(())
}

/// Builds the order engine with every shipped backend available.
fn build_engine(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	Ok(OrderEngineBuilder::new(config).build(OrderFactories::registered())?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use oms_config::builders::config::ConfigBuilder;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["oms"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["oms", "--config", "custom.toml", "--log-level", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_every_backend_is_available() {
		let factories = OrderFactories::registered();

		let mut storage: Vec<_> = factories.storage_factories.keys().cloned().collect();
		storage.sort();
		assert_eq!(storage, vec!["file", "memory"]);

		let mut payment: Vec<_> = factories.payment_factories.keys().cloned().collect();
		payment.sort();
		assert_eq!(payment, vec!["http", "mock"]);
	}

	#[tokio::test]
	async fn test_build_engine_with_minimal_config() {
		let engine = build_engine(ConfigBuilder::new().build()).unwrap();
		assert!(engine.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		let data_path = temp_dir.path().join("orders");

		let config_content = format!(
			r#"
[service]
id = "oms-file-test"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "{}"

[payment]
primary = "http"
timeout_ms = 500
[payment.implementations.http]
base_url = "${{OMS_TEST_PAYMENTS_URL:-http://127.0.0.1:1}}"

[api]
enabled = true
port = 8081
"#,
			data_path.display()
		);
		std::fs::write(&config_path, config_content).unwrap();

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.service.id, "oms-file-test");
		assert_eq!(config.payment.timeout_ms, 500);
		assert!(config.api.as_ref().is_some_and(|api| api.enabled));

		let engine = build_engine(config).unwrap();
		assert!(engine.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_shipped_config_loads() {
		let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/oms.toml");
		let config = Config::from_file(path).await.unwrap();

		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.payment.primary, "http");
		assert!(config.payment.implementations.contains_key("mock"));
		assert!(build_engine(config).is_ok());
	}
}
