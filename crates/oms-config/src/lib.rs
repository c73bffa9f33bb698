//! Configuration module for the order management system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required configuration values are
//! properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders {
	pub mod config;
}
mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the order service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to the service instance.
	pub service: ServiceConfig,
	/// Configuration for the order storage backend.
	pub storage: StorageConfig,
	/// Configuration for the payment status gateway.
	pub payment: PaymentConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the payment status gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Time budget for one payment lookup, in milliseconds. A lookup that
	/// exceeds it is treated like any other payment service failure.
	#[serde(default = "default_payment_timeout_ms")]
	pub timeout_ms: u64,
	/// Map of payment implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Returns the default payment lookup timeout in milliseconds.
fn default_payment_timeout_ms() -> u64 {
	5000
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration. Only the local web console origin when absent.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS; `"*"` allows any origin.
	pub allowed_origins: Vec<String>,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	8081
}

/// Returns the default API timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

/// Returns the default maximum request size in bytes.
fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Ensures the service ID is not empty
	/// - Checks that the primary storage and payment backends are configured
	/// - Bounds the payment lookup timeout
	/// - Checks the API port when the API is enabled
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;
		validate_primary("payment", &self.payment.primary, &self.payment.implementations)?;

		if self.payment.timeout_ms == 0 {
			return Err(ConfigError::Validation(
				"Payment timeout_ms must be greater than 0".into(),
			));
		}
		if self.payment.timeout_ms > 60_000 {
			return Err(ConfigError::Validation(
				"Payment timeout_ms cannot exceed 60000 (1 minute)".into(),
			));
		}

		if let Some(api) = &self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation(
					"API port must be set when the API is enabled".into(),
				));
			}
		}

		Ok(())
	}
}

/// Checks that a section names a primary implementation that is configured.
fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[service]
id = "oms-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[payment]
primary = "http"
[payment.implementations.http]
base_url = "http://localhost:8082"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("OMS_TEST_HOST", "localhost");
		std::env::set_var("OMS_TEST_PORT", "8082");

		let input = "base_url = \"http://${OMS_TEST_HOST}:${OMS_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "base_url = \"http://localhost:8082\"");

		std::env::remove_var("OMS_TEST_HOST");
		std::env::remove_var("OMS_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${OMS_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${OMS_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("OMS_MISSING_VAR"));
	}

	#[test]
	fn test_parse_with_defaults() {
		let config: Config = BASE_CONFIG.parse().unwrap();

		assert_eq!(config.service.id, "oms-test");
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.payment.primary, "http");
		assert_eq!(config.payment.timeout_ms, 5000);
		assert!(config.api.is_none());
	}

	#[test]
	fn test_api_section_defaults() {
		let config: Config = format!("{}\n[api]\nenabled = true\n", BASE_CONFIG)
			.parse()
			.unwrap();
		let api = config.api.unwrap();

		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 8081);
		assert_eq!(api.max_request_size, 1024 * 1024);
		assert!(api.cors.is_none());
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("OMS_TEST_PAYMENT_URL", "http://payments:8082");

		let config_str = BASE_CONFIG.replace("http://localhost:8082", "${OMS_TEST_PAYMENT_URL}");
		let config: Config = config_str.parse().unwrap();
		assert_eq!(
			config.payment.implementations["http"]
				.get("base_url")
				.and_then(|v| v.as_str()),
			Some("http://payments:8082")
		);

		std::env::remove_var("OMS_TEST_PAYMENT_URL");
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = BASE_CONFIG.replace("primary = \"memory\"", "primary = \"file\"");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file' not found"));

		let config_str = BASE_CONFIG.replace("primary = \"http\"", "primary = \"mock\"");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary payment 'mock' not found"));
	}

	#[test]
	fn test_payment_timeout_bounds() {
		let zero = BASE_CONFIG.replace("primary = \"http\"", "primary = \"http\"\ntimeout_ms = 0");
		assert!(matches!(
			zero.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));

		let huge =
			BASE_CONFIG.replace("primary = \"http\"", "primary = \"http\"\ntimeout_ms = 120000");
		assert!(matches!(
			huge.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_empty_service_id_rejected() {
		let config_str = BASE_CONFIG.replace("id = \"oms-test\"", "id = \"\"");
		assert!(config_str
			.parse::<Config>()
			.unwrap_err()
			.to_string()
			.contains("Service ID cannot be empty"));
	}
}
