//! Checks for backend configuration tables.
//!
//! Each storage and payment backend is handed its own TOML table. A backend
//! wraps it in [`BackendTable`] and reads the fields it understands; every
//! read reports problems with the field name attached, so a factory checks
//! and extracts its settings in one pass. Keys a backend does not read are
//! ignored.

use std::ops::RangeInclusive;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: &'static str,
	},
}

impl ValidationError {
	pub fn invalid(field: &str, message: impl Into<String>) -> Self {
		ValidationError::InvalidValue {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

/// Typed read access to one backend's configuration table.
#[derive(Debug, Clone, Copy)]
pub struct BackendTable<'a> {
	table: &'a toml::Table,
}

impl<'a> BackendTable<'a> {
	/// Wraps a backend configuration, which must be a table.
	pub fn new(config: &'a toml::Value) -> Result<Self, ValidationError> {
		config
			.as_table()
			.map(|table| Self { table })
			.ok_or(ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str(),
			})
	}

	fn typed<T>(
		&self,
		name: &str,
		expected: &'static str,
		read: impl Fn(&'a toml::Value) -> Option<T>,
	) -> Result<Option<T>, ValidationError> {
		match self.table.get(name) {
			None => Ok(None),
			Some(value) => read(value)
				.map(Some)
				.ok_or_else(|| ValidationError::TypeMismatch {
					field: name.to_string(),
					expected,
					actual: value.type_str(),
				}),
		}
	}

	/// Optional string field.
	pub fn string(&self, name: &str) -> Result<Option<&'a str>, ValidationError> {
		self.typed(name, "string", toml::Value::as_str)
	}

	/// Required string field.
	pub fn required_string(&self, name: &str) -> Result<&'a str, ValidationError> {
		self.string(name)?
			.ok_or_else(|| ValidationError::MissingField(name.to_string()))
	}

	/// Optional integer field that must fall within `range`.
	pub fn integer_in(
		&self,
		name: &str,
		range: RangeInclusive<i64>,
	) -> Result<Option<i64>, ValidationError> {
		let value = self.typed(name, "integer", toml::Value::as_integer)?;
		match value {
			Some(v) if !range.contains(&v) => Err(ValidationError::invalid(
				name,
				format!(
					"{} is outside {}..={}",
					v,
					range.start(),
					range.end()
				),
			)),
			_ => Ok(value),
		}
	}

	/// Optional nested table.
	pub fn table(&self, name: &str) -> Result<Option<&'a toml::Table>, ValidationError> {
		self.typed(name, "table", toml::Value::as_table)
	}
}

/// Validation entry point exposed by every backend.
pub trait ConfigSchema: Send + Sync {
	/// Checks a backend configuration without building the backend.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
