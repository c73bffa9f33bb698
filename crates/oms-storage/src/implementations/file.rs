//! File-based storage backend for the order service.
//!
//! Each key is stored as one JSON document on disk. Writes are atomic per
//! record (temp file then rename) and serialized within the process.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use oms_types::{BackendTable, ConfigSchema, ImplementationRegistry, ValidationError};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

const FILE_EXTENSION: &str = "json";

/// File-based storage implementation.
///
/// This implementation stores data as files on the filesystem,
/// providing simple persistence without requiring external dependencies.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes writers so a record is never written by two tasks at once.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Sanitizes a key into a filesystem-safe file stem.
	fn sanitize(key: &str) -> String {
		key.replace(['/', ':'], "_")
	}

	/// Converts a storage key to a file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", Self::sanitize(key), FILE_EXTENSION))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		match fs::remove_file(&path).await {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	/// Keys are recovered from file names, so the part after the prefix must
	/// not itself contain `/` or `:`.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let safe_prefix = Self::sanitize(prefix);
		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(FILE_EXTENSION)) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
				tracing::debug!("Skipping file {:?}: name is not valid UTF-8", path);
				continue;
			};
			if let Some(rest) = stem.strip_prefix(&safe_prefix) {
				keys.push(format!("{}{}", prefix, rest));
			}
		}
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

const DEFAULT_STORAGE_PATH: &str = "./data/orders";

/// Reads `storage_path`, falling back to the default directory.
fn parse_path(config: &toml::Value) -> Result<PathBuf, ValidationError> {
	let table = BackendTable::new(config)?;
	match table.string("storage_path")? {
		Some(path) if path.trim().is_empty() => {
			Err(ValidationError::invalid("storage_path", "cannot be empty"))
		},
		Some(path) => Ok(PathBuf::from(path)),
		None => Ok(PathBuf::from(DEFAULT_STORAGE_PATH)),
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		parse_path(config).map(|_| ())
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let base_path = parse_path(config).map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(FileStorage::new(base_path)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}
