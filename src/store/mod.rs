//! Backing stores for persisted documents.
//!
//! This module handles:
//! - The `Store` interface the config reads and writes through
//! - `FileStore` for documents on disk
//! - `MemoryStore` for tests and ephemeral configs
//!
//! A missing document is a distinct condition (`NotFound`) rather than a
//! plain I/O failure: first load treats it as an empty document so that
//! defaults can self-document on the first save.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A location a configuration document is read from and written to.
pub trait Store: Send + Sync {
	/// Read the whole document. Fails with `NotFound` if none exists yet.
	fn read(&self) -> Result<Vec<u8>>;

	/// Replace the whole document.
	fn write(&self, bytes: &[u8]) -> Result<()>;
}

// A shared store handle is itself a store; callers keep a clone to edit
// the document from outside the config, as tests do.
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
	fn read(&self) -> Result<Vec<u8>> {
		(**self).read()
	}

	fn write(&self, bytes: &[u8]) -> Result<()> {
		(**self).write(bytes)
	}
}

/// A document stored in a file on disk.
///
/// Writing creates missing parent directories.
pub struct FileStore {
	path: PathBuf,
}

impl FileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		FileStore { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Store for FileStore {
	fn read(&self) -> Result<Vec<u8>> {
		std::fs::read(&self.path).map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				ConfigError::NotFound {
					path: self.path.clone(),
				}
			} else {
				ConfigError::Io {
					path: self.path.clone(),
					source,
				}
			}
		})
	}

	fn write(&self, bytes: &[u8]) -> Result<()> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
				path: self.path.clone(),
				source,
			})?;
		}
		std::fs::write(&self.path, bytes).map_err(|source| ConfigError::Io {
			path: self.path.clone(),
			source,
		})
	}
}

/// An in-memory document, primarily for tests.
pub struct MemoryStore {
	bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
	/// An empty store: reads fail with `NotFound` until the first write.
	pub fn new() -> Self {
		MemoryStore {
			bytes: Mutex::new(None),
		}
	}

	/// A store pre-filled with a document.
	pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		MemoryStore {
			bytes: Mutex::new(Some(bytes.into())),
		}
	}

	/// The current document, if any.
	pub fn contents(&self) -> Option<Vec<u8>> {
		self.lock().clone()
	}

	/// Replace the document from outside, as an external edit would.
	pub fn replace(&self, bytes: impl Into<Vec<u8>>) {
		*self.lock() = Some(bytes.into());
	}

	/// Remove the document, as an external deletion would.
	pub fn clear(&self) {
		*self.lock() = None;
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
		self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		MemoryStore::new()
	}
}

impl Store for MemoryStore {
	fn read(&self) -> Result<Vec<u8>> {
		self.lock().clone().ok_or(ConfigError::NotFound {
			path: PathBuf::from("<memory>"),
		})
	}

	fn write(&self, bytes: &[u8]) -> Result<()> {
		*self.lock() = Some(bytes.to_vec());
		Ok(())
	}
}
