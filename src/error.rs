use std::path::PathBuf;

/// Library-level structured errors for confit.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// Declaration-time errors (`DuplicatePath`, `InvalidPath`, and a default
/// value failing its own validator) indicate programming mistakes and are
/// raised while building the schema, before any I/O. Everything else is a
/// runtime condition surfaced from `load`/`reload`/`save`/`prune`/`set`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Failed to parse {format} document: {message}")]
	Parse {
		format: &'static str,
		message: String,
	},

	#[error("Type mismatch at {path}: expected {expected}, found {actual}")]
	TypeMismatch {
		path: String,
		expected: String,
		actual: String,
	},

	#[error("Invalid value at {path}: {reason}")]
	Validation { path: String, reason: String },

	#[error("Failed to access backing store: {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("No document found at {path}")]
	NotFound { path: PathBuf },

	#[error("Duplicate key in declaration: {path}")]
	DuplicatePath { path: String },

	#[error("Invalid path segment {segment:?}: {reason}")]
	InvalidPath { segment: String, reason: String },

	#[error("The {format} format does not support {reason}")]
	Unsupported {
		format: &'static str,
		reason: String,
	},

	#[error("Config has not been loaded")]
	NotLoaded,

	#[error("Config has already been loaded")]
	AlreadyLoaded,

	#[error("Entry {path} is not declared on this config")]
	UnknownEntry { path: String },
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
