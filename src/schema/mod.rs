//! Declaration surface: typed entries, containers, validators.
//!
//! This module handles:
//! - Typed entry declarations (path, default, optional validator)
//! - Container grouping mirroring nested document objects
//! - Declaration-time checks (duplicate keys, path syntax, bad defaults)
//! - Value coercion between document nodes and Rust types

pub mod container;
pub mod entry;
pub mod validator;
pub mod value;

pub use container::Container;
pub use entry::Entry;
pub use validator::Validator;
pub use value::{CoerceError, ConfigValue, ValueKind};

use crate::error::{ConfigError, Result};

/// Validate a single path segment.
///
/// Segments are non-empty, case-sensitive, and drawn from `[0-9A-Za-z_-]`.
/// Dots are rejected: nesting is expressed with containers, not dotted
/// keys.
pub(crate) fn check_segment(segment: &str) -> Result<()> {
	if segment.is_empty() {
		return Err(ConfigError::InvalidPath {
			segment: segment.to_string(),
			reason: "must not be empty".to_string(),
		});
	}
	if let Some(c) = segment
		.chars()
		.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
	{
		let reason = if c == '.' {
			"segments may not contain dots; nest containers instead".to_string()
		} else {
			format!("character {c:?} is outside [0-9A-Za-z_-]")
		};
		return Err(ConfigError::InvalidPath {
			segment: segment.to_string(),
			reason,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_check_segment() {
		assert!(check_segment("server").is_ok());
		assert!(check_segment("max-retries").is_ok());
		assert!(check_segment("snake_case_2").is_ok());

		assert!(check_segment("").is_err());
		assert!(check_segment("a.b").is_err());
		assert!(check_segment("with space").is_err());
		assert!(check_segment("ünicode").is_err());
	}
}
