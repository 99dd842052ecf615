use crate::error::{ConfigError, Result};
use crate::node::Node;
use crate::schema::check_segment;
use crate::schema::validator::Validator;
use crate::schema::value::{ConfigValue, ValueKind};
use arc_swap::ArcSwap;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// A type-erased resolved value.
pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// A resolved entry value: the typed value plus its canonical node.
///
/// The canonical node is what `to_node` produces for the typed value, not
/// the document's spelling. Reload diffs compare canonical nodes, so an
/// integer document value widened into a float entry equals its float
/// spelling.
#[derive(Clone)]
pub(crate) struct Resolved {
	pub(crate) value: AnyValue,
	pub(crate) canonical: Node,
}

impl std::fmt::Debug for Resolved {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Resolved")
			.field("value", &"<any>")
			.field("canonical", &self.canonical)
			.finish()
	}
}

/// The whole resolved-value set, indexed by entry slot in declaration order.
pub(crate) type Snapshot = Vec<Resolved>;

/// Shared cell holding the current snapshot.
///
/// Load/reload/set publish a complete new snapshot with a single pointer
/// swap; readers never observe a partially applied reconciliation.
pub(crate) struct SnapshotCell {
	pub(crate) values: ArcSwap<Snapshot>,
}

/// Failure to decode a document node for an entry.
pub(crate) enum DecodeError {
	Mismatch { expected: ValueKind, actual: String },
	Invalid { reason: String },
}

impl DecodeError {
	/// Attach the entry's path, producing the public error.
	pub(crate) fn at_path(self, path: &str) -> ConfigError {
		match self {
			DecodeError::Mismatch { expected, actual } => ConfigError::TypeMismatch {
				path: path.to_string(),
				expected: expected.to_string(),
				actual,
			},
			DecodeError::Invalid { reason } => ConfigError::Validation {
				path: path.to_string(),
				reason,
			},
		}
	}
}

/// Where an entry lives once its container is attached to a config.
pub(crate) struct Binding {
	pub(crate) slot: usize,
	pub(crate) path: String,
	pub(crate) cell: Arc<SnapshotCell>,
}

/// The erased declaration shared between a `Container` and the typed
/// `Entry<T>` handles cloned from it.
pub(crate) struct EntryCore {
	pub(crate) key: String,
	pub(crate) kind: ValueKind,
	pub(crate) default_node: Node,
	pub(crate) default_value: AnyValue,
	pub(crate) decode: Box<dyn Fn(&Node) -> std::result::Result<Resolved, DecodeError> + Send + Sync>,
	pub(crate) binding: OnceLock<Binding>,
}

impl EntryCore {
	/// Bind this entry to its slot in a config's snapshot.
	///
	/// Called exactly once: the container owning the core is consumed by
	/// the config build.
	pub(crate) fn bind(&self, slot: usize, path: String, cell: Arc<SnapshotCell>) {
		let _ = self.binding.set(Binding { slot, path, cell });
	}

	/// Decode and validate a programmatic value already in node form.
	pub(crate) fn decode_at(&self, node: &Node, path: &str) -> Result<Resolved> {
		(self.decode)(node).map_err(|e| e.at_path(path))
	}
}

/// A typed, path-addressed configuration entry.
///
/// Handles are cheap to clone and read the owning config's current
/// snapshot without locking. Before the entry's container is attached to
/// a loaded config, reads return the static default.
pub struct Entry<T: ConfigValue> {
	core: Arc<EntryCore>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: ConfigValue> Clone for Entry<T> {
	fn clone(&self) -> Self {
		Entry {
			core: Arc::clone(&self.core),
			_marker: PhantomData,
		}
	}
}

impl<T: ConfigValue> Entry<T> {
	pub(crate) fn new(key: &str, default: T, validator: Option<Validator<T>>) -> Result<Self> {
		check_segment(key)?;

		// Defaults must satisfy their own validator; a bad default is a
		// programming error caught at declaration time.
		if let Some(validator) = &validator {
			validator(&default).map_err(|reason| ConfigError::Validation {
				path: key.to_string(),
				reason,
			})?;
		}

		let default_node = default.to_node();
		let decode = Box::new(move |node: &Node| {
			let value = T::from_node(node).map_err(|e| DecodeError::Mismatch {
				expected: e.expected,
				actual: e.actual,
			})?;
			if let Some(validator) = &validator {
				validator(&value).map_err(|reason| DecodeError::Invalid { reason })?;
			}
			Ok(Resolved {
				canonical: value.to_node(),
				value: Arc::new(value),
			})
		});

		Ok(Entry {
			core: Arc::new(EntryCore {
				key: key.to_string(),
				kind: T::kind(),
				default_node,
				default_value: Arc::new(default),
				decode,
				binding: OnceLock::new(),
			}),
			_marker: PhantomData,
		})
	}

	pub(crate) fn core(&self) -> &Arc<EntryCore> {
		&self.core
	}

	/// The dotted path of this entry, or its bare key before attachment.
	pub fn path(&self) -> &str {
		match self.core.binding.get() {
			Some(binding) => &binding.path,
			None => &self.core.key,
		}
	}

	/// The declared shape of this entry.
	pub fn kind(&self) -> &ValueKind {
		&self.core.kind
	}

	/// The static default declared for this entry.
	pub fn default(&self) -> T {
		// The core was built from a T; this downcast cannot fail.
		self.core
			.default_value
			.downcast_ref::<T>()
			.cloned()
			.expect("entry default holds the declared type")
	}

	/// The current resolved value.
	///
	/// A pure snapshot read: no locking, safe to call from any thread
	/// while a reload is in progress. Returns the static default until
	/// the owning config has loaded.
	pub fn get(&self) -> T {
		match self.core.binding.get() {
			Some(binding) => {
				let snapshot = binding.cell.values.load();
				match snapshot
					.get(binding.slot)
					.and_then(|resolved| resolved.value.downcast_ref::<T>())
				{
					Some(value) => value.clone(),
					None => self.default(),
				}
			}
			None => self.default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::validator;

	#[test]
	fn test_unattached_entry_returns_default() {
		let entry = Entry::new("port", 8080_i64, None).unwrap();
		assert_eq!(entry.get(), 8080);
		assert_eq!(entry.path(), "port");
	}

	#[test]
	fn test_invalid_default_rejected_at_declaration() {
		let result = Entry::new("port", 99999_i64, Some(validator::in_range(1, 65535)));
		match result {
			Err(ConfigError::Validation { path, .. }) => assert_eq!(path, "port"),
			_ => panic!("Expected Validation error"),
		}
	}

	#[test]
	fn test_invalid_segment_rejected() {
		let result = Entry::new("server.port", 1_i64, None);
		assert!(matches!(result, Err(ConfigError::InvalidPath { .. })));
	}

	#[test]
	fn test_decode_applies_validator() {
		let entry = Entry::new("port", 8080_i64, Some(validator::in_range(1, 65535))).unwrap();
		let err = entry
			.core()
			.decode_at(&Node::from(99999), "server.port")
			.unwrap_err();
		match err {
			ConfigError::Validation { path, .. } => assert_eq!(path, "server.port"),
			_ => panic!("Expected Validation error"),
		}
	}

	#[test]
	fn test_decode_reports_mismatch() {
		let entry = Entry::new("port", 8080_i64, None).unwrap();
		let err = entry
			.core()
			.decode_at(&Node::from("abc"), "server.port")
			.unwrap_err();
		match err {
			ConfigError::TypeMismatch {
				path,
				expected,
				actual,
			} => {
				assert_eq!(path, "server.port");
				assert_eq!(expected, "integer");
				assert_eq!(actual, "string");
			}
			_ => panic!("Expected TypeMismatch error"),
		}
	}

	#[test]
	fn test_clone_shares_core() {
		let entry = Entry::new("debug", false, None).unwrap();
		let other = entry.clone();
		assert_eq!(entry.path(), other.path());
	}
}
