use crate::error::{ConfigError, Result};
use crate::schema::check_segment;
use crate::schema::entry::{Entry, EntryCore};
use crate::schema::validator::Validator;
use crate::schema::value::ConfigValue;
use std::sync::Arc;

/// A named group of entries and nested containers.
///
/// Mirrors a nested object in the document. Keys (entry or container) are
/// unique within one container; a duplicate is a declaration-time error,
/// raised immediately rather than at load.
pub struct Container {
	key: Option<String>,
	children: Vec<Child>,
}

pub(crate) enum Child {
	Entry(Arc<EntryCore>),
	Container(Container),
}

impl Child {
	fn key(&self) -> &str {
		match self {
			Child::Entry(core) => &core.key,
			Child::Container(container) => container.key.as_deref().unwrap_or(""),
		}
	}
}

impl Container {
	/// The root of a declared schema. Has no key of its own; it mirrors
	/// the document root.
	pub fn root() -> Self {
		Container {
			key: None,
			children: Vec::new(),
		}
	}

	/// A nestable container with the given key.
	pub fn new(key: &str) -> Result<Self> {
		check_segment(key)?;
		Ok(Container {
			key: Some(key.to_string()),
			children: Vec::new(),
		})
	}

	fn check_duplicate(&self, key: &str) -> Result<()> {
		if self.children.iter().any(|child| child.key() == key) {
			return Err(ConfigError::DuplicatePath {
				path: key.to_string(),
			});
		}
		Ok(())
	}

	/// Declare an entry with a default value.
	pub fn entry<T: ConfigValue>(&mut self, key: &str, default: T) -> Result<Entry<T>> {
		self.declare(key, default, None)
	}

	/// Declare an entry with a default value and a validator.
	pub fn entry_validated<T: ConfigValue>(
		&mut self,
		key: &str,
		default: T,
		validator: Validator<T>,
	) -> Result<Entry<T>> {
		self.declare(key, default, Some(validator))
	}

	fn declare<T: ConfigValue>(
		&mut self,
		key: &str,
		default: T,
		validator: Option<Validator<T>>,
	) -> Result<Entry<T>> {
		self.check_duplicate(key)?;
		let entry = Entry::new(key, default, validator)?;
		self.children.push(Child::Entry(Arc::clone(entry.core())));
		Ok(entry)
	}

	/// Attach a child container.
	pub fn nest(&mut self, child: Container) -> Result<()> {
		let Some(key) = child.key.as_deref() else {
			return Err(ConfigError::InvalidPath {
				segment: String::new(),
				reason: "the root container cannot be nested".to_string(),
			});
		};
		self.check_duplicate(key)?;
		self.children.push(Child::Container(child));
		Ok(())
	}

	/// Flatten the declared tree depth-first into the reconciliation plan.
	///
	/// Entry slots are assigned in declaration order; container paths come
	/// out in the same order the reconciler must ensure them.
	pub(crate) fn flatten(&self) -> Plan {
		let mut plan = Plan {
			entries: Vec::new(),
			containers: Vec::new(),
		};
		self.flatten_into(&mut Vec::new(), &mut plan);
		plan
	}

	fn flatten_into(&self, prefix: &mut Vec<String>, plan: &mut Plan) {
		for child in &self.children {
			match child {
				Child::Entry(core) => {
					let mut segments = prefix.clone();
					segments.push(core.key.clone());
					let path = segments.join(".");
					plan.entries.push(PlannedEntry {
						core: Arc::clone(core),
						segments,
						path,
					});
				}
				Child::Container(container) => {
					let key = container.key.clone().unwrap_or_default();
					prefix.push(key);
					plan.containers.push(PlannedContainer {
						segments: prefix.clone(),
						path: prefix.join("."),
					});
					container.flatten_into(prefix, plan);
					prefix.pop();
				}
			}
		}
	}
}

/// The flattened declaration tree consumed by the reconciler.
pub(crate) struct Plan {
	pub(crate) entries: Vec<PlannedEntry>,
	pub(crate) containers: Vec<PlannedContainer>,
}

pub(crate) struct PlannedEntry {
	pub(crate) core: Arc<EntryCore>,
	pub(crate) segments: Vec<String>,
	pub(crate) path: String,
}

pub(crate) struct PlannedContainer {
	pub(crate) segments: Vec<String>,
	pub(crate) path: String,
}
