//! Config orchestration: load, save, reload, change notification.
//!
//! This module handles:
//! - The Unloaded → Loaded state machine
//! - Wiring a declared container tree to a provider and a backing store
//! - Atomic publication of resolved values (whole-snapshot pointer swap)
//! - Change listeners fired on reload deltas
//! - Pruning undeclared keys from the document

use crate::error::{ConfigError, Result};
use crate::node::Node;
use crate::provider::Provider;
use crate::reconcile::reconcile;
use crate::schema::container::Plan;
use crate::schema::entry::{AnyValue, Resolved, Snapshot, SnapshotCell};
use crate::schema::value::ConfigValue;
use crate::schema::{Container, Entry};
use crate::store::Store;
use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

/// A changed entry reported to whole-config listeners.
///
/// Values are canonical nodes: format-neutral, independent of how the
/// document spelled them.
pub struct ChangeEvent<'a> {
	pub path: &'a str,
	pub old: &'a Node,
	pub new: &'a Node,
}

type GlobalListener = Box<dyn Fn(&ChangeEvent<'_>) + Send + Sync>;
type SlotListener = Box<dyn Fn(&AnyValue, &AnyValue) + Send + Sync>;

enum Listener {
	Global(GlobalListener),
	Slot { slot: usize, callback: SlotListener },
}

struct DocState {
	/// The live document tree; `None` until the first successful load.
	root: Option<Node>,
}

/// A declared schema bound to one document in one backing store.
///
/// `load`/`reload`/`save`/`set`/`prune` serialize on an internal mutex.
/// Entry reads go through the published snapshot and never block; a
/// reload in progress is invisible to readers until it commits.
pub struct Config {
	provider: Box<dyn Provider>,
	store: Box<dyn Store>,
	plan: Plan,
	cell: Arc<SnapshotCell>,
	state: Mutex<DocState>,
	listeners: Mutex<Vec<Listener>>,
}

impl Config {
	/// Bind a declared container tree to a provider and a backing store.
	///
	/// Consumes the declaration; entry handles cloned from it stay live
	/// and read this config's snapshot from now on. All declaration-time
	/// checks have already run while the containers were built.
	pub fn new(root: Container, provider: impl Provider + 'static, store: impl Store + 'static) -> Self {
		let plan = root.flatten();
		let defaults: Snapshot = plan
			.entries
			.iter()
			.map(|entry| Resolved {
				value: entry.core.default_value.clone(),
				canonical: entry.core.default_node.clone(),
			})
			.collect();
		let cell = Arc::new(SnapshotCell {
			values: ArcSwap::from_pointee(defaults),
		});
		for (slot, entry) in plan.entries.iter().enumerate() {
			entry.core.bind(slot, entry.path.clone(), Arc::clone(&cell));
		}

		Config {
			provider: Box::new(provider),
			store: Box::new(store),
			plan,
			cell,
			state: Mutex::new(DocState { root: None }),
			listeners: Mutex::new(Vec::new()),
		}
	}

	/// Whether a load has succeeded.
	pub fn is_loaded(&self) -> bool {
		self.lock_state().root.is_some()
	}

	/// The dotted paths of all declared entries, in declaration order.
	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.plan.entries.iter().map(|entry| entry.path.as_str())
	}

	/// Load the document and resolve all declared entries.
	///
	/// A missing document is not an error: reconciliation starts from an
	/// empty tree and every entry resolves to its default, so the next
	/// `save` writes a fully populated document. On any parse,
	/// coercion, or validation failure the config stays unloaded and no
	/// entry values change.
	pub fn load(&self) -> Result<()> {
		let mut state = self.lock_state();
		if state.root.is_some() {
			return Err(ConfigError::AlreadyLoaded);
		}

		let mut tree = match self.store.read() {
			Ok(bytes) => self.provider.parse(&bytes)?,
			Err(ConfigError::NotFound { path }) => {
				tracing::debug!(
					path = %path.display(),
					"no existing document, starting from defaults"
				);
				Node::object()
			}
			Err(e) => return Err(e),
		};

		let snapshot = reconcile(&mut tree, &self.plan)?;
		state.root = Some(tree);
		self.cell.values.store(Arc::new(snapshot));
		tracing::info!(
			entries = self.plan.entries.len(),
			format = self.provider.format(),
			"configuration loaded"
		);
		Ok(())
	}

	/// Re-read the document and republish resolved values.
	///
	/// On success, listeners run synchronously for each entry whose
	/// resolved value changed, in declaration order. On any failure the
	/// previous values and document stay fully intact. A missing backing
	/// store keeps current values and fires nothing.
	pub fn reload(&self) -> Result<()> {
		let mut state = self.lock_state();
		if state.root.is_none() {
			return Err(ConfigError::NotLoaded);
		}

		let bytes = match self.store.read() {
			Ok(bytes) => bytes,
			Err(ConfigError::NotFound { path }) => {
				tracing::warn!(
					path = %path.display(),
					"backing store missing on reload, keeping current values"
				);
				return Ok(());
			}
			Err(e) => return Err(e),
		};
		let mut tree = self.provider.parse(&bytes)?;
		let snapshot = reconcile(&mut tree, &self.plan)?;

		let previous = self.cell.values.load_full();
		let current = Arc::new(snapshot);
		state.root = Some(tree);
		self.cell.values.store(Arc::clone(&current));
		// Listeners may read entries; release the critical section first.
		drop(state);

		let changed: Vec<usize> = (0..current.len())
			.filter(|&slot| previous[slot].canonical != current[slot].canonical)
			.collect();
		if !changed.is_empty() {
			tracing::debug!(changed = changed.len(), "reload changed entry values");
			self.notify(&previous, &current, &changed);
		}
		Ok(())
	}

	/// Serialize the current document and write it to the backing store.
	///
	/// In-memory entry values are not touched.
	pub fn save(&self) -> Result<()> {
		let state = self.lock_state();
		let Some(root) = &state.root else {
			return Err(ConfigError::NotLoaded);
		};
		let bytes = self.provider.serialize(root)?;
		self.store.write(&bytes)?;
		tracing::debug!(
			bytes = bytes.len(),
			format = self.provider.format(),
			"configuration saved"
		);
		Ok(())
	}

	/// Set an entry's value programmatically.
	///
	/// The value is validated, written into the live document tree, and
	/// published in a fresh snapshot; the next `save` persists it. Fires
	/// no change listeners (those report external edits discovered by
	/// reload).
	pub fn set<T: ConfigValue>(&self, entry: &Entry<T>, value: T) -> Result<()> {
		let slot = self.slot_of(entry)?;
		let planned = &self.plan.entries[slot];
		let resolved = planned.core.decode_at(&value.to_node(), &planned.path)?;

		let mut state = self.lock_state();
		let Some(root) = &mut state.root else {
			return Err(ConfigError::NotLoaded);
		};
		root.set(
			planned.segments.iter().map(String::as_str),
			resolved.canonical.clone(),
		);
		let mut snapshot: Snapshot = (**self.cell.values.load()).clone();
		snapshot[slot] = resolved;
		self.cell.values.store(Arc::new(snapshot));
		Ok(())
	}

	/// Remove document keys not covered by any declared entry or
	/// container, write the stripped document back, and return the
	/// removed paths.
	///
	/// Declared container objects survive even when empty; undeclared
	/// objects emptied by the removal are dropped along with their
	/// contents.
	pub fn prune(&self) -> Result<Vec<String>> {
		let mut state = self.lock_state();
		let Some(root) = &mut state.root else {
			return Err(ConfigError::NotLoaded);
		};

		let entry_paths: HashSet<&str> =
			self.plan.entries.iter().map(|e| e.path.as_str()).collect();
		let container_paths: HashSet<&str> =
			self.plan.containers.iter().map(|c| c.path.as_str()).collect();

		let mut removed = Vec::new();
		strip_object(root, "", &entry_paths, &container_paths, &mut removed);
		if removed.is_empty() {
			return Ok(removed);
		}

		let bytes = self.provider.serialize(root)?;
		self.store.write(&bytes)?;
		tracing::info!(removed = removed.len(), "pruned undeclared keys");
		Ok(removed)
	}

	/// Drop the document and return to the unloaded state.
	///
	/// Entry reads fall back to their static defaults; `load` may be
	/// called again afterwards.
	pub fn close(&self) {
		let mut state = self.lock_state();
		if state.root.take().is_some() {
			let defaults: Snapshot = self
				.plan
				.entries
				.iter()
				.map(|entry| Resolved {
					value: entry.core.default_value.clone(),
					canonical: entry.core.default_node.clone(),
				})
				.collect();
			self.cell.values.store(Arc::new(defaults));
			tracing::debug!("configuration closed");
		}
	}

	/// Register a listener for all entry changes discovered by reload.
	///
	/// Listeners run synchronously inside `reload`, after the new values
	/// are published, in entry declaration order. They must not register
	/// further listeners from within the callback.
	pub fn on_change(&self, listener: impl Fn(&ChangeEvent<'_>) + Send + Sync + 'static) {
		self.lock_listeners().push(Listener::Global(Box::new(listener)));
	}

	/// Register a typed listener for one entry's changes.
	pub fn on_entry_change<T: ConfigValue>(
		&self,
		entry: &Entry<T>,
		listener: impl Fn(&T, &T) + Send + Sync + 'static,
	) -> Result<()> {
		let slot = self.slot_of(entry)?;
		let callback: SlotListener = Box::new(move |old, new| {
			if let (Some(old), Some(new)) = (old.downcast_ref::<T>(), new.downcast_ref::<T>()) {
				listener(old, new);
			}
		});
		self.lock_listeners().push(Listener::Slot { slot, callback });
		Ok(())
	}

	fn notify(&self, previous: &Snapshot, current: &Snapshot, changed: &[usize]) {
		let listeners = self.lock_listeners();
		for &slot in changed {
			let path = self.plan.entries[slot].path.as_str();
			let old = &previous[slot];
			let new = &current[slot];
			for listener in listeners.iter() {
				let invoke = || match listener {
					Listener::Global(callback) => callback(&ChangeEvent {
						path,
						old: &old.canonical,
						new: &new.canonical,
					}),
					Listener::Slot { slot: s, callback } if *s == slot => {
						callback(&old.value, &new.value);
					}
					Listener::Slot { .. } => {}
				};
				// One panicking listener must not starve the rest.
				if catch_unwind(AssertUnwindSafe(invoke)).is_err() {
					tracing::error!(path, "change listener panicked, continuing with remaining listeners");
				}
			}
		}
	}

	fn slot_of<T: ConfigValue>(&self, entry: &Entry<T>) -> Result<usize> {
		match entry.core().binding.get() {
			Some(binding) if Arc::ptr_eq(&binding.cell, &self.cell) => Ok(binding.slot),
			_ => Err(ConfigError::UnknownEntry {
				path: entry.path().to_string(),
			}),
		}
	}

	fn lock_state(&self) -> MutexGuard<'_, DocState> {
		// State is only committed after full success, so a panicked
		// earlier operation cannot have left a half-applied document.
		self.state
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn lock_listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
		self.listeners
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

fn strip_object(
	node: &mut Node,
	prefix: &str,
	entries: &HashSet<&str>,
	containers: &HashSet<&str>,
	removed: &mut Vec<String>,
) {
	let Some(fields) = node.as_object_mut() else {
		return;
	};
	let keys: Vec<String> = fields.keys().cloned().collect();
	let mut dead: Vec<String> = Vec::new();

	for key in keys {
		let path = if prefix.is_empty() {
			key.clone()
		} else {
			format!("{prefix}.{key}")
		};
		// A declared entry (including map-shaped ones) keeps its whole
		// subtree.
		if entries.contains(path.as_str()) {
			continue;
		}
		let Some(child) = fields.get_mut(&key) else {
			continue;
		};
		match child {
			Node::Object(_) => {
				strip_object(child, &path, entries, containers, removed);
				let now_empty = child.as_object().is_some_and(|m| m.is_empty());
				if now_empty && !containers.contains(path.as_str()) {
					dead.push(key);
				}
			}
			_ => {
				removed.push(path);
				dead.push(key);
			}
		}
	}

	for key in dead {
		fields.shift_remove(&key);
	}
}
