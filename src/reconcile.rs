//! Reconciliation of a declared schema against a document tree.
//!
//! This module handles:
//! - Ensuring an object node exists at every declared container path
//! - Default-filling missing entries into the tree
//! - Coercing and validating present document values
//! - Leaving undeclared keys untouched
//!
//! Reconciliation is all-or-nothing: the caller hands in a candidate tree
//! and commits it together with the returned snapshot only on success.
//! The first failing entry aborts the whole pass, so a failed load or
//! reload never leaves partially applied values behind.

use crate::error::{ConfigError, Result};
use crate::node::Node;
use crate::schema::container::Plan;
use crate::schema::entry::{Resolved, Snapshot};

/// Resolve every declared entry against the candidate tree.
///
/// Mutates the tree (container creation, default-fill) and returns the
/// resolved snapshot in slot order. On error the tree may be partially
/// augmented; the caller discards it.
pub(crate) fn reconcile(root: &mut Node, plan: &Plan) -> Result<Snapshot> {
	for container in &plan.containers {
		ensure_object(root, &container.segments, &container.path)?;
	}

	let mut snapshot = Vec::with_capacity(plan.entries.len());
	for entry in &plan.entries {
		let resolved = match root.get(entry.segments.iter().map(String::as_str)) {
			Some(node) => entry.core.decode_at(node, &entry.path)?,
			None => {
				// Default-fill: write the default into the tree so the
				// document self-documents on the next save.
				root.set(
					entry.segments.iter().map(String::as_str),
					entry.core.default_node.clone(),
				);
				Resolved {
					value: entry.core.default_value.clone(),
					canonical: entry.core.default_node.clone(),
				}
			}
		};
		snapshot.push(resolved);
	}
	Ok(snapshot)
}

/// Ensure an object node exists at a declared container path.
///
/// Creates empty objects for missing segments; a non-object node already
/// sitting at the path is a type mismatch against the declared schema.
fn ensure_object(root: &mut Node, segments: &[String], path: &str) -> Result<()> {
	match root.get(segments.iter().map(String::as_str)) {
		Some(Node::Object(_)) => Ok(()),
		Some(other) => Err(ConfigError::TypeMismatch {
			path: path.to_string(),
			expected: "object".to_string(),
			actual: other.tag().to_string(),
		}),
		None => {
			root.set(segments.iter().map(String::as_str), Node::object());
			Ok(())
		}
	}
}
