//! Pluggable per-format parsers and serializers.
//!
//! This module handles:
//! - The narrow `Provider` interface the core calls through
//! - TOML documents via the `toml` value tree
//! - JSON documents via the `serde_json` value tree
//! - Java properties syntax via a hand-written line parser
//!
//! Providers translate raw bytes to and from the format-neutral node tree
//! and never see declared entries; unknown keys flow through them
//! untouched.

pub mod json;
pub mod properties;
pub mod toml;

pub use json::JsonProvider;
pub use properties::PropertiesProvider;
pub use toml::TomlProvider;

use crate::error::Result;
use crate::node::Node;

/// A per-format document codec.
///
/// `parse(serialize(tree))` must be semantically equivalent to `tree` for
/// any tree this library produces: same keys, same order where the format
/// has one, same scalar tags where the format can express them.
pub trait Provider: Send + Sync {
	/// Format name used in error messages and logs.
	fn format(&self) -> &'static str;

	/// Parse raw document bytes into a node tree rooted at an object.
	fn parse(&self, bytes: &[u8]) -> Result<Node>;

	/// Serialize a node tree back to document bytes.
	fn serialize(&self, root: &Node) -> Result<Vec<u8>>;
}
