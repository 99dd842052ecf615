//! Format-neutral document tree.
//!
//! Every provider parses its format into this model and serializes back from
//! it, so the reconciler never sees format-specific values. Scalars keep the
//! tag the provider gave them; coercion against declared entry types happens
//! later, during reconciliation.

use indexmap::IndexMap;

/// A scalar document value, tagged with its parsed representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
	Bool(bool),
	Integer(i64),
	Float(f64),
	String(String),
}

/// A node in a parsed configuration document.
///
/// A document is always rooted at an `Object`. Object keys preserve
/// insertion order so that a parse→mutate→serialize cycle keeps the
/// document's key order for formats that have one.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Scalar(Scalar),
	List(Vec<Node>),
	Object(IndexMap<String, Node>),
}

impl Node {
	/// Create an empty object node.
	pub fn object() -> Self {
		Node::Object(IndexMap::new())
	}

	/// The tag name of this node, as used in error messages.
	pub fn tag(&self) -> &'static str {
		match self {
			Node::Scalar(Scalar::Bool(_)) => "boolean",
			Node::Scalar(Scalar::Integer(_)) => "integer",
			Node::Scalar(Scalar::Float(_)) => "float",
			Node::Scalar(Scalar::String(_)) => "string",
			Node::List(_) => "list",
			Node::Object(_) => "object",
		}
	}

	/// Borrow the key/value map if this node is an object.
	pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
		match self {
			Node::Object(map) => Some(map),
			_ => None,
		}
	}

	/// Mutably borrow the key/value map if this node is an object.
	pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Node>> {
		match self {
			Node::Object(map) => Some(map),
			_ => None,
		}
	}

	/// Iterate the keys of an object node, in insertion order.
	///
	/// Non-object nodes yield nothing.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.as_object()
			.into_iter()
			.flat_map(|map| map.keys().map(String::as_str))
	}

	/// Look up the node at a path of key segments.
	///
	/// Returns `None` if any segment is missing or a non-object node is
	/// reached before the last segment.
	pub fn get<'a, I>(&self, path: I) -> Option<&Node>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut node = self;
		for segment in path {
			node = node.as_object()?.get(segment)?;
		}
		Some(node)
	}

	/// Insert a node at a path of key segments, creating intermediate
	/// objects as needed.
	///
	/// A non-object node sitting where an intermediate object is needed is
	/// replaced; the reconciler checks declared paths for that conflict
	/// before calling this.
	pub fn set<'a, I>(&mut self, path: I, value: Node)
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut segments = path.into_iter().peekable();
		let mut node = self;
		while let Some(segment) = segments.next() {
			if !matches!(node, Node::Object(_)) {
				*node = Node::object();
			}
			let Node::Object(map) = node else {
				unreachable!("node was just made an object");
			};
			if segments.peek().is_none() {
				map.insert(segment.to_string(), value);
				return;
			}
			node = map
				.entry(segment.to_string())
				.or_insert_with(Node::object);
		}
	}
}

impl From<bool> for Node {
	fn from(value: bool) -> Self {
		Node::Scalar(Scalar::Bool(value))
	}
}

impl From<i64> for Node {
	fn from(value: i64) -> Self {
		Node::Scalar(Scalar::Integer(value))
	}
}

impl From<f64> for Node {
	fn from(value: f64) -> Self {
		Node::Scalar(Scalar::Float(value))
	}
}

impl From<&str> for Node {
	fn from(value: &str) -> Self {
		Node::Scalar(Scalar::String(value.to_string()))
	}
}

impl From<String> for Node {
	fn from(value: String) -> Self {
		Node::Scalar(Scalar::String(value))
	}
}
