use crate::node::{Node, Scalar};
use indexmap::IndexMap;
use std::fmt;

/// The declared shape of an entry, used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
	Bool,
	Integer,
	Float,
	String,
	List(Box<ValueKind>),
	Map(Box<ValueKind>),
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValueKind::Bool => write!(f, "boolean"),
			ValueKind::Integer => write!(f, "integer"),
			ValueKind::Float => write!(f, "float"),
			ValueKind::String => write!(f, "string"),
			ValueKind::List(element) => write!(f, "list<{element}>"),
			ValueKind::Map(element) => write!(f, "map<{element}>"),
		}
	}
}

/// Failure to coerce a document node into a declared shape.
///
/// Carries no path; the reconciler knows the entry being resolved and
/// attaches it there.
#[derive(Debug)]
pub struct CoerceError {
	pub expected: ValueKind,
	pub actual: String,
}

impl CoerceError {
	fn mismatch(expected: ValueKind, node: &Node) -> Self {
		CoerceError {
			expected,
			actual: node.tag().to_string(),
		}
	}
}

/// A value that can be bound to a configuration entry.
///
/// Implementations define the coercion from a document node to the typed
/// value and the canonical node written back for it. Coercion is strict:
/// the scalar tag must match exactly, except that an integer node is
/// widened for a float entry. The reverse (a float document value for an
/// integer entry) is a mismatch, as is any string-to-number reading.
///
/// Custom string-backed types (enums and the like) can participate by
/// implementing this trait on top of the `String` rules.
pub trait ConfigValue: Clone + Send + Sync + 'static {
	/// The shape descriptor for this type.
	fn kind() -> ValueKind;

	/// Coerce a document node into this type.
	fn from_node(node: &Node) -> Result<Self, CoerceError>;

	/// The canonical node representation of this value.
	fn to_node(&self) -> Node;
}

impl ConfigValue for bool {
	fn kind() -> ValueKind {
		ValueKind::Bool
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::Scalar(Scalar::Bool(value)) => Ok(*value),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::Scalar(Scalar::Bool(*self))
	}
}

impl ConfigValue for i64 {
	fn kind() -> ValueKind {
		ValueKind::Integer
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::Scalar(Scalar::Integer(value)) => Ok(*value),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::Scalar(Scalar::Integer(*self))
	}
}

impl ConfigValue for f64 {
	fn kind() -> ValueKind {
		ValueKind::Float
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::Scalar(Scalar::Float(value)) => Ok(*value),
			// Integer documents widen to float entries.
			Node::Scalar(Scalar::Integer(value)) => Ok(*value as f64),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::Scalar(Scalar::Float(*self))
	}
}

impl ConfigValue for String {
	fn kind() -> ValueKind {
		ValueKind::String
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::Scalar(Scalar::String(value)) => Ok(value.clone()),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::Scalar(Scalar::String(self.clone()))
	}
}

impl<T: ConfigValue> ConfigValue for Vec<T> {
	fn kind() -> ValueKind {
		ValueKind::List(Box::new(T::kind()))
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::List(elements) => elements
				.iter()
				.map(|element| {
					T::from_node(element).map_err(|e| CoerceError {
						expected: Self::kind(),
						actual: format!("list with {} element", e.actual),
					})
				})
				.collect(),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::List(self.iter().map(ConfigValue::to_node).collect())
	}
}

impl<T: ConfigValue> ConfigValue for IndexMap<String, T> {
	fn kind() -> ValueKind {
		ValueKind::Map(Box::new(T::kind()))
	}

	fn from_node(node: &Node) -> Result<Self, CoerceError> {
		match node {
			Node::Object(fields) => fields
				.iter()
				.map(|(key, value)| {
					let value = T::from_node(value).map_err(|e| CoerceError {
						expected: Self::kind(),
						actual: format!("object with {} value for key {key:?}", e.actual),
					})?;
					Ok((key.clone(), value))
				})
				.collect(),
			other => Err(CoerceError::mismatch(Self::kind(), other)),
		}
	}

	fn to_node(&self) -> Node {
		Node::Object(
			self.iter()
				.map(|(key, value)| (key.clone(), value.to_node()))
				.collect(),
		)
	}
}
