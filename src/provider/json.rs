use crate::error::{ConfigError, Result};
use crate::node::{Node, Scalar};
use crate::provider::Provider;
use serde_json::{Map, Value};

/// Provider for JSON documents.
///
/// Backed by the `serde_json` value tree with key order preserved. The
/// node model's scalar union is closed, so `null` (anywhere in the
/// document) and integers outside the `i64` range fail parsing.
pub struct JsonProvider;

impl JsonProvider {
	fn parse_error(&self, message: impl Into<String>) -> ConfigError {
		ConfigError::Parse {
			format: self.format(),
			message: message.into(),
		}
	}
}

impl Provider for JsonProvider {
	fn format(&self) -> &'static str {
		"json"
	}

	fn parse(&self, bytes: &[u8]) -> Result<Node> {
		let value: Value =
			serde_json::from_slice(bytes).map_err(|e| self.parse_error(e.to_string()))?;
		if !value.is_object() {
			return Err(self.parse_error(format!(
				"document root must be an object, found {}",
				json_tag(&value)
			)));
		}
		self.from_value(value)
	}

	fn serialize(&self, root: &Node) -> Result<Vec<u8>> {
		let mut bytes = serde_json::to_vec_pretty(&to_value(root)).map_err(|e| {
			ConfigError::Unsupported {
				format: self.format(),
				reason: e.to_string(),
			}
		})?;
		bytes.push(b'\n');
		Ok(bytes)
	}
}

impl JsonProvider {
	fn from_value(&self, value: Value) -> Result<Node> {
		match value {
			Value::Null => Err(self.parse_error("null values are not supported")),
			Value::Bool(b) => Ok(Node::Scalar(Scalar::Bool(b))),
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Ok(Node::Scalar(Scalar::Integer(i)))
				} else if let Some(f) = n.as_f64() {
					Ok(Node::Scalar(Scalar::Float(f)))
				} else {
					Err(self.parse_error(format!("integer {n} is out of range")))
				}
			}
			Value::String(s) => Ok(Node::Scalar(Scalar::String(s))),
			Value::Array(elements) => Ok(Node::List(
				elements
					.into_iter()
					.map(|element| self.from_value(element))
					.collect::<Result<_>>()?,
			)),
			Value::Object(fields) => Ok(Node::Object(
				fields
					.into_iter()
					.map(|(key, value)| Ok((key, self.from_value(value)?)))
					.collect::<Result<_>>()?,
			)),
		}
	}
}

fn to_value(node: &Node) -> Value {
	match node {
		Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
		Node::Scalar(Scalar::Integer(i)) => Value::Number((*i).into()),
		Node::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
			.map(Value::Number)
			.unwrap_or_else(|| Value::String(f.to_string())),
		Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
		Node::List(elements) => Value::Array(elements.iter().map(to_value).collect()),
		Node::Object(fields) => Value::Object(
			fields
				.iter()
				.map(|(key, value)| (key.clone(), to_value(value)))
				.collect::<Map<String, Value>>(),
		),
	}
}

fn json_tag(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
