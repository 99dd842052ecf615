use crate::error::{ConfigError, Result};
use crate::node::{Node, Scalar};
use crate::provider::Provider;
use toml::{Table, Value};

/// Provider for TOML documents.
///
/// Backed by the `toml` crate's value tree with key order preserved.
/// TOML datetimes have no counterpart in the node model and are carried
/// as string scalars; they re-serialize quoted.
pub struct TomlProvider;

impl Provider for TomlProvider {
	fn format(&self) -> &'static str {
		"toml"
	}

	fn parse(&self, bytes: &[u8]) -> Result<Node> {
		let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::Parse {
			format: self.format(),
			message: format!("invalid UTF-8: {e}"),
		})?;
		let table: Table = text.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
			format: self.format(),
			message: e.to_string(),
		})?;
		Ok(from_value(Value::Table(table)))
	}

	fn serialize(&self, root: &Node) -> Result<Vec<u8>> {
		let Value::Table(table) = to_value(root) else {
			return Err(ConfigError::Unsupported {
				format: self.format(),
				reason: "a non-object document root".to_string(),
			});
		};
		let text = toml::to_string_pretty(&table).map_err(|e| ConfigError::Unsupported {
			format: self.format(),
			reason: e.to_string(),
		})?;
		Ok(text.into_bytes())
	}
}

fn from_value(value: Value) -> Node {
	match value {
		Value::Boolean(b) => Node::Scalar(Scalar::Bool(b)),
		Value::Integer(i) => Node::Scalar(Scalar::Integer(i)),
		Value::Float(f) => Node::Scalar(Scalar::Float(f)),
		Value::String(s) => Node::Scalar(Scalar::String(s)),
		Value::Datetime(dt) => Node::Scalar(Scalar::String(dt.to_string())),
		Value::Array(elements) => Node::List(elements.into_iter().map(from_value).collect()),
		Value::Table(table) => Node::Object(
			table
				.into_iter()
				.map(|(key, value)| (key, from_value(value)))
				.collect(),
		),
	}
}

fn to_value(node: &Node) -> Value {
	match node {
		Node::Scalar(Scalar::Bool(b)) => Value::Boolean(*b),
		Node::Scalar(Scalar::Integer(i)) => Value::Integer(*i),
		Node::Scalar(Scalar::Float(f)) => Value::Float(*f),
		Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
		Node::List(elements) => Value::Array(elements.iter().map(to_value).collect()),
		Node::Object(fields) => Value::Table(
			fields
				.iter()
				.map(|(key, value)| (key.clone(), to_value(value)))
				.collect(),
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_scalars() {
		let doc = b"flag = true\ncount = 3\nratio = 0.5\nname = \"x\"\n";
		let root = TomlProvider.parse(doc).unwrap();

		assert_eq!(root.get(["flag"]), Some(&Node::from(true)));
		assert_eq!(root.get(["count"]), Some(&Node::from(3)));
		assert_eq!(root.get(["ratio"]), Some(&Node::from(0.5)));
		assert_eq!(root.get(["name"]), Some(&Node::from("x")));
	}

	#[test]
	fn test_parse_nested_tables_and_arrays() {
		let doc = b"[server]\nport = 8080\nhosts = [\"a\", \"b\"]\n";
		let root = TomlProvider.parse(doc).unwrap();

		assert_eq!(root.get(["server", "port"]), Some(&Node::from(8080)));
		assert_eq!(
			root.get(["server", "hosts"]),
			Some(&Node::List(vec![Node::from("a"), Node::from("b")]))
		);
	}

	#[test]
	fn test_parse_error_on_malformed_document() {
		let result = TomlProvider.parse(b"not valid toml ==");
		match result {
			Err(ConfigError::Parse { format, .. }) => assert_eq!(format, "toml"),
			_ => panic!("Expected Parse error"),
		}
	}

	#[test]
	fn test_datetime_becomes_string() {
		let root = TomlProvider.parse(b"when = 1979-05-27T07:32:00Z\n").unwrap();
		assert_eq!(root.get(["when"]).unwrap().tag(), "string");
	}

	#[test]
	fn test_round_trip_preserves_tags_and_order() {
		let mut root = Node::object();
		root.set(["zeta"], Node::from(1));
		root.set(["alpha"], Node::from(1.0));
		root.set(["server", "debug"], Node::from(false));

		let bytes = TomlProvider.serialize(&root).unwrap();
		let reparsed = TomlProvider.parse(&bytes).unwrap();

		assert_eq!(reparsed, root);
		let keys: Vec<&str> = reparsed.keys().collect();
		assert_eq!(keys, vec!["zeta", "alpha", "server"]);
	}
}
