use crate::error::{ConfigError, Result};
use crate::node::{Node, Scalar};
use crate::provider::Provider;

/// Provider for Java `.properties` documents.
///
/// Hand-written line-based codec: `#`/`!` comments, `=`/`:`/whitespace
/// separators, backslash escapes including `\uXXXX`, and logical-line
/// continuations. Dotted keys map to nested objects.
///
/// Properties files are untyped, so scalar tags are inferred lexically on
/// parse: `true`/`false` read as booleans, integer-looking text as
/// integers, float-looking text as floats, everything else as strings. A
/// string value whose text looks numeric therefore re-parses with a
/// numeric tag; declared string entries should not store such values in
/// this format. Lists cannot be expressed at all and fail serialization.
pub struct PropertiesProvider {
	header: Option<String>,
}

impl PropertiesProvider {
	pub fn new() -> Self {
		PropertiesProvider { header: None }
	}

	/// Emit a comment header at the top of every serialized document.
	pub fn with_header(header: impl Into<String>) -> Self {
		PropertiesProvider {
			header: Some(header.into()),
		}
	}
}

impl Default for PropertiesProvider {
	fn default() -> Self {
		PropertiesProvider::new()
	}
}

impl Provider for PropertiesProvider {
	fn format(&self) -> &'static str {
		"properties"
	}

	fn parse(&self, bytes: &[u8]) -> Result<Node> {
		let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::Parse {
			format: self.format(),
			message: format!("invalid UTF-8: {e}"),
		})?;

		let mut root = Node::object();
		for line in logical_lines(text) {
			let Some((raw_key, raw_value)) = split_key_value(&line) else {
				continue;
			};
			let key = unescape(&raw_key, self.format())?;
			let value = unescape(&raw_value, self.format())?;

			// Dotted keys nest; a key with an empty segment stays flat.
			let segments: Vec<&str> = key.split('.').collect();
			let node = Node::Scalar(infer_scalar(&value));
			if segments.iter().any(|s| s.is_empty()) {
				root.set([key.as_str()], node);
			} else {
				root.set(segments, node);
			}
		}
		Ok(root)
	}

	fn serialize(&self, root: &Node) -> Result<Vec<u8>> {
		let Node::Object(_) = root else {
			return Err(ConfigError::Unsupported {
				format: self.format(),
				reason: "a non-object document root".to_string(),
			});
		};

		let mut out = String::new();
		if let Some(header) = &self.header {
			for line in header.lines() {
				out.push_str("# ");
				out.push_str(line);
				out.push('\n');
			}
		}
		write_object(root, &mut Vec::new(), &mut out)?;
		Ok(out.into_bytes())
	}
}

/// Join physical lines into logical ones, dropping blanks and comments.
///
/// A line ending with an odd number of backslashes continues on the next
/// physical line, whose leading whitespace is ignored.
fn logical_lines(text: &str) -> Vec<String> {
	let mut lines = Vec::new();
	let mut pending: Option<String> = None;

	for physical in text.lines() {
		let mut part = match pending.take() {
			Some(prefix) => {
				let mut joined = prefix;
				joined.push_str(physical.trim_start());
				joined
			}
			None => {
				let trimmed = physical.trim_start();
				if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
					continue;
				}
				trimmed.to_string()
			}
		};

		let trailing_backslashes = part.chars().rev().take_while(|c| *c == '\\').count();
		if trailing_backslashes % 2 == 1 {
			part.pop();
			pending = Some(part);
		} else {
			lines.push(part);
		}
	}

	// A dangling continuation at end of input is treated as complete.
	if let Some(part) = pending {
		lines.push(part);
	}
	lines
}

/// Split a logical line at the first unescaped separator.
///
/// Returns the raw (still escaped) key and value. A line without a
/// separator yields the whole line as key and an empty value, matching
/// the Java reader.
fn split_key_value(line: &str) -> Option<(String, String)> {
	let chars: Vec<char> = line.chars().collect();
	let mut key_end = chars.len();
	let mut escaped = false;

	for (i, c) in chars.iter().enumerate() {
		if escaped {
			escaped = false;
			continue;
		}
		match c {
			'\\' => escaped = true,
			'=' | ':' | ' ' | '\t' => {
				key_end = i;
				break;
			}
			_ => {}
		}
	}

	let key: String = chars[..key_end].iter().collect();
	if key.is_empty() {
		return None;
	}

	// Skip whitespace, at most one = or :, then whitespace again.
	let mut rest = key_end;
	while rest < chars.len() && (chars[rest] == ' ' || chars[rest] == '\t') {
		rest += 1;
	}
	if rest < chars.len() && (chars[rest] == '=' || chars[rest] == ':') {
		rest += 1;
		while rest < chars.len() && (chars[rest] == ' ' || chars[rest] == '\t') {
			rest += 1;
		}
	}

	let value: String = chars[rest..].iter().collect();
	Some((key, value))
}

/// Resolve backslash escapes.
fn unescape(raw: &str, format: &'static str) -> Result<String> {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();

	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('t') => out.push('\t'),
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some('f') => out.push('\u{000C}'),
			Some('u') => {
				let digits: String = chars.by_ref().take(4).collect();
				let code = u32::from_str_radix(&digits, 16).map_err(|_| ConfigError::Parse {
					format,
					message: format!("invalid unicode escape \\u{digits}"),
				})?;
				let c = char::from_u32(code).ok_or_else(|| ConfigError::Parse {
					format,
					message: format!("invalid unicode escape \\u{digits}"),
				})?;
				out.push(c);
			}
			// Any other escaped character stands for itself.
			Some(other) => out.push(other),
			None => {}
		}
	}
	Ok(out)
}

/// Infer a scalar tag from the raw text of a value.
fn infer_scalar(value: &str) -> Scalar {
	match value {
		"true" => return Scalar::Bool(true),
		"false" => return Scalar::Bool(false),
		_ => {}
	}
	if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'+') {
		if let Ok(i) = value.parse::<i64>() {
			return Scalar::Integer(i);
		}
	}
	if !value.is_empty()
		&& value
			.bytes()
			.all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
	{
		if let Ok(f) = value.parse::<f64>() {
			return Scalar::Float(f);
		}
	}
	Scalar::String(value.to_string())
}

fn write_object(node: &Node, prefix: &mut Vec<String>, out: &mut String) -> Result<()> {
	let Some(fields) = node.as_object() else {
		return Ok(());
	};
	for (key, value) in fields {
		match value {
			Node::Object(_) => {
				prefix.push(key.clone());
				write_object(value, prefix, out)?;
				prefix.pop();
			}
			Node::List(_) => {
				return Err(ConfigError::Unsupported {
					format: "properties",
					reason: "list values".to_string(),
				});
			}
			Node::Scalar(scalar) => {
				let mut dotted = String::new();
				for segment in prefix.iter() {
					dotted.push_str(&escape_key(segment));
					dotted.push('.');
				}
				dotted.push_str(&escape_key(key));
				out.push_str(&dotted);
				out.push('=');
				out.push_str(&escape_value(&scalar_text(scalar)));
				out.push('\n');
			}
		}
	}
	Ok(())
}

fn scalar_text(scalar: &Scalar) -> String {
	match scalar {
		Scalar::Bool(b) => b.to_string(),
		Scalar::Integer(i) => i.to_string(),
		// Keep a decimal point so the value re-parses as a float.
		Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f:.1}"),
		Scalar::Float(f) => f.to_string(),
		Scalar::String(s) => s.clone(),
	}
}

fn escape_key(key: &str) -> String {
	let mut out = String::with_capacity(key.len());
	for c in key.chars() {
		match c {
			'\\' | '=' | ':' | '#' | '!' | ' ' => {
				out.push('\\');
				out.push(c);
			}
			'\t' => out.push_str("\\t"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			_ => out.push(c),
		}
	}
	out
}

fn escape_value(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for (i, c) in value.chars().enumerate() {
		match c {
			'\\' => out.push_str("\\\\"),
			'\t' => out.push_str("\\t"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			' ' if i == 0 => out.push_str("\\ "),
			_ => out.push(c),
		}
	}
	out
}
