use confit::{
	Config, ConfigError, Container, FileStore, JsonProvider, MemoryStore, Node, PropertiesProvider,
	TomlProvider, validator,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Declare the schema shared by the cross-format tests.
///
/// Returns the root container and the handles the assertions need.
fn declare_schema() -> (Container, confit::Entry<i64>, confit::Entry<String>, confit::Entry<bool>) {
	let mut root = Container::root();
	let mut server = Container::new("server").unwrap();
	let port = server
		.entry_validated("port", 8080_i64, validator::in_range(1, 65535))
		.unwrap();
	let host = server.entry("host", "localhost".to_string()).unwrap();
	root.nest(server).unwrap();
	let debug = root.entry("debug", false).unwrap();
	(root, port, host, debug)
}

// ============================================================================
// Cross-format loading
// ============================================================================

#[test]
fn test_same_schema_resolves_identically_across_formats() {
	let toml_doc = "debug = true\n[server]\nport = 9090\nhost = \"example.org\"\n";
	let json_doc = r#"{"server": {"port": 9090, "host": "example.org"}, "debug": true}"#;
	let props_doc = "server.port=9090\nserver.host=example.org\ndebug=true\n";

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, TomlProvider, MemoryStore::with_bytes(toml_doc.as_bytes().to_vec()));
	config.load().unwrap();
	assert_eq!((port.get(), host.get(), debug.get()), (9090, "example.org".to_string(), true));

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, JsonProvider, MemoryStore::with_bytes(json_doc.as_bytes().to_vec()));
	config.load().unwrap();
	assert_eq!((port.get(), host.get(), debug.get()), (9090, "example.org".to_string(), true));

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(
		root,
		PropertiesProvider::new(),
		MemoryStore::with_bytes(props_doc.as_bytes().to_vec()),
	);
	config.load().unwrap();
	assert_eq!((port.get(), host.get(), debug.get()), (9090, "example.org".to_string(), true));
}

// ============================================================================
// Default-fill idempotence
// ============================================================================

#[test]
fn test_default_fill_idempotence_toml() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("app.toml");
	fs::write(&path, "[server]\nport = 9090\n").unwrap();

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, TomlProvider, FileStore::new(&path));
	config.load().unwrap();
	let first = (port.get(), host.get(), debug.get());
	config.save().unwrap();

	// The saved document now spells out the previously missing defaults.
	let saved = fs::read_to_string(&path).unwrap();
	assert!(saved.contains("host = \"localhost\""));
	assert!(saved.contains("debug = false"));
	assert!(saved.contains("port = 9090"));

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, TomlProvider, FileStore::new(&path));
	config.load().unwrap();
	assert_eq!((port.get(), host.get(), debug.get()), first);
}

#[test]
fn test_default_fill_idempotence_json() {
	let store = Arc::new(MemoryStore::with_bytes(br#"{"debug": true}"#.to_vec()));

	let (root, port, _host, debug) = declare_schema();
	let config = Config::new(root, JsonProvider, Arc::clone(&store));
	config.load().unwrap();
	assert_eq!(port.get(), 8080);
	assert!(debug.get());
	config.save().unwrap();

	let saved = String::from_utf8(store.contents().unwrap()).unwrap();
	assert!(saved.contains("\"port\": 8080"));
	assert!(saved.contains("\"host\": \"localhost\""));

	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, JsonProvider, Arc::clone(&store));
	config.load().unwrap();
	assert_eq!((port.get(), host.get(), debug.get()), (8080, "localhost".to_string(), true));
}

#[test]
fn test_first_load_of_missing_file_saves_full_document() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("fresh.properties");

	let (root, _port, _host, _debug) = declare_schema();
	let config = Config::new(root, PropertiesProvider::new(), FileStore::new(&path));
	config.load().unwrap();
	config.save().unwrap();

	let saved = fs::read_to_string(&path).unwrap();
	assert!(saved.contains("server.port=8080"));
	assert!(saved.contains("server.host=localhost"));
	assert!(saved.contains("debug=false"));
}

// ============================================================================
// Unknown-key preservation
// ============================================================================

#[test]
fn test_unknown_keys_survive_load_save_cycle_toml() {
	let store = Arc::new(MemoryStore::with_bytes(
		b"future-flag = \"keep me\"\n[server]\nport = 1234\nexperimental = 7\n[plugin]\nname = \"x\"\n".to_vec(),
	));

	let (root, _port, _host, _debug) = declare_schema();
	let config = Config::new(root, TomlProvider, Arc::clone(&store));
	config.load().unwrap();
	config.save().unwrap();

	let saved = String::from_utf8(store.contents().unwrap()).unwrap();
	assert!(saved.contains("future-flag = \"keep me\""));
	assert!(saved.contains("experimental = 7"));
	assert!(saved.contains("[plugin]"));
	assert!(saved.contains("name = \"x\""));
}

#[test]
fn test_unknown_keys_survive_load_save_cycle_json() {
	let store = Arc::new(MemoryStore::with_bytes(
		br#"{"server": {"port": 1, "extra": [1, 2]}, "unrelated": {"a": "b"}}"#.to_vec(),
	));

	let (root, _port, _host, _debug) = declare_schema();
	let config = Config::new(root, JsonProvider, Arc::clone(&store));
	config.load().unwrap();
	config.save().unwrap();

	let saved = String::from_utf8(store.contents().unwrap()).unwrap();
	assert!(saved.contains("\"extra\""));
	assert!(saved.contains("\"unrelated\""));
}

// ============================================================================
// Type safety and atomicity
// ============================================================================

#[test]
fn test_string_where_integer_expected_fails_load() {
	let (root, port, _host, _debug) = declare_schema();
	let config = Config::new(
		root,
		TomlProvider,
		MemoryStore::with_bytes(b"[server]\nport = \"abc\"\n".to_vec()),
	);

	let err = config.load().unwrap_err();
	match err {
		ConfigError::TypeMismatch { path, expected, actual } => {
			assert_eq!(path, "server.port");
			assert_eq!(expected, "integer");
			assert_eq!(actual, "string");
		}
		_ => panic!("Expected TypeMismatch error"),
	}
	assert!(!config.is_loaded());
	assert_eq!(port.get(), 8080);
}

#[test]
fn test_failed_reload_is_all_or_nothing() {
	let store = Arc::new(MemoryStore::with_bytes(
		b"debug = true\n[server]\nport = 1000\nhost = \"a\"\n".to_vec(),
	));
	let (root, port, host, debug) = declare_schema();
	let config = Config::new(root, TomlProvider, Arc::clone(&store));
	config.load().unwrap();

	// The edit fixes nothing and breaks the last entry; every value must
	// keep its pre-reload state, including the ones that would have
	// changed.
	store.replace(b"debug = false\n[server]\nport = 2000\nhost = 5\n".to_vec());
	assert!(config.reload().is_err());
	assert_eq!(port.get(), 1000);
	assert_eq!(host.get(), "a");
	assert!(debug.get());
}

#[test]
fn test_validator_enforcement_fails_load() {
	let (root, _port, _host, _debug) = declare_schema();
	let config = Config::new(
		root,
		JsonProvider,
		MemoryStore::with_bytes(br#"{"server": {"port": 99999}}"#.to_vec()),
	);

	let err = config.load().unwrap_err();
	match err {
		ConfigError::Validation { path, reason } => {
			assert_eq!(path, "server.port");
			assert!(reason.contains("65535"));
		}
		_ => panic!("Expected Validation error"),
	}
	assert!(!config.is_loaded());
}

// ============================================================================
// Change notification
// ============================================================================

#[test]
fn test_external_edit_fires_listener_exactly_once() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("app.toml");
	fs::write(&path, "debug = false\n").unwrap();

	let mut root = Container::root();
	let debug = root.entry("debug", false).unwrap();
	let config = Config::new(root, TomlProvider, FileStore::new(&path));
	config.load().unwrap();

	let calls = Arc::new(AtomicUsize::new(0));
	let seen = Arc::clone(&calls);
	config.on_change(move |event| {
		assert_eq!(event.path, "debug");
		assert_eq!(event.old, &Node::from(false));
		assert_eq!(event.new, &Node::from(true));
		seen.fetch_add(1, Ordering::SeqCst);
	});

	fs::write(&path, "debug = true\n").unwrap();
	config.reload().unwrap();
	assert!(debug.get());
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	// No further edits: no further notifications.
	config.reload().unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Prune
// ============================================================================

#[test]
fn test_prune_strips_only_undeclared_keys() {
	let store = Arc::new(MemoryStore::with_bytes(
		b"dead = 1\ndebug = true\n[server]\nport = 2\nstale = \"x\"\n".to_vec(),
	));
	let (root, _port, _host, _debug) = declare_schema();
	let config = Config::new(root, TomlProvider, Arc::clone(&store));
	config.load().unwrap();

	let removed = config.prune().unwrap();
	assert_eq!(removed, vec!["dead".to_string(), "server.stale".to_string()]);

	let saved = String::from_utf8(store.contents().unwrap()).unwrap();
	assert!(!saved.contains("dead"));
	assert!(!saved.contains("stale"));
	assert!(saved.contains("port = 2"));
	assert!(saved.contains("debug = true"));
}

// ============================================================================
// Programmatic set
// ============================================================================

#[test]
fn test_set_then_save_persists_across_fresh_load() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("app.properties");

	let (root, port, _host, _debug) = declare_schema();
	let config = Config::new(root, PropertiesProvider::new(), FileStore::new(&path));
	config.load().unwrap();
	config.set(&port, 443).unwrap();
	config.save().unwrap();

	let (root, port, _host, _debug) = declare_schema();
	let config = Config::new(root, PropertiesProvider::new(), FileStore::new(&path));
	config.load().unwrap();
	assert_eq!(port.get(), 443);
}
