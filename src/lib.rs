//! Confit - typed, format-agnostic configuration binding.
//!
//! This library provides the core machinery for binding statically
//! declared, typed configuration entries to persisted documents:
//! - A format-neutral document tree shared by every backend
//! - Typed entry and container declarations with defaults and validators
//! - Reconciliation: default-fill, strict coercion, all-or-nothing loads
//! - TOML, JSON, and Java-properties providers
//! - Caller-triggered reload with change notification over atomically
//!   swapped value snapshots
//!
//! Unknown document keys survive a load→save cycle untouched, so configs
//! stay forward and backward compatible with other schema versions and
//! hand-edited extras.
//!
//! # Example
//!
//! ```no_run
//! use confit::{Config, Container, FileStore, TomlProvider, validator};
//!
//! let mut root = Container::root();
//! let mut server = Container::new("server").unwrap();
//! let port = server
//! 	.entry_validated("port", 8080_i64, validator::in_range(1, 65535))
//! 	.unwrap();
//! let host = server.entry("host", "localhost".to_string()).unwrap();
//! root.nest(server).unwrap();
//!
//! let config = Config::new(root, TomlProvider, FileStore::new("app.toml"));
//! config.load().unwrap();
//!
//! println!("listening on {}:{}", host.get(), port.get());
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod provider;
mod reconcile;
pub mod schema;
pub mod store;

pub use config::{ChangeEvent, Config};
pub use error::{ConfigError, Result};
pub use node::{Node, Scalar};
pub use provider::{JsonProvider, PropertiesProvider, Provider, TomlProvider};
pub use schema::{ConfigValue, Container, Entry, ValueKind, Validator, validator};
pub use store::{FileStore, MemoryStore, Store};
