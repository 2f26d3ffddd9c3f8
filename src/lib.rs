//! # Myrica
//!
//! An embedded document-oriented full-text search library.
//!
//! Myrica ingests JSON documents keyed by caller-supplied u64 IDs and
//! answers exact-term and prefix queries over their fields. Documents and
//! per-field inverted indices are persisted in an embedded key-value
//! store using a per-index directory layout.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Typed field indexing (string, uint, int, float, bool, date)
//! - Sorted, duplicate-free posting lists maintained by a merge-set
//!   primitive
//! - Atomic multi-write batches with read isolation
//! - Pluggable storage backends
//!
//! ## Quick start
//!
//! ```no_run
//! use myrica::{Config, FieldType, Metadata, Myrica};
//!
//! let myrica = Myrica::new(Config::new("./data")).unwrap();
//! let index = myrica.create_index("companies").unwrap();
//!
//! let metadata = Metadata::new()
//!     .with_field("id", FieldType::Uint)
//!     .with_field("name", FieldType::String);
//! index
//!     .add_with_metadata(1, br#"{"id": 1, "name": "Neoway Business Solution"}"#, &metadata)
//!     .unwrap();
//!
//! let docs = index.filter_term("name", "neoway").unwrap();
//! assert_eq!(docs.len(), 1);
//! ```

// Core modules
pub mod analysis;
pub mod command;
pub mod config;
pub mod engine;
mod error;
pub mod index;
mod myrica;
pub mod store;
pub mod util;

// Re-exports for the public API
pub use command::{Command, OpKind, Operand};
pub use config::Config;
pub use engine::Engine;
pub use error::{MyricaError, NameKind, Result};
pub use index::metadata::{FieldMeta, FieldType, Metadata};
pub use index::Index;
pub use myrica::Myrica;
pub use store::{new_store, KvConfig, KvStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
