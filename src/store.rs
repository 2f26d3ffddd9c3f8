//! Key-value store abstraction.
//!
//! Each index owns a set of single-purpose databases (`document.db`,
//! `<field>_<type>.idx`) living under `<data_dir>/<index>/`. The [`KvStore`]
//! trait is the storage contract the engine dispatches against; backends
//! are selected through [`new_store`].
//!
//! ## Batch semantics
//!
//! `start_batch` switches a store into buffered mode: `set` and `delete`
//! land in an in-memory buffer and `get` does NOT observe them. The buffer
//! is committed atomically by `flush_batch` (ops applied in issue order)
//! and discarded by `close`. `start_batch` while already batching clears
//! the buffer.

pub mod disk;
pub mod memory;
pub mod merge;

use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;
use crate::error::Result;

/// Database holding the raw documents of an index.
pub const DOCUMENT_DB: &str = "document.db";

/// Configuration handed to store backends.
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Root data directory; databases live at `<data_dir>/<index>/<db>`.
    pub data_dir: String,
    /// Chatty tracing.
    pub debug: bool,
    /// Ask the backend to keep a block cache.
    pub enable_cache: bool,
    /// Cache size in bytes.
    pub cache_size: usize,
}

impl KvConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            debug: config.debug,
            enable_cache: config.enable_cache,
            cache_size: config.cache_size,
        }
    }
}

/// One buffered batch operation.
#[derive(Debug, Clone)]
pub(crate) enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// The storage contract used by the engine.
///
/// Implementations must provide crash-safe durability for flushed batches
/// and make no guarantee for un-flushed batch buffers. `get` after `close`
/// is a programming error and fails with
/// [`MyricaError::InvalidState`](crate::MyricaError::InvalidState).
pub trait KvStore: Send {
    /// Open (creating if missing) the database `database` of index `index`.
    fn open(&mut self, index: &str, database: &str) -> Result<()>;

    /// True once `open` succeeded and `close` has not been called.
    fn is_open(&self) -> bool;

    /// Write a key. Buffered in batch mode, durable otherwise.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Read a key. Never reflects buffered batch writes.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Delete a key. Buffered in batch mode.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Enter batch mode; clears the buffer when already batching.
    fn start_batch(&mut self);

    /// True while in batch mode.
    fn is_batch(&self) -> bool;

    /// Atomically commit all buffered operations and leave batch mode.
    fn flush_batch(&mut self) -> Result<()>;

    /// Iterate entries whose key starts with `prefix`, in ascending
    /// byte-lexicographic key order. Restartable by calling again.
    fn iterator<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>>;

    /// Release file handles; a pending batch buffer is dropped, not flushed.
    fn close(&mut self);
}

/// Create a store with the default backend.
pub fn new_store(config: &KvConfig) -> Box<dyn KvStore> {
    Box::new(disk::DiskStore::new(config))
}

/// Validate a database file name: `[A-Za-z0-9_]+\.(db|idx|tt)`.
pub fn validate_database_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+\.(db|idx|tt)$").expect("valid regex"));
    re.is_match(name)
}
