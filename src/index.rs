//! Per-index façade.
//!
//! An [`Index`] owns the databases of one named index: `document.db` for
//! the raw documents and one `<field>_<type>.idx` per indexed field. It
//! composes the indexing planner with the command engine and carries the
//! index-level batch state.
//!
//! Writes on one index must be serialized by the caller; reads may run
//! concurrently with reads. Different indices are independent.

pub mod metadata;
pub mod planner;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::command::{Command, Operand};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{MyricaError, NameKind, Result};
use crate::index::metadata::Metadata;
use crate::store::DOCUMENT_DB;
use crate::util::bytes;

/// Validate an index name: `[A-Za-z0-9_-]{3,}`, no path separators.
pub fn validate_index_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{3,}$").expect("valid regex"));
    re.is_match(name)
}

/// One open index.
///
/// Obtained from [`Myrica`](crate::Myrica); the registry keeps at most one
/// live handle per index name.
pub struct Index {
    name: String,
    path: PathBuf,
    engine: Engine,
    batching: AtomicBool,
    open: AtomicBool,
}

impl Index {
    /// Open (or, with `create`, initialize) the index directory and its
    /// engine. Used by the registry; library users go through
    /// [`Myrica::create_index`](crate::Myrica::create_index) and
    /// [`Myrica::open_index`](crate::Myrica::open_index).
    pub(crate) fn new(name: &str, config: &Config, create: bool) -> Result<Self> {
        if !validate_index_name(name) {
            return Err(MyricaError::invalid_name(NameKind::Index, name));
        }

        let path = PathBuf::from(&config.data_dir).join(name);
        if create {
            if path.exists() {
                return Err(MyricaError::IndexExists(name.to_string()));
            }
            std::fs::create_dir_all(&path)?;
        } else if !path.is_dir() {
            return Err(MyricaError::IndexNotFound(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            path,
            engine: Engine::new(config),
            batching: AtomicBool::new(false),
            open: AtomicBool::new(true),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding this index's databases.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// True while a batch session is active.
    pub fn is_batching(&self) -> bool {
        self.batching.load(Ordering::Acquire)
    }

    /// Store and index a document, inferring field types from the JSON
    /// value shapes (strings as `string`, booleans as `bool`, numbers as
    /// `uint`/`int`/`float` by representability). Nested values are
    /// stored but not indexed.
    pub fn add(&self, id: u64, document: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let commands = planner::build_add(&self.name, id, document, None, self.is_batching())?;
        self.execute_all(&commands)
    }

    /// Store and index a document under an explicit metadata schema.
    pub fn add_with_metadata(&self, id: u64, document: &[u8], metadata: &Metadata) -> Result<()> {
        self.ensure_open()?;
        let commands =
            planner::build_add(&self.name, id, document, Some(metadata), self.is_batching())?;
        self.execute_all(&commands)
    }

    /// Planner output for one document, without executing it. Exposed for
    /// command-language collaborators and tests.
    pub fn build_add(&self, id: u64, document: &[u8], metadata: &Metadata) -> Result<Vec<Command>> {
        self.ensure_open()?;
        planner::build_add(&self.name, id, document, Some(metadata), self.is_batching())
    }

    /// Fetch the raw JSON bytes of a document.
    pub fn get(&self, id: u64) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        self.engine
            .execute(&Command::get(&self.name, DOCUMENT_DB, Operand::Uint(id)))
    }

    /// Exact-term lookup on a string field. Returns matching documents in
    /// ascending document-ID order. Case-insensitive.
    pub fn filter_term(&self, field: &str, term: &str) -> Result<Vec<Vec<u8>>> {
        self.ensure_open()?;

        let database = format!("{}_string.idx", field.to_lowercase());
        let key = term.to_lowercase().into_bytes();

        let Some(packed) = self
            .engine
            .execute(&Command::get(&self.name, &database, Operand::Str(key)))?
        else {
            return Ok(Vec::new());
        };

        let ids = bytes::decode_u64_seq(&packed)?;
        self.documents_for_ids(ids)
    }

    /// Prefix lookup on a string field: the union of the posting lists of
    /// every term starting with `prefix`, resolved to documents in
    /// ascending document-ID order. Case-insensitive.
    pub fn match_prefix(&self, field: &str, prefix: &str) -> Result<Vec<Vec<u8>>> {
        self.ensure_open()?;

        let database = format!("{}_string.idx", field.to_lowercase());
        let prefix = prefix.to_lowercase().into_bytes();

        let entries = self.engine.prefix_scan(&self.name, &database, &prefix)?;

        let mut ids = std::collections::BTreeSet::new();
        for (_, packed) in entries {
            ids.extend(bytes::decode_u64_seq(&packed)?);
        }
        self.documents_for_ids(ids)
    }

    /// Enter batch mode. Idempotent; stores switch into batching lazily
    /// as writes touch them.
    pub fn batch(&self) {
        self.batching.store(true, Ordering::Release);
    }

    /// Commit the active batch on every participating store,
    /// `document.db` first, and leave batch mode.
    pub fn flush_batch(&self) -> Result<()> {
        self.ensure_open()?;
        self.engine.flush_index_batches(&self.name)?;
        self.batching.store(false, Ordering::Release);
        Ok(())
    }

    /// Flush any pending batch and close every store of this index.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if self.batching.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.engine.flush_index_batches(&self.name) {
                debug!(index = %self.name, error = %e, "flush on close failed");
            }
        }
        self.engine.close_index(&self.name);
        debug!(index = %self.name, "index closed");
    }

    fn execute_all(&self, commands: &[Command]) -> Result<()> {
        for command in commands {
            self.engine.execute(command)?;
        }
        Ok(())
    }

    fn documents_for_ids(&self, ids: impl IntoIterator<Item = u64>) -> Result<Vec<Vec<u8>>> {
        let mut documents = Vec::new();
        for id in ids {
            if let Some(doc) = self.get(id)? {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(MyricaError::invalid_state(format!(
                "index '{}' is closed",
                self.name
            )))
        }
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_index_name() {
        for name in ["test", "test2", "abc", "a_b-c", "document-sample"] {
            assert!(validate_index_name(name), "should accept {name}");
        }
        for name in ["", "a", "aa", "#", "@", "test/", "test/sub", "$%&*", "with space"] {
            assert!(!validate_index_name(name), "should reject {name}");
        }
    }
}
