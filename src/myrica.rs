//! Top-level façade and open-index registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::error::{MyricaError, NameKind, Result};
use crate::index::{validate_index_name, Index};

/// The entry point of the library.
///
/// `Myrica` owns the process-wide open-index registry: a mapping from
/// index name to live [`Index`] handle, guarded for concurrent use. At
/// most one live handle exists per index name; handles are `Arc`s whose
/// lifetime is bounded by this façade.
///
/// # Examples
///
/// ```no_run
/// use myrica::{Config, Myrica};
///
/// let myrica = Myrica::new(Config::new("/var/lib/myrica")).unwrap();
/// let index = myrica.create_index("companies").unwrap();
/// index.add(1, br#"{"id": 1, "name": "Neoway Business Solution"}"#).unwrap();
///
/// let docs = index.filter_term("name", "neoway").unwrap();
/// assert_eq!(docs.len(), 1);
/// ```
pub struct Myrica {
    config: Config,
    indices: RwLock<HashMap<String, Arc<Index>>>,
}

impl Myrica {
    /// Create the façade. The data directory is created if missing.
    pub fn new(config: Config) -> Result<Self> {
        if config.data_dir.is_empty() {
            return Err(MyricaError::invalid_state("data_dir is required"));
        }
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(Self {
            config,
            indices: RwLock::new(HashMap::new()),
        })
    }

    /// Create a new index and register its handle.
    pub fn create_index(&self, name: &str) -> Result<Arc<Index>> {
        let mut indices = self.indices.write();
        if indices.contains_key(name) {
            return Err(MyricaError::IndexExists(name.to_string()));
        }

        let index = Arc::new(Index::new(name, &self.config, true)?);
        indices.insert(name.to_string(), index.clone());
        debug!(index = name, "index created");
        Ok(index)
    }

    /// Open an existing index, reusing the live handle when present.
    pub fn open_index(&self, name: &str) -> Result<Arc<Index>> {
        let mut indices = self.indices.write();
        if let Some(index) = indices.get(name) {
            return Ok(index.clone());
        }

        let index = Arc::new(Index::new(name, &self.config, false)?);
        indices.insert(name.to_string(), index.clone());
        debug!(index = name, "index opened");
        Ok(index)
    }

    /// Close (if open) and remove an index and all of its data.
    pub fn delete_index(&self, name: &str) -> Result<()> {
        if !validate_index_name(name) {
            return Err(MyricaError::invalid_name(NameKind::Index, name));
        }

        let mut indices = self.indices.write();
        if let Some(index) = indices.remove(name) {
            index.close();
        }

        let path = self.index_path(name);
        if !path.is_dir() {
            return Err(MyricaError::IndexNotFound(name.to_string()));
        }
        std::fs::remove_dir_all(&path)?;
        debug!(index = name, "index deleted");
        Ok(())
    }

    /// Whether an index directory exists on disk.
    pub fn index_exists(&self, name: &str) -> Result<bool> {
        if !validate_index_name(name) {
            return Err(MyricaError::invalid_name(NameKind::Index, name));
        }
        Ok(self.index_path(name).is_dir())
    }

    /// Number of indices currently held in the open-set.
    pub fn open_indices_len(&self) -> usize {
        self.indices.read().len()
    }

    /// Close every open index and clear the registry.
    pub fn close(&self) {
        let mut indices = self.indices.write();
        for (_, index) in indices.drain() {
            index.close();
        }
    }

    fn index_path(&self, name: &str) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join(name)
    }
}

impl Drop for Myrica {
    fn drop(&mut self) {
        self.close();
    }
}
