//! Command dispatch over per-database stores.
//!
//! The [`Engine`] owns the mapping (index name, database name) → open
//! store handle, opening stores lazily on first use and evicting the
//! least-recently-used non-batching store when the configured bound is
//! exceeded. Every storage operation arrives as a [`Command`]; the engine
//! resolves the target store and dispatches on the command kind.
//!
//! Batching is a per-store property. The engine propagates `start_batch`
//! lazily: the first batched write touching a store switches it into
//! batch mode. [`Engine::flush_index_batches`] commits every
//! participating store of an index, `document.db` first and the inverted
//! indices after it in lexicographic database order, so a visible posting
//! always has its document record.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::command::{Command, OpKind, Operand};
use crate::config::Config;
use crate::error::{MyricaError, Result};
use crate::store::{merge, new_store, KvConfig, KvStore, DOCUMENT_DB};

struct StoreEntry {
    store: Box<dyn KvStore>,
    last_used: u64,
}

struct EngineInner {
    stores: HashMap<(String, String), StoreEntry>,
    clock: u64,
}

/// Routes typed commands to the correct store instance.
pub struct Engine {
    kv_config: KvConfig,
    debug: bool,
    max_open_stores: usize,
    inner: Mutex<EngineInner>,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            kv_config: KvConfig::from_config(config),
            debug: config.debug,
            max_open_stores: config.max_open_stores.max(1),
            inner: Mutex::new(EngineInner {
                stores: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Execute one command. Returns the value bytes for `get`, `None` for
    /// every other kind.
    pub fn execute(&self, cmd: &Command) -> Result<Option<Vec<u8>>> {
        if self.debug {
            trace!(command = %cmd.reverse(), "execute");
        }

        let mut inner = self.inner.lock();
        let entry = Self::resolve(
            &mut inner,
            &self.kv_config,
            self.max_open_stores,
            &cmd.index,
            &cmd.database,
        )?;

        match cmd.kind {
            OpKind::Set => {
                let key = required_key(cmd)?.to_bytes();
                let value = required_value(cmd)?.to_bytes();
                Self::propagate_batch(cmd, entry);
                entry.store.set(&key, &value)?;
                Ok(None)
            }
            OpKind::MergeSet => {
                let key = required_key(cmd)?.to_bytes();
                let id = match required_value(cmd)? {
                    Operand::Uint(id) => *id,
                    other => {
                        return Err(MyricaError::invalid_state(format!(
                            "mergeset requires a uint value, got {other:?}"
                        )))
                    }
                };
                Self::propagate_batch(cmd, entry);
                merge::merge_set(entry.store.as_mut(), &key, id)?;
                Ok(None)
            }
            OpKind::Get => {
                let key = required_key(cmd)?.to_bytes();
                entry.store.get(&key)
            }
            OpKind::Delete => {
                let key = required_key(cmd)?.to_bytes();
                Self::propagate_batch(cmd, entry);
                entry.store.delete(&key)?;
                Ok(None)
            }
            OpKind::Batch => {
                entry.store.start_batch();
                Ok(None)
            }
            OpKind::FlushBatch => entry.store.flush_batch().map(|_| None),
        }
    }

    /// Scan `database` of `index` for keys starting with `prefix`, in
    /// ascending byte order. Used by prefix matching, which needs more
    /// than the point-lookup command surface.
    pub fn prefix_scan(
        &self,
        index: &str,
        database: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut inner = self.inner.lock();
        let entry = Self::resolve(
            &mut inner,
            &self.kv_config,
            self.max_open_stores,
            index,
            database,
        )?;
        let entries = entry.store.iterator(prefix)?.collect();
        Ok(entries)
    }

    /// Flush every store of `index` that is currently batching.
    ///
    /// `document.db` flushes first, then the inverted-index stores in
    /// lexicographic database-name order.
    pub fn flush_index_batches(&self, index: &str) -> Result<()> {
        let mut inner = self.inner.lock();

        let mut databases: Vec<String> = inner
            .stores
            .iter()
            .filter(|((idx, _), entry)| idx.as_str() == index && entry.store.is_batch())
            .map(|((_, db), _)| db.clone())
            .collect();
        databases.sort_by_key(|db| (db.as_str() != DOCUMENT_DB, db.clone()));

        for db in databases {
            let entry = inner
                .stores
                .get_mut(&(index.to_string(), db))
                .expect("store disappeared while holding the lock");
            entry.store.flush_batch()?;
        }
        Ok(())
    }

    /// Close and drop every store belonging to `index`.
    pub fn close_index(&self, index: &str) {
        let mut inner = self.inner.lock();
        let keys: Vec<_> = inner
            .stores
            .keys()
            .filter(|(idx, _)| idx.as_str() == index)
            .cloned()
            .collect();
        for key in keys {
            if let Some(mut entry) = inner.stores.remove(&key) {
                entry.store.close();
            }
        }
    }

    /// Number of currently open stores.
    pub fn open_stores_len(&self) -> usize {
        self.inner.lock().stores.len()
    }

    fn propagate_batch(cmd: &Command, entry: &mut StoreEntry) {
        if cmd.batch && !entry.store.is_batch() {
            entry.store.start_batch();
        }
    }

    fn resolve<'a>(
        inner: &'a mut EngineInner,
        kv_config: &KvConfig,
        max_open_stores: usize,
        index: &str,
        database: &str,
    ) -> Result<&'a mut StoreEntry> {
        let key = (index.to_string(), database.to_string());

        if !inner.stores.contains_key(&key) {
            if inner.stores.len() >= max_open_stores {
                Self::evict_one(inner);
            }

            let mut store = new_store(kv_config);
            store.open(index, database)?;
            inner.stores.insert(
                key.clone(),
                StoreEntry {
                    store,
                    last_used: 0,
                },
            );
        }

        inner.clock += 1;
        let clock = inner.clock;
        let entry = inner.stores.get_mut(&key).expect("just inserted");
        entry.last_used = clock;
        Ok(entry)
    }

    /// Close the least-recently-used store that is not batching. When all
    /// stores are batching the bound is allowed to overflow.
    fn evict_one(inner: &mut EngineInner) {
        let victim = inner
            .stores
            .iter()
            .filter(|(_, entry)| !entry.store.is_batch())
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            if let Some(mut entry) = inner.stores.remove(&key) {
                entry.store.close();
            }
        }
    }
}

fn required_key(cmd: &Command) -> Result<&Operand> {
    cmd.key
        .as_ref()
        .ok_or_else(|| MyricaError::invalid_state(format!("{:?} command requires a key", cmd.kind)))
}

fn required_value(cmd: &Command) -> Result<&Operand> {
    cmd.value.as_ref().ok_or_else(|| {
        MyricaError::invalid_state(format!("{:?} command requires a value", cmd.kind))
    })
}
