//! In-memory store backend.
//!
//! Keeps everything in a `BTreeMap`; used by tests and available for
//! ephemeral indices. Shares the batch visibility rules of the disk
//! backend: buffered writes are invisible to `get` until `flush_batch`.

use std::collections::BTreeMap;

use crate::error::{MyricaError, NameKind, Result};
use crate::store::{validate_database_name, BatchOp, KvStore};

/// Ephemeral [`KvStore`] over an ordered in-memory table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    open: bool,
    table: BTreeMap<Vec<u8>, Vec<u8>>,
    batch: Option<Vec<BatchOp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(MyricaError::invalid_state("store is not open"))
        }
    }
}

impl KvStore for MemoryStore {
    fn open(&mut self, _index: &str, database: &str) -> Result<()> {
        if !validate_database_name(database) {
            return Err(MyricaError::invalid_name(NameKind::Database, database));
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if let Some(buffer) = self.batch.as_mut() {
            buffer.push(BatchOp::Put(key.to_vec(), value.to_vec()));
        } else {
            self.table.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.table.get(key).cloned())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if let Some(buffer) = self.batch.as_mut() {
            buffer.push(BatchOp::Delete(key.to_vec()));
        } else {
            self.table.remove(key);
        }
        Ok(())
    }

    fn start_batch(&mut self) {
        match self.batch.as_mut() {
            Some(buffer) => buffer.clear(),
            None => self.batch = Some(Vec::new()),
        }
    }

    fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    fn flush_batch(&mut self) -> Result<()> {
        self.ensure_open()?;
        if let Some(buffer) = self.batch.take() {
            for op in buffer {
                match op {
                    BatchOp::Put(k, v) => {
                        self.table.insert(k, v);
                    }
                    BatchOp::Delete(k) => {
                        self.table.remove(&k);
                    }
                }
            }
        }
        Ok(())
    }

    fn iterator<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        self.ensure_open()?;
        let prefix = prefix.to_vec();
        let iter = self
            .table
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(Box::new(iter))
    }

    fn close(&mut self) {
        self.open = false;
        self.table.clear();
        self.batch = None;
    }
}
