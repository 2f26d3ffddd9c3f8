//! Disk-backed store.
//!
//! Each database is one append-only log file at
//! `<data_dir>/<index>/<database>` replayed into an in-memory ordered
//! table on open. Non-batch writes append a record and fsync before the
//! table is updated. A flushed batch is appended as one framed group
//! behind a group marker and fsynced once; at replay a group applies only
//! when it is complete, so a torn tail replays to nothing.
//!
//! ## Record format
//!
//! ```text
//! put:    [0u8][u32 klen][key][u32 vlen][value]
//! delete: [1u8][u32 klen][key][u32 0]
//! group:  [2u8][u32 count][u32 0]  followed by `count` put/delete records
//! ```
//!
//! All integers are big-endian.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::error::{MyricaError, NameKind, Result};
use crate::store::{validate_database_name, BatchOp, KvConfig, KvStore};

const OP_PUT: u8 = 0;
const OP_DELETE: u8 = 1;
const OP_GROUP: u8 = 2;

/// Durable [`KvStore`] backed by an append-only log file.
#[derive(Debug)]
pub struct DiskStore {
    data_dir: String,
    debug: bool,
    path: Option<PathBuf>,
    log: Option<File>,
    table: BTreeMap<Vec<u8>, Vec<u8>>,
    batch: Option<Vec<BatchOp>>,
}

impl DiskStore {
    pub fn new(config: &KvConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            debug: config.debug,
            path: None,
            log: None,
            table: BTreeMap::new(),
            batch: None,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.log.is_some() {
            Ok(())
        } else {
            Err(MyricaError::invalid_state("store is not open"))
        }
    }

    fn encode_record(buf: &mut Vec<u8>, op: &BatchOp) {
        match op {
            BatchOp::Put(key, value) => {
                buf.push(OP_PUT);
                buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
                buf.extend_from_slice(key);
                buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
                buf.extend_from_slice(value);
            }
            BatchOp::Delete(key) => {
                buf.push(OP_DELETE);
                buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
                buf.extend_from_slice(key);
                buf.extend_from_slice(&0u32.to_be_bytes());
            }
        }
    }

    /// Parse one put/delete record starting at `pos`.
    ///
    /// Returns the op and the position after it, or `None` when the record
    /// is truncated.
    fn parse_record(data: &[u8], mut pos: usize) -> Option<(BatchOp, usize)> {
        if pos + 5 > data.len() {
            return None;
        }
        let op = data[pos];
        let klen = u32::from_be_bytes(data[pos + 1..pos + 5].try_into().unwrap()) as usize;
        pos += 5;

        if pos + klen + 4 > data.len() {
            return None;
        }
        let key = data[pos..pos + klen].to_vec();
        pos += klen;
        let vlen = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;

        match op {
            OP_PUT => {
                if pos + vlen > data.len() {
                    return None;
                }
                let value = data[pos..pos + vlen].to_vec();
                Some((BatchOp::Put(key, value), pos + vlen))
            }
            OP_DELETE => Some((BatchOp::Delete(key), pos)),
            _ => None,
        }
    }

    fn apply(table: &mut BTreeMap<Vec<u8>, Vec<u8>>, op: BatchOp) {
        match op {
            BatchOp::Put(k, v) => {
                table.insert(k, v);
            }
            BatchOp::Delete(k) => {
                table.remove(&k);
            }
        }
    }

    fn replay(data: &[u8], table: &mut BTreeMap<Vec<u8>, Vec<u8>>) {
        let mut pos = 0;
        while pos < data.len() {
            if data[pos] == OP_GROUP {
                if pos + 9 > data.len() {
                    return;
                }
                let count =
                    u32::from_be_bytes(data[pos + 1..pos + 5].try_into().unwrap()) as usize;
                let mut group_pos = pos + 9;

                let mut group = Vec::with_capacity(count);
                for _ in 0..count {
                    match Self::parse_record(data, group_pos) {
                        Some((op, next)) => {
                            group.push(op);
                            group_pos = next;
                        }
                        // Incomplete group: the flush never finished.
                        None => return,
                    }
                }
                for op in group {
                    Self::apply(table, op);
                }
                pos = group_pos;
            } else {
                match Self::parse_record(data, pos) {
                    Some((op, next)) => {
                        Self::apply(table, op);
                        pos = next;
                    }
                    None => return,
                }
            }
        }
    }

    fn write_and_sync(&mut self, buf: &[u8]) -> Result<()> {
        let log = self
            .log
            .as_mut()
            .ok_or_else(|| MyricaError::invalid_state("store is not open"))?;
        log.write_all(buf)?;
        log.sync_data()?;
        Ok(())
    }
}

impl KvStore for DiskStore {
    fn open(&mut self, index: &str, database: &str) -> Result<()> {
        if !validate_database_name(database) {
            return Err(MyricaError::invalid_name(NameKind::Database, database));
        }

        let path = PathBuf::from(&self.data_dir).join(index).join(database);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut log = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut data = Vec::new();
        log.read_to_end(&mut data)?;

        let mut table = BTreeMap::new();
        Self::replay(&data, &mut table);

        if self.debug {
            debug!(path = %path.display(), entries = table.len(), "database open");
        }

        self.path = Some(path);
        self.log = Some(log);
        self.table = table;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.log.is_some()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if let Some(buffer) = self.batch.as_mut() {
            buffer.push(BatchOp::Put(key.to_vec(), value.to_vec()));
            return Ok(());
        }

        let op = BatchOp::Put(key.to_vec(), value.to_vec());
        let mut buf = Vec::new();
        Self::encode_record(&mut buf, &op);
        self.write_and_sync(&buf)?;
        Self::apply(&mut self.table, op);
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
            return Ok(());
        }

        let op = BatchOp::Delete(key.to_vec());
        let mut buf = Vec::new();
        Self::encode_record(&mut buf, &op);
        self.write_and_sync(&buf)?;
        Self::apply(&mut self.table, op);
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
        let Some(buffer) = self.batch.take() else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        buf.push(OP_GROUP);
        buf.extend_from_slice(&(buffer.len() as u32).to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        for op in &buffer {
            Self::encode_record(&mut buf, op);
        }
        self.write_and_sync(&buf)?;

        if self.debug {
            if let Some(path) = self.path.as_ref() {
                debug!(path = %path.display(), ops = buffer.len(), "batch flushed");
            }
        }

        for op in buffer {
            Self::apply(&mut self.table, op);
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
        if self.debug {
            if let Some(path) = self.path.as_ref() {
                debug!(path = %path.display(), "database closed");
            }
        }
        self.log = None;
        self.path = None;
        self.table.clear();
        self.batch = None;
    }
}
