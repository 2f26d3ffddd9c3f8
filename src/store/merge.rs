//! The merge-set primitive.
//!
//! `merge_set` maintains, under one inverted-index key, a packed sorted
//! duplicate-free sequence of 8-byte big-endian document IDs. It is a
//! plain read-modify-write: NOT safe under concurrent writers on the same
//! key, and inside a batch every call reads the pre-batch value, so only
//! the last write to a key wins. The indexing planner emits at most one
//! merge-set per (document, field, term) pair, which keeps single-document
//! batches exact; batching multiple documents that share a term loses
//! postings.

use crate::error::Result;
use crate::store::KvStore;
use crate::util::bytes;

/// Insert `value` into the posting list stored under `key`.
///
/// No write is issued when `value` is already present. Fails with
/// [`MyricaError::CorruptPostingList`](crate::MyricaError::CorruptPostingList)
/// when the stored value length is not a multiple of 8.
pub fn merge_set(store: &mut dyn KvStore, key: &[u8], value: u64) -> Result<()> {
    let existing = store.get(key)?.unwrap_or_default();
    let mut ids = bytes::decode_u64_seq(&existing)?;

    match ids.binary_search(&value) {
        Ok(_) => Ok(()),
        Err(pos) => {
            ids.insert(pos, value);
            store.set(key, &bytes::encode_u64_seq(&ids))
        }
    }
}
