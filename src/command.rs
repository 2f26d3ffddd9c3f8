//! Typed storage commands.
//!
//! A [`Command`] is an immutable descriptor of one storage operation: the
//! target index and database, the operation kind, and typed key/value
//! operands. The indexing planner produces command sequences; the
//! [`Engine`](crate::engine::Engine) consumes them. Commands also have a
//! textual reverse form (`USING <index>.<database> <OP> ...;`) consumed by
//! external command-language collaborators.

use crate::util::bytes;

/// The operation kind of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Set,
    MergeSet,
    Get,
    Delete,
    Batch,
    FlushBatch,
}

impl OpKind {
    fn as_str(&self) -> &'static str {
        match self {
            OpKind::Set => "SET",
            OpKind::MergeSet => "MERGESET",
            OpKind::Get => "GET",
            OpKind::Delete => "DELETE",
            OpKind::Batch => "BATCH",
            OpKind::FlushBatch => "FLUSHBATCH",
        }
    }
}

/// A typed command operand.
///
/// `Uint`, `Int` and `Float` encode to fixed-width 8-byte big-endian;
/// `Str` is raw bytes; `Bool` is the ASCII bytes `true` / `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Str(Vec<u8>),
    Uint(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Operand {
    /// Storage encoding of this operand.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Operand::Str(b) => b.clone(),
            Operand::Uint(v) => bytes::encode_u64(*v).to_vec(),
            Operand::Int(v) => bytes::encode_i64(*v).to_vec(),
            Operand::Float(v) => bytes::encode_f64(*v).to_vec(),
            Operand::Bool(v) => {
                if *v {
                    b"true".to_vec()
                } else {
                    b"false".to_vec()
                }
            }
        }
    }

    /// Textual literal used by the command reverse form.
    fn render(&self) -> String {
        match self {
            Operand::Str(b) => format!("'{}'", String::from_utf8_lossy(b)),
            Operand::Uint(v) => format!("uint({v})"),
            Operand::Int(v) => format!("int({v})"),
            Operand::Float(v) => format!("float({v})"),
            Operand::Bool(v) => format!("bool({v})"),
        }
    }
}

/// One storage operation against a single database of a single index.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Target index name.
    pub index: String,
    /// Target database file name, e.g. `document.db` or `name_string.idx`.
    pub database: String,
    /// Operation kind.
    pub kind: OpKind,
    /// Key operand; absent for `Batch` / `FlushBatch`.
    pub key: Option<Operand>,
    /// Value operand; present for `Set` / `MergeSet`.
    pub value: Option<Operand>,
    /// Whether this command participates in an index-level batch.
    pub batch: bool,
}

impl Command {
    pub fn set(index: impl Into<String>, database: impl Into<String>, key: Operand, value: Operand) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::Set,
            key: Some(key),
            value: Some(value),
            batch: false,
        }
    }

    pub fn merge_set(
        index: impl Into<String>,
        database: impl Into<String>,
        key: Operand,
        value: Operand,
    ) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::MergeSet,
            key: Some(key),
            value: Some(value),
            batch: false,
        }
    }

    pub fn get(index: impl Into<String>, database: impl Into<String>, key: Operand) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::Get,
            key: Some(key),
            value: None,
            batch: false,
        }
    }

    pub fn delete(index: impl Into<String>, database: impl Into<String>, key: Operand) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::Delete,
            key: Some(key),
            value: None,
            batch: false,
        }
    }

    pub fn batch(index: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::Batch,
            key: None,
            value: None,
            batch: false,
        }
    }

    pub fn flush_batch(index: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            database: database.into(),
            kind: OpKind::FlushBatch,
            key: None,
            value: None,
            batch: false,
        }
    }

    /// Mark this command as part of an index-level batch.
    pub fn batched(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Render the textual reverse form:
    /// `USING <index>.<database> <OP> [<key> [<value>]];`
    pub fn reverse(&self) -> String {
        let target = format!("USING {}.{}", self.index, self.database);
        let op = self.kind.as_str();

        match self.kind {
            OpKind::Set | OpKind::MergeSet => {
                let key = self.key.as_ref().map(Operand::render).unwrap_or_default();
                let value = self.value.as_ref().map(Operand::render).unwrap_or_default();
                format!("{target} {op} {key} {value};")
            }
            OpKind::Get | OpKind::Delete => {
                let key = self.key.as_ref().map(Operand::render).unwrap_or_default();
                format!("{target} {op} {key};")
            }
            OpKind::Batch | OpKind::FlushBatch => format!("{target} {op};"),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reverse())
    }
}
