//! Index metadata persisted as `index.meta.json`
//!
//! Describes every field of the segment and carries a crc32 over the data
//! files, so a reader can reject a directory whose files do not belong
//! together.

use std::io;

use serde::{Deserialize, Serialize};

use super::types::{IndexOption, ValueKind};

/// Per-field capabilities
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub index_option: IndexOption,
    pub stored: bool,
    pub has_vectors: bool,
    #[serde(default)]
    pub doc_values: Option<ValueKind>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index_option: IndexOption::None,
            stored: false,
            has_vectors: false,
            doc_values: None,
        }
    }

    pub fn with_index_option(mut self, option: IndexOption) -> Self {
        self.index_option = option;
        self
    }

    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn with_vectors(mut self, has_vectors: bool) -> Self {
        self.has_vectors = has_vectors;
        self
    }

    pub fn with_doc_values(mut self, kind: ValueKind) -> Self {
        self.doc_values = Some(kind);
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.index_option != IndexOption::None
    }
}

/// Contents of `index.meta.json`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexMeta {
    /// On-disk format version
    pub format_version: u32,
    /// Number of docnos allocated, deleted ones included
    pub max_doc: u32,
    /// Fields in the order they were declared
    pub fields: Vec<FieldInfo>,
    /// crc32 over the data files
    pub checksum: u32,
}

impl IndexMeta {
    /// Current format version
    pub const FORMAT_VERSION: u32 = 1;

    pub fn new(max_doc: u32, fields: Vec<FieldInfo>) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            max_doc,
            fields,
            checksum: 0,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Indexed fields, in declaration order
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.is_indexed())
    }

    pub fn to_json(&self) -> io::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn from_json(data: &[u8]) -> io::Result<Self> {
        serde_json::from_slice(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
