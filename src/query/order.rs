//! Value-ordered enumeration of live documents
//!
//! Documents are ordered by a docvalues column. Documents without a value in
//! that column are left out; equal values keep ascending docno order.

use std::cmp::Ordering;
use std::fmt;

use crate::config::FieldNames;
use crate::error::{LexdumpError, Result};
use crate::inspect::IndexHandle;
use crate::segment::{DocNo, IndexReader, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort key for enumerating every document of an index
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocOrder {
    pub field: String,
    pub kind: ValueKind,
    pub direction: SortDirection,
}

impl fmt::Display for DocOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{} {:?} {}", self.field, self.kind, direction)
    }
}

impl DocOrder {
    pub fn new(field: impl Into<String>, kind: ValueKind, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            kind,
            direction,
        }
    }

    /// Collection docid, ascending
    pub fn by_docid(fields: &FieldNames) -> Self {
        Self::new(fields.id.clone(), ValueKind::Keyword, SortDirection::Ascending)
    }

    /// Numeric tweet id, newest first
    pub fn by_tweetid(fields: &FieldNames) -> Self {
        Self::new(fields.id_long.clone(), ValueKind::Numeric, SortDirection::Descending)
    }

    /// Tweet order when the index carries a numeric id column, docid order otherwise
    pub fn detect(handle: &IndexHandle, fields: &FieldNames) -> Self {
        match handle.doc_values_kind(&fields.id_long) {
            Some(ValueKind::Numeric) => Self::by_tweetid(fields),
            _ => Self::by_docid(fields),
        }
    }

    fn apply_direction(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Live docnos in this order, at most `limit` of them
    pub fn sort_docs(&self, reader: &IndexReader, limit: Option<usize>) -> Result<Vec<DocNo>> {
        let missing = || {
            LexdumpError::CorruptIndex(format!(
                "No {:?} docvalues for field {}",
                self.kind, self.field
            ))
        };
        let live = reader.live_docs();

        let mut docs: Vec<DocNo> = match self.kind {
            ValueKind::Keyword => {
                let column = reader.docvalues().get_keyword(&self.field).ok_or_else(missing)?;
                let mut keyed: Vec<(&str, DocNo)> = live
                    .iter()
                    .filter_map(|docno| column.get(docno).map(|value| (value, docno)))
                    .collect();
                keyed.sort_by(|a, b| self.apply_direction(a.0.cmp(b.0)));
                keyed.into_iter().map(|(_, docno)| docno).collect()
            }
            ValueKind::Numeric => {
                let column = reader.docvalues().get_numeric(&self.field).ok_or_else(missing)?;
                let mut keyed: Vec<(i64, DocNo)> = live
                    .iter()
                    .filter_map(|docno| column.get(docno).map(|value| (value, docno)))
                    .collect();
                keyed.sort_by(|a, b| self.apply_direction(a.0.cmp(&b.0)));
                keyed.into_iter().map(|(_, docno)| docno).collect()
            }
        };

        if let Some(limit) = limit {
            docs.truncate(limit);
        }
        tracing::debug!(order = %self, documents = docs.len(), "Enumerated documents");
        Ok(docs)
    }
}
