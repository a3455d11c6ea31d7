//! Per-field length statistics
//!
//! One entry per docno holding the number of analyzed tokens the field
//! produced. Deleted documents and documents without the field have length 0.

use serde::{Deserialize, Serialize};

use super::types::DocNo;

/// Token counts of one indexed field
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldStatistics {
    /// Field lengths indexed by docno
    doc_lengths: Vec<u32>,
    /// Documents with at least one token
    doc_count: u32,
}

impl FieldStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            doc_lengths: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Record the length of the field for the next docno
    pub fn add_document(&mut self, len: u32) -> DocNo {
        let docno = DocNo::new(self.doc_lengths.len() as u32);
        self.doc_lengths.push(len);
        if len > 0 {
            self.doc_count += 1;
        }
        docno
    }

    /// Number of documents where the field is non-empty
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn doc_lengths(&self) -> &[u32] {
        &self.doc_lengths
    }

    /// Rebuild statistics from serialized lengths
    pub fn from_doc_lengths(doc_lengths: Vec<u32>) -> Self {
        let doc_count = doc_lengths.iter().filter(|&&l| l > 0).count() as u32;
        Self {
            doc_lengths,
            doc_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_statistics() {
        let mut stats = FieldStatistics::new();
        assert_eq!(stats.add_document(10), DocNo(0));
        assert_eq!(stats.add_document(0), DocNo(1));
        assert_eq!(stats.add_document(20), DocNo(2));

        assert_eq!(stats.doc_count(), 2);
        assert_eq!(stats.doc_lengths(), &[10, 0, 20]);
    }

    #[test]
    fn test_from_doc_lengths() {
        let stats = FieldStatistics::from_doc_lengths(vec![3, 0, 4]);
        assert_eq!(stats.doc_count(), 2);

        let bytes = bincode::serialize(&stats).unwrap();
        let restored: FieldStatistics = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.doc_lengths(), &[3, 0, 4]);
    }
}
