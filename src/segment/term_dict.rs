//! Term dictionary using FST (Finite State Transducer)
//!
//! One dictionary per indexed field. The FST maps each term to an index into
//! a parallel array of postings metadata.

use std::io;

use fst::{Map, MapBuilder, Streamer};

use super::types::PostingListMeta;

/// Term dictionary backed by FST
pub struct TermDictionary {
    /// FST mapping term -> index in metadata array
    fst: Map<Vec<u8>>,
    /// Metadata for each term (parallel to FST output values)
    metadata: Vec<PostingListMeta>,
}

impl TermDictionary {
    /// Create a term dictionary from FST data and metadata
    pub fn new(fst_data: Vec<u8>, metadata: Vec<PostingListMeta>) -> io::Result<Self> {
        let fst = Map::new(fst_data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if fst.len() != metadata.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Term dictionary has {} terms but {} metadata entries",
                    fst.len(),
                    metadata.len()
                ),
            ));
        }
        Ok(Self { fst, metadata })
    }

    /// Look up a term and return its postings metadata
    pub fn get(&self, term: &str) -> Option<&PostingListMeta> {
        self.fst
            .get(term.as_bytes())
            .and_then(|idx| self.metadata.get(idx as usize))
    }

    /// Check if a term exists
    pub fn contains(&self, term: &str) -> bool {
        self.fst.contains_key(term.as_bytes())
    }

    /// Get the number of terms
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Sum of total term frequency over every term
    pub fn sum_total_term_frequency(&self) -> u64 {
        self.metadata.iter().map(|m| m.total_term_frequency).sum()
    }

    /// Get the raw FST data (for serialization)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }

    /// Get the metadata array (for serialization)
    pub fn metadata(&self) -> &[PostingListMeta] {
        &self.metadata
    }

    /// All terms in lexicographic byte order
    pub fn iter_terms(&self) -> Vec<(String, &PostingListMeta)> {
        let mut results = Vec::with_capacity(self.metadata.len());
        let mut stream = self.fst.stream();
        while let Some((key, idx)) = stream.next() {
            if let (Ok(term), Some(meta)) = (std::str::from_utf8(key), self.metadata.get(idx as usize)) {
                results.push((term.to_string(), meta));
            }
        }
        results
    }
}

/// Builder for term dictionaries
pub struct TermDictionaryBuilder {
    terms: Vec<(String, PostingListMeta)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// Add a term with its postings metadata
    pub fn add(&mut self, term: String, meta: PostingListMeta) {
        self.terms.push((term, meta));
    }

    /// Build the term dictionary
    pub fn build(mut self) -> io::Result<TermDictionary> {
        // FST requires sorted, unique keys
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));
        self.terms.dedup_by(|a, b| a.0 == b.0);

        let mut fst_builder = MapBuilder::memory();
        let mut metadata = Vec::with_capacity(self.terms.len());

        for (idx, (term, meta)) in self.terms.into_iter().enumerate() {
            fst_builder
                .insert(term.as_bytes(), idx as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            metadata.push(meta);
        }

        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        TermDictionary::new(fst_data, metadata)
    }
}

impl Default for TermDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(offset: u64, doc_frequency: u32, total_term_frequency: u64) -> PostingListMeta {
        PostingListMeta {
            offset,
            length: 10,
            doc_frequency,
            total_term_frequency,
        }
    }

    #[test]
    fn test_term_dictionary_builder() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add("cherry".to_string(), meta(300, 15, 75));
        builder.add("apple".to_string(), meta(0, 10, 50));
        builder.add("banana".to_string(), meta(100, 20, 100));

        let dict = builder.build().unwrap();

        assert_eq!(dict.len(), 3);
        assert!(dict.contains("apple"));
        assert!(!dict.contains("date"));
        assert_eq!(dict.get("apple").unwrap().doc_frequency, 10);
        assert_eq!(dict.get("cherry").unwrap().offset, 300);
        assert_eq!(dict.sum_total_term_frequency(), 225);

        let terms: Vec<String> = dict.iter_terms().into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_reload_from_bytes() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add("hello".to_string(), meta(0, 2, 3));
        let dict = builder.build().unwrap();

        let reloaded =
            TermDictionary::new(dict.fst_bytes().to_vec(), dict.metadata().to_vec()).unwrap();
        assert_eq!(reloaded.get("hello"), dict.get("hello"));

        assert!(TermDictionary::new(dict.fst_bytes().to_vec(), Vec::new()).is_err());
        assert!(TermDictionary::new(vec![1, 2, 3], Vec::new()).is_err());
    }
}
