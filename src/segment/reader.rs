//! Immutable index reader over fully loaded segment files
//!
//! Every structure is decoded and validated when the reader is built; after
//! that all lookups are in-memory and the reader is freely shareable.

use std::collections::HashMap;
use std::io;

use super::docvalues::DocValuesReader;
use super::live_docs::LiveDocs;
use super::manifest::{FieldInfo, IndexMeta};
use super::postings::{PostingIterator, PostingsReader};
use super::statistics::FieldStatistics;
use super::stored::{BlobLogReader, StoredDocument, TermVector};
use super::term_dict::TermDictionary;
use super::types::{DocNo, PostingListMeta};

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Inverted index of one field
pub struct FieldIndex {
    terms: TermDictionary,
    postings: PostingsReader,
    stats: FieldStatistics,
}

impl FieldIndex {
    pub fn new(terms: TermDictionary, postings: PostingsReader, stats: FieldStatistics) -> Self {
        Self {
            terms,
            postings,
            stats,
        }
    }

    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    pub fn stats(&self) -> &FieldStatistics {
        &self.stats
    }
}

/// Read-only view of one index snapshot
pub struct IndexReader {
    meta: IndexMeta,
    fields: HashMap<String, FieldIndex>,
    stored: BlobLogReader,
    vectors: BlobLogReader,
    docvalues: DocValuesReader,
    live_docs: LiveDocs,
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("max_doc", &self.meta.max_doc)
            .field("num_docs", &self.live_docs.num_docs())
            .field("fields", &self.meta.fields.len())
            .finish()
    }
}

impl IndexReader {
    /// Assemble a reader, checking that every part covers the same docnos
    pub fn new(
        meta: IndexMeta,
        fields: HashMap<String, FieldIndex>,
        stored: BlobLogReader,
        vectors: BlobLogReader,
        docvalues: DocValuesReader,
        live_docs: LiveDocs,
    ) -> io::Result<Self> {
        let max_doc = meta.max_doc as usize;

        if live_docs.max_doc() != meta.max_doc {
            return Err(invalid(format!(
                "Live docs cover {} docnos, metadata declares {}",
                live_docs.max_doc(),
                meta.max_doc
            )));
        }
        if stored.len() != max_doc {
            return Err(invalid(format!(
                "Stored fields cover {} docnos, metadata declares {}",
                stored.len(),
                max_doc
            )));
        }
        if !vectors.is_empty() && vectors.len() != max_doc {
            return Err(invalid(format!(
                "Term vectors cover {} docnos, metadata declares {}",
                vectors.len(),
                max_doc
            )));
        }
        for info in meta.indexed_fields() {
            let field = fields
                .get(&info.name)
                .ok_or_else(|| invalid(format!("Indexed field {} has no term dictionary", info.name)))?;
            if field.stats.doc_lengths().len() != max_doc {
                return Err(invalid(format!(
                    "Field {} has lengths for {} docnos, metadata declares {}",
                    info.name,
                    field.stats.doc_lengths().len(),
                    max_doc
                )));
            }
        }

        Ok(Self {
            meta,
            fields,
            stored,
            vectors,
            docvalues,
            live_docs,
        })
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn field_info(&self, name: &str) -> Option<&FieldInfo> {
        self.meta.field(name)
    }

    pub fn field_index(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name)
    }

    /// Number of docnos allocated, deleted ones included
    pub fn max_doc(&self) -> u32 {
        self.meta.max_doc
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u32 {
        self.live_docs.num_docs()
    }

    pub fn live_docs(&self) -> &LiveDocs {
        &self.live_docs
    }

    pub fn docvalues(&self) -> &DocValuesReader {
        &self.docvalues
    }

    /// Postings metadata of a term in a field
    pub fn term_meta(&self, field: &str, term: &str) -> Option<&PostingListMeta> {
        self.fields.get(field).and_then(|f| f.terms.get(term))
    }

    /// Fresh posting iterator for a term; empty when field or term is absent
    pub fn postings(&self, field: &str, term: &str) -> io::Result<PostingIterator<'_>> {
        match self.fields.get(field) {
            Some(index) => match index.terms.get(term) {
                Some(meta) => index.postings.get_postings(meta),
                None => Ok(PostingIterator::empty()),
            },
            None => Ok(PostingIterator::empty()),
        }
    }

    /// All stored fields of a document
    pub fn stored_document(&self, docno: DocNo) -> io::Result<Option<StoredDocument>> {
        self.stored.read_decoded(docno)
    }

    /// One stored field of a document
    pub fn stored_field(&self, docno: DocNo, field: &str) -> io::Result<Option<String>> {
        Ok(self
            .stored_document(docno)?
            .and_then(|mut doc| doc.remove(field)))
    }

    /// Term vector of the body field of a document
    pub fn term_vector(&self, docno: DocNo) -> io::Result<Option<TermVector>> {
        self.vectors.read_decoded(docno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::docvalues::KeywordColumn;
    use crate::segment::postings::PostingsWriter;
    use crate::segment::stored::BlobLogWriter;
    use crate::segment::term_dict::TermDictionaryBuilder;
    use crate::segment::types::{IndexOption, Posting, ValueKind};

    fn field_index(terms: &[(&str, &[(u32, u32)])], lengths: Vec<u32>) -> FieldIndex {
        let mut writer = PostingsWriter::new();
        let mut dict = TermDictionaryBuilder::new();
        for (term, postings) in terms {
            writer.start_posting_list();
            for &(docno, tf) in postings.iter() {
                writer.add_posting(Posting::new(DocNo(docno), tf));
            }
            dict.add(term.to_string(), writer.finish_posting_list());
        }
        FieldIndex::new(
            dict.build().unwrap(),
            PostingsReader::new(writer.into_data()),
            FieldStatistics::from_doc_lengths(lengths),
        )
    }

    fn two_doc_reader() -> IndexReader {
        let meta = IndexMeta::new(
            2,
            vec![
                FieldInfo::new("id")
                    .with_index_option(IndexOption::Docs)
                    .with_stored(true)
                    .with_doc_values(ValueKind::Keyword),
                FieldInfo::new("contents").with_index_option(IndexOption::DocsAndFreqs),
            ],
        );

        let mut fields = HashMap::new();
        fields.insert(
            "id".to_string(),
            field_index(&[("a", &[(0, 1)]), ("b", &[(1, 1)])], vec![1, 1]),
        );
        fields.insert(
            "contents".to_string(),
            field_index(&[("rust", &[(0, 2), (1, 1)])], vec![2, 1]),
        );

        let mut stored = BlobLogWriter::new();
        for id in ["a", "b"] {
            let mut doc = StoredDocument::new();
            doc.insert("id".to_string(), id.to_string());
            stored.append(&bincode::serialize(&doc).unwrap());
        }
        let (data, pointers) = stored.finish().unwrap();

        let mut ids = KeywordColumn::new();
        ids.add(Some("a"));
        ids.add(Some("b"));
        let mut docvalues = DocValuesReader::new();
        docvalues.add_keyword("id".to_string(), ids);

        IndexReader::new(
            meta,
            fields,
            BlobLogReader::new(data, &pointers).unwrap(),
            BlobLogReader::default(),
            docvalues,
            LiveDocs::new(2),
        )
        .unwrap()
    }

    #[test]
    fn test_reader_lookups() {
        let reader = two_doc_reader();

        assert_eq!(reader.max_doc(), 2);
        assert_eq!(reader.num_docs(), 2);
        assert_eq!(reader.term_meta("contents", "rust").unwrap().total_term_frequency, 3);
        assert!(reader.term_meta("contents", "go").is_none());
        assert!(reader.term_meta("nofield", "rust").is_none());

        let postings: Vec<(DocNo, u32)> = reader.postings("contents", "rust").unwrap().collect();
        assert_eq!(postings, vec![(DocNo(0), 2), (DocNo(1), 1)]);
        assert_eq!(reader.postings("contents", "go").unwrap().count(), 0);

        assert_eq!(reader.stored_field(DocNo(1), "id").unwrap().as_deref(), Some("b"));
        assert_eq!(reader.stored_field(DocNo(1), "raw").unwrap(), None);
        assert_eq!(reader.term_vector(DocNo(0)).unwrap(), None);
    }

    #[test]
    fn test_reader_rejects_mismatched_parts() {
        let meta = IndexMeta::new(3, Vec::new());
        let err = IndexReader::new(
            meta,
            HashMap::new(),
            BlobLogReader::default(),
            BlobLogReader::default(),
            DocValuesReader::new(),
            LiveDocs::new(2),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
