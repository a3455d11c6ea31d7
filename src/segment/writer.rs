//! Index writer used to materialise test and benchmark indexes
//!
//! Documents are buffered in memory and laid out in a single immutable
//! segment on `build`. Deleted documents keep their docno but are left out of
//! postings, field lengths and docvalues.

use std::collections::{BTreeMap, HashMap};
use std::io;

use crc32fast::Hasher;

use super::docvalues::{DocValuesReader, KeywordColumn, NumericColumn};
use super::live_docs::LiveDocs;
use super::manifest::{FieldInfo, IndexMeta};
use super::postings::PostingsWriter;
use super::statistics::FieldStatistics;
use super::store::{self, SegmentFiles};
use super::stored::{BlobLogWriter, StoredDocument, TermVector};
use super::term_dict::TermDictionaryBuilder;
use super::types::{DocNo, IndexOption, Posting, ValueKind};
use crate::config::{AnalyzerConfig, FieldNames};
use crate::tokenizer::Analyzer;

/// A document to add to the index
#[derive(Clone, Debug, Default)]
pub struct NewDocument {
    pub id: String,
    /// Text analyzed into the body field
    pub contents: Option<String>,
    /// Keep the body text as a stored field
    pub store_contents: bool,
    /// Raw document, stored only
    pub raw: Option<String>,
    /// Record a term vector for the body field
    pub term_vector: bool,
    /// Numeric id docvalue (tweet collections)
    pub id_long: Option<i64>,
}

impl NewDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Index body text without storing it
    pub fn with_contents(mut self, text: impl Into<String>) -> Self {
        self.contents = Some(text.into());
        self
    }

    /// Index body text and store it
    pub fn with_stored_contents(mut self, text: impl Into<String>) -> Self {
        self.contents = Some(text.into());
        self.store_contents = true;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_term_vector(mut self) -> Self {
        self.term_vector = true;
        self
    }

    pub fn with_id_long(mut self, value: i64) -> Self {
        self.id_long = Some(value);
        self
    }
}

/// Collects postings of one field in term order
#[derive(Default)]
struct FieldBuffer {
    postings: BTreeMap<String, Vec<Posting>>,
    stats: FieldStatistics,
}

impl FieldBuffer {
    fn add(&mut self, docno: DocNo, terms: &BTreeMap<String, u32>) {
        let mut len = 0u32;
        for (term, &tf) in terms {
            self.postings
                .entry(term.clone())
                .or_default()
                .push(Posting::new(docno, tf));
            len += tf;
        }
        self.stats.add_document(len);
    }

    /// Encode into (fst, term metadata, postings, lengths) files
    fn encode(self) -> io::Result<[Vec<u8>; 4]> {
        let mut postings_writer = PostingsWriter::new();
        let mut term_builder = TermDictionaryBuilder::with_capacity(self.postings.len());

        for (term, postings) in self.postings {
            postings_writer.start_posting_list();
            for posting in postings {
                postings_writer.add_posting(posting);
            }
            term_builder.add(term, postings_writer.finish_posting_list());
        }

        let dict = term_builder.build()?;
        let term_meta = bincode::serialize(dict.metadata())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let lengths = bincode::serialize(&self.stats)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok([
            dict.fst_bytes().to_vec(),
            term_meta,
            postings_writer.into_data(),
            lengths,
        ])
    }
}

/// Buffers documents and writes them as one segment
pub struct IndexWriter {
    fields: FieldNames,
    analyzer: Analyzer,
    docs: Vec<NewDocument>,
    deleted: Vec<DocNo>,
}

impl IndexWriter {
    pub fn new(fields: FieldNames, analyzer: &AnalyzerConfig) -> Self {
        Self {
            fields,
            analyzer: Analyzer::new(analyzer),
            docs: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Add a document, returning its docno
    pub fn add_document(&mut self, doc: NewDocument) -> DocNo {
        let docno = DocNo::new(self.docs.len() as u32);
        self.docs.push(doc);
        docno
    }

    /// Delete a previously added document
    pub fn delete(&mut self, docno: DocNo) {
        self.deleted.push(docno);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Lay the buffered documents out as segment files
    pub fn build(self) -> io::Result<SegmentFiles> {
        let max_doc = self.docs.len() as u32;
        let mut live_docs = LiveDocs::new(max_doc);
        for docno in &self.deleted {
            live_docs.delete(*docno);
        }

        let mut id_field = FieldBuffer::default();
        let mut body_field = FieldBuffer::default();
        let mut stored = BlobLogWriter::new();
        let mut vectors = BlobLogWriter::new();
        let mut ids = KeywordColumn::new();
        let mut id_longs = NumericColumn::with_capacity(self.docs.len());

        let mut any_raw = false;
        let mut any_stored_body = false;
        let mut any_vector = false;
        let mut any_id_long = false;

        for (i, doc) in self.docs.iter().enumerate() {
            let docno = DocNo::new(i as u32);
            let live = live_docs.is_live(docno);

            let mut fields = StoredDocument::new();
            fields.insert(self.fields.id.clone(), doc.id.clone());
            if let Some(raw) = &doc.raw {
                fields.insert(self.fields.raw.clone(), raw.clone());
                any_raw = true;
            }
            if let (true, Some(text)) = (doc.store_contents, &doc.contents) {
                fields.insert(self.fields.body.clone(), text.clone());
                any_stored_body = true;
            }
            let payload = bincode::serialize(&fields)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            stored.append(&payload);

            let body_terms = match (&doc.contents, live) {
                (Some(text), true) => self.analyzer.term_frequencies(text),
                _ => BTreeMap::new(),
            };

            if doc.term_vector && live && doc.contents.is_some() {
                let vector: TermVector = body_terms
                    .iter()
                    .map(|(term, &tf)| (term.clone(), tf as u64))
                    .collect();
                let payload = bincode::serialize(&vector)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                vectors.append(&payload);
                any_vector = true;
            } else {
                vectors.skip();
            }

            if live {
                let mut id_terms = BTreeMap::new();
                id_terms.insert(doc.id.clone(), 1);
                id_field.add(docno, &id_terms);
                ids.add(Some(&doc.id));
                id_longs.add(doc.id_long);
                any_id_long |= doc.id_long.is_some();
            } else {
                id_field.add(docno, &BTreeMap::new());
                ids.add(None);
                id_longs.add(None);
            }
            body_field.add(docno, &body_terms);
        }

        let mut field_infos = vec![FieldInfo::new(self.fields.id.clone())
            .with_index_option(IndexOption::Docs)
            .with_stored(true)
            .with_doc_values(ValueKind::Keyword)];
        if any_id_long {
            field_infos.push(
                FieldInfo::new(self.fields.id_long.clone()).with_doc_values(ValueKind::Numeric),
            );
        }
        if any_raw {
            field_infos.push(FieldInfo::new(self.fields.raw.clone()).with_stored(true));
        }
        field_infos.push(
            FieldInfo::new(self.fields.body.clone())
                .with_index_option(IndexOption::DocsAndFreqs)
                .with_stored(any_stored_body)
                .with_vectors(any_vector),
        );

        let mut docvalues = DocValuesReader::new();
        docvalues.add_keyword(self.fields.id.clone(), ids);
        if any_id_long {
            docvalues.add_numeric(self.fields.id_long.clone(), id_longs);
        }

        let (stored_data, stored_pointers) = stored.finish()?;
        let (vector_data, vector_pointers) = vectors.finish()?;

        let mut files = SegmentFiles::new(IndexMeta::new(max_doc, field_infos));
        files.insert(store::LIVE_DOCS_FILE, live_docs.serialize()?);
        files.insert(store::STORED_FILE, stored_data);
        files.insert(store::STORED_POINTERS_FILE, stored_pointers);
        files.insert(store::VECTORS_FILE, vector_data);
        files.insert(store::VECTORS_POINTERS_FILE, vector_pointers);
        files.insert(store::DOCVALUES_FILE, docvalues.serialize()?);

        let mut buffers: HashMap<&str, FieldBuffer> = HashMap::new();
        buffers.insert(self.fields.id.as_str(), id_field);
        buffers.insert(self.fields.body.as_str(), body_field);
        for (name, buffer) in buffers {
            let [fst, term_meta, postings, lengths] = buffer.encode()?;
            files.insert(store::field_file(name, store::TERMS_EXT), fst);
            files.insert(store::field_file(name, store::TERM_META_EXT), term_meta);
            files.insert(store::field_file(name, store::POSTINGS_EXT), postings);
            files.insert(store::field_file(name, store::LENGTHS_EXT), lengths);
        }

        files.seal();
        Ok(files)
    }
}

/// Checksum over segment files in their canonical order
pub fn checksum_files<'a>(files: impl Iterator<Item = &'a [u8]>) -> u32 {
    let mut hasher = Hasher::new();
    for data in files {
        hasher.update(&(data.len() as u64).to_le_bytes());
        hasher.update(data);
    }
    hasher.finalize()
}
