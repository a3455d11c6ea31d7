//! Directory layout of an index
//!
//! ```text
//! index.meta.json            field infos, max_doc, format version, checksum
//! live_docs.bin              deleted-docs bitmap
//! stored.blob / stored.ptr   stored fields blob log + pointer table
//! vectors.blob / vectors.ptr term vectors blob log + pointer table
//! docvalues.bin              docvalues columns
//! field_<name>.fst           term dictionary, per indexed field
//! field_<name>.terms         postings metadata (bincode)
//! field_<name>.postings      block-encoded postings
//! field_<name>.lengths       field length statistics (bincode)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::docvalues::DocValuesReader;
use super::live_docs::LiveDocs;
use super::manifest::IndexMeta;
use super::postings::PostingsReader;
use super::reader::{FieldIndex, IndexReader};
use super::statistics::FieldStatistics;
use super::stored::BlobLogReader;
use super::term_dict::TermDictionary;
use super::types::PostingListMeta;
use super::writer::checksum_files;
use crate::error::{LexdumpError, Result};

pub const META_FILE: &str = "index.meta.json";
pub const LIVE_DOCS_FILE: &str = "live_docs.bin";
pub const STORED_FILE: &str = "stored.blob";
pub const STORED_POINTERS_FILE: &str = "stored.ptr";
pub const VECTORS_FILE: &str = "vectors.blob";
pub const VECTORS_POINTERS_FILE: &str = "vectors.ptr";
pub const DOCVALUES_FILE: &str = "docvalues.bin";

pub const TERMS_EXT: &str = "fst";
pub const TERM_META_EXT: &str = "terms";
pub const POSTINGS_EXT: &str = "postings";
pub const LENGTHS_EXT: &str = "lengths";

/// File name of a per-field file
pub fn field_file(field: &str, ext: &str) -> String {
    format!("field_{}.{}", field, ext)
}

/// Every data file an index described by `meta` consists of
pub fn expected_files(meta: &IndexMeta) -> Vec<String> {
    let mut names: Vec<String> = [
        LIVE_DOCS_FILE,
        STORED_FILE,
        STORED_POINTERS_FILE,
        VECTORS_FILE,
        VECTORS_POINTERS_FILE,
        DOCVALUES_FILE,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for field in meta.indexed_fields() {
        for ext in [TERMS_EXT, TERM_META_EXT, POSTINGS_EXT, LENGTHS_EXT] {
            names.push(field_file(&field.name, ext));
        }
    }
    names.sort();
    names
}

/// In-memory image of an index directory
#[derive(Clone, Debug)]
pub struct SegmentFiles {
    meta: IndexMeta,
    files: BTreeMap<String, Vec<u8>>,
}

impl SegmentFiles {
    pub fn new(meta: IndexMeta) -> Self {
        Self {
            meta,
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.files.insert(name.into(), data);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|d| d.as_slice())
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Checksum of the data files, in file name order
    pub fn checksum(&self) -> u32 {
        checksum_files(self.files.values().map(|d| d.as_slice()))
    }

    /// Record the checksum in the metadata
    pub fn seal(&mut self) {
        self.meta.checksum = self.checksum();
    }

    fn take(&mut self, name: &str) -> io::Result<Vec<u8>> {
        self.files.remove(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("Missing index file {}", name))
        })
    }

    /// Decode every structure into a reader
    pub fn into_reader(mut self) -> io::Result<IndexReader> {
        let live_docs = LiveDocs::deserialize(&self.take(LIVE_DOCS_FILE)?)?;

        let stored_pointers = self.take(STORED_POINTERS_FILE)?;
        let stored = BlobLogReader::new(self.take(STORED_FILE)?, &stored_pointers)?;

        let vector_pointers = self.take(VECTORS_POINTERS_FILE)?;
        let vectors = BlobLogReader::new(self.take(VECTORS_FILE)?, &vector_pointers)?;

        let docvalues = DocValuesReader::deserialize(&self.take(DOCVALUES_FILE)?)?;

        let mut fields = HashMap::new();
        let names: Vec<String> = self.meta.indexed_fields().map(|f| f.name.clone()).collect();
        for name in names {
            let term_meta: Vec<PostingListMeta> =
                bincode::deserialize(&self.take(&field_file(&name, TERM_META_EXT))?)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let postings = PostingsReader::new(self.take(&field_file(&name, POSTINGS_EXT))?);
            for meta in &term_meta {
                postings.validate(meta).map_err(|e| {
                    io::Error::new(e.kind(), format!("{}: {}", field_file(&name, POSTINGS_EXT), e))
                })?;
            }
            let terms = TermDictionary::new(self.take(&field_file(&name, TERMS_EXT))?, term_meta)?;
            let stats: FieldStatistics =
                bincode::deserialize(&self.take(&field_file(&name, LENGTHS_EXT))?)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            fields.insert(name, FieldIndex::new(terms, postings, stats));
        }

        IndexReader::new(self.meta, fields, stored, vectors, docvalues, live_docs)
    }
}

/// Reads and writes index directories
pub struct IndexStore {
    base_dir: PathBuf,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    /// Write all files, metadata last
    pub fn write(&self, files: &SegmentFiles) -> io::Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        for (name, data) in &files.files {
            fs::write(self.base_dir.join(name), data)?;
        }
        fs::write(self.base_dir.join(META_FILE), files.meta.to_json()?)?;
        Ok(())
    }

    fn open_error(&self, reason: impl Into<String>) -> LexdumpError {
        LexdumpError::Open {
            path: self.base_dir.clone(),
            reason: reason.into(),
        }
    }

    /// Read metadata and data files, verifying version and checksum
    pub fn read(&self) -> Result<SegmentFiles> {
        if !self.base_dir.is_dir() {
            return Err(self.open_error("not a directory"));
        }
        let meta_path = self.base_dir.join(META_FILE);
        if !meta_path.is_file() {
            return Err(self.open_error(format!("no {} found", META_FILE)));
        }

        let meta_bytes = fs::read(&meta_path).map_err(|e| self.open_error(e.to_string()))?;
        let meta = IndexMeta::from_json(&meta_bytes)
            .map_err(|e| LexdumpError::CorruptIndex(format!("{}: {}", META_FILE, e)))?;

        if meta.format_version != IndexMeta::FORMAT_VERSION {
            return Err(LexdumpError::CorruptIndex(format!(
                "Unsupported format version {} (expected {})",
                meta.format_version,
                IndexMeta::FORMAT_VERSION
            )));
        }

        let mut files = SegmentFiles::new(meta);
        for name in expected_files(&files.meta) {
            let data = fs::read(self.base_dir.join(&name))
                .map_err(|e| LexdumpError::CorruptIndex(format!("{}: {}", name, e)))?;
            files.insert(name, data);
        }

        let actual = files.checksum();
        if actual != files.meta.checksum {
            return Err(LexdumpError::CorruptIndex(format!(
                "Checksum mismatch: expected {:08x}, found {:08x}",
                files.meta.checksum, actual
            )));
        }

        Ok(files)
    }

    /// Open a reader over the directory
    pub fn open_reader(&self) -> Result<IndexReader> {
        let files = self.read()?;
        files
            .into_reader()
            .map_err(|e| LexdumpError::CorruptIndex(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, FieldNames};
    use crate::segment::writer::{IndexWriter, NewDocument};
    use crate::segment::DocNo;
    use tempfile::TempDir;

    fn segment() -> SegmentFiles {
        let mut writer = IndexWriter::new(FieldNames::default(), &AnalyzerConfig::default());
        writer.add_document(NewDocument::new("d1").with_stored_contents("rust search engine"));
        writer.add_document(NewDocument::new("d2").with_raw("raw body"));
        writer.build().unwrap()
    }

    fn build(dir: &Path) {
        IndexStore::new(dir).write(&segment()).unwrap();
    }

    #[test]
    fn test_write_and_open() {
        let dir = TempDir::new().unwrap();
        build(dir.path());

        let reader = IndexStore::new(dir.path()).open_reader().unwrap();
        assert_eq!(reader.max_doc(), 2);
        assert_eq!(reader.stored_field(DocNo(1), "raw").unwrap().as_deref(), Some("raw body"));
        assert_eq!(reader.term_meta("contents", "search").unwrap().doc_frequency, 1);
    }

    #[test]
    fn test_missing_directory_is_open_error() {
        let dir = TempDir::new().unwrap();
        let err = IndexStore::new(dir.path().join("absent")).open_reader().unwrap_err();
        assert!(matches!(err, LexdumpError::Open { .. }));

        let err = IndexStore::new(dir.path()).open_reader().unwrap_err();
        assert!(matches!(err, LexdumpError::Open { .. }));
    }

    #[test]
    fn test_tampered_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        build(dir.path());
        fs::write(dir.path().join(STORED_FILE), b"garbage").unwrap();

        let err = IndexStore::new(dir.path()).open_reader().unwrap_err();
        assert!(matches!(err, LexdumpError::CorruptIndex(_)));
    }

    #[test]
    fn test_missing_data_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        build(dir.path());
        fs::remove_file(dir.path().join(field_file("contents", POSTINGS_EXT))).unwrap();

        let err = IndexStore::new(dir.path()).open_reader().unwrap_err();
        assert!(matches!(err, LexdumpError::CorruptIndex(_)));
    }

    #[test]
    fn test_undecodable_postings_fail_to_open() {
        let postings = field_file("contents", POSTINGS_EXT);
        let mut files = segment();
        let mut data = files.get(&postings).unwrap().to_vec();
        data.truncate(data.len() - 2);
        files.insert(postings.clone(), data);

        let err = files.into_reader().unwrap_err();
        assert!(err.to_string().contains(&postings), "{}", err);
    }

    #[test]
    fn test_undecodable_lengths_fail_to_open() {
        let mut files = segment();
        files.insert(field_file("contents", LENGTHS_EXT), vec![0xFF; 3]);

        let err = files.into_reader().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
