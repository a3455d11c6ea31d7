//! Bulk exports: every docid of an index, and raw documents into a tarball
//!
//! Exports stream to completion or stop at the first failing document. On a
//! failure the output written so far is finished and left on disk.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tar::{Builder, EntryType, Header};

use super::codec::{open_read, write_compressed, Compression};
use crate::config::{ExportConfig, FieldNames};
use crate::error::{IoResultExt, LexdumpError, Result};
use crate::inspect::{DocidResolver, DocumentAccessor, IndexHandle};
use crate::query::DocOrder;

/// Outcome of a finished export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    /// File written
    pub path: PathBuf,
    /// Documents written to it
    pub documents: usize,
}

/// Marker line put in front of a raw document
pub fn docno_marker(docid: &str) -> String {
    format!("<DOCNO>{}</DOCNO>\n", docid)
}

/// Exports documents of one index
pub struct ExportPipeline<'a> {
    handle: &'a IndexHandle,
    fields: FieldNames,
    config: ExportConfig,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(handle: &'a IndexHandle, fields: &FieldNames, config: &ExportConfig) -> Self {
        Self {
            handle,
            fields: fields.clone(),
            config: config.clone(),
        }
    }

    /// Name the docid dump after the index directory
    fn index_name(&self) -> String {
        let path = self.handle.path();
        path.file_name()
            .map(|n| n.to_os_string())
            .or_else(|| {
                path.canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_os_string()))
            })
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string())
    }

    /// Path prefix of the docid dump, before the compression suffix
    pub fn docids_base(&self) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}.allDocids", self.index_name()))
    }

    /// Path prefix of the raw document tarball for an id list, before `.gz`
    pub fn archive_base(&self, list_path: &Path) -> PathBuf {
        let mut name = list_path.as_os_str().to_owned();
        name.push(&self.config.archive_suffix);
        PathBuf::from(name)
    }

    /// Write every live docid, one per line, in `order`
    pub fn dump_all_docids(&self, order: &DocOrder, scheme: Compression) -> Result<ExportSummary> {
        let resolver = DocidResolver::new(self.handle, &self.fields);
        let docnos = self.handle.sorted_docs(order, None)?;
        let base = self.docids_base();

        let (documents, path) = write_compressed(&base, scheme, |w| {
            let target = w.path().to_path_buf();
            for (written, docno) in docnos.iter().enumerate() {
                let docid = resolver.resolve_external(*docno)?;
                writeln!(w, "{}", docid).with_path(&target)?;
                if (written + 1) % 100_000 == 0 {
                    tracing::debug!(written = written + 1, "Writing docids");
                }
            }
            Ok(docnos.len())
        })?;

        tracing::info!(path = %path.display(), documents, order = %order, "Dumped docids");
        Ok(ExportSummary { path, documents })
    }

    /// Write the raw documents named in `list_path` to a gzipped tarball.
    ///
    /// One entry per docid, named by the docid. With `prepend_marker` each
    /// entry starts with a `<DOCNO>` line. Blank lines in the list are
    /// skipped.
    pub fn dump_raw_documents(&self, list_path: &Path, prepend_marker: bool) -> Result<ExportSummary> {
        let accessor = DocumentAccessor::new(self.handle, &self.fields);
        let ids = open_read(list_path)?;
        let base = self.archive_base(list_path);

        let (documents, path) = write_compressed(&base, Compression::Gz, |w| {
            let target = w.path().to_path_buf();
            let mut archive = Builder::new(w);
            let appended = append_documents(&mut archive, &accessor, ids, list_path, &target, prepend_marker);
            if let Err(e) = archive.finish() {
                tracing::warn!(error = %e, "Could not finish tar stream");
                appended?;
                return Err(e).with_path(&target);
            }
            appended
        })?;

        tracing::info!(path = %path.display(), documents, "Dumped raw documents");
        Ok(ExportSummary { path, documents })
    }
}

/// Check that `docid` can be used verbatim as a tar entry name.
///
/// Entries are extracted relative to the working directory, so absolute
/// names and `..` components are refused rather than rewritten.
pub fn check_entry_name(docid: &str) -> Result<&str> {
    let reason = if docid.contains('\0') {
        Some("contains a NUL byte")
    } else if docid.starts_with('/') || docid.starts_with('\\') {
        Some("absolute path")
    } else if docid.split(|c| c == '/' || c == '\\').any(|part| part == "..") {
        Some("contains a '..' component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(LexdumpError::InvalidEntryName {
            docid: docid.to_string(),
            reason,
        }),
        None => Ok(docid),
    }
}

fn append_documents<W: Write>(
    archive: &mut Builder<W>,
    accessor: &DocumentAccessor<'_>,
    ids: Box<dyn BufRead>,
    list_path: &Path,
    target: &Path,
    prepend_marker: bool,
) -> Result<usize> {
    let mut documents = 0;

    for line in ids.lines() {
        let line = line.with_path(list_path)?;
        let docid = line.trim_end_matches('\r');
        if docid.trim().is_empty() {
            continue;
        }

        let name = check_entry_name(docid)?;
        let raw = accessor.get_raw(docid)?;
        let payload = if prepend_marker {
            let mut payload = docno_marker(docid);
            payload.push_str(&raw);
            payload
        } else {
            raw
        };
        let bytes = payload.as_bytes();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        archive
            .append_data(&mut header, name, bytes)
            .with_path(target)?;

        documents += 1;
        tracing::debug!(docid, bytes = bytes.len(), "Archived raw document");
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_fixture_index, FixtureDoc};
    use tempfile::TempDir;

    #[test]
    fn test_marker() {
        assert_eq!(docno_marker("d1"), "<DOCNO>d1</DOCNO>\n");
    }

    #[test]
    fn test_entry_names() {
        assert_eq!(check_entry_name("FBIS3-1").unwrap(), "FBIS3-1");
        assert_eq!(check_entry_name("wiki/Rust_(language)").unwrap(), "wiki/Rust_(language)");
        assert!(check_entry_name("a..b").is_ok());

        for docid in ["/abs", "\\share\\doc", "../x", "a/../../b", "a\\..", "nul\0byte"] {
            let err = check_entry_name(docid).unwrap_err();
            assert!(
                matches!(&err, LexdumpError::InvalidEntryName { docid: d, .. } if d == docid),
                "{}",
                docid
            );
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn test_output_paths() {
        let dir = TempDir::new().unwrap();
        let index_dir = dir.path().join("robust04");
        build_fixture_index(&index_dir, &[FixtureDoc::new("a")]).unwrap();
        let handle = IndexHandle::open(&index_dir).unwrap();

        let config = ExportConfig::default().with_output_dir(dir.path());
        let pipeline = ExportPipeline::new(&handle, &FieldNames::default(), &config);

        assert_eq!(pipeline.docids_base(), dir.path().join("robust04.allDocids"));
        assert_eq!(
            pipeline.archive_base(Path::new("/data/ids.txt")),
            PathBuf::from("/data/ids.txt.output.tar")
        );
    }
}
