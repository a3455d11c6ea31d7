//! Transparent compression on read and write
//!
//! Reads pick a decoder from the file extension. Writes append the scheme's
//! suffix to a base path; zip archives hold a single entry named after the
//! base file.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{IoResultExt, LexdumpError, Result};

/// Compression scheme of an output file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Compression {
    None,
    Gz,
    Bz2,
    Zip,
}

impl Compression {
    pub const ALL: [Compression; 4] = [
        Compression::None,
        Compression::Gz,
        Compression::Bz2,
        Compression::Zip,
    ];

    /// Canonical file suffix, without the dot
    pub fn suffix(self) -> &'static str {
        match self {
            Compression::None => "txt",
            Compression::Gz => "gz",
            Compression::Bz2 => "bz2",
            Compression::Zip => "zip",
        }
    }

    /// Scheme implied by a path's extension; anything unknown reads as plain text
    pub fn from_path(path: &Path) -> Compression {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gz,
            Some(ext) if ext.eq_ignore_ascii_case("bz2") => Compression::Bz2,
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Compression::Zip,
            _ => Compression::None,
        }
    }

    /// `base` with this scheme's suffix appended
    pub fn output_path(self, base: &Path) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(self.suffix());
        PathBuf::from(name)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gz => "gz",
            Compression::Bz2 => "bz2",
            Compression::Zip => "zip",
        };
        f.write_str(name)
    }
}

fn zip_error(e: zip::result::ZipError) -> io::Error {
    match e {
        zip::result::ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Open a file for line-oriented reading, decompressing by extension
pub fn open_read(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_path(path)?;

    let reader: Box<dyn BufRead> = match Compression::from_path(path) {
        Compression::Bz2 => Box::new(BufReader::new(MultiBzDecoder::new(file))),
        Compression::Gz => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        Compression::Zip => {
            let mut archive = ZipArchive::new(file).map_err(zip_error).with_path(path)?;
            if archive.len() == 0 {
                return Err(LexdumpError::io(
                    path,
                    io::Error::new(io::ErrorKind::InvalidData, "Zip archive has no entries"),
                ));
            }
            let mut entry = archive.by_index(0).map_err(zip_error).with_path(path)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).with_path(path)?;
            Box::new(Cursor::new(data))
        }
        Compression::None => Box::new(BufReader::new(file)),
    };

    Ok(reader)
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
    Zip(ZipWriter<BufWriter<File>>),
}

/// Compressing writer over an output file
///
/// Must be finished with [`CompressedWriter::finish`]; dropping it flushes
/// what the encoder can but swallows errors.
pub struct CompressedWriter {
    path: PathBuf,
    scheme: Compression,
    sink: Sink,
}

impl CompressedWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scheme(&self) -> Compression {
        self.scheme
    }

    /// Write trailers and flush to disk, returning the file path
    pub fn finish(self) -> Result<PathBuf> {
        let path = self.path;
        let mut inner = match self.sink {
            Sink::Plain(w) => w,
            Sink::Gzip(w) => w.finish().with_path(&path)?,
            Sink::Bzip2(w) => w.finish().with_path(&path)?,
            Sink::Zip(w) => w.finish().map_err(zip_error).with_path(&path)?,
        };
        inner.flush().with_path(&path)?;
        Ok(path)
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
            Sink::Bzip2(w) => w.write(buf),
            Sink::Zip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
            Sink::Bzip2(w) => w.flush(),
            Sink::Zip(w) => w.flush(),
        }
    }
}

/// Create `base.<suffix>` and wrap it in the scheme's encoder
pub fn open_write(base: &Path, scheme: Compression) -> Result<CompressedWriter> {
    let path = scheme.output_path(base);
    let file = BufWriter::new(File::create(&path).with_path(&path)?);

    let sink = match scheme {
        Compression::None => Sink::Plain(file),
        Compression::Gz => Sink::Gzip(GzEncoder::new(file, flate2::Compression::default())),
        Compression::Bz2 => Sink::Bzip2(BzEncoder::new(file, bzip2::Compression::default())),
        Compression::Zip => {
            let entry_name = base
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| base.to_string_lossy().into_owned());
            let mut zip = ZipWriter::new(file);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(entry_name, options)
                .map_err(zip_error)
                .with_path(&path)?;
            Sink::Zip(zip)
        }
    };

    tracing::debug!(path = %path.display(), scheme = %scheme, "Opened output");
    Ok(CompressedWriter { path, scheme, sink })
}

/// Run `f` against a fresh sink and always finish the sink afterwards.
///
/// When `f` fails the sink is still finished so that everything written so
/// far is readable; the error from `f` takes precedence.
pub fn write_compressed<T, F>(base: &Path, scheme: Compression, f: F) -> Result<(T, PathBuf)>
where
    F: FnOnce(&mut CompressedWriter) -> Result<T>,
{
    let mut writer = open_write(base, scheme)?;
    let outcome = f(&mut writer);
    let finished = writer.finish();

    match (outcome, finished) {
        (Ok(value), Ok(path)) => Ok((value, path)),
        (Err(e), finished) => {
            if let Err(finish_err) = finished {
                tracing::warn!(error = %finish_err, "Could not finish output after failure");
            }
            Err(e)
        }
        (Ok(_), Err(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_suffix_and_sniffing() {
        for scheme in Compression::ALL {
            let path = scheme.output_path(Path::new("/tmp/run.allDocids"));
            assert_eq!(Compression::from_path(&path), scheme);
            assert!(path.to_string_lossy().ends_with(scheme.suffix()));
        }
        assert_eq!(Compression::from_path(Path::new("ids.GZ")), Compression::Gz);
        assert_eq!(Compression::from_path(Path::new("ids")), Compression::None);
    }

    #[test]
    fn test_round_trip_every_scheme() {
        let dir = TempDir::new().unwrap();
        for scheme in Compression::ALL {
            let base = dir.path().join(format!("ids-{}", scheme));
            let (_, path) = write_compressed(&base, scheme, |w| {
                writeln!(w, "doc-1").with_path(&base)?;
                writeln!(w, "doc-2").with_path(&base)?;
                Ok(())
            })
            .unwrap();

            let lines: Vec<String> = open_read(&path).unwrap().lines().map(|l| l.unwrap()).collect();
            assert_eq!(lines, vec!["doc-1", "doc-2"], "scheme {}", scheme);
        }
    }

    #[test]
    fn test_zip_entry_named_after_base() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("index.allDocids");
        let (_, path) = write_compressed(&base, Compression::Zip, |w| {
            w.write_all(b"x\n").with_path(&base)
        })
        .unwrap();

        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "index.allDocids");
    }

    #[test]
    fn test_sink_finished_when_closure_fails() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("partial");
        let err = write_compressed(&base, Compression::Gz, |w| -> Result<()> {
            w.write_all(b"kept\n").with_path(&base)?;
            Err(LexdumpError::IdentifierNotFound("missing".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, LexdumpError::IdentifierNotFound(_)));

        let path = Compression::Gz.output_path(&base);
        let lines: Vec<String> = open_read(&path).unwrap().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["kept"]);
    }

    #[test]
    fn test_open_read_missing_file_reports_path() {
        let err = open_read(Path::new("/nonexistent/ids.txt")).err().unwrap();
        match err {
            LexdumpError::Io { path, .. } => assert_eq!(path, PathBuf::from("/nonexistent/ids.txt")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
