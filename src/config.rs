use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Names of the fields the tools read from an index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    /// Collection docid: indexed verbatim and stored
    pub id: String,
    /// Numeric docvalues column present in tweet collections
    pub id_long: String,
    /// Raw document as ingested
    pub raw: String,
    /// Transformed (analyzed) body, also the field term statistics run against
    pub body: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            id_long: "id_long".to_string(),
            raw: "raw".to_string(),
            body: "contents".to_string(),
        }
    }
}

/// Analyzer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for AnalyzerConfig {
    /// English stemming without a stopword list, matching how body fields
    /// are normally indexed for term statistics.
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: true,
            min_token_length: 1,
            max_token_length: 255,
            language: "english".to_string(),
        }
    }
}

/// Export configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the docid dump is written to
    pub output_dir: PathBuf,
    /// Suffix appended to an id list path to name the raw document tarball,
    /// before the `.gz` of its compression
    pub archive_suffix: String,
    /// Whether plain raw dumps start each entry with a `<DOCNO>` line
    pub prepend_marker: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            archive_suffix: ".output.tar".to_string(),
            prepend_marker: false,
        }
    }
}

impl ExportConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Top-level configuration shared by the inspection and export operations
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub fields: FieldNames,
    pub analyzer: AnalyzerConfig,
    pub export: ExportConfig,
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the field names
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// Override the analyzer configuration
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Set the directory docid dumps are written to
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export.output_dir = dir.into();
        self
    }

    /// Load a configuration from JSON, filling unspecified sections with defaults
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}
