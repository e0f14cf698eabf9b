//! Archive container for tagged output
//!
//! One ZIP file per protocol, self-describing through an embedded
//! `metadata.json` record:
//!
//! ```text
//! prot-1958-fake.zip
//! ├── metadata.json            {name, date, checksum, mode, format}
//! ├── document_index.csv       one tab-separated row per payload unit
//! ├── prot-1958-fake@1.csv     speech mode: one payload per speech
//! ├── prot-1958-fake@2.csv
//! └── ...                      protocol mode: a single prot-1958-fake.<ext>
//! ```
//!
//! A zero-byte file at the archive location is a placeholder meaning
//! "checked, nothing to tag". An archive without readable metadata is
//! invalid; readers treat both as "no prior result" rather than failing.

mod codec;
mod reader;
mod writer;

pub use codec::SpeechRecord;
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;
pub(crate) use writer::{remove_if_exists, touch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Entry holding the archive metadata record
pub const METADATA_FILENAME: &str = "metadata.json";

/// Entry holding the payload index
pub const INDEX_FILENAME: &str = "document_index.csv";

/// Errors from archive reads and writes
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive has no entry '{0}'")]
    MissingEntry(String),

    #[error("archive {path} is stored in {found} mode, expected {expected}")]
    WrongMode {
        path: PathBuf,
        expected: StorageMode,
        found: StorageMode,
    },
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// What one payload entry holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// One payload per speech
    #[default]
    Speech,
    /// One payload with every utterance of the protocol
    Protocol,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Speech => "speech",
            Self::Protocol => "protocol",
        })
    }
}

/// Payload encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Tab-separated text
    #[default]
    Csv,
    /// Structured JSON records
    Json,
}

impl PayloadFormat {
    /// Order in which readers look for payload entries
    pub const PREFERENCE: [PayloadFormat; 2] = [Self::Json, Self::Csv];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Storage layout used when writing archives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub mode: StorageMode,
    pub format: PayloadFormat,
}

impl StorageOptions {
    pub fn new(mode: StorageMode, format: PayloadFormat) -> Self {
        Self { mode, format }
    }
}

/// Record stored as `metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    pub name: Option<String>,
    pub date: Option<String>,
    pub checksum: String,
    #[serde(default)]
    pub mode: StorageMode,
    #[serde(default)]
    pub format: PayloadFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ArchiveMetadata {
    pub fn new(name: Option<String>, date: Option<String>, checksum: impl Into<String>) -> Self {
        Self {
            name,
            date,
            checksum: checksum.into(),
            mode: StorageMode::default(),
            format: PayloadFormat::default(),
            created_at: None,
        }
    }

    /// Stem used for payload entry names
    pub fn stem(&self) -> &str {
        self.name
            .as_deref()
            .map(crate::model::strip_extensions)
            .unwrap_or("unknown")
    }
}

/// One row of `document_index.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub document_name: Option<String>,
    pub speech_id: String,
    pub speaker: String,
    pub speech_date: Option<String>,
    pub speech_index: usize,
    pub filename: String,
    pub num_tokens: usize,
    pub num_words: usize,
    pub document_id: usize,
}

/// What is found at an archive location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveState {
    /// No file
    Missing,
    /// Zero-byte marker for a protocol without text
    Placeholder,
    /// A file that cannot be read as an archive
    Invalid(String),
    Valid(ArchiveMetadata),
}

impl ArchiveState {
    pub fn metadata(&self) -> Option<&ArchiveMetadata> {
        match self {
            Self::Valid(metadata) => Some(metadata),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
