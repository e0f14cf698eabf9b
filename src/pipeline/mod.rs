//! Tagging pipeline
//!
//! Per document: build the protocol, preprocess its text, merge it into
//! speeches (or keep whole utterances), fingerprint the texts, consult the
//! checksum gate, tag, and write the archive.
//!
//! Documents share nothing but the tagger, which is created once by the
//! caller and borrowed by the pipeline.

mod batch;
mod tagging;

pub use batch::{protocol_files, source_path, sync_delta, target_path, BatchSummary, FailedDocument};
pub use tagging::{TagOutcome, TaggingPipeline};

use crate::archive::ArchiveError;
use crate::model::ModelError;
use crate::source::SourceError;
use crate::tagger::TaggerError;
use crate::text::TextError;
use std::path::PathBuf;
use thiserror::Error;

/// A failure while processing one document, or while walking folders
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{document}: failed to build protocol: {source}")]
    Source {
        document: String,
        #[source]
        source: SourceError,
    },

    #[error("{document}: preprocessing failed: {source}")]
    Text {
        document: String,
        #[source]
        source: TextError,
    },

    #[error("{document}: failed to merge speeches: {source}")]
    Model {
        document: String,
        #[source]
        source: ModelError,
    },

    #[error("{document}: tagging failed: {source}")]
    Tagger {
        document: String,
        #[source]
        source: TaggerError,
    },

    #[error("{document}: archive error: {source}")]
    Archive {
        document: String,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Name of the failing document, if the error concerns one
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Source { document, .. }
            | Self::Text { document, .. }
            | Self::Model { document, .. }
            | Self::Tagger { document, .. }
            | Self::Archive { document, .. } => Some(document),
            Self::Walk { .. } | Self::Io { .. } => None,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
