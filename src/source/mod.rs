//! Source documents: XML loading and protocol reconstruction
//!
//! - [`XmlElement`]: a generic attributed tree parsed from ParlaClarin XML
//! - [`ProtocolBuilder`]: walks the tree's utterance sequence, validates
//!   prev/next linkage and produces a [`crate::model::Protocol`]

mod builder;
mod tree;

pub use builder::{BuiltProtocol, ProtocolBuilder};
pub use tree::XmlElement;

use crate::model::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or building a protocol
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("utterance #{position} has no xml:id")]
    MissingUtteranceId { position: usize },

    #[error("duplicate utterance id: {0}")]
    DuplicateUtteranceId(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<quick_xml::Error> for SourceError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;
