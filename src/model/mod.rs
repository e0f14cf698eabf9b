//! Protocol data model: utterances, speeches and protocols

mod chain;
mod protocol;
mod speech;
mod utterance;


pub use chain::{resolve_chains, ChainResolution, LinkIssue, LinkIssueKind, LEGACY_CONTINUATION};
pub use protocol::Protocol;
pub use speech::Speech;
pub(crate) use speech::strip_extensions;
pub use utterance::{Utterance, DEFAULT_DELIMITER, UNDEFINED_SPEAKER};

use thiserror::Error;

/// Errors raised when protocol entities are constructed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("speech {speech_id}: utterance {utterance_id} has speaker '{found}', expected '{expected}'")]
    SpeakerConsistency {
        speech_id: String,
        utterance_id: String,
        expected: String,
        found: String,
    },

    #[error("utterance list cannot be empty")]
    MissingUtterances,

    #[error("unknown merge strategy: {0}")]
    UnknownMergeStrategy(String),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
