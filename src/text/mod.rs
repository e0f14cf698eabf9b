//! Text preprocessing applied to utterance paragraphs before tagging
//!
//! A preprocessing pipeline is configured as a comma-separated list of
//! transform names (e.g. `dedent,strip,pretokenize`). Names are resolved
//! once, against a [`TransformRegistry`], into a [`TextPipeline`] that
//! applies the transforms left to right. Unknown names are rejected when
//! the pipeline is resolved, not when it first runs.
//!
//! Transforms provided by external subsystems (such as dehyphenation)
//! are registered by name before resolving.

mod tokenize;
mod transforms;

pub use tokenize::Tokenizer;
pub use transforms::{dedent, normalize_whitespace, TextPipeline, Transform, TransformRegistry};

use thiserror::Error;

/// Default preprocessing pipeline
pub const DEFAULT_PIPELINE: &str = "dedent,strip,pretokenize";

/// Errors raised by text preprocessing
#[derive(Debug, Error)]
pub enum TextError {
    #[error("unknown text transform: {0}")]
    UnknownTransform(String),

    #[error("text transform '{name}' failed: {message}")]
    TransformFailed { name: String, message: String },

    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for text operations
pub type TextResult<T> = Result<T, TextError>;
