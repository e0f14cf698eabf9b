//! Tagger capability: PoS/lemma annotation of speech texts
//!
//! The tagging model itself is opaque. It is reached through the
//! [`Tagger`] trait so the pipeline does not depend on how annotation is
//! produced. Two implementations:
//! - [`SubprocessTagger`]: a long-lived external process spoken to in
//!   JSON lines (production)
//! - [`MockTagger`]: canned output with an invocation counter (testing)
//!
//! A tagger is expensive to construct. Build one at the top of a run and
//! pass it by reference into every per-document call.

mod mock;
mod subprocess;

pub use mock::MockTagger;
pub use subprocess::{SubprocessTagger, SubprocessTaggerConfig};

use serde::{Deserialize, Serialize};

/// Column header of the delimited annotation table
pub const ANNOTATION_HEADER: &str = "token\tlemma\tpos\txpos";

/// Errors from tagger operations
#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    #[error("tagger not available: {0}")]
    Unavailable(String),
    #[error("tagging failed: {0}")]
    Failed(String),
    #[error("malformed tagger output: {0}")]
    Malformed(String),
}

/// Result type for tagger operations
pub type TaggerResult<T> = Result<T, TaggerError>;

/// Annotation of one text: parallel per-token sequences plus counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedDocument {
    pub token: Vec<String>,
    pub lemma: Vec<String>,
    pub pos: Vec<String>,
    pub xpos: Vec<String>,
    #[serde(default)]
    pub num_tokens: usize,
    #[serde(default)]
    pub num_words: usize,
}

impl TaggedDocument {
    /// Check that the per-token sequences have equal length
    pub fn validate(&self) -> TaggerResult<()> {
        let n = self.token.len();
        if self.lemma.len() != n || self.pos.len() != n || self.xpos.len() != n {
            return Err(TaggerError::Malformed(format!(
                "unequal sequence lengths: token={}, lemma={}, pos={}, xpos={}",
                n,
                self.lemma.len(),
                self.pos.len(),
                self.xpos.len()
            )));
        }
        Ok(())
    }
}

/// Annotates texts.
///
/// Implementations must tolerate being shared across documents. Whether
/// concurrent `tag` calls are safe is up to the implementation; callers
/// running documents in parallel serialize access otherwise.
pub trait Tagger: Send + Sync {
    /// Human-readable name, used in log lines
    fn name(&self) -> &str {
        "tagger"
    }

    /// Tag each text, returning one document per input text in order
    fn tag(&self, texts: &[String]) -> TaggerResult<Vec<TaggedDocument>>;
}

/// Tag `texts`, checking the shape of the result.
///
/// An empty input never reaches the tagger.
pub fn tag_texts(tagger: &dyn Tagger, texts: &[String]) -> TaggerResult<Vec<TaggedDocument>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let documents = tagger.tag(texts)?;
    if documents.len() != texts.len() {
        return Err(TaggerError::Malformed(format!(
            "{} returned {} documents for {} texts",
            tagger.name(),
            documents.len(),
            texts.len()
        )));
    }
    for document in &documents {
        document.validate()?;
    }
    Ok(documents)
}

/// Render a tagged document as a tab-separated table.
///
/// First line is [`ANNOTATION_HEADER`], then one row per token; rows are
/// joined by newline with no trailing newline.
pub fn to_delimited_text(document: &TaggedDocument) -> String {
    std::iter::once(ANNOTATION_HEADER.to_string())
        .chain((0..document.token.len()).map(|i| {
            format!(
                "{}\t{}\t{}\t{}",
                document.token[i],
                document.lemma.get(i).map(String::as_str).unwrap_or_default(),
                document.pos.get(i).map(String::as_str).unwrap_or_default(),
                document.xpos.get(i).map(String::as_str).unwrap_or_default()
            )
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
