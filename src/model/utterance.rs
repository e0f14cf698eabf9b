//! A single utterance fragment as encoded in the source markup

use serde::{Deserialize, Serialize};

/// Speaker assigned to utterances whose `who` attribute is missing
pub const UNDEFINED_SPEAKER: &str = "Undefined";

/// Separator used when joining paragraphs and utterances
pub const DEFAULT_DELIMITER: &str = "\n";

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// One contiguous statement fragment.
///
/// Created once by the protocol builder. Only `paragraphs` (through an
/// explicit preprocessing pass) and the annotation fields change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Unique within its protocol (`xml:id`)
    #[serde(rename = "u_id")]
    pub id: String,
    /// Source grouping key (`n`), may repeat across fragments
    #[serde(rename = "n")]
    pub group_id: String,
    /// Speaker (`who`)
    #[serde(rename = "who")]
    pub speaker: String,
    pub prev_id: Option<String>,
    pub next_id: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub annotation: Option<String>,
    #[serde(default, rename = "num_tokens")]
    pub token_count: usize,
    #[serde(default, rename = "num_words")]
    pub word_count: usize,
}

impl Utterance {
    /// Create an utterance with no links, paragraphs or annotation.
    ///
    /// The group id defaults to the utterance id.
    pub fn new(id: impl Into<String>, speaker: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            group_id: id.clone(),
            id,
            speaker: speaker.into(),
            prev_id: None,
            next_id: None,
            paragraphs: Vec::new(),
            delimiter: default_delimiter(),
            annotation: None,
            token_count: 0,
            word_count: 0,
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_prev(mut self, prev_id: impl Into<String>) -> Self {
        self.prev_id = Some(prev_id.into());
        self
    }

    pub fn with_next(mut self, next_id: impl Into<String>) -> Self {
        self.next_id = Some(next_id.into());
        self
    }

    pub fn with_paragraphs<I, S>(mut self, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paragraphs = paragraphs.into_iter().map(Into::into).collect();
        self
    }

    /// Non-empty paragraphs joined by the delimiter, trimmed
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .filter(|p| !p.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&self.delimiter)
            .trim()
            .to_string()
    }

    pub fn has_text(&self) -> bool {
        !self.text().is_empty()
    }
}
