//! Speech: one or more utterances attributed to a single speaker

use super::utterance::{Utterance, DEFAULT_DELIMITER};
use super::{ModelError, ModelResult};
use serde::Serialize;

/// A merged, speaker-consistent unit of utterances.
///
/// Construction validates that `utterances` is non-empty and that every
/// member shares `speaker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Speech {
    pub document_name: Option<String>,
    pub speech_id: String,
    pub speaker: String,
    pub speech_date: Option<String>,
    /// 1-based position within the protocol under the active merge policy
    pub speech_index: usize,
    pub utterances: Vec<Utterance>,
    pub annotation: Option<String>,
    #[serde(rename = "num_tokens")]
    pub token_count: usize,
    #[serde(rename = "num_words")]
    pub word_count: usize,
    pub delimiter: String,
}

impl Speech {
    /// Create a speech from `utterances`.
    ///
    /// The speech takes its id and speaker from the first utterance.
    pub fn new(
        document_name: Option<String>,
        speech_date: Option<String>,
        speech_index: usize,
        utterances: Vec<Utterance>,
    ) -> ModelResult<Self> {
        let first = utterances.first().ok_or(ModelError::MissingUtterances)?;
        let speech_id = first.id.clone();
        let speaker = first.speaker.clone();

        if let Some(stranger) = utterances.iter().find(|u| u.speaker != speaker) {
            return Err(ModelError::SpeakerConsistency {
                speech_id,
                utterance_id: stranger.id.clone(),
                expected: speaker,
                found: stranger.speaker.clone(),
            });
        }

        Ok(Self {
            document_name,
            speech_id,
            speaker,
            speech_date,
            speech_index,
            utterances,
            annotation: None,
            token_count: 0,
            word_count: 0,
            delimiter: DEFAULT_DELIMITER.to_string(),
        })
    }

    /// Append an utterance, enforcing the single-speaker invariant
    pub fn add(&mut self, utterance: Utterance) -> ModelResult<()> {
        if utterance.speaker != self.speaker {
            return Err(ModelError::SpeakerConsistency {
                speech_id: self.speech_id.clone(),
                utterance_id: utterance.id,
                expected: self.speaker.clone(),
                found: utterance.speaker,
            });
        }
        self.utterances.push(utterance);
        Ok(())
    }

    /// The entire speech text.
    ///
    /// Whitespace runs within a line collapse to one space and blank lines
    /// are dropped; line breaks from the delimiters are kept. Empty when the
    /// joined text contains no alphabetic character, so punctuation-only
    /// speeches count as textually empty.
    pub fn text(&self) -> String {
        let text = self
            .utterances
            .iter()
            .map(|u| normalize_lines(&u.text()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(&self.delimiter);

        if !text.chars().any(char::is_alphabetic) {
            return String::new();
        }
        text.trim().to_string()
    }

    /// `<document stem>@<speech_index>`
    pub fn speech_name(&self) -> String {
        let stem = self
            .document_name
            .as_deref()
            .map(strip_extensions)
            .unwrap_or("unknown");
        format!("{}@{}", stem, self.speech_index)
    }

    pub fn filename(&self) -> String {
        format!("{}.csv", self.speech_name())
    }

    pub fn contains(&self, utterance_id: &str) -> bool {
        self.utterances.iter().any(|u| u.id == utterance_id)
    }

    /// All paragraphs of all member utterances, in order
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.utterances
            .iter()
            .flat_map(|u| u.paragraphs.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

/// Strip every extension from a file name (`a.b.xml` -> `a`)
pub(crate) fn strip_extensions(name: &str) -> &str {
    match name.find('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// Collapse whitespace within each line and drop blank lines
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
