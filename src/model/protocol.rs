//! Protocol: one parliamentary-sitting source document

use super::speech::Speech;
use super::utterance::Utterance;
use super::ModelResult;
use crate::checksum;
use crate::merge::{MergeStrategy, SpeechMerger};

/// Container for a single protocol.
///
/// `name` and `date` are best-effort extractions from the source header
/// and may be missing. The speech list is computed per merge policy and
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protocol {
    pub name: Option<String>,
    pub date: Option<String>,
    /// Document order, regardless of link repairs
    pub utterances: Vec<Utterance>,
}

impl Protocol {
    pub fn new(name: Option<String>, date: Option<String>, utterances: Vec<Utterance>) -> Self {
        Self {
            name,
            date,
            utterances,
        }
    }

    /// Name used in log lines when the header had none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// True if any utterance carries uttered words
    pub fn has_text(&self) -> bool {
        self.utterances.iter().any(Utterance::has_text)
    }

    /// All utterance texts joined by newline
    pub fn text(&self) -> String {
        self.utterances
            .iter()
            .map(Utterance::text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Rewrite every paragraph with `transform`.
    ///
    /// Paragraphs are trimmed before transformation. Either every
    /// paragraph is rewritten or, on the first failure, none is.
    pub fn preprocess<F, E>(&mut self, transform: F) -> Result<(), E>
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let rewritten = self
            .utterances
            .iter()
            .map(|u| {
                u.paragraphs
                    .iter()
                    .map(|p| transform(p.trim()))
                    .collect::<Result<Vec<_>, E>>()
            })
            .collect::<Result<Vec<_>, E>>()?;

        for (utterance, paragraphs) in self.utterances.iter_mut().zip(rewritten) {
            utterance.paragraphs = paragraphs;
        }
        Ok(())
    }

    /// Fingerprint of the utterance texts
    pub fn checksum(&self) -> String {
        checksum::fingerprint(self.utterances.iter().map(Utterance::text))
    }

    /// Merge utterances into speeches under `strategy`.
    ///
    /// Speeches whose text is shorter than `min_length` characters are
    /// dropped; 0 keeps every speech.
    pub fn to_speeches(&self, strategy: MergeStrategy, min_length: usize) -> ModelResult<Vec<Speech>> {
        SpeechMerger::new(strategy)
            .with_min_length(min_length)
            .speeches(self)
    }

    pub fn get(&self, utterance_id: &str) -> Option<&Utterance> {
        self.utterances.iter().find(|u| u.id == utterance_id)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}
