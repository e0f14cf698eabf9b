//! Payload encoders and decoders, keyed by [`PayloadFormat`]

use super::{ArchiveResult, IndexRow, PayloadFormat};
use crate::model::{Speech, Utterance};
use serde::{Deserialize, Serialize};

/// A tagged speech as restored from an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRecord {
    pub document_name: Option<String>,
    pub speech_id: String,
    pub speaker: String,
    pub speech_date: Option<String>,
    pub speech_index: usize,
    pub num_tokens: usize,
    pub num_words: usize,
    /// Delimited annotation table
    pub annotation: String,
}

impl SpeechRecord {
    pub fn from_speech(speech: &Speech) -> Self {
        Self {
            document_name: speech.document_name.clone(),
            speech_id: speech.speech_id.clone(),
            speaker: speech.speaker.clone(),
            speech_date: speech.speech_date.clone(),
            speech_index: speech.speech_index,
            num_tokens: speech.token_count,
            num_words: speech.word_count,
            annotation: speech.annotation.clone().unwrap_or_default(),
        }
    }

    /// Rebuild a record from an index row and a bare annotation payload
    fn from_row(row: &IndexRow, annotation: String) -> Self {
        Self {
            document_name: row.document_name.clone(),
            speech_id: row.speech_id.clone(),
            speaker: row.speaker.clone(),
            speech_date: row.speech_date.clone(),
            speech_index: row.speech_index,
            num_tokens: row.num_tokens,
            num_words: row.num_words,
            annotation,
        }
    }
}

/// Flat form of an utterance for tab-separated storage
#[derive(Debug, Serialize, Deserialize)]
struct UtteranceRow {
    u_id: String,
    n: String,
    who: String,
    prev_id: Option<String>,
    next_id: Option<String>,
    /// JSON-encoded list
    paragraphs: String,
    delimiter: String,
    annotation: Option<String>,
    num_tokens: usize,
    num_words: usize,
}

impl UtteranceRow {
    fn from_utterance(u: &Utterance) -> ArchiveResult<Self> {
        Ok(Self {
            u_id: u.id.clone(),
            n: u.group_id.clone(),
            who: u.speaker.clone(),
            prev_id: u.prev_id.clone(),
            next_id: u.next_id.clone(),
            paragraphs: serde_json::to_string(&u.paragraphs)?,
            delimiter: u.delimiter.clone(),
            annotation: u.annotation.clone(),
            num_tokens: u.token_count,
            num_words: u.word_count,
        })
    }

    fn into_utterance(self) -> ArchiveResult<Utterance> {
        Ok(Utterance {
            id: self.u_id,
            group_id: self.n,
            speaker: self.who,
            prev_id: self.prev_id,
            next_id: self.next_id,
            paragraphs: serde_json::from_str(&self.paragraphs)?,
            delimiter: self.delimiter,
            annotation: self.annotation,
            token_count: self.num_tokens,
            word_count: self.num_words,
        })
    }
}

fn tsv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new())
}

fn tsv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(content.as_bytes())
}

fn to_tsv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> ArchiveResult<String> {
    let mut writer = tsv_writer();
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| super::ArchiveError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

fn from_tsv<T: for<'de> Deserialize<'de>>(content: &str) -> ArchiveResult<Vec<T>> {
    tsv_reader(content)
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(Into::into)
}

pub(super) fn encode_index(rows: &[IndexRow]) -> ArchiveResult<String> {
    to_tsv(rows)
}

pub(super) fn decode_index(content: &str) -> ArchiveResult<Vec<IndexRow>> {
    from_tsv(content)
}

impl PayloadFormat {
    pub(super) fn encode_speech(&self, record: &SpeechRecord) -> ArchiveResult<String> {
        match self {
            Self::Csv => Ok(record.annotation.clone()),
            Self::Json => Ok(serde_json::to_string(record)?),
        }
    }

    /// Decode a speech payload; a bare `csv` payload takes its fields
    /// from the matching index row
    pub(super) fn decode_speech(&self, content: &str, row: &IndexRow) -> ArchiveResult<SpeechRecord> {
        match self {
            Self::Csv => Ok(SpeechRecord::from_row(row, content.to_string())),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }

    pub(super) fn encode_utterances(&self, utterances: &[Utterance]) -> ArchiveResult<String> {
        match self {
            Self::Csv => to_tsv(
                utterances
                    .iter()
                    .map(UtteranceRow::from_utterance)
                    .collect::<ArchiveResult<Vec<_>>>()?,
            ),
            Self::Json => Ok(serde_json::to_string(utterances)?),
        }
    }

    pub(super) fn decode_utterances(&self, content: &str) -> ArchiveResult<Vec<Utterance>> {
        match self {
            Self::Csv => from_tsv::<UtteranceRow>(content)?
                .into_iter()
                .map(UtteranceRow::into_utterance)
                .collect(),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }
}
