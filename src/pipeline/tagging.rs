//! Tagging of a single protocol

use super::{PipelineError, PipelineResult};
use crate::archive::{
    remove_if_exists, touch, ArchiveError, ArchiveMetadata, ArchiveWriter, StorageMode, StorageOptions,
};
use crate::checksum::{self, GateDecision};
use crate::config::Config;
use crate::merge::SpeechMerger;
use crate::model::{Protocol, Speech, Utterance};
use crate::source::ProtocolBuilder;
use crate::tagger::{tag_texts, to_delimited_text, TaggedDocument, Tagger};
use crate::text::TextPipeline;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// No text to tag; a placeholder marks the document as checked
    Empty,
    /// Archive already holds output for this content
    Skipped { checksum: String },
    /// Tagger ran and a new archive was written
    Tagged { units: usize, checksum: String },
}

/// Units handed to the tagger in one call
enum Units {
    Speeches(Vec<Speech>),
    Utterances(Protocol),
}

impl Units {
    fn len(&self) -> usize {
        match self {
            Self::Speeches(speeches) => speeches.len(),
            Self::Utterances(protocol) => protocol.len(),
        }
    }

    fn texts(&self) -> Vec<String> {
        match self {
            Self::Speeches(speeches) => speeches.iter().map(Speech::text).collect(),
            Self::Utterances(protocol) => protocol.utterances.iter().map(Utterance::text).collect(),
        }
    }

    fn annotate(&mut self, documents: Vec<TaggedDocument>) {
        match self {
            Self::Speeches(speeches) => {
                for (speech, document) in speeches.iter_mut().zip(documents) {
                    speech.annotation = Some(to_delimited_text(&document));
                    speech.token_count = document.num_tokens;
                    speech.word_count = document.num_words;
                }
            }
            Self::Utterances(protocol) => {
                for (utterance, document) in protocol.utterances.iter_mut().zip(documents) {
                    utterance.annotation = Some(to_delimited_text(&document));
                    utterance.token_count = document.num_tokens;
                    utterance.word_count = document.num_words;
                }
            }
        }
    }
}

/// Runs documents through build, preprocess, merge, gate, tag and write.
///
/// Borrows the tagger; create the tagger once and reuse the pipeline for
/// every document of a run.
pub struct TaggingPipeline<'a> {
    tagger: &'a dyn Tagger,
    builder: ProtocolBuilder,
    text: TextPipeline,
    merger: SpeechMerger,
    writer: ArchiveWriter,
}

impl<'a> TaggingPipeline<'a> {
    /// Pipeline with no preprocessing, default merge policy and storage
    pub fn new(tagger: &'a dyn Tagger) -> Self {
        Self {
            tagger,
            builder: ProtocolBuilder::new(),
            text: TextPipeline::identity(),
            merger: SpeechMerger::default(),
            writer: ArchiveWriter::default(),
        }
    }

    /// Pipeline configured from `config` with built-in transforms
    pub fn from_config(tagger: &'a dyn Tagger, config: &Config) -> crate::config::ConfigResult<Self> {
        Ok(Self::new(tagger)
            .with_text_pipeline(config.text_pipeline()?)
            .with_merger(SpeechMerger::new(config.merge_strategy).with_min_length(config.min_speech_length))
            .with_storage(config.storage))
    }

    pub fn with_text_pipeline(mut self, text: TextPipeline) -> Self {
        self.text = text;
        self
    }

    pub fn with_merger(mut self, merger: SpeechMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_storage(mut self, storage: StorageOptions) -> Self {
        self.writer = ArchiveWriter::new(storage);
        self
    }

    pub fn with_builder(mut self, builder: ProtocolBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn storage(&self) -> StorageOptions {
        self.writer.options()
    }

    /// Tag the protocol document at `input` into the archive at `output`.
    ///
    /// Unless `force` is set, a document whose archive already carries
    /// the current fingerprint is skipped without invoking the tagger.
    /// On any error the archive at `output` is removed, so a failed
    /// document never keeps an archive from an earlier version.
    pub fn tag_protocol_file(&self, input: &Path, output: &Path, force: bool) -> PipelineResult<TagOutcome> {
        let result = self
            .builder
            .build_file(input)
            .map_err(|source| PipelineError::Source {
                document: input.display().to_string(),
                source,
            })
            .and_then(|built| {
                if !built.issues.is_empty() {
                    debug!(
                        document = %built.protocol.display_name(),
                        issues = built.issues.len(),
                        "protocol has repaired links"
                    );
                }
                self.run(built.protocol, output, force)
            });
        discard_on_error(output, result)
    }

    /// Tag an already built protocol into the archive at `output`.
    ///
    /// Removes the archive on error, like [`Self::tag_protocol_file`].
    pub fn tag_protocol(&self, protocol: Protocol, output: &Path, force: bool) -> PipelineResult<TagOutcome> {
        discard_on_error(output, self.run(protocol, output, force))
    }

    fn run(&self, mut protocol: Protocol, output: &Path, force: bool) -> PipelineResult<TagOutcome> {
        let document = protocol.display_name().to_string();
        let archive_error = |source: ArchiveError| PipelineError::Archive {
            document: document.clone(),
            source,
        };

        if !protocol.has_text() {
            self.writer.write_placeholder(output).map_err(archive_error)?;
            info!(document = %document, "protocol has no text, placeholder written");
            return Ok(TagOutcome::Empty);
        }

        protocol
            .preprocess(|text| self.text.apply(text))
            .map_err(|source| PipelineError::Text {
                document: document.clone(),
                source,
            })?;

        let mut units = match self.writer.options().mode {
            StorageMode::Speech => Units::Speeches(self.merger.speeches(&protocol).map_err(|source| {
                PipelineError::Model {
                    document: document.clone(),
                    source,
                }
            })?),
            StorageMode::Protocol => Units::Utterances(protocol.clone()),
        };

        let texts = units.texts();
        let checksum = checksum::fingerprint(&texts);

        if !force {
            match checksum::evaluate(output, &checksum) {
                GateDecision::UpToDate => {
                    touch(output).map_err(|source| PipelineError::Io {
                        path: output.to_path_buf(),
                        source,
                    })?;
                    info!(document = %document, "SKIPPING (checksum validates OK)");
                    return Ok(TagOutcome::Skipped { checksum });
                }
                GateDecision::Proceed(reason) => {
                    debug!(document = %document, ?reason, "tagging required");
                }
            }
        }

        remove_if_exists(output).map_err(|source| PipelineError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        let documents = tag_texts(self.tagger, &texts).map_err(|source| PipelineError::Tagger {
            document: document.clone(),
            source,
        })?;
        units.annotate(documents);

        let metadata = ArchiveMetadata::new(protocol.name.clone(), protocol.date.clone(), checksum.clone());
        let written = match &units {
            Units::Speeches(speeches) => self.writer.write_speeches(output, &metadata, speeches),
            Units::Utterances(tagged) => self.writer.write_protocol(output, &metadata, tagged),
        };
        written.map_err(archive_error)?;

        info!(document = %document, units = units.len(), "tagged");
        Ok(TagOutcome::Tagged {
            units: units.len(),
            checksum,
        })
    }
}

/// Remove the archive at `output` when `result` is an error
fn discard_on_error(output: &Path, result: PipelineResult<TagOutcome>) -> PipelineResult<TagOutcome> {
    if let Err(err) = &result {
        if let Err(cleanup) = remove_if_exists(output) {
            warn!(path = %output.display(), error = %cleanup, "failed to remove archive");
        }
        error!(
            document = err.document().unwrap_or_default(),
            archive = %output.display(),
            error = %err,
            "tagging failed, archive removed"
        );
    }
    result
}
