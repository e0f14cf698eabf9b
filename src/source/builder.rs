//! Protocol reconstruction from a parsed ParlaClarin tree

use super::tree::XmlElement;
use super::{SourceError, SourceResult};
use crate::model::{
    resolve_chains, LinkIssue, ModelError, Protocol, Utterance, DEFAULT_DELIMITER,
    UNDEFINED_SPEAKER,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// A built protocol together with the soft link defects found in it
#[derive(Debug, Clone)]
pub struct BuiltProtocol {
    pub protocol: Protocol,
    /// Every unresolved prev/next reference, in document order
    pub issues: Vec<LinkIssue>,
}

/// Builds a [`Protocol`] from a ParlaClarin document.
///
/// Utterances are the `u` elements under `TEI/text/body`, in document
/// order. Every one of them ends up in the protocol; a defective `prev`
/// link only causes the utterance to start a new continuation group.
/// A continuation group mixing speakers fails the build.
#[derive(Debug, Clone)]
pub struct ProtocolBuilder {
    name: Option<String>,
    delimiter: String,
}

impl Default for ProtocolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    /// Override the protocol name (otherwise taken from the header title)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Parse and build the document at `path`, named after its file stem
    pub fn build_file(&self, path: &Path) -> SourceResult<BuiltProtocol> {
        let root = XmlElement::parse_file(path)?;
        let builder = match (&self.name, document_stem(path)) {
            (None, Some(stem)) => self.clone().with_name(stem),
            _ => self.clone(),
        };
        builder.build(&root)
    }

    pub fn build_str(&self, xml: &str) -> SourceResult<BuiltProtocol> {
        self.build(&XmlElement::parse_str(xml)?)
    }

    pub fn build(&self, root: &XmlElement) -> SourceResult<BuiltProtocol> {
        let tei = match root.name.as_str() {
            "TEI" => root,
            "teiCorpus" => root
                .child("TEI")
                .ok_or_else(|| SourceError::Malformed("teiCorpus without TEI".to_string()))?,
            other => {
                return Err(SourceError::Malformed(format!(
                    "unexpected root element <{}>",
                    other
                )))
            }
        };

        let name = self.name.clone().or_else(|| header_title(root, tei));
        let date = document_date(tei);
        let label = name.as_deref().unwrap_or("<unnamed>");

        let utterances = match tei.find("text/body") {
            Some(body) => self.read_utterances(body)?,
            None => {
                debug!(document = label, "no text body, protocol is empty");
                Vec::new()
            }
        };

        let resolution = resolve_chains(label, &utterances);

        for group in &resolution.groups {
            let first = &utterances[group[0]];
            if let Some(stranger) = group
                .iter()
                .map(|&i| &utterances[i])
                .find(|u| u.speaker != first.speaker)
            {
                warn!(
                    document = label,
                    utterance = %stranger.id,
                    "speaker changes inside a continuation chain"
                );
                return Err(ModelError::SpeakerConsistency {
                    speech_id: first.id.clone(),
                    utterance_id: stranger.id.clone(),
                    expected: first.speaker.clone(),
                    found: stranger.speaker.clone(),
                }
                .into());
            }
        }

        debug!(
            document = label,
            utterances = utterances.len(),
            chains = resolution.groups.len(),
            link_issues = resolution.issues.len(),
            "protocol built"
        );

        Ok(BuiltProtocol {
            protocol: Protocol::new(name, date, utterances),
            issues: resolution.issues,
        })
    }

    fn read_utterances(&self, body: &XmlElement) -> SourceResult<Vec<Utterance>> {
        let mut seen: HashSet<String> = HashSet::new();

        body.descendants("u")
            .into_iter()
            .enumerate()
            .map(|(position, element)| {
                let id = element
                    .non_empty_attr("xml:id")
                    .ok_or(SourceError::MissingUtteranceId { position })?
                    .to_string();

                if !seen.insert(id.clone()) {
                    return Err(SourceError::DuplicateUtteranceId(id));
                }

                Ok(Utterance {
                    group_id: element.non_empty_attr("n").unwrap_or(id.as_str()).to_string(),
                    speaker: element
                        .non_empty_attr("who")
                        .unwrap_or(UNDEFINED_SPEAKER)
                        .to_string(),
                    prev_id: element.non_empty_attr("prev").map(str::to_string),
                    next_id: element.non_empty_attr("next").map(str::to_string),
                    paragraphs: element
                        .children_named("seg")
                        .map(|seg| seg.text().to_string())
                        .collect(),
                    delimiter: self.delimiter.clone(),
                    annotation: None,
                    token_count: 0,
                    word_count: 0,
                    id,
                })
            })
            .collect()
    }
}

/// Title from the corpus or document header
fn header_title(root: &XmlElement, tei: &XmlElement) -> Option<String> {
    const TITLE: &str = "teiHeader/fileDesc/titleStmt/title";
    tei.find(TITLE)
        .or_else(|| root.find(TITLE))
        .map(|t| t.text().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// First `docDate`, preferring its `when` attribute over its text
fn document_date(tei: &XmlElement) -> Option<String> {
    tei.descendants("docDate").into_iter().find_map(|d| {
        d.non_empty_attr("when")
            .map(str::to_string)
            .or_else(|| Some(d.text().trim().to_string()).filter(|t| !t.is_empty()))
    })
}

/// File name with every extension removed
fn document_stem(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    Some(crate::model::strip_extensions(file_name).to_string())
}
