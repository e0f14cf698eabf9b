//! Merge policies and the merger that applies them

use crate::model::{resolve_chains, ModelError, ModelResult, Protocol, Speech, Utterance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// How utterances are grouped into speeches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MergeStrategy {
    /// Group by utterance group id (`n`)
    #[default]
    ById,
    /// Group by speaker (`who`)
    BySpeaker,
    /// Group by prev/next continuation chain
    ByChain,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 3] = [Self::ById, Self::BySpeaker, Self::ByChain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ById => "by-id",
            Self::BySpeaker => "by-speaker",
            Self::ByChain => "by-chain",
        }
    }

    /// Group the protocol's utterances, in policy order
    fn group<'a>(&self, protocol: &'a Protocol) -> Vec<Vec<&'a Utterance>> {
        match self {
            Self::ById => group_by_key(&protocol.utterances, |u| u.group_id.as_str()),
            Self::BySpeaker => group_by_key(&protocol.utterances, |u| u.speaker.as_str()),
            Self::ByChain => resolve_chains(protocol.display_name(), &protocol.utterances)
                .groups
                .into_iter()
                .map(|group| group.into_iter().map(|i| &protocol.utterances[i]).collect())
                .collect(),
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = ModelError;

    /// Accepts the policy names and their legacy aliases (`n`, `who`, `chain`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "by-id" | "n" => Ok(Self::ById),
            "by-speaker" | "who" => Ok(Self::BySpeaker),
            "by-chain" | "chain" => Ok(Self::ByChain),
            other => Err(ModelError::UnknownMergeStrategy(other.to_string())),
        }
    }
}

impl TryFrom<String> for MergeStrategy {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MergeStrategy> for String {
    fn from(strategy: MergeStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Groups utterances by `key`, preserving first-seen key order
fn group_by_key<'a, K>(utterances: &'a [Utterance], key: K) -> Vec<Vec<&'a Utterance>>
where
    K: Fn(&'a Utterance) -> &'a str,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Utterance>> = Vec::new();

    for utterance in utterances {
        let slot = *positions.entry(key(utterance)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(utterance);
    }

    groups
}

/// Applies a merge policy and the minimum length filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeechMerger {
    pub strategy: MergeStrategy,
    /// Speeches with shorter text are dropped; 0 disables the filter
    pub min_length: usize,
}

impl SpeechMerger {
    pub fn new(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            min_length: 0,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Merge without filtering. Speech indices are 1-based in policy order.
    pub fn merge(&self, protocol: &Protocol) -> ModelResult<Vec<Speech>> {
        self.strategy
            .group(protocol)
            .into_iter()
            .enumerate()
            .map(|(i, group)| {
                Speech::new(
                    protocol.name.clone(),
                    protocol.date.clone(),
                    i + 1,
                    group.into_iter().cloned().collect(),
                )
            })
            .collect()
    }

    /// Merge, then drop speeches shorter than `min_length`.
    ///
    /// Indices are assigned before filtering, so they stay stable when the
    /// threshold changes.
    pub fn speeches(&self, protocol: &Protocol) -> ModelResult<Vec<Speech>> {
        let speeches = self.merge(protocol)?;
        if self.min_length == 0 {
            return Ok(speeches);
        }
        Ok(speeches
            .into_iter()
            .filter(|s| s.text().chars().count() >= self.min_length)
            .collect())
    }
}
