//! Mock tagger for testing

use super::{TaggedDocument, Tagger, TaggerError, TaggerResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns preconfigured documents and counts how often it is invoked.
///
/// Texts without a registered response are tagged by splitting on
/// whitespace: lemma is the lowercased token, pos/xpos are `X`.
#[derive(Debug, Default)]
pub struct MockTagger {
    responses: HashMap<String, TaggedDocument>,
    failure: Option<String>,
    calls: AtomicUsize,
    texts: AtomicUsize,
}

impl MockTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tagger whose every invocation fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Register the document returned for `text`
    pub fn with_response(mut self, text: impl Into<String>, document: TaggedDocument) -> Self {
        self.responses.insert(text.into(), document);
        self
    }

    /// Number of `tag` invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of texts tagged so far, across all invocations
    pub fn text_count(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }

    fn whitespace_document(text: &str) -> TaggedDocument {
        let token: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let n = token.len();
        TaggedDocument {
            lemma: token.iter().map(|t| t.to_lowercase()).collect(),
            pos: vec!["X".to_string(); n],
            xpos: vec!["X".to_string(); n],
            num_tokens: n,
            num_words: n,
            token,
        }
    }
}

impl Tagger for MockTagger {
    fn name(&self) -> &str {
        "mock"
    }

    fn tag(&self, texts: &[String]) -> TaggerResult<Vec<TaggedDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(TaggerError::Failed(message.clone()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.responses
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| Self::whitespace_document(text))
            })
            .collect())
    }
}
