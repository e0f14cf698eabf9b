//! Word/punctuation tokenizer used by the `pretokenize` transform

use super::TextResult;
use regex::Regex;

/// Words (with inner hyphens, apostrophes and colons), numbers (with
/// decimal or thousands separators), or any other single non-space char.
const TOKEN_PATTERN: &str =
    r"\p{L}[\p{L}\p{M}\p{N}]*(?:[-'’:][\p{L}\p{N}]+)*|\p{N}+(?:[.,:]\p{N}+)*|\S";

/// Splits text into word and punctuation tokens
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    pub fn new() -> TextResult<Self> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.pattern.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Tokenize, then re-join the tokens with single spaces
    pub fn pretokenize(&self, text: &str) -> String {
        self.tokenize(text).join(" ")
    }
}
