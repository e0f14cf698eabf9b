//! Content fingerprints and the checksum gate
//!
//! Tagging is the expensive step, so a document is only re-tagged when
//! the text that would be sent to the tagger changed since the archive
//! at its target location was written. Change is detected on content,
//! never on file timestamps.
//!
//! The fingerprint is taken at one canonical point: after preprocessing
//! and before tagging, over exactly the texts handed to the tagger.

use crate::archive::{ArchiveReader, ArchiveState};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Separator placed between texts before hashing
pub const SEPARATOR: &str = "  ";

/// SHA-256 hex digest of `texts` joined by [`SEPARATOR`]
pub fn fingerprint<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (i, text) in texts.into_iter().enumerate() {
        if i > 0 {
            hasher.update(SEPARATOR.as_bytes());
        }
        hasher.update(text.as_ref().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Why a document has to be (re-)tagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// Nothing at the target location
    NoArchive,
    /// Only an empty-protocol marker at the target location
    Placeholder,
    /// Existing archive could not be read; treated as absent
    Unreadable(String),
    /// Stored fingerprint differs
    Changed { stored: String },
}

/// Outcome of the checksum gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Stored fingerprint matches; the tagger need not run
    UpToDate,
    Proceed(MissReason),
}

impl GateDecision {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::UpToDate)
    }
}

/// Compare `checksum` with the one stored in the archive at `archive`.
///
/// Never fails: an unreadable archive is a cache miss.
pub fn evaluate(archive: &Path, checksum: &str) -> GateDecision {
    let decision = match ArchiveReader::state(archive) {
        ArchiveState::Missing => GateDecision::Proceed(MissReason::NoArchive),
        ArchiveState::Placeholder => GateDecision::Proceed(MissReason::Placeholder),
        ArchiveState::Invalid(reason) => GateDecision::Proceed(MissReason::Unreadable(reason)),
        ArchiveState::Valid(metadata) if metadata.checksum == checksum => GateDecision::UpToDate,
        ArchiveState::Valid(metadata) => GateDecision::Proceed(MissReason::Changed {
            stored: metadata.checksum,
        }),
    };
    debug!(archive = %archive.display(), ?decision, "checksum gate");
    decision
}

/// True if the archive at `archive` already holds output for `checksum`
pub fn should_skip(archive: &Path, checksum: &str) -> bool {
    evaluate(archive, checksum).is_skip()
}
