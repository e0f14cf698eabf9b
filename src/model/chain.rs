//! Continuation-chain reconstruction over prev/next links
//!
//! Utterances arrive in document order and may carry soft references to
//! the fragment they continue (`prev`) and the fragment that follows
//! (`next`). Resolution builds an id index once, then walks the sequence:
//! a resolved `prev` extends the open group, anything else starts a new
//! group. Defects are reported as [`LinkIssue`] values and logged; they
//! never abort the walk and never drop an utterance.

use super::utterance::Utterance;
use std::collections::HashMap;
use tracing::warn;

/// Legacy `prev` value meaning "continues the preceding utterance"
pub const LEGACY_CONTINUATION: &str = "cont";

/// Why a declared link did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkIssueKind {
    /// `prev` is set on an utterance with no open group before it
    NoOpenGroup,
    /// `prev` names an id that does not exist in the protocol
    UnknownPrev,
    /// `prev` names an existing utterance that is not the tail of the open group
    NotPredecessor { tail: String },
    /// `next` does not name the utterance that actually follows
    NextMismatch { actual: Option<String> },
}

/// A soft structural defect found while resolving links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkIssue {
    pub utterance_id: String,
    /// The declared reference that failed to resolve
    pub reference: String,
    pub kind: LinkIssueKind,
}

impl LinkIssue {
    /// True for `prev` defects, which cause a repair (new group)
    pub fn is_repair(&self) -> bool {
        !matches!(self.kind, LinkIssueKind::NextMismatch { .. })
    }
}

impl std::fmt::Display for LinkIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            LinkIssueKind::NoOpenGroup => write!(
                f,
                "u[{}]: ignoring prev='{}' (no previous utterance)",
                self.utterance_id, self.reference
            ),
            LinkIssueKind::UnknownPrev => write!(
                f,
                "u[{}]: ignoring prev='{}' (no such utterance)",
                self.utterance_id, self.reference
            ),
            LinkIssueKind::NotPredecessor { tail } => write!(
                f,
                "u[{}]: ignoring prev='{}' (open speech ends with '{}')",
                self.utterance_id, self.reference, tail
            ),
            LinkIssueKind::NextMismatch { actual } => write!(
                f,
                "u[{}]: next='{}' but following utterance is '{}'",
                self.utterance_id,
                self.reference,
                actual.as_deref().unwrap_or("<end of document>")
            ),
        }
    }
}

/// Outcome of resolving one `prev` reference
enum PrevLink {
    Absent,
    Resolved,
    Unresolved(LinkIssueKind),
}

/// Groups of utterance positions plus every defect seen on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainResolution {
    /// Each group lists positions into the input slice, in document order
    pub groups: Vec<Vec<usize>>,
    pub issues: Vec<LinkIssue>,
}

/// Reassemble continuation chains from `utterances`.
///
/// `document` only labels log lines.
pub fn resolve_chains(document: &str, utterances: &[Utterance]) -> ChainResolution {
    let index: HashMap<&str, usize> = utterances
        .iter()
        .enumerate()
        .map(|(i, u)| (u.id.as_str(), i))
        .collect();

    let mut resolution = ChainResolution::default();

    for (position, utterance) in utterances.iter().enumerate() {
        let tail = position.checked_sub(1).map(|p| &utterances[p]);

        match resolve_prev(utterance, tail, &index) {
            PrevLink::Resolved => match resolution.groups.last_mut() {
                Some(group) => group.push(position),
                None => resolution.groups.push(vec![position]),
            },
            PrevLink::Absent => resolution.groups.push(vec![position]),
            PrevLink::Unresolved(kind) => {
                let issue = LinkIssue {
                    utterance_id: utterance.id.clone(),
                    reference: utterance.prev_id.clone().unwrap_or_default(),
                    kind,
                };
                warn!(document, "{}", issue);
                resolution.issues.push(issue);
                resolution.groups.push(vec![position]);
            }
        }

        if let Some(next_id) = &utterance.next_id {
            let following = utterances.get(position + 1).map(|u| u.id.clone());
            if following.as_deref() != Some(next_id.as_str()) {
                let issue = LinkIssue {
                    utterance_id: utterance.id.clone(),
                    reference: next_id.clone(),
                    kind: LinkIssueKind::NextMismatch { actual: following },
                };
                warn!(document, "{}", issue);
                resolution.issues.push(issue);
            }
        }
    }

    resolution
}

fn resolve_prev(
    utterance: &Utterance,
    tail: Option<&Utterance>,
    index: &HashMap<&str, usize>,
) -> PrevLink {
    let Some(prev_id) = utterance.prev_id.as_deref() else {
        return PrevLink::Absent;
    };

    let Some(tail) = tail else {
        return PrevLink::Unresolved(LinkIssueKind::NoOpenGroup);
    };

    if prev_id == tail.id || prev_id == LEGACY_CONTINUATION {
        return PrevLink::Resolved;
    }

    if index.contains_key(prev_id) {
        PrevLink::Unresolved(LinkIssueKind::NotPredecessor {
            tail: tail.id.clone(),
        })
    } else {
        PrevLink::Unresolved(LinkIssueKind::UnknownPrev)
    }
}
