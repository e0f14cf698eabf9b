//! Speech merging: regroup protocol utterances into speeches
//!
//! Three mutually exclusive policies, selected by name:
//!
//! - **by-id**: one speech per distinct utterance group id (`n`), in
//!   first-seen order. Non-contiguous fragments sharing an id are merged.
//! - **by-speaker**: one speech per distinct speaker, in first-seen order.
//!   A speaker who reappears after an interruption is merged into their
//!   first speech (lifetime aggregation).
//! - **by-chain**: one speech per prev/next continuation chain, in
//!   document order, with the same link repair as the protocol builder.
//!
//! Independent of policy, a minimum text length filter can drop
//! near-empty speeches after merging.

mod strategy;

pub use strategy::{MergeStrategy, SpeechMerger};
