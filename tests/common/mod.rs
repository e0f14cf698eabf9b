//! Common test utilities for riksprot-tagger integration tests
//!
//! Provides a throwaway corpus layout (source and target folders in a
//! temp dir), the checked-in fixture protocols, and helpers for writing
//! small ParlaClarin documents inline.

#![allow(dead_code)]

pub mod corpus;

pub use corpus::{fixture_path, fixture_root, protocol_xml, utterance_xml, TestCorpus};
