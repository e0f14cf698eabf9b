//! Protocol building and speech merging over ParlaClarin documents

mod common;

use common::{fixture_path, protocol_xml, utterance_xml};
use riksprot_tagger::{
    LinkIssueKind, MergeStrategy, ProtocolBuilder, SourceError, UNDEFINED_SPEAKER,
};

fn speech_ids(speeches: &[riksprot_tagger::Speech]) -> Vec<Vec<&str>> {
    speeches
        .iter()
        .map(|s| s.utterances.iter().map(|u| u.id.as_str()).collect())
        .collect()
}

#[test]
fn fixture_builds_with_name_date_and_every_utterance() {
    let built = ProtocolBuilder::new()
        .build_file(&fixture_path("1958/prot-1958-fake.xml"))
        .unwrap();
    let protocol = &built.protocol;

    assert_eq!(protocol.name.as_deref(), Some("prot-1958-fake"));
    assert_eq!(protocol.date.as_deref(), Some("1958-01-15"));
    assert_eq!(protocol.len(), 6);
    assert_eq!(protocol.get("i-6").unwrap().speaker, UNDEFINED_SPEAKER);
    assert_eq!(protocol.get("i-1").unwrap().paragraphs.len(), 2);
    assert_eq!(protocol.get("i-2").unwrap().prev_id.as_deref(), Some("i-1"));
}

#[test]
fn fixture_reports_repaired_link() {
    let built = ProtocolBuilder::new()
        .build_file(&fixture_path("1958/prot-1958-fake.xml"))
        .unwrap();

    assert_eq!(built.issues.len(), 1);
    let issue = &built.issues[0];
    assert_eq!(issue.utterance_id, "i-5");
    assert_eq!(issue.reference, "i-3");
    assert_eq!(
        issue.kind,
        LinkIssueKind::NotPredecessor {
            tail: "i-4".to_string()
        }
    );
    assert!(issue.is_repair());
}

#[test]
fn fixture_speeches_under_each_strategy() {
    let protocol = ProtocolBuilder::new()
        .build_file(&fixture_path("1958/prot-1958-fake.xml"))
        .unwrap()
        .protocol;

    let by_id = protocol.to_speeches(MergeStrategy::ById, 0).unwrap();
    assert_eq!(
        speech_ids(&by_id),
        vec![vec!["i-1"], vec!["i-2"], vec!["i-3", "i-4"], vec!["i-5"], vec!["i-6"]]
    );

    let by_speaker = protocol.to_speeches(MergeStrategy::BySpeaker, 0).unwrap();
    assert_eq!(
        speech_ids(&by_speaker),
        vec![vec!["i-1", "i-2", "i-5"], vec!["i-3", "i-4"], vec!["i-6"]]
    );

    let by_chain = protocol.to_speeches(MergeStrategy::ByChain, 0).unwrap();
    assert_eq!(
        speech_ids(&by_chain),
        vec![vec!["i-1", "i-2"], vec!["i-3"], vec!["i-4"], vec!["i-5"], vec!["i-6"]]
    );

    for speeches in [&by_id, &by_speaker, &by_chain] {
        for speech in speeches.iter() {
            assert!(speech.utterances.iter().all(|u| u.speaker == speech.speaker));
        }
    }
}

#[test]
fn punctuation_only_speech_is_dropped_by_length_filter() {
    let protocol = ProtocolBuilder::new()
        .build_file(&fixture_path("1958/prot-1958-fake.xml"))
        .unwrap()
        .protocol;

    let unfiltered = protocol.to_speeches(MergeStrategy::ByChain, 0).unwrap();
    let punctuation = unfiltered.iter().find(|s| s.contains("i-4")).unwrap();
    assert_eq!(punctuation.text(), "");

    let filtered = protocol.to_speeches(MergeStrategy::ByChain, 1).unwrap();
    assert_eq!(filtered.len(), 4);
    assert!(filtered.iter().all(|s| !s.contains("i-4")));
    assert_eq!(
        filtered.iter().map(|s| s.speech_index).collect::<Vec<_>>(),
        vec![1, 2, 4, 5]
    );
    assert_eq!(filtered[0].speech_name(), "prot-1958-fake@1");
}

#[test]
fn unlinked_document_yields_one_chain_per_utterance() {
    let xml = protocol_xml(
        "1960-03-01",
        &[
            utterance_xml("u-1", "A", None, None, &["Ett."]),
            utterance_xml("u-2", "A", None, None, &["Två."]),
            utterance_xml("u-3", "B", None, None, &["Tre."]),
        ],
    );
    let protocol = ProtocolBuilder::new().build_str(&xml).unwrap().protocol;
    let speeches = protocol.to_speeches(MergeStrategy::ByChain, 0).unwrap();
    assert_eq!(speeches.len(), protocol.len());
}

#[test]
fn broken_links_never_drop_utterances() {
    let xml = protocol_xml(
        "1960-03-01",
        &[
            utterance_xml("u-1", "A", Some("u-0"), Some("u-9"), &["Ett."]),
            utterance_xml("u-2", "A", Some("u-3"), None, &["Två."]),
            utterance_xml("u-3", "B", None, None, &[]),
            utterance_xml("u-4", "B", Some("cont"), None, &["Fyra."]),
        ],
    );
    let built = ProtocolBuilder::new().build_str(&xml).unwrap();
    assert_eq!(built.protocol.len(), 4);
    assert!(built.issues.len() >= 3);
    assert!(built
        .issues
        .iter()
        .any(|i| matches!(i.kind, LinkIssueKind::NextMismatch { .. })));
}

#[test]
fn speaker_change_inside_chain_fails_build() {
    let xml = protocol_xml(
        "1960-03-01",
        &[
            utterance_xml("u-1", "A", None, Some("u-2"), &["Ett."]),
            utterance_xml("u-2", "B", Some("u-1"), None, &["Två."]),
        ],
    );
    let err = ProtocolBuilder::new().build_str(&xml).unwrap_err();
    assert!(matches!(err, SourceError::Model(_)));
}

#[test]
fn duplicate_utterance_id_fails_build() {
    let xml = protocol_xml(
        "1960-03-01",
        &[
            utterance_xml("u-1", "A", None, None, &["Ett."]),
            utterance_xml("u-1", "A", None, None, &["Två."]),
        ],
    );
    let err = ProtocolBuilder::new().build_str(&xml).unwrap_err();
    assert!(matches!(err, SourceError::DuplicateUtteranceId(ref id) if id == "u-1"));
}
