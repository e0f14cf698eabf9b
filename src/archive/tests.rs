use super::*;
use crate::model::{Protocol, Speech, Utterance};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn protocol() -> Protocol {
    let mut utterances = vec![
        Utterance::new("i-1", "A")
            .with_group_id("c01")
            .with_next("i-2")
            .with_paragraphs(["Herr talman!"]),
        Utterance::new("i-2", "A")
            .with_group_id("c02")
            .with_prev("i-1")
            .with_paragraphs(["Jag yrkar bifall."]),
        Utterance::new("i-3", "B")
            .with_group_id("c03")
            .with_paragraphs(["Ja."]),
    ];
    for u in &mut utterances {
        u.annotation = Some(format!("token\tlemma\tpos\txpos\n{}\t{}\tX\tX", u.id, u.id));
        u.token_count = 1;
        u.word_count = 1;
    }
    Protocol::new(
        Some("prot-1958-fake".to_string()),
        Some("1958-01-01".to_string()),
        utterances,
    )
}

fn tagged_speeches(protocol: &Protocol) -> Vec<Speech> {
    let mut speeches = protocol
        .to_speeches(crate::merge::MergeStrategy::BySpeaker, 0)
        .unwrap();
    for speech in &mut speeches {
        speech.annotation = Some(format!("token\tlemma\tpos\txpos\n{}\tx\tX\tX", speech.speaker));
        speech.token_count = 1;
        speech.word_count = 1;
    }
    speeches
}

fn metadata() -> ArchiveMetadata {
    ArchiveMetadata::new(
        Some("prot-1958-fake".to_string()),
        Some("1958-01-01".to_string()),
        "abc123",
    )
}

#[test]
fn state_of_missing_and_placeholder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("1958/prot-1958-fake.zip");
    assert_eq!(ArchiveReader::state(&path), ArchiveState::Missing);

    ArchiveWriter::default().write_placeholder(&path).unwrap();
    assert_eq!(ArchiveReader::state(&path), ArchiveState::Placeholder);
    assert_eq!(ArchiveReader::load_checksum(&path), None);
}

#[test]
fn garbage_file_is_invalid_not_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prot.zip");
    fs::write(&path, b"not a zip").unwrap();
    assert!(matches!(ArchiveReader::state(&path), ArchiveState::Invalid(_)));
    assert_eq!(ArchiveReader::load_checksum(&path), None);
}

#[test]
fn archive_without_metadata_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prot.zip");
    {
        let file = fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("prot@1.csv", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zip, b"token\tlemma\tpos\txpos").unwrap();
        zip.finish().unwrap();
    }
    match ArchiveReader::state(&path) {
        ArchiveState::Invalid(reason) => assert!(reason.contains(METADATA_FILENAME)),
        other => panic!("expected invalid archive, got {:?}", other),
    }
}

#[test]
fn speech_archive_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("1958/prot-1958-fake.zip");
    let protocol = protocol();
    let speeches = tagged_speeches(&protocol);

    for format in [PayloadFormat::Csv, PayloadFormat::Json] {
        let writer = ArchiveWriter::new(StorageOptions::new(StorageMode::Speech, format));
        writer.write_speeches(&path, &metadata(), &speeches).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.metadata().name.as_deref(), Some("prot-1958-fake"));
        assert_eq!(reader.metadata().date.as_deref(), Some("1958-01-01"));
        assert_eq!(reader.metadata().checksum, "abc123");
        assert_eq!(reader.metadata().mode, StorageMode::Speech);
        assert_eq!(reader.metadata().format, format);

        let ext = format.extension();
        assert_eq!(
            reader.entry_names(),
            vec![
                INDEX_FILENAME.to_string(),
                METADATA_FILENAME.to_string(),
                format!("prot-1958-fake@1.{}", ext),
                format!("prot-1958-fake@2.{}", ext),
            ]
        );

        let records = reader.load_speeches().unwrap();
        let expected: Vec<SpeechRecord> = speeches.iter().map(SpeechRecord::from_speech).collect();
        assert_eq!(records, expected);
    }
}

#[test]
fn protocol_archive_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prot-1958-fake.zip");
    let protocol = protocol();

    for format in [PayloadFormat::Csv, PayloadFormat::Json] {
        let writer = ArchiveWriter::new(StorageOptions::new(StorageMode::Protocol, format));
        writer.write_protocol(&path, &metadata(), &protocol).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.load_protocol().unwrap(), protocol);

        let index = reader.index().unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index[2].speech_id, "i-3");
        assert_eq!(index[2].speech_index, 3);
        assert_eq!(index[2].filename, format!("prot-1958-fake.{}", format.extension()));
    }
}

#[test]
fn loading_the_wrong_mode_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prot-1958-fake.zip");
    ArchiveWriter::new(StorageOptions::new(StorageMode::Protocol, PayloadFormat::Json))
        .write_protocol(&path, &metadata(), &protocol())
        .unwrap();

    let err = ArchiveReader::open(&path).unwrap().load_speeches().unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::WrongMode {
            expected: StorageMode::Speech,
            found: StorageMode::Protocol,
            ..
        }
    ));
}

#[test]
fn rewrite_replaces_the_archive_and_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prot-1958-fake.zip");
    let writer = ArchiveWriter::default();
    let protocol = protocol();
    let speeches = tagged_speeches(&protocol);

    writer.write_placeholder(&path).unwrap();
    writer.write_speeches(&path, &metadata(), &speeches).unwrap();
    let mut updated = metadata();
    updated.checksum = "def456".to_string();
    writer.write_speeches(&path, &updated, &speeches[..1]).unwrap();

    assert_eq!(ArchiveReader::load_checksum(&path).as_deref(), Some("def456"));
    assert_eq!(ArchiveReader::open(&path).unwrap().index().unwrap().len(), 1);
    assert_eq!(entries(dir.path()), vec!["prot-1958-fake.zip".to_string()]);
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn metadata_deserializes_without_optional_fields() {
    let metadata: ArchiveMetadata =
        serde_json::from_str(r#"{"name": "prot-1958-fake", "date": null, "checksum": "x"}"#).unwrap();
    assert_eq!(metadata.mode, StorageMode::Speech);
    assert_eq!(metadata.format, PayloadFormat::Csv);
    assert_eq!(metadata.stem(), "prot-1958-fake");
}
