//! Archive writer

use super::codec::{self, SpeechRecord};
use super::{
    ArchiveMetadata, ArchiveResult, IndexRow, StorageMode, StorageOptions, INDEX_FILENAME,
    METADATA_FILENAME,
};
use crate::model::{Protocol, Speech};
use chrono::Utc;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes archives in one storage layout.
///
/// Every write replaces the target wholesale. The existing file is
/// removed first and the new archive is assembled in a temporary file
/// next to the target, so a failed write leaves no archive behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveWriter {
    options: StorageOptions,
}

impl ArchiveWriter {
    pub fn new(options: StorageOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> StorageOptions {
        self.options
    }

    /// Write tagged speeches: one payload per speech plus an index
    pub fn write_speeches(
        &self,
        path: &Path,
        metadata: &ArchiveMetadata,
        speeches: &[Speech],
    ) -> ArchiveResult<()> {
        let metadata = self.stamp(metadata, StorageMode::Speech);
        let format = self.options.format;

        let mut entries = Vec::with_capacity(speeches.len());
        let mut index = Vec::with_capacity(speeches.len());
        for (document_id, speech) in speeches.iter().enumerate() {
            let filename = format!("{}@{}.{}", metadata.stem(), speech.speech_index, format.extension());
            let record = SpeechRecord::from_speech(speech);
            index.push(IndexRow {
                document_name: record.document_name.clone(),
                speech_id: record.speech_id.clone(),
                speaker: record.speaker.clone(),
                speech_date: record.speech_date.clone(),
                speech_index: record.speech_index,
                filename: filename.clone(),
                num_tokens: record.num_tokens,
                num_words: record.num_words,
                document_id,
            });
            entries.push((filename, format.encode_speech(&record)?));
        }
        entries.push((INDEX_FILENAME.to_string(), codec::encode_index(&index)?));

        self.write_archive(path, &metadata, entries)
    }

    /// Write a whole protocol as a single payload plus an index
    pub fn write_protocol(
        &self,
        path: &Path,
        metadata: &ArchiveMetadata,
        protocol: &Protocol,
    ) -> ArchiveResult<()> {
        let metadata = self.stamp(metadata, StorageMode::Protocol);
        let format = self.options.format;
        let filename = format!("{}.{}", metadata.stem(), format.extension());

        let index = protocol
            .utterances
            .iter()
            .enumerate()
            .map(|(document_id, u)| IndexRow {
                document_name: protocol.name.clone(),
                speech_id: u.id.clone(),
                speaker: u.speaker.clone(),
                speech_date: protocol.date.clone(),
                speech_index: document_id + 1,
                filename: filename.clone(),
                num_tokens: u.token_count,
                num_words: u.word_count,
                document_id,
            })
            .collect::<Vec<_>>();

        let entries = vec![
            (filename.clone(), format.encode_utterances(&protocol.utterances)?),
            (INDEX_FILENAME.to_string(), codec::encode_index(&index)?),
        ];
        self.write_archive(path, &metadata, entries)
    }

    /// Write the zero-byte marker for a protocol without text
    pub fn write_placeholder(&self, path: &Path) -> ArchiveResult<()> {
        ensure_parent(path)?;
        File::create(path)?;
        Ok(())
    }

    fn stamp(&self, metadata: &ArchiveMetadata, mode: StorageMode) -> ArchiveMetadata {
        ArchiveMetadata {
            mode,
            format: self.options.format,
            created_at: metadata.created_at.or_else(|| Some(Utc::now())),
            ..metadata.clone()
        }
    }

    fn write_archive(
        &self,
        path: &Path,
        metadata: &ArchiveMetadata,
        entries: Vec<(String, String)>,
    ) -> ArchiveResult<()> {
        let dir = ensure_parent(path)?;
        remove_if_exists(path)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            let mut zip = ZipWriter::new(tmp.as_file_mut());

            zip.start_file(METADATA_FILENAME, options)?;
            zip.write_all(serde_json::to_string_pretty(metadata)?.as_bytes())?;

            for (name, content) in &entries {
                zip.start_file(name.as_str(), options)?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        debug!(
            archive = %path.display(),
            entries = entries.len() + 1,
            mode = %metadata.mode,
            "archive written"
        );
        Ok(())
    }
}

/// Create the parent directory of `path` and return it
fn ensure_parent(path: &Path) -> ArchiveResult<&Path> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    Ok(dir)
}

/// Mark an up-to-date archive as checked by bumping its modification time
pub(crate) fn touch(path: &Path) -> std::io::Result<()> {
    File::options()
        .append(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

/// Remove `path`, ignoring a file that is already gone
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
