//! Archive reader

use super::codec::{self, SpeechRecord};
use super::{
    ArchiveError, ArchiveMetadata, ArchiveResult, ArchiveState, IndexRow, PayloadFormat,
    StorageMode, INDEX_FILENAME, METADATA_FILENAME,
};
use crate::model::Protocol;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened archive whose metadata has been read
pub struct ArchiveReader {
    path: PathBuf,
    zip: ZipArchive<File>,
    metadata: ArchiveMetadata,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ArchiveReader {
    /// Open an archive and parse its metadata
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut zip = ZipArchive::new(File::open(&path)?)?;
        let metadata = match read_entry(&mut zip, METADATA_FILENAME)? {
            Some(content) => serde_json::from_str(&content)?,
            None => return Err(ArchiveError::MissingEntry(METADATA_FILENAME.to_string())),
        };
        Ok(Self {
            path,
            zip,
            metadata,
        })
    }

    /// Classify what is stored at `path`; never fails
    pub fn state(path: impl AsRef<Path>) -> ArchiveState {
        let path = path.as_ref();
        match fs::metadata(path) {
            Err(_) => return ArchiveState::Missing,
            Ok(m) if m.len() == 0 => return ArchiveState::Placeholder,
            Ok(_) => {}
        }
        match Self::open(path) {
            Ok(reader) => ArchiveState::Valid(reader.metadata),
            Err(e) => {
                debug!(archive = %path.display(), error = %e, "archive is not readable");
                ArchiveState::Invalid(e.to_string())
            }
        }
    }

    /// Stored checksum, if `path` holds a readable archive
    pub fn load_checksum(path: impl AsRef<Path>) -> Option<String> {
        match Self::state(path) {
            ArchiveState::Valid(metadata) => Some(metadata.checksum),
            _ => None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Rows of the payload index; empty when the archive has none
    pub fn index(&mut self) -> ArchiveResult<Vec<IndexRow>> {
        match read_entry(&mut self.zip, INDEX_FILENAME)? {
            Some(content) => codec::decode_index(&content),
            None => Ok(Vec::new()),
        }
    }

    /// Restore the protocol stored by a protocol-mode archive
    pub fn load_protocol(&mut self) -> ArchiveResult<Protocol> {
        self.expect_mode(StorageMode::Protocol)?;
        let stem = self.metadata.stem().to_string();
        let (format, content) = self.find_payload(&stem)?;
        let utterances = format.decode_utterances(&content)?;
        Ok(Protocol::new(
            self.metadata.name.clone(),
            self.metadata.date.clone(),
            utterances,
        ))
    }

    /// Restore the tagged speeches of a speech-mode archive, in index order
    pub fn load_speeches(&mut self) -> ArchiveResult<Vec<SpeechRecord>> {
        self.expect_mode(StorageMode::Speech)?;
        let stem = self.metadata.stem().to_string();
        self.index()?
            .iter()
            .map(|row| {
                let (format, content) = self.find_payload(&format!("{}@{}", stem, row.speech_index))?;
                format.decode_speech(&content, row)
            })
            .collect()
    }

    fn expect_mode(&self, expected: StorageMode) -> ArchiveResult<()> {
        if self.metadata.mode != expected {
            return Err(ArchiveError::WrongMode {
                path: self.path.clone(),
                expected,
                found: self.metadata.mode,
            });
        }
        Ok(())
    }

    /// First payload `<basename>.<ext>` found, trying formats in preference order
    fn find_payload(&mut self, basename: &str) -> ArchiveResult<(PayloadFormat, String)> {
        for format in PayloadFormat::PREFERENCE {
            let name = format!("{}.{}", basename, format.extension());
            if let Some(content) = read_entry(&mut self.zip, &name)? {
                return Ok((format, content));
            }
        }
        Err(ArchiveError::MissingEntry(basename.to_string()))
    }
}

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> ArchiveResult<Option<String>> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}
