//! Batch tagging over a source folder tree

use super::tagging::{TagOutcome, TaggingPipeline};
use super::{PipelineError, PipelineResult};
use crate::config::{SourceConfig, TargetConfig};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// A document whose processing failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub error: String,
}

/// Counts of what a batch run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub tagged: usize,
    pub skipped: usize,
    pub empty: usize,
    pub failed: Vec<FailedDocument>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.tagged + self.skipped + self.empty + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: &TagOutcome) {
        match outcome {
            TagOutcome::Empty => self.empty += 1,
            TagOutcome::Skipped { .. } => self.skipped += 1,
            TagOutcome::Tagged { .. } => self.tagged += 1,
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Files under `folder` with `extension`, sorted by path
fn files_with_extension(folder: &Path, extension: &str) -> PipelineResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder) {
        let entry = entry.map_err(|source| PipelineError::Walk {
            path: folder.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Protocol documents under the source folder, sorted by path
pub fn protocol_files(source: &SourceConfig) -> PipelineResult<Vec<PathBuf>> {
    let mut files = files_with_extension(&source.folder, &source.extension)?;
    files.retain(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&source.prefix))
    });
    Ok(files)
}

/// Re-root `path` from `from` to `to`, replacing its extension
fn reroot(path: &Path, from: &Path, to: &Path, extension: &str) -> Option<PathBuf> {
    let relative = path.strip_prefix(from).ok()?;
    Some(to.join(relative).with_extension(extension))
}

/// Archive path for a source document:
/// `<source>/<group>/<stem>.xml` maps to `<target>/<group>/<stem>.zip`
pub fn target_path(source: &SourceConfig, target: &TargetConfig, input: &Path) -> Option<PathBuf> {
    reroot(input, &source.folder, &target.folder, &target.extension)
}

/// Source document path an archive was produced from
pub fn source_path(source: &SourceConfig, target: &TargetConfig, archive: &Path) -> Option<PathBuf> {
    reroot(archive, &target.folder, &source.folder, &source.extension)
}

impl TaggingPipeline<'_> {
    /// Tag every protocol under the source folder.
    ///
    /// A failing document is logged and recorded in the summary; the run
    /// continues with the next document.
    pub fn tag_protocols(
        &self,
        source: &SourceConfig,
        target: &TargetConfig,
        force: bool,
    ) -> PipelineResult<BatchSummary> {
        let files = protocol_files(source)?;
        info!(
            source = %source.folder.display(),
            target = %target.folder.display(),
            documents = files.len(),
            "tagging protocols"
        );

        let mut summary = BatchSummary::default();
        for input in files {
            let Some(output) = target_path(source, target, &input) else {
                warn!(path = %input.display(), "document is outside the source folder");
                continue;
            };
            match self.tag_protocol_file(&input, &output, force) {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!(document = %input.display(), error = %e, "document failed");
                    summary.failed.push(FailedDocument {
                        path: input,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            tagged = summary.tagged,
            skipped = summary.skipped,
            empty = summary.empty,
            failed = summary.failed.len(),
            "tagging done"
        );
        Ok(summary)
    }
}

/// Archives in the target folder whose source document no longer exists.
///
/// With `delete`, the stale archives are removed as well.
pub fn sync_delta(source: &SourceConfig, target: &TargetConfig, delete: bool) -> PipelineResult<Vec<PathBuf>> {
    if !target.folder.exists() {
        return Ok(Vec::new());
    }

    let mut stale = Vec::new();
    for archive in files_with_extension(&target.folder, &target.extension)? {
        let orphaned = source_path(source, target, &archive).map_or(true, |path| !path.is_file());
        if !orphaned {
            continue;
        }
        if delete {
            std::fs::remove_file(&archive).map_err(|source| PipelineError::Io {
                path: archive.clone(),
                source,
            })?;
            info!(archive = %archive.display(), "removed stale archive");
        }
        stale.push(archive);
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout(root: &Path) -> (SourceConfig, TargetConfig) {
        (
            SourceConfig {
                folder: root.join("corpus"),
                ..SourceConfig::default()
            },
            TargetConfig {
                folder: root.join("tagged"),
                ..TargetConfig::default()
            },
        )
    }

    #[test]
    fn maps_source_documents_to_archives_and_back() {
        let (source, target) = layout(Path::new("/data"));
        let input = Path::new("/data/corpus/1958/prot-1958-fake.xml");
        let archive = target_path(&source, &target, input).unwrap();
        assert_eq!(archive, PathBuf::from("/data/tagged/1958/prot-1958-fake.zip"));
        assert_eq!(source_path(&source, &target, &archive).unwrap(), input);
        assert_eq!(target_path(&source, &target, Path::new("/elsewhere/prot.xml")), None);
    }

    #[test]
    fn protocol_files_filters_prefix_and_extension() {
        let dir = TempDir::new().unwrap();
        let (source, _) = layout(dir.path());
        fs::create_dir_all(source.folder.join("1958")).unwrap();
        fs::create_dir_all(source.folder.join("1959")).unwrap();
        for name in [
            "1959/prot-1959-b.xml",
            "1958/prot-1958-a.xml",
            "1958/person.xml",
            "1958/prot-1958-a.txt",
        ] {
            fs::write(source.folder.join(name), "").unwrap();
        }

        let files = protocol_files(&source).unwrap();
        assert_eq!(
            files,
            vec![
                source.folder.join("1958/prot-1958-a.xml"),
                source.folder.join("1959/prot-1959-b.xml"),
            ]
        );
    }

    #[test]
    fn sync_delta_finds_and_deletes_orphans() {
        let dir = TempDir::new().unwrap();
        let (source, target) = layout(dir.path());
        fs::create_dir_all(source.folder.join("1958")).unwrap();
        fs::create_dir_all(target.folder.join("1958")).unwrap();
        fs::write(source.folder.join("1958/prot-1958-a.xml"), "").unwrap();
        fs::write(target.folder.join("1958/prot-1958-a.zip"), "").unwrap();
        fs::write(target.folder.join("1958/prot-1958-gone.zip"), "").unwrap();

        let stale = sync_delta(&source, &target, false).unwrap();
        assert_eq!(stale, vec![target.folder.join("1958/prot-1958-gone.zip")]);
        assert!(stale[0].exists());

        sync_delta(&source, &target, true).unwrap();
        assert!(!stale[0].exists());
        assert!(target.folder.join("1958/prot-1958-a.zip").exists());
    }

    #[test]
    fn sync_delta_without_target_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let (source, target) = layout(dir.path());
        assert!(sync_delta(&source, &target, true).unwrap().is_empty());
    }
}
