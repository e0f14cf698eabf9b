//! Corpus fixtures for integration tests

use riksprot_tagger::config::{SourceConfig, TargetConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Root of the checked-in fixture protocols
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path of a fixture relative to [`fixture_root`]
pub fn fixture_path(relative: &str) -> PathBuf {
    fixture_root().join(relative)
}

/// One `<u>` element; `prev`/`next` are omitted when `None`
pub fn utterance_xml(id: &str, who: &str, prev: Option<&str>, next: Option<&str>, segs: &[&str]) -> String {
    let mut attributes = format!(r#"xml:id="{}" who="{}""#, id, who);
    if let Some(prev) = prev {
        attributes.push_str(&format!(r#" prev="{}""#, prev));
    }
    if let Some(next) = next {
        attributes.push_str(&format!(r#" next="{}""#, next));
    }
    let segs: String = segs.iter().map(|s| format!("<seg>{}</seg>", s)).collect();
    format!("<u {}>{}</u>", attributes, segs)
}

/// A minimal ParlaClarin document around `utterances`
pub fn protocol_xml(date: &str, utterances: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<teiCorpus xmlns="http://www.tei-c.org/ns/1.0">
  <TEI>
    <text>
      <body>
        <div type="debateSection">
          <docDate when="{}">{}</docDate>
          {}
        </div>
      </body>
    </text>
  </TEI>
</teiCorpus>
"#,
        date,
        date,
        utterances.join("\n          ")
    )
}

/// Source and target folders in a temp dir, laid out as
/// `<root>/corpus/<year>/<stem>.xml` and `<root>/tagged/<year>/<stem>.zip`
pub struct TestCorpus {
    dir: TempDir,
    pub source: SourceConfig,
    pub target: TargetConfig,
}

impl Default for TestCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCorpus {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = SourceConfig {
            folder: dir.path().join("corpus"),
            ..SourceConfig::default()
        };
        let target = TargetConfig {
            folder: dir.path().join("tagged"),
            ..TargetConfig::default()
        };
        fs::create_dir_all(&source.folder).expect("Failed to create source folder");
        Self { dir, source, target }
    }

    /// Copy every fixture protocol into the source folder
    pub fn with_fixtures(self) -> Self {
        let root = fixture_root();
        for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).expect("fixture under root");
            let destination = self.source.folder.join(relative);
            fs::create_dir_all(destination.parent().expect("fixture has a parent"))
                .expect("Failed to create fixture folder");
            fs::copy(entry.path(), &destination).expect("Failed to copy fixture");
        }
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `xml` as `<source>/<group>/<stem>.xml`
    pub fn add_protocol(&self, group: &str, stem: &str, xml: &str) -> PathBuf {
        let path = self.source.folder.join(group).join(format!("{}.xml", stem));
        fs::create_dir_all(path.parent().expect("protocol has a parent"))
            .expect("Failed to create group folder");
        fs::write(&path, xml).expect("Failed to write protocol");
        path
    }

    pub fn protocol_path(&self, group: &str, stem: &str) -> PathBuf {
        self.source.folder.join(group).join(format!("{}.xml", stem))
    }

    pub fn archive_path(&self, group: &str, stem: &str) -> PathBuf {
        self.target.folder.join(group).join(format!("{}.zip", stem))
    }

    /// Every file under the target folder, sorted
    pub fn target_files(&self) -> Vec<PathBuf> {
        if !self.target.folder.exists() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.target.folder)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}
