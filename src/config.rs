//! YAML configuration
//!
//! ```yaml
//! source:
//!   folder: /data/riksdagen-corpus/corpus
//!   extension: xml
//!   prefix: prot-
//! target:
//!   folder: /data/tagged
//!   extension: zip
//! tagger:
//!   command: stanza-tagger
//!   args: ["--lang", "sv"]
//! preprocess: dedent,strip,pretokenize
//! merge_strategy: by-id
//! min_speech_length: 0
//! storage:
//!   mode: speech
//!   format: csv
//! ```
//!
//! Every key is optional; missing keys take the defaults shown.

use crate::archive::StorageOptions;
use crate::merge::MergeStrategy;
use crate::tagger::SubprocessTaggerConfig;
use crate::text::{TextError, TextPipeline, TransformRegistry, DEFAULT_PIPELINE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid preprocess pipeline: {0}")]
    Text(#[from] TextError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where source protocols are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub folder: PathBuf,
    pub extension: String,
    /// File name prefix of protocol documents; empty matches every file
    pub prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::new(),
            extension: "xml".to_string(),
            prefix: "prot-".to_string(),
        }
    }
}

/// Where archives are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub folder: PathBuf,
    pub extension: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::new(),
            extension: "zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub target: TargetConfig,
    /// External tagger process; required by `tag`
    pub tagger: Option<SubprocessTaggerConfig>,
    /// Comma-separated transform names
    pub preprocess: String,
    pub merge_strategy: MergeStrategy,
    pub min_speech_length: usize,
    pub storage: StorageOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            tagger: None,
            preprocess: DEFAULT_PIPELINE.to_string(),
            merge_strategy: MergeStrategy::default(),
            min_speech_length: 0,
            storage: StorageOptions::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load from a file if `value` names one, otherwise parse it as YAML
    pub fn resolve(value: &str) -> ConfigResult<Self> {
        let path = Path::new(value);
        if path.is_file() {
            Self::load(path)
        } else {
            Self::from_yaml_str(value)
        }
    }

    /// Resolve the preprocess pipeline against the built-in transforms
    pub fn text_pipeline(&self) -> ConfigResult<TextPipeline> {
        self.text_pipeline_with(&TransformRegistry::with_builtins()?)
    }

    /// Resolve the preprocess pipeline against `registry`
    pub fn text_pipeline_with(&self, registry: &TransformRegistry) -> ConfigResult<TextPipeline> {
        Ok(registry.resolve(&self.preprocess)?)
    }

    /// Check everything a tagging run needs, resolving names eagerly
    pub fn validate(&self) -> ConfigResult<()> {
        self.text_pipeline()?;
        if self.source.extension.is_empty() || self.target.extension.is_empty() {
            return Err(ConfigError::Invalid("file extensions cannot be empty".to_string()));
        }
        if self.source.extension == self.target.extension
            && self.source.folder == self.target.folder
        {
            return Err(ConfigError::Invalid(
                "target would overwrite source documents".to_string(),
            ));
        }
        if let Some(tagger) = &self.tagger {
            if tagger.command.trim().is_empty() {
                return Err(ConfigError::Invalid("tagger.command cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Default config file (`~/.config/riksprot-tagger/config.yml` on Linux)
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("riksprot-tagger").join("config.yml")
}
