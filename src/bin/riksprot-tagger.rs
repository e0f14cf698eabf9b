//! riksprot-tagger CLI: tag ParlaClarin protocols and inspect the archives.
//!
//! Usage:
//!   riksprot-tagger tag [CONFIG] [--source DIR] [--target DIR] [--force]
//!   riksprot-tagger info ARCHIVE [--key name|date|checksum]
//!   riksprot-tagger speeches XML [--strategy by-id|by-speaker|by-chain] [--min-length N]
//!   riksprot-tagger prune [CONFIG] [--delete]

use clap::{Parser, Subcommand, ValueEnum};
use riksprot_tagger::archive::IndexRow;
use riksprot_tagger::config::default_config_path;
use riksprot_tagger::pipeline::sync_delta;
use riksprot_tagger::tagger::SubprocessTagger;
use riksprot_tagger::{
    ArchiveMetadata, ArchiveReader, ArchiveState, Config, MergeStrategy, ProtocolBuilder,
    TaggingPipeline,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "riksprot-tagger",
    version,
    about = "PoS/lemma tagging of ParlaClarin parliamentary protocols"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag every protocol in the source folder
    Tag {
        /// Config file or inline YAML (default: user config file)
        config: Option<String>,
        /// Override source.folder
        #[arg(long)]
        source: Option<PathBuf>,
        /// Override target.folder
        #[arg(long)]
        target: Option<PathBuf>,
        /// Re-tag documents whose checksum is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Print an archive's metadata and index as YAML
    Info {
        archive: PathBuf,
        /// Print a single metadata value
        #[arg(long, value_enum)]
        key: Option<MetadataKey>,
    },
    /// Print the speeches of a protocol document
    Speeches {
        xml: PathBuf,
        #[arg(long, default_value = "by-id")]
        strategy: MergeStrategy,
        /// Drop speeches with shorter text
        #[arg(long, default_value_t = 0)]
        min_length: usize,
    },
    /// List (or delete) archives whose source document is gone
    Prune {
        config: Option<String>,
        #[arg(long)]
        delete: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetadataKey {
    Name,
    Date,
    Checksum,
}

#[derive(Serialize)]
struct ArchiveInfo<'a> {
    archive: &'a Path,
    metadata: &'a ArchiveMetadata,
    index: Vec<IndexRow>,
}

#[derive(Serialize)]
struct SpeechSummary {
    speech_index: usize,
    speech_id: String,
    speaker: String,
    utterances: Vec<String>,
    text: String,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "riksprot_tagger=debug" } else { "riksprot_tagger=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config from the argument, else the user config file, else defaults
fn load_config(value: Option<&str>) -> Result<Config, String> {
    let config = match value {
        Some(value) => Config::resolve(value),
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(config = %path.display(), "using default config");
                Config::load(&path)
            } else {
                Ok(Config::default())
            }
        }
    };
    config.map_err(|e| format!("Failed to load config: {}", e))
}

fn cmd_tag(
    config: Option<&str>,
    source: Option<PathBuf>,
    target: Option<PathBuf>,
    force: bool,
) -> Result<i32, String> {
    let mut config = load_config(config)?;
    if let Some(source) = source {
        config.source.folder = source;
    }
    if let Some(target) = target {
        config.target.folder = target;
    }
    config.validate().map_err(|e| e.to_string())?;

    let tagger_config = config
        .tagger
        .clone()
        .ok_or_else(|| "No tagger configured (tagger.command)".to_string())?;
    let tagger = SubprocessTagger::start(tagger_config).map_err(|e| e.to_string())?;

    let pipeline = TaggingPipeline::from_config(&tagger, &config).map_err(|e| e.to_string())?;
    let summary = pipeline
        .tag_protocols(&config.source, &config.target, force)
        .map_err(|e| e.to_string())?;

    println!(
        "tagged: {}, skipped: {}, empty: {}, failed: {}",
        summary.tagged,
        summary.skipped,
        summary.empty,
        summary.failed.len()
    );
    for failed in &summary.failed {
        eprintln!("  {}: {}", failed.path.display(), failed.error);
    }
    Ok(if summary.is_success() { 0 } else { 1 })
}

fn cmd_info(path: &Path, key: Option<MetadataKey>) -> Result<i32, String> {
    let mut reader = match ArchiveReader::state(path) {
        ArchiveState::Valid(_) => ArchiveReader::open(path).map_err(|e| e.to_string())?,
        ArchiveState::Missing => return Err(format!("{} does not exist", path.display())),
        ArchiveState::Placeholder => {
            println!("{}: placeholder (protocol has no text)", path.display());
            return Ok(0);
        }
        ArchiveState::Invalid(reason) => {
            return Err(format!("{} is not a valid archive: {}", path.display(), reason))
        }
    };

    let metadata = reader.metadata().clone();
    if let Some(key) = key {
        let value = match key {
            MetadataKey::Name => metadata.name.unwrap_or_default(),
            MetadataKey::Date => metadata.date.unwrap_or_default(),
            MetadataKey::Checksum => metadata.checksum,
        };
        println!("{}", value);
        return Ok(0);
    }

    let info = ArchiveInfo {
        archive: path,
        metadata: &metadata,
        index: reader.index().map_err(|e| e.to_string())?,
    };
    print!("{}", serde_yaml::to_string(&info).map_err(|e| e.to_string())?);
    Ok(0)
}

fn cmd_speeches(xml: &Path, strategy: MergeStrategy, min_length: usize) -> Result<i32, String> {
    let built = ProtocolBuilder::new()
        .build_file(xml)
        .map_err(|e| format!("{}: {}", xml.display(), e))?;
    for issue in &built.issues {
        eprintln!("warning: {}", issue);
    }

    let speeches = built
        .protocol
        .to_speeches(strategy, min_length)
        .map_err(|e| e.to_string())?;
    let summaries: Vec<SpeechSummary> = speeches
        .iter()
        .map(|s| SpeechSummary {
            speech_index: s.speech_index,
            speech_id: s.speech_id.clone(),
            speaker: s.speaker.clone(),
            utterances: s.utterances.iter().map(|u| u.id.clone()).collect(),
            text: s.text(),
        })
        .collect();

    print!("{}", serde_yaml::to_string(&summaries).map_err(|e| e.to_string())?);
    Ok(0)
}

fn cmd_prune(config: Option<&str>, delete: bool) -> Result<i32, String> {
    let config = load_config(config)?;
    let stale = sync_delta(&config.source, &config.target, delete).map_err(|e| e.to_string())?;
    for path in &stale {
        println!("{}", path.display());
    }
    info!(stale = stale.len(), deleted = delete, "prune done");
    Ok(0)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Tag {
            config,
            source,
            target,
            force,
        } => cmd_tag(config.as_deref(), source, target, force),
        Commands::Info { archive, key } => cmd_info(&archive, key),
        Commands::Speeches {
            xml,
            strategy,
            min_length,
        } => cmd_speeches(&xml, strategy, min_length),
        Commands::Prune { config, delete } => cmd_prune(config.as_deref(), delete),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
