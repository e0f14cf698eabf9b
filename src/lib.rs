//! riksprot-tagger: incremental annotation of parliamentary protocols
//!
//! Reads ParlaClarin (TEI) protocol documents, reconstructs the speeches
//! they encode, and drives a PoS/lemma tagger over them, skipping
//! documents whose text has not changed since they were last tagged.
//!
//! # Core Concepts
//!
//! - **Protocol**: one parliamentary-sitting document, a flat list of utterances
//! - **Utterance**: one fragment of spoken text, linked to its neighbours by `prev`/`next`
//! - **Speech**: speaker-consistent utterances merged under a [`MergeStrategy`]
//! - **Archive**: one ZIP per protocol holding the tagged output and the
//!   checksum of the text it was produced from
//!
//! # Example
//!
//! ```
//! use riksprot_tagger::{MergeStrategy, ProtocolBuilder};
//!
//! let xml = r#"<TEI><text><body>
//!     <u xml:id="i-1" who="A" next="i-2"><seg>Herr talman!</seg></u>
//!     <u xml:id="i-2" who="A" prev="i-1"><seg>Jag yrkar bifall.</seg></u>
//! </body></text></TEI>"#;
//!
//! let built = ProtocolBuilder::new().with_name("prot-1958-fake").build_str(xml).unwrap();
//! let speeches = built.protocol.to_speeches(MergeStrategy::ByChain, 0).unwrap();
//! assert_eq!(speeches.len(), 1);
//! ```

pub mod archive;
pub mod checksum;
pub mod config;
pub mod merge;
mod model;
pub mod pipeline;
pub mod source;
pub mod tagger;
pub mod text;

pub use archive::{
    ArchiveError, ArchiveMetadata, ArchiveReader, ArchiveResult, ArchiveState, ArchiveWriter,
    PayloadFormat, StorageMode, StorageOptions,
};
pub use config::{Config, ConfigError, ConfigResult};
pub use merge::{MergeStrategy, SpeechMerger};
pub use model::{
    resolve_chains, ChainResolution, LinkIssue, LinkIssueKind, ModelError, ModelResult, Protocol,
    Speech, Utterance, UNDEFINED_SPEAKER,
};
pub use pipeline::{BatchSummary, PipelineError, PipelineResult, TagOutcome, TaggingPipeline};
pub use source::{BuiltProtocol, ProtocolBuilder, SourceError, SourceResult, XmlElement};
pub use tagger::{MockTagger, SubprocessTagger, TaggedDocument, Tagger, TaggerError, TaggerResult};
pub use text::{TextError, TextPipeline, TextResult, TransformRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
