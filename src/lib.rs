//! Name-indexed random access to FASTA/FASTQ files.
//!
//! A [`SeqIndex`] maps record names to byte spans inside a memory-mapped
//! sequence file, so large files can be queried, summarized, and intersected
//! without being loaded into memory. Built on top of the index are the
//! per-file/multi-file statistics engine ([`summarize`], [`summarize_files`])
//! and the two-collection name intersection ([`intersect`],
//! [`write_intersection`]).

mod cache;
mod error;
mod format;
mod index;
mod intersect;
mod parallel;
mod record;
mod rename;
mod stats;

pub use cache::{remove_sidecar, sidecar_path};
pub use error::{CacheError, Error, Result, ScanError, SniffError};
pub use format::SequenceFormat;
pub use index::SeqIndex;
pub use intersect::{intersect, write_intersection};
pub use parallel::process_ordered;
pub use record::Record;
pub use rename::{lookup_or_suggest, rename_records, NameSuggester};
pub use stats::{
    grand_total, per_record, summarize, summarize_files, AggregateStats, FileSummary, RecordStats,
};

/// Magic number identifying a persisted index side-car.
pub const SIDECAR_MAGIC: &[u8; 8] = b"SDXINDEX";
/// Current side-car layout version.
pub const SIDECAR_VERSION: u8 = 1;
/// Extension appended to the source path to derive its side-car path.
pub const SIDECAR_EXT: &str = "sdx";

/// Default worker count for multi-file operations (sequential).
pub const DEFAULT_THREADS: usize = 1;
