//! Per-record and per-file length/GC statistics.
//!
//! All statistics are derived values: computed in one pass over the records
//! reachable from an index, never mutated afterwards, recomputed wholesale if
//! the inputs change. GC content is counted case-insensitively; a zero-length
//! denominator is signalled as `None` rather than divided by.

use std::path::{Path, PathBuf};

use crate::{parallel::process_ordered, Result, SeqIndex};

/// File-level aggregate statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub sequence_count: u64,
    pub total_length: u64,
    pub gc_bases: u64,
}

impl AggregateStats {
    /// G+C fraction over the concatenation of all sequences, or `None` when
    /// there are no bases to classify.
    #[must_use]
    pub fn gc_fraction(&self) -> Option<f64> {
        if self.total_length == 0 {
            None
        } else {
            Some(self.gc_bases as f64 / self.total_length as f64)
        }
    }
}

/// One per-record statistics row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStats {
    pub name: String,
    pub length: u64,
    pub gc_bases: u64,
}

impl RecordStats {
    /// G+C fraction of this record, or `None` for a zero-length sequence.
    #[must_use]
    pub fn gc_fraction(&self) -> Option<f64> {
        if self.length == 0 {
            None
        } else {
            Some(self.gc_bases as f64 / self.length as f64)
        }
    }
}

/// The outcome of summarizing one input file.
///
/// A failed file keeps its row (and its input position) so sibling files are
/// unaffected; the error identifies the cause for that file specifically.
#[derive(Debug)]
pub struct FileSummary {
    pub path: PathBuf,
    pub stats: Result<AggregateStats>,
}

fn gc_count(seq: &[u8]) -> u64 {
    // case-insensitive without allocating an upper-cased copy
    seq.iter()
        .filter(|&&b| matches!(b, b'G' | b'g' | b'C' | b'c'))
        .count() as u64
}

/// Computes file-level aggregates in one pass over the indexed records.
#[must_use]
pub fn summarize(index: &SeqIndex) -> AggregateStats {
    let mut stats = AggregateStats::default();
    for record in index.records() {
        let seq = record.sequence();
        stats.sequence_count += 1;
        stats.total_length += seq.len() as u64;
        stats.gc_bases += gc_count(seq);
    }
    stats
}

/// Computes one statistics row per record, in first-seen order.
#[must_use]
pub fn per_record(index: &SeqIndex) -> Vec<RecordStats> {
    index
        .records()
        .map(|record| {
            let seq = record.sequence();
            RecordStats {
                name: record.name().to_string(),
                length: seq.len() as u64,
                gc_bases: gc_count(seq),
            }
        })
        .collect()
}

/// Indexes and summarizes many files on a bounded worker pool.
///
/// Rows come back in input file order regardless of the concurrency level or
/// completion order. A file that fails to index yields a row carrying the
/// error plus one diagnostic line, and does not abort its siblings.
#[must_use]
pub fn summarize_files<P: AsRef<Path> + Sync>(paths: &[P], threads: usize) -> Vec<FileSummary> {
    process_ordered(paths, threads, |_, path| {
        let path = path.as_ref();
        let stats = SeqIndex::build(path).map(|index| summarize(&index));
        if let Err(err) = &stats {
            log::warn!("Skipping {}: {err}", path.display());
        }
        FileSummary {
            path: path.to_path_buf(),
            stats,
        }
    })
}

/// Sums the successful rows of a multi-file run into one grand total.
#[must_use]
pub fn grand_total(summaries: &[FileSummary]) -> AggregateStats {
    let mut total = AggregateStats::default();
    for summary in summaries {
        if let Ok(stats) = &summary.stats {
            total.sequence_count += stats.sequence_count;
            total.total_length += stats.total_length;
            total.gc_bases += stats.gc_bases;
        }
    }
    total
}
