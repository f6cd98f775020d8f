use std::path::Path;

use crate::{error::SniffError, Result};

/// The textual convention a sequence source follows.
///
/// Determined once per source by structural inspection, never re-sniffed
/// mid-stream. Carried by every [`crate::SeqIndex`] so downstream consumers
/// can serialize records back in their originating convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

impl SequenceFormat {
    /// Determines the format of a source from a bounded prefix of its bytes.
    ///
    /// Only the first non-empty line is inspected: `>` means FASTA, `@` means
    /// FASTQ. Full FASTQ 4-line framing is validated lazily by the index scan
    /// rather than here, so a single pass over the source suffices.
    pub fn sniff(bytes: &[u8], path: &Path) -> Result<Self> {
        for line in bytes.split(|&b| b == b'\n') {
            let line = trim_line(line);
            if line.is_empty() {
                continue;
            }
            return match line[0] {
                b'>' => Ok(Self::Fasta),
                b'@' => Ok(Self::Fastq),
                found => Err(SniffError::UnrecognizedFormat {
                    path: path.to_path_buf(),
                    found: found as char,
                }
                .into()),
            };
        }
        Err(SniffError::EmptySource {
            path: path.to_path_buf(),
        }
        .into())
    }
}

/// Strips a trailing carriage return from a line split on `\n`.
pub(crate) fn trim_line(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}
