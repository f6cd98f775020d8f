use std::borrow::Cow;
use std::io::{self, Write};

use crate::SequenceFormat;

/// A zero-copy view of one named sequence entry resolved from a [`crate::SeqIndex`].
///
/// The name and optional description/quality borrow directly from the
/// memory-mapped source. The sequence is borrowed when it sits on a single
/// physical line and owned only when hard-wrapping forces the physical lines
/// to be concatenated.
///
/// Invariant: for FASTQ-origin records `quality` is present and its length
/// equals the sequence length (enforced at index build time).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a [u8]>,
    pub(crate) sequence: Cow<'a, [u8]>,
    pub(crate) quality: Option<&'a [u8]>,
    pub(crate) format: SequenceFormat,
}

impl<'a> Record<'a> {
    /// Returns the record name (the header token up to the first whitespace).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the header text after the name, if any.
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&'a [u8]> {
        self.description
    }

    /// Returns the logical sequence with any hard-wrap transparently unwrapped.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns the quality string if present (FASTQ origin).
    #[inline]
    #[must_use]
    pub fn quality(&self) -> Option<&'a [u8]> {
        self.quality
    }

    /// Returns the originating format of this record.
    #[inline]
    #[must_use]
    pub fn format(&self) -> SequenceFormat {
        self.format
    }

    /// Returns the sequence length in bases.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Serializes this record in its originating format.
    ///
    /// FASTA records are written unwrapped (`>name desc`, sequence on one
    /// line); FASTQ records with 4-line framing and a bare `+` separator.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_with_name(self.name, writer)
    }

    /// Serializes this record under a caller-supplied name, dropping the
    /// original description. Used by the rename path.
    pub fn write_renamed<W: Write>(&self, name: &str, writer: &mut W) -> io::Result<()> {
        match self.format {
            SequenceFormat::Fasta => {
                write_fasta(writer, name.as_bytes(), None, &self.sequence)
            }
            SequenceFormat::Fastq => write_fastq(
                writer,
                name.as_bytes(),
                None,
                &self.sequence,
                self.quality.unwrap_or(b""),
            ),
        }
    }

    fn write_with_name<W: Write>(&self, name: &str, writer: &mut W) -> io::Result<()> {
        match self.format {
            SequenceFormat::Fasta => {
                write_fasta(writer, name.as_bytes(), self.description, &self.sequence)
            }
            SequenceFormat::Fastq => write_fastq(
                writer,
                name.as_bytes(),
                self.description,
                &self.sequence,
                self.quality.unwrap_or(b""),
            ),
        }
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    prefix: &[u8],
    name: &[u8],
    description: Option<&[u8]>,
) -> io::Result<()> {
    writer.write_all(prefix)?;
    writer.write_all(name)?;
    if let Some(desc) = description {
        writer.write_all(b" ")?;
        writer.write_all(desc)?;
    }
    writer.write_all(b"\n")
}

/// Writes one record with the FASTA textual convention, sequence unwrapped.
pub(crate) fn write_fasta<W: Write>(
    writer: &mut W,
    name: &[u8],
    description: Option<&[u8]>,
    seq: &[u8],
) -> io::Result<()> {
    write_header(writer, b">", name, description)?;
    writer.write_all(seq)?;
    writer.write_all(b"\n")
}

/// Writes one record with the FASTQ 4-line convention.
pub(crate) fn write_fastq<W: Write>(
    writer: &mut W,
    name: &[u8],
    description: Option<&[u8]>,
    seq: &[u8],
    qual: &[u8],
) -> io::Result<()> {
    write_header(writer, b"@", name, description)?;
    writer.write_all(seq)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")
}
