use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memchr::memchr;
use memmap2::Mmap;

use crate::format::trim_line;
use crate::{cache, error::ScanError, Error, Record, Result, SequenceFormat};

/// The location of one record inside its source: a byte span sufficient to
/// reconstruct the record, plus the header line number for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RecordSpan {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) line: usize,
}

/// A name-to-location index over a memory-mapped FASTA/FASTQ source.
///
/// Built by one scan of the source. Lookups resolve byte spans lazily, so
/// memory stays proportional to the records actually requested rather than
/// the file size. Keys are unique: duplicate names keep their first
/// occurrence and are collected as warnings (or abort the build in strict
/// mode). Entries are stale by contract if the source file is mutated after
/// indexing.
#[derive(Debug)]
pub struct SeqIndex {
    pub(crate) source: PathBuf,
    pub(crate) data: Arc<Mmap>,
    pub(crate) format: SequenceFormat,
    pub(crate) spans: HashMap<String, RecordSpan>,
    /// Key order as first seen in the source.
    pub(crate) order: Vec<String>,
    pub(crate) warnings: Vec<ScanError>,
}

impl SeqIndex {
    /// Builds an index by scanning the source once. Duplicate names are
    /// collected as warnings, first occurrence wins.
    pub fn build<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build_with(path, false)
    }

    /// Builds an index, aborting on the first duplicate name when `strict`.
    pub fn build_with<P: AsRef<Path>>(path: P, strict: bool) -> Result<Self> {
        let path = path.as_ref();
        let data = map_source(path)?;
        Self::build_from_mmap(path, data, strict)
    }

    /// Buffers a stream into `scratch` and indexes it from there.
    ///
    /// Indexing requires random access, so stdin-like sources must be spooled
    /// to an addressable file first. The caller owns the scratch file.
    pub fn build_from_reader<R: io::Read, P: AsRef<Path>>(
        reader: &mut R,
        scratch: P,
    ) -> Result<Self> {
        let scratch = scratch.as_ref();
        let mut out = io::BufWriter::new(fs::File::create(scratch)?);
        io::copy(reader, &mut out)?;
        out.into_inner().map_err(io::IntoInnerError::into_error)?;
        Self::build(scratch)
    }

    /// Builds an index, reusing the source's persisted side-car when one is
    /// present and current.
    ///
    /// A missing, stale, or corrupt side-car triggers a fresh scan followed by
    /// a best-effort rewrite of the side-car; the side-car is an optimization,
    /// never a correctness requirement. Duplicate-name warnings are a
    /// build-time diagnostic and are not persisted, so a reloaded index
    /// carries none.
    pub fn load_or_build<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = map_source(path)?;
        match cache::read_sidecar(path, data.len() as u64) {
            Ok(contents) => {
                log::info!("Reusing index side-car for {}", path.display());
                Ok(Self::from_parts(
                    path.to_path_buf(),
                    Arc::new(data),
                    contents.format,
                    contents.entries,
                ))
            }
            Err(err) => {
                if !is_missing_sidecar(&err) {
                    log::warn!("Discarding index side-car for {}: {err}", path.display());
                }
                let index = Self::build_from_mmap(path, data, false)?;
                if let Err(err) = index.persist() {
                    log::warn!(
                        "Could not persist index side-car for {}: {err}",
                        path.display()
                    );
                }
                Ok(index)
            }
        }
    }

    /// Writes this index to its side-car, returning the side-car path.
    pub fn persist(&self) -> Result<PathBuf> {
        cache::write_sidecar(self)
    }

    fn build_from_mmap(path: &Path, data: Mmap, strict: bool) -> Result<Self> {
        let format = SequenceFormat::sniff(&data, path)?;
        let scan = match format {
            SequenceFormat::Fasta => scan_fasta(&data, path, strict),
            SequenceFormat::Fastq => scan_fastq(&data, path, strict),
        }?;
        log::info!(
            "Indexed {} records from {} ({} duplicate names)",
            scan.order.len(),
            path.display(),
            scan.warnings.len()
        );
        Ok(Self {
            source: path.to_path_buf(),
            data: Arc::new(data),
            format,
            spans: scan.spans,
            order: scan.order,
            warnings: scan.warnings,
        })
    }

    pub(crate) fn from_parts(
        source: PathBuf,
        data: Arc<Mmap>,
        format: SequenceFormat,
        entries: Vec<(String, RecordSpan)>,
    ) -> Self {
        let mut spans = HashMap::with_capacity(entries.len());
        let mut order = Vec::with_capacity(entries.len());
        for (name, span) in entries {
            order.push(name.clone());
            spans.insert(name, span);
        }
        Self {
            source,
            data,
            format,
            spans,
            order,
            warnings: Vec::new(),
        }
    }

    /// Resolves a name to its full record, or `Error::NotFound`.
    ///
    /// Repeated calls for the same name return byte-identical content; letter
    /// case is preserved as stored.
    pub fn get(&self, name: &str) -> Result<Record<'_>> {
        match self.spans.get_key_value(name) {
            Some((key, span)) => Ok(self.resolve(key, span)),
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.spans.contains_key(name)
    }

    /// Record names in first-seen order, without re-scanning the source.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Resolved records in first-seen order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.order.iter().map(move |name| {
            let span = &self.spans[name.as_str()];
            self.resolve(name, span)
        })
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn format(&self) -> SequenceFormat {
        self.format
    }

    /// Path of the indexed source file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Duplicate-name warnings collected during a non-strict build.
    #[must_use]
    pub fn warnings(&self) -> &[ScanError] {
        &self.warnings
    }

    fn resolve<'a>(&'a self, name: &'a str, span: &RecordSpan) -> Record<'a> {
        let slice = &self.data[span.start..span.end.min(self.data.len())];
        match self.format {
            SequenceFormat::Fasta => resolve_fasta(slice, name),
            SequenceFormat::Fastq => resolve_fastq(slice, name),
        }
    }
}

fn map_source(path: &Path) -> Result<Mmap> {
    let unreadable = |source: io::Error| Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(unreadable)?;
    let len = file.metadata().map_err(unreadable)?.len();
    if len == 0 {
        return Err(crate::SniffError::EmptySource {
            path: path.to_path_buf(),
        }
        .into());
    }
    unsafe { Mmap::map(&file) }.map_err(unreadable)
}

fn is_missing_sidecar(err: &Error) -> bool {
    matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::NotFound)
}

/// The name is the header token up to the first whitespace.
fn name_token(header: &[u8]) -> Result<&str> {
    let end = header
        .iter()
        .position(|&b| b == b' ' || b == b'\t')
        .unwrap_or(header.len());
    Ok(std::str::from_utf8(&header[..end])?)
}

/// Header text after the name token, if any.
fn description_of(header: &[u8], name_len: usize) -> Option<&[u8]> {
    let rest = &header[name_len..];
    let start = rest.iter().position(|&b| b != b' ' && b != b'\t')?;
    Some(&rest[start..])
}

fn resolve_fasta<'a>(slice: &'a [u8], name: &'a str) -> Record<'a> {
    let mut lines = slice.split(|&b| b == b'\n').map(trim_line);
    // header line was validated to start with '>' during the scan
    let header = &lines.next().unwrap_or(b">")[1..];
    let description = description_of(header, name.len());

    let seq_lines: Vec<&[u8]> = lines.filter(|line| !line.is_empty()).collect();
    let sequence = match seq_lines.as_slice() {
        [] => Cow::Borrowed(&b""[..]),
        [line] => Cow::Borrowed(*line),
        wrapped => Cow::Owned(wrapped.concat()),
    };

    Record {
        name,
        description,
        sequence,
        quality: None,
        format: SequenceFormat::Fasta,
    }
}

fn resolve_fastq<'a>(slice: &'a [u8], name: &'a str) -> Record<'a> {
    let mut lines = slice.split(|&b| b == b'\n').map(trim_line);
    let header = &lines.next().unwrap_or(b"@")[1..];
    let description = description_of(header, name.len());
    let sequence = lines.next().unwrap_or(b"");
    let _separator = lines.next();
    let quality = lines.next().unwrap_or(b"");

    Record {
        name,
        description,
        sequence: Cow::Borrowed(sequence),
        quality: Some(quality),
        format: SequenceFormat::Fastq,
    }
}

#[derive(Default)]
struct Scan {
    spans: HashMap<String, RecordSpan>,
    order: Vec<String>,
    warnings: Vec<ScanError>,
}
impl Scan {
    fn insert(&mut self, path: &Path, strict: bool, name: String, span: RecordSpan) -> Result<()> {
        if self.spans.contains_key(&name) {
            let dup = ScanError::DuplicateName {
                path: path.to_path_buf(),
                name,
                line: span.line,
            };
            if strict {
                return Err(dup.into());
            }
            log::warn!("{dup}");
            self.warnings.push(dup);
        } else {
            self.order.push(name.clone());
            self.spans.insert(name, span);
        }
        Ok(())
    }
}

/// Yields `(start_offset, line_without_newline)` pairs and tracks line numbers.
struct LineCursor<'a> {
    data: &'a [u8],
    offset: usize,
    line_no: usize,
}
impl<'a> LineCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a [u8])> {
        if self.offset >= self.data.len() {
            return None;
        }
        let start = self.offset;
        let end = memchr(b'\n', &self.data[start..]).map_or(self.data.len(), |p| start + p);
        self.offset = end + 1;
        self.line_no += 1;
        Some((start, trim_line(&self.data[start..end])))
    }
}

/// A FASTA record begins at a `>` line and owns every following line up to
/// the next `>` line (hard-wrap is unwrapped at resolve time).
fn scan_fasta(data: &[u8], path: &Path, strict: bool) -> Result<Scan> {
    let mut scan = Scan::default();
    let mut cursor = LineCursor::new(data);
    let mut open: Option<(String, usize, usize)> = None;

    while let Some((start, line)) = cursor.next_line() {
        if line.first() == Some(&b'>') {
            if let Some((name, rec_start, rec_line)) = open.take() {
                let span = RecordSpan {
                    start: rec_start,
                    end: start,
                    line: rec_line,
                };
                scan.insert(path, strict, name, span)?;
            }
            let name = name_token(&line[1..])?.to_string();
            open = Some((name, start, cursor.line_no));
        }
    }
    if let Some((name, rec_start, rec_line)) = open.take() {
        let span = RecordSpan {
            start: rec_start,
            end: data.len(),
            line: rec_line,
        };
        scan.insert(path, strict, name, span)?;
    }
    Ok(scan)
}

/// FASTQ records are fixed 4-line groups; no blank line is permitted anywhere
/// in a well-formed stream, and the quality length must equal the sequence
/// length. Any violation is fatal to the whole build - a partial index would
/// silently misrepresent the file downstream.
fn scan_fastq(data: &[u8], path: &Path, strict: bool) -> Result<Scan> {
    let mut scan = Scan::default();
    let mut cursor = LineCursor::new(data);

    while let Some((start, header)) = cursor.next_line() {
        let header_line = cursor.line_no;
        if header.is_empty() {
            return Err(ScanError::BlankLine {
                path: path.to_path_buf(),
                line: header_line,
            }
            .into());
        }
        if header[0] != b'@' {
            return Err(ScanError::GroupHeader {
                path: path.to_path_buf(),
                line: header_line,
            }
            .into());
        }
        let name = name_token(&header[1..])?.to_string();

        let sequence = fastq_group_line(&mut cursor, path, &name, header_line)?;
        let separator = fastq_group_line(&mut cursor, path, &name, header_line)?;
        if separator.first() != Some(&b'+') {
            return Err(ScanError::GroupSeparator {
                path: path.to_path_buf(),
                name,
                line: cursor.line_no,
            }
            .into());
        }
        let quality = fastq_group_line(&mut cursor, path, &name, header_line)?;
        if quality.len() != sequence.len() {
            return Err(ScanError::QualityLength {
                path: path.to_path_buf(),
                name,
                sequence: sequence.len(),
                quality: quality.len(),
            }
            .into());
        }

        let span = RecordSpan {
            start,
            end: cursor.offset.min(data.len()),
            line: header_line,
        };
        scan.insert(path, strict, name, span)?;
    }
    Ok(scan)
}

fn fastq_group_line<'a>(
    cursor: &mut LineCursor<'a>,
    path: &Path,
    name: &str,
    header_line: usize,
) -> Result<&'a [u8]> {
    let Some((_, line)) = cursor.next_line() else {
        return Err(ScanError::TruncatedGroup {
            path: path.to_path_buf(),
            name: name.to_string(),
            line: header_line,
        }
        .into());
    };
    if line.is_empty() {
        return Err(ScanError::BlankLine {
            path: path.to_path_buf(),
            line: cursor.line_no,
        }
        .into());
    }
    Ok(line)
}
