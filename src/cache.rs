//! Persisted index side-car.
//!
//! An optional on-disk artifact that lets repeated invocations against the
//! same unmodified source skip the scan. The layout is an implementation
//! detail, not a compatibility contract: a [`bytemuck`] Pod header carrying
//! the magic, layout version, and the source's byte length (the staleness
//! check), a zstd-compressed entry payload, and a Pod footer with a trailing
//! magic. Writes go to a process-unique temp path and are published with an
//! atomic rename; the lifecycle (reuse, deletion) is owned by the caller.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytemuck::{Pod, Zeroable};
use zstd::stream::{copy_decode, copy_encode};

use crate::error::CacheError;
use crate::index::{RecordSpan, SeqIndex};
use crate::{Result, SequenceFormat, SIDECAR_EXT, SIDECAR_MAGIC, SIDECAR_VERSION};

const FORMAT_FASTA: u8 = 0;
const FORMAT_FASTQ: u8 = 1;
const COMPRESSION_LEVEL: i32 = 3;

/// The header for a persisted side-car.
///
/// This is stored identically in memory and on disk.
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct SidecarHeader {
    /// Magic number identifying the side-car format
    magic: [u8; 8],
    /// Side-car layout version
    version: u8,
    /// Source format tag (0 = FASTA, 1 = FASTQ)
    format: u8,
    /// Reserved for future use
    reserved: [u8; 6],
    /// Byte length of the source file when the index was built
    source_bytes: u64,
    /// Number of records in the entry payload
    num_records: u64,
    /// Number of bytes in the uncompressed entry payload
    u_bytes: u64,
    /// Number of bytes in the compressed entry payload
    z_bytes: u64,
}

/// The footer for a persisted side-car.
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct SidecarFooter {
    /// Number of bytes in the compressed entry payload
    z_bytes: u64,
    /// Magic number identifying the side-car format
    magic: [u8; 8],
}

/// Derives the side-car path for a source file.
///
/// Deterministic per source path, so concurrent workers over distinct sources
/// never collide on a cache file.
#[must_use]
pub fn sidecar_path(source: &Path) -> PathBuf {
    let mut os = source.as_os_str().to_os_string();
    os.push(".");
    os.push(SIDECAR_EXT);
    PathBuf::from(os)
}

/// Deletes the side-car of a source file, returning whether one existed.
pub fn remove_sidecar(source: &Path) -> std::io::Result<bool> {
    match fs::remove_file(sidecar_path(source)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Debug)]
pub(crate) struct SidecarContents {
    pub(crate) format: SequenceFormat,
    pub(crate) entries: Vec<(String, RecordSpan)>,
}

/// Reads and validates the side-car of `source`, failing with a stale-cache
/// error when the recorded source length does not match `actual_len`.
pub(crate) fn read_sidecar(source: &Path, actual_len: u64) -> Result<SidecarContents> {
    let path = sidecar_path(source);
    let bytes = fs::read(&path)?;

    let header_size = size_of::<SidecarHeader>();
    let footer_size = size_of::<SidecarFooter>();
    if bytes.len() < header_size + footer_size {
        return Err(CacheError::Truncated { path }.into());
    }

    let header: SidecarHeader = bytemuck::pod_read_unaligned(&bytes[..header_size]);
    if header.magic != *SIDECAR_MAGIC {
        return Err(CacheError::InvalidMagic { path }.into());
    }
    if header.version != SIDECAR_VERSION {
        return Err(CacheError::UnsupportedVersion {
            version: header.version,
            path,
        }
        .into());
    }
    if header.source_bytes != actual_len {
        return Err(CacheError::SourceLengthMismatch {
            path,
            recorded: header.source_bytes,
            actual: actual_len,
        }
        .into());
    }
    let format = match header.format {
        FORMAT_FASTA => SequenceFormat::Fasta,
        FORMAT_FASTQ => SequenceFormat::Fastq,
        _ => return Err(CacheError::CorruptPayload { path }.into()),
    };

    let z_end = header_size + header.z_bytes as usize;
    if bytes.len() < z_end + footer_size {
        return Err(CacheError::Truncated { path }.into());
    }
    let footer: SidecarFooter = bytemuck::pod_read_unaligned(&bytes[z_end..z_end + footer_size]);
    if footer.magic != *SIDECAR_MAGIC || footer.z_bytes != header.z_bytes {
        return Err(CacheError::InvalidMagic { path }.into());
    }

    let mut payload = Vec::with_capacity(header.u_bytes as usize);
    copy_decode(&bytes[header_size..z_end], &mut payload)?;
    if payload.len() as u64 != header.u_bytes {
        return Err(CacheError::CorruptPayload { path }.into());
    }

    let entries = decode_entries(&payload, header.num_records as usize)
        .ok_or(CacheError::CorruptPayload { path })?;
    Ok(SidecarContents { format, entries })
}

/// Serializes an index to its side-car, publishing it with an atomic rename.
pub(crate) fn write_sidecar(index: &SeqIndex) -> Result<PathBuf> {
    let path = sidecar_path(index.source());

    let mut payload = Vec::new();
    for name in index.keys() {
        let span = index.spans[name];
        payload.write_u32::<LittleEndian>(name.len() as u32)?;
        payload.write_all(name.as_bytes())?;
        payload.write_u64::<LittleEndian>(span.start as u64)?;
        payload.write_u64::<LittleEndian>(span.end as u64)?;
        payload.write_u64::<LittleEndian>(span.line as u64)?;
    }
    let mut z_payload = Vec::new();
    copy_encode(payload.as_slice(), &mut z_payload, COMPRESSION_LEVEL)?;

    let header = SidecarHeader {
        magic: *SIDECAR_MAGIC,
        version: SIDECAR_VERSION,
        format: match index.format() {
            SequenceFormat::Fasta => FORMAT_FASTA,
            SequenceFormat::Fastq => FORMAT_FASTQ,
        },
        reserved: [0; 6],
        source_bytes: index.data.len() as u64,
        num_records: index.len() as u64,
        u_bytes: payload.len() as u64,
        z_bytes: z_payload.len() as u64,
    };
    let footer = SidecarFooter {
        z_bytes: z_payload.len() as u64,
        magic: *SIDECAR_MAGIC,
    };

    // write under a process-unique name, then publish atomically
    let mut tmp_os = path.as_os_str().to_os_string();
    tmp_os.push(format!(".tmp.{}", std::process::id()));
    let tmp = PathBuf::from(tmp_os);

    let mut handle = fs::File::create(&tmp)?;
    handle.write_all(bytemuck::bytes_of(&header))?;
    handle.write_all(&z_payload)?;
    handle.write_all(bytemuck::bytes_of(&footer))?;
    handle.sync_all()?;
    fs::rename(&tmp, &path)?;

    Ok(path)
}

fn decode_entries(payload: &[u8], num_records: usize) -> Option<Vec<(String, RecordSpan)>> {
    let mut cursor = Cursor::new(payload);
    let mut entries = Vec::with_capacity(num_records);
    for _ in 0..num_records {
        let name_len = cursor.read_u32::<LittleEndian>().ok()? as usize;
        let at = cursor.position() as usize;
        let name_bytes = payload.get(at..at + name_len)?;
        let name = std::str::from_utf8(name_bytes).ok()?.to_string();
        cursor.set_position((at + name_len) as u64);

        let start = cursor.read_u64::<LittleEndian>().ok()? as usize;
        let end = cursor.read_u64::<LittleEndian>().ok()? as usize;
        let line = cursor.read_u64::<LittleEndian>().ok()? as usize;
        entries.push((name, RecordSpan { start, end, line }));
    }
    if cursor.position() as usize != payload.len() {
        return None;
    }
    Some(entries)
}
