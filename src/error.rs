use std::path::PathBuf;

/// Custom Result type for seqdex operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the seqdex library, encompassing all possible error
/// cases that can occur while sniffing, indexing, or querying sequence files.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors raised while determining the format of a source
    #[error("Error sniffing format: {0}")]
    Sniff(#[from] SniffError),

    /// Structural errors found while scanning a source into an index
    #[error("Error scanning source: {0}")]
    Scan(#[from] ScanError),

    /// Errors related to the persisted index side-car
    #[error("Error processing index side-car: {0}")]
    Cache(#[from] CacheError),

    /// A lookup miss - callers may fall back to fuzzy matching
    #[error("Record not found: {0}")]
    NotFound(String),

    /// I/O failure opening or reading a specific source
    #[error("Cannot read source {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Standard I/O errors
    #[error("Error with IO: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion errors in record names
    #[error("Error with UTF8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Conversion errors from anyhow errors
    #[cfg(feature = "anyhow")]
    #[error("Generic error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
impl Error {
    /// Checks if the error indicates a side-car that is out of sync with its
    /// source file, which means the index should be rebuilt rather than
    /// treated as a hard failure.
    #[must_use]
    pub fn is_stale_cache(&self) -> bool {
        match self {
            Self::Cache(err) => err.is_stale(),
            _ => false,
        }
    }

    /// Checks if the error is a lookup miss.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors raised by the format sniffer
#[derive(thiserror::Error, Debug)]
pub enum SniffError {
    /// The first non-empty line starts with neither `>` nor `@`
    #[error(
        "First non-empty line of {} starts with {found:?} - expected '>' (FASTA) or '@' (FASTQ)",
        path.display()
    )]
    UnrecognizedFormat { path: PathBuf, found: char },

    /// The source contains no non-empty lines
    #[error("Source {} is empty - cannot determine format", path.display())]
    EmptySource { path: PathBuf },
}

/// Structural violations found while scanning a source
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A FASTQ record's quality string length does not match its sequence length
    #[error(
        "Malformed record '{name}' in {}: quality length ({quality}) does not match sequence length ({sequence})",
        path.display()
    )]
    QualityLength {
        path: PathBuf,
        name: String,
        sequence: usize,
        quality: usize,
    },

    /// A FASTQ group header line does not start with `@`
    #[error(
        "Malformed record in {} at line {line}: FASTQ group does not start with '@'",
        path.display()
    )]
    GroupHeader { path: PathBuf, line: usize },

    /// A FASTQ separator line does not start with `+`
    #[error(
        "Malformed record '{name}' in {} at line {line}: FASTQ separator does not start with '+'",
        path.display()
    )]
    GroupSeparator {
        path: PathBuf,
        name: String,
        line: usize,
    },

    /// A blank line inside a FASTQ stream
    #[error("Blank line in FASTQ stream {} at line {line}", path.display())]
    BlankLine { path: PathBuf, line: usize },

    /// A FASTQ group cut short by end of file
    #[error("Truncated FASTQ group '{name}' in {} starting at line {line}", path.display())]
    TruncatedGroup {
        path: PathBuf,
        name: String,
        line: usize,
    },

    /// The same record name seen twice in one source.
    ///
    /// Collected as a warning during non-strict builds; fatal in strict mode.
    #[error("Duplicate record name '{name}' in {} at line {line}", path.display())]
    DuplicateName {
        path: PathBuf,
        name: String,
        line: usize,
    },
}

/// Errors related to the persisted index side-car
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The magic number in the side-car doesn't match the expected value
    #[error("Invalid side-car magic in {}", path.display())]
    InvalidMagic { path: PathBuf },

    /// The side-car layout version is not supported
    #[error("Unsupported side-car version {version} in {}", path.display())]
    UnsupportedVersion { version: u8, path: PathBuf },

    /// The source file's size doesn't match what the side-car recorded
    #[error(
        "Side-car {} records source length {recorded} but source is {actual} bytes",
        path.display()
    )]
    SourceLengthMismatch {
        path: PathBuf,
        recorded: u64,
        actual: u64,
    },

    /// The side-car is shorter than its own framing claims
    #[error("Truncated side-car {}", path.display())]
    Truncated { path: PathBuf },

    /// The decompressed entry payload does not parse
    #[error("Corrupt entry payload in side-car {}", path.display())]
    CorruptPayload { path: PathBuf },
}
impl CacheError {
    /// Checks if this error indicates a side-car out of sync with its source,
    /// i.e. one that a caller should discard and rebuild.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::SourceLengthMismatch { .. })
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_is_stale_cache_with_length_mismatch() {
        let error = Error::Cache(CacheError::SourceLengthMismatch {
            path: PathBuf::from("reads.fq.sdx"),
            recorded: 100,
            actual: 200,
        });
        assert!(error.is_stale_cache());
    }

    #[test]
    fn test_is_stale_cache_with_invalid_magic() {
        let error = Error::Cache(CacheError::InvalidMagic {
            path: PathBuf::from("reads.fq.sdx"),
        });
        assert!(!error.is_stale_cache());
    }

    #[test]
    fn test_is_stale_cache_with_non_cache_error() {
        let error = Error::NotFound("seq1".to_string());
        assert!(!error.is_stale_cache());
    }

    #[test]
    fn test_is_not_found() {
        let error = Error::NotFound("seq1".to_string());
        assert!(error.is_not_found());
        assert!(format!("{error}").contains("seq1"));
    }

    #[test]
    fn test_sniff_error_unrecognized() {
        let error = SniffError::UnrecognizedFormat {
            path: PathBuf::from("reads.txt"),
            found: '#',
        };
        let error_str = format!("{error}");
        assert!(error_str.contains("reads.txt"));
        assert!(error_str.contains('#'));
    }

    #[test]
    fn test_scan_error_quality_length() {
        let error = ScanError::QualityLength {
            path: PathBuf::from("reads.fq"),
            name: "read_7".to_string(),
            sequence: 4,
            quality: 3,
        };
        let error_str = format!("{error}");
        assert!(error_str.contains("read_7"));
        assert!(error_str.contains('4'));
        assert!(error_str.contains('3'));
    }

    #[test]
    fn test_scan_error_duplicate_name() {
        let error = ScanError::DuplicateName {
            path: PathBuf::from("contigs.fa"),
            name: "seq1".to_string(),
            line: 42,
        };
        let error_str = format!("{error}");
        assert!(error_str.contains("seq1"));
        assert!(error_str.contains("42"));
    }

    #[test]
    fn test_cache_error_source_length_mismatch() {
        let error = CacheError::SourceLengthMismatch {
            path: PathBuf::from("contigs.fa.sdx"),
            recorded: 512,
            actual: 1024,
        };
        assert!(error.is_stale());
        let error_str = format!("{error}");
        assert!(error_str.contains("512"));
        assert!(error_str.contains("1024"));
    }

    #[test]
    fn test_error_from_scan_error() {
        let scan_error = ScanError::BlankLine {
            path: PathBuf::from("reads.fq"),
            line: 9,
        };
        let error: Error = scan_error.into();
        assert!(matches!(error, Error::Scan(_)));
    }

    #[test]
    fn test_error_from_sniff_error() {
        let sniff_error = SniffError::EmptySource {
            path: PathBuf::from("empty.fa"),
        };
        let error: Error = sniff_error.into();
        assert!(matches!(error, Error::Sniff(_)));
    }
}
