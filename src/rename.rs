//! Key-based record renaming with an optional fuzzy-lookup fallback.
//!
//! Only the mapped names are written; records absent from the mapping are
//! ignored. Approximate matching stays outside this crate: the
//! [`NameSuggester`] seam is consulted only after a definitive lookup miss.

use std::io::Write;

use crate::{Error, Result, SeqIndex};

/// Pluggable fuzzy-match strategy consulted after an exact lookup miss.
///
/// Implementations return the best candidate name and a match score, or
/// `None` when nothing is close enough. This crate ships no implementation.
pub trait NameSuggester {
    fn suggest(
        &self,
        name: &str,
        candidates: &mut dyn Iterator<Item = &str>,
    ) -> Option<(String, f64)>;
}

/// Writes the mapped records to `sink` under their new names, in mapping
/// order, serialized in the index's originating format with the original
/// description dropped.
///
/// An exact miss consults `suggester` (when provided) before failing with
/// `Error::NotFound` naming the missed entry. Returns the number of records
/// written.
pub fn rename_records<W: Write>(
    index: &SeqIndex,
    mapping: &[(String, String)],
    sink: &mut W,
    suggester: Option<&dyn NameSuggester>,
) -> Result<usize> {
    for (old_name, new_name) in mapping {
        match index.get(old_name) {
            Ok(record) => record.write_renamed(new_name, sink)?,
            Err(err) if err.is_not_found() => {
                let fallback = suggester
                    .and_then(|s| s.suggest(old_name, &mut index.keys()))
                    .map(|(best, score)| (index.get(&best), best, score));
                match fallback {
                    Some((Ok(record), best, score)) => {
                        log::warn!(
                            "'{old_name}' not found in {}; using closest match '{best}' (score {score:.2})",
                            index.source().display()
                        );
                        record.write_renamed(new_name, sink)?;
                    }
                    _ => return Err(err),
                }
            }
            Err(err) => return Err(err),
        }
    }
    sink.flush()?;
    Ok(mapping.len())
}

/// Looks a name up, falling back to the suggester on a miss.
pub fn lookup_or_suggest<'a>(
    index: &'a SeqIndex,
    name: &str,
    suggester: &dyn NameSuggester,
) -> Result<crate::Record<'a>> {
    match index.get(name) {
        Ok(record) => Ok(record),
        Err(err) if err.is_not_found() => {
            match suggester.suggest(name, &mut index.keys()) {
                Some((best, _)) if index.contains(&best) => index.get(&best),
                _ => Err(Error::NotFound(name.to_string())),
            }
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::index::testing::write_fixture;

    use tempfile::TempDir;

    /// Suggests any candidate sharing the query's first character.
    struct FirstCharSuggester;
    impl NameSuggester for FirstCharSuggester {
        fn suggest(
            &self,
            name: &str,
            mut candidates: &mut dyn Iterator<Item = &str>,
        ) -> Option<(String, f64)> {
            let first = name.chars().next()?;
            <&mut dyn Iterator<Item = &str> as Iterator>::find(&mut candidates, |c| {
                c.starts_with(first)
            })
            .map(|c| (c.to_string(), 0.5))
        }
    }

    #[test]
    fn test_rename_writes_mapped_records_only() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fa", ">old1 desc\nACGT\n>old2\nGG\n>old3\nTT\n");
        let index = SeqIndex::build(&path).unwrap();

        let mapping = vec![
            ("old2".to_string(), "new2".to_string()),
            ("old1".to_string(), "new1".to_string()),
        ];
        let mut out = Vec::new();
        let n = rename_records(&index, &mapping, &mut out, None).unwrap();
        assert_eq!(n, 2);
        // mapping order, descriptions dropped, old3 ignored
        assert_eq!(out, b">new2\nGG\n>new1\nACGT\n");
    }

    #[test]
    fn test_rename_miss_without_suggester() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fa", ">old1\nACGT\n");
        let index = SeqIndex::build(&path).unwrap();

        let mapping = vec![("missing".to_string(), "new".to_string())];
        let mut out = Vec::new();
        let err = rename_records(&index, &mapping, &mut out, None).unwrap_err();
        assert!(err.is_not_found());
        assert!(format!("{err}").contains("missing"));
    }

    #[test]
    fn test_rename_miss_with_suggester_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fa", ">sample_1\nACGT\n");
        let index = SeqIndex::build(&path).unwrap();

        let mapping = vec![("sample1".to_string(), "renamed".to_string())];
        let mut out = Vec::new();
        let n = rename_records(&index, &mapping, &mut out, Some(&FirstCharSuggester)).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out, b">renamed\nACGT\n");
    }

    #[test]
    fn test_rename_miss_when_suggester_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fa", ">sample_1\nACGT\n");
        let index = SeqIndex::build(&path).unwrap();

        let mapping = vec![("zzz".to_string(), "new".to_string())];
        let mut out = Vec::new();
        let err =
            rename_records(&index, &mapping, &mut out, Some(&FirstCharSuggester)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rename_fastq_keeps_quality() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fq", "@read1\nACGT\n+\nIIII\n");
        let index = SeqIndex::build(&path).unwrap();

        let mapping = vec![("read1".to_string(), "renamed".to_string())];
        let mut out = Vec::new();
        rename_records(&index, &mapping, &mut out, None).unwrap();
        assert_eq!(out, b"@renamed\nACGT\n+\nIIII\n");
    }

    #[test]
    fn test_lookup_or_suggest() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "a.fa", ">sample_1\nACGT\n");
        let index = SeqIndex::build(&path).unwrap();

        let hit = lookup_or_suggest(&index, "sample_1", &FirstCharSuggester).unwrap();
        assert_eq!(hit.name(), "sample_1");

        let fuzzy = lookup_or_suggest(&index, "sample1", &FirstCharSuggester).unwrap();
        assert_eq!(fuzzy.name(), "sample_1");

        let err = lookup_or_suggest(&index, "zzz", &FirstCharSuggester).unwrap_err();
        assert!(err.is_not_found());
    }
}
