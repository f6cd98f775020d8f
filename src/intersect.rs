//! Name intersection of two indexed sources.
//!
//! Matching is by name token only: a record's trailing description plays no
//! part, so the same name with differing descriptions on the two sides still
//! matches. This mirrors how read pairs are matched across files and is a
//! deliberate policy, not an accident of implementation.

use std::io::Write;

use crate::{Result, SeqIndex};

/// Computes the set of names present in both indices.
///
/// A hash-set intersection iterating the smaller key set, so the cost is
/// O(min(|A|, |B|)) expected, never a nested-loop join. The result is sorted
/// by name so output is stable across runs.
#[must_use]
pub fn intersect(a: &SeqIndex, b: &SeqIndex) -> Vec<String> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut names: Vec<String> = small
        .keys()
        .filter(|&name| large.contains(name))
        .map(str::to_string)
        .collect();
    names.sort_unstable();
    names
}

/// Streams every record in the intersection to per-side sinks.
///
/// Each side's records are serialized in that side's originating format: a
/// FASTA-origin record as `>name desc` plus the sequence on one line, a
/// FASTQ-origin record with 4-line framing and a bare `+` separator. When
/// `sink_b` is `None`, only side A's matching records are emitted. Returns
/// the number of intersecting names.
pub fn write_intersection<WA, WB>(
    a: &SeqIndex,
    b: &SeqIndex,
    sink_a: &mut WA,
    mut sink_b: Option<&mut WB>,
) -> Result<usize>
where
    WA: Write,
    WB: Write,
{
    let names = intersect(a, b);
    log::info!(
        "Intersection of {} and {}: {} shared names",
        a.source().display(),
        b.source().display(),
        names.len()
    );

    for name in &names {
        a.get(name)?.write_to(sink_a)?;
        if let Some(sink) = sink_b.as_deref_mut() {
            b.get(name)?.write_to(sink)?;
        }
    }
    sink_a.flush()?;
    if let Some(sink) = sink_b.as_deref_mut() {
        sink.flush()?;
    }
    Ok(names.len())
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::index::testing::write_fixture;

    use std::io::Sink;

    use tempfile::TempDir;

    #[test]
    fn test_intersection_scenario() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">x\nAC\n>y\nGT\n");
        let pb = write_fixture(&dir, "b.fa", ">y\nGT\n>z\nTT\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        assert_eq!(intersect(&a, &b), vec!["y".to_string()]);

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        let n = write_intersection(&a, &b, &mut out_a, Some(&mut out_b)).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out_a, b">y\nGT\n");
        assert_eq!(out_b, b">y\nGT\n");
    }

    #[test]
    fn test_intersection_is_commutative() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">x\nAC\n>y\nGT\n>w\nAA\n");
        let pb = write_fixture(&dir, "b.fa", ">y\nGT\n>z\nTT\n>w\nAA\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }

    #[test]
    fn test_self_intersection_covers_every_name() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">x\nAC\n>y\nGT\n>z\nTT\n");
        let a = SeqIndex::build(&pa).unwrap();
        assert_eq!(intersect(&a, &a).len(), a.len());
    }

    #[test]
    fn test_single_sink_emits_side_a_only() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">y desc_a\nGT\n");
        let pb = write_fixture(&dir, "b.fa", ">y desc_b\nGT\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        let mut out_a = Vec::new();
        let n = write_intersection::<_, Sink>(&a, &b, &mut out_a, None).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out_a, b">y desc_a\nGT\n");
    }

    #[test]
    fn test_name_only_matching_ignores_descriptions() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">y left-hand copy\nGT\n");
        let pb = write_fixture(&dir, "b.fa", ">y right-hand copy\nGT\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();
        assert_eq!(intersect(&a, &b), vec!["y".to_string()]);
    }

    #[test]
    fn test_mixed_formats_serialize_per_side() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fq", "@y\nGT\n+\nII\n@q\nAA\n+\nJJ\n");
        let pb = write_fixture(&dir, "b.fa", ">y\nGT\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        write_intersection(&a, &b, &mut out_a, Some(&mut out_b)).unwrap();
        assert_eq!(out_a, b"@y\nGT\n+\nII\n");
        assert_eq!(out_b, b">y\nGT\n");
    }

    #[test]
    fn test_disjoint_indices() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">x\nAC\n");
        let pb = write_fixture(&dir, "b.fa", ">z\nTT\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        assert!(intersect(&a, &b).is_empty());
        let mut out_a = Vec::new();
        let n = write_intersection::<_, Sink>(&a, &b, &mut out_a, None).unwrap();
        assert_eq!(n, 0);
        assert!(out_a.is_empty());
    }

    #[test]
    fn test_wrapped_fasta_emitted_unwrapped() {
        let dir = TempDir::new().unwrap();
        let pa = write_fixture(&dir, "a.fa", ">y\nGGGG\nCCCC\n");
        let pb = write_fixture(&dir, "b.fa", ">y\nGGGGCCCC\n");
        let a = SeqIndex::build(&pa).unwrap();
        let b = SeqIndex::build(&pb).unwrap();

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        write_intersection(&a, &b, &mut out_a, Some(&mut out_b)).unwrap();
        // hard-wrap on side A is transparently unwrapped on emission
        assert_eq!(out_a, out_b);
    }
}
