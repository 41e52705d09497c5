use serde::{Deserialize, Serialize};

use crate::core::read::Read;
use crate::core::types::{Assignment, UnassignedReason};
use crate::matching::distance::best_match;
use crate::parsing::sample_sheet::ResolvedSample;

/// Default maximum number of mismatches per barcode
pub const DEFAULT_MAX_MISMATCHES: usize = 1;

/// Configuration for read assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignerConfig {
    /// Mismatches allowed in total, forward and reverse barcodes combined
    pub max_mismatches: usize,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            max_mismatches: DEFAULT_MAX_MISMATCHES,
        }
    }
}

/// How well one sample matched a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SampleHit {
    distance: usize,
    lengths: (usize, Option<usize>),
}

/// Assigns reads to samples by barcode distance.
///
/// The resolved samples are read-only once the assigner is built, so a single
/// assigner can be shared across worker threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Assigner {
    samples: Vec<ResolvedSample>,
    config: AssignerConfig,
}

impl Assigner {
    /// Create an assigner with default configuration
    pub fn new(samples: Vec<ResolvedSample>) -> Self {
        Self::with_config(samples, AssignerConfig::default())
    }

    pub fn with_config(samples: Vec<ResolvedSample>, config: AssignerConfig) -> Self {
        Self { samples, config }
    }

    pub fn samples(&self) -> &[ResolvedSample] {
        &self.samples
    }

    pub fn config(&self) -> &AssignerConfig {
        &self.config
    }

    /// True if any sample carries reverse barcodes
    pub fn has_reverse_barcodes(&self) -> bool {
        self.samples.iter().any(|s| s.reverse.is_some())
    }

    /// Assign a read (or read pair) to the closest sample.
    ///
    /// The forward and reverse distances together must not exceed
    /// `max_mismatches`. The sample with the lowest combined distance wins; a tie at that distance routes
    /// the read to unassigned as ambiguous, and no sample within the threshold
    /// routes it to unassigned as unmatched.
    pub fn assign(&self, read: &Read) -> Assignment {
        let mut best: Option<(usize, SampleHit)> = None;
        let mut tied = false;

        for (index, sample) in self.samples.iter().enumerate() {
            let Some(hit) = self.score(read, sample) else {
                continue;
            };
            match best {
                Some((_, current)) if hit.distance > current.distance => {}
                Some((_, current)) if hit.distance == current.distance => tied = true,
                _ => {
                    best = Some((index, hit));
                    tied = false;
                }
            }
        }

        match best {
            None => Assignment::unassigned(&read.header, UnassignedReason::NoMatch, None),
            Some((_, hit)) if tied => Assignment::unassigned(
                &read.header,
                UnassignedReason::Ambiguous,
                Some(hit.distance),
            ),
            Some((index, hit)) => {
                Assignment::assigned(&read.header, index, hit.distance, hit.lengths)
            }
        }
    }

    /// Combined distance of a read to one sample, if it is within the limit
    fn score(&self, read: &Read, sample: &ResolvedSample) -> Option<SampleHit> {
        let limit = self.config.max_mismatches;
        let forward = best_match(read.seq(), &sample.forward, limit)?;

        match (&sample.reverse, read.reverse_seq()) {
            (Some(set), Some(reverse_seq)) => {
                // The reverse side only gets what the forward side left of the budget
                let reverse = best_match(reverse_seq, set, limit - forward.distance)?;
                Some(SampleHit {
                    distance: forward.distance + reverse.distance,
                    lengths: (forward.length, Some(reverse.length)),
                })
            }
            // A reverse barcode cannot be checked without a reverse mate
            (Some(_), None) => None,
            (None, _) => Some(SampleHit {
                distance: forward.distance,
                lengths: (forward.length, None),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::BarcodeCatalog;
    use crate::core::types::AssignmentOutcome;
    use crate::parsing::sample_sheet::{parse_sample_sheet_text, resolve};

    fn assigner(catalog: &str, sheet: &str, max_mismatches: usize) -> Assigner {
        let catalog = BarcodeCatalog::from_text(catalog).unwrap();
        let entries = parse_sample_sheet_text(sheet).unwrap();
        let samples = resolve(&entries, &catalog).unwrap();
        Assigner::with_config(samples, AssignerConfig { max_mismatches })
    }

    fn read(seq: &str) -> Read {
        Read::new("r1", seq, "I".repeat(seq.len())).unwrap()
    }

    fn pair(forward: &str, reverse: &str) -> Read {
        let mut read = read(forward);
        read.add_reverse("r1", reverse, "I".repeat(reverse.len()))
            .unwrap();
        read
    }

    #[test]
    fn test_exact_match() {
        let assigner = assigner("bc1,ACGT\nbc2,TTTT\n", "S1 bc1\nS2 bc2\n", 0);
        let assignment = assigner.assign(&read("ACGTGGGGGG"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(0));
        assert_eq!(assignment.distance, Some(0));
        assert_eq!(assignment.matched_lengths, Some((4, None)));
        assert_eq!(assignment.read_id, "r1");
    }

    #[test]
    fn test_lowest_distance_wins() {
        let assigner = assigner("bc1,ACGT\nbc2,ACGA\n", "S1 bc1\nS2 bc2\n", 2);
        let assignment = assigner.assign(&read("ACGACCCC"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(1));
        assert_eq!(assignment.distance, Some(0));
    }

    #[test]
    fn test_over_threshold_is_unassigned() {
        let assigner = assigner("bc1,ACGT\n", "S1 bc1\n", 1);
        let assignment = assigner.assign(&read("TTTTTTTT"));
        assert_eq!(
            assignment.outcome,
            AssignmentOutcome::Unassigned(UnassignedReason::NoMatch)
        );
        assert_eq!(assignment.distance, None);
    }

    #[test]
    fn test_tie_is_ambiguous() {
        // CCGT is one mismatch from both ACGT and GCGT
        let assigner = assigner("bc1,ACGT\nbc2,GCGT\n", "S1 bc1\nS2 bc2\n", 1);
        let assignment = assigner.assign(&read("CCGTAAAA"));
        assert_eq!(
            assignment.outcome,
            AssignmentOutcome::Unassigned(UnassignedReason::Ambiguous)
        );
        assert_eq!(assignment.distance, Some(1));
    }

    #[test]
    fn test_tie_broken_by_closer_later_sample() {
        let assigner = assigner(
            "bc1,ACGT\nbc2,GCGT\nbc3,CCGT\n",
            "S1 bc1\nS2 bc2\nS3 bc3\n",
            1,
        );
        let assignment = assigner.assign(&read("CCGTAAAA"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(2));
    }

    #[test]
    fn test_degenerate_barcode() {
        let assigner = assigner("bc1,ACRT\n", "S1 bc1\n", 0);
        assert!(assigner.assign(&read("ACGTAA")).outcome.is_assigned());
        assert!(assigner.assign(&read("ACATAA")).outcome.is_assigned());
        assert!(!assigner.assign(&read("ACCTAA")).outcome.is_assigned());
    }

    #[test]
    fn test_read_shorter_than_barcode() {
        let assigner = assigner("bc1,ACGTACGT\n", "S1 bc1\n", 2);
        assert!(!assigner.assign(&read("ACGT")).outcome.is_assigned());
    }

    #[test]
    fn test_paired_requires_both_sides() {
        let assigner = assigner("f1,ACGT\nr1,GGCC\n", "S1 f1 r1\n", 1);

        let assignment = assigner.assign(&pair("ACGTAAAA", "GGCCTTTT"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(0));
        assert_eq!(assignment.matched_lengths, Some((4, Some(4))));

        let assignment = assigner.assign(&pair("ACGTAAAA", "TTTTTTTT"));
        assert!(!assignment.outcome.is_assigned());

        // Without a mate the reverse barcode cannot be checked
        assert!(!assigner.assign(&read("ACGTAAAA")).outcome.is_assigned());
    }

    #[test]
    fn test_paired_combined_distance() {
        // Both samples share the forward barcode; the reverse side decides
        let assigner = assigner(
            "f1,ACGT\nr1,GGCC\nr2,GGCA\n",
            "S1 f1 r1\nS2 f1 r2\n",
            1,
        );
        let assignment = assigner.assign(&pair("ACGAAAAA", "GGCATTTT"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(1));
        assert_eq!(assignment.distance, Some(1));
    }

    #[test]
    fn test_paired_mismatches_share_one_budget() {
        let strict = assigner("f1,ACGT\nr1,GGCC\n", "S1 f1 r1\n", 1);

        // One mismatch on each side is two in total
        let assignment = strict.assign(&pair("ACGAAAAA", "GGCATTTT"));
        assert_eq!(
            assignment.outcome,
            AssignmentOutcome::Unassigned(UnassignedReason::NoMatch)
        );

        let assignment = strict.assign(&pair("ACGTAAAA", "GGCATTTT"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(0));
        assert_eq!(assignment.distance, Some(1));

        let relaxed = assigner("f1,ACGT\nr1,GGCC\n", "S1 f1 r1\n", 2);
        let assignment = relaxed.assign(&pair("ACGAAAAA", "GGCATTTT"));
        assert_eq!(assignment.distance, Some(2));
    }

    #[test]
    fn test_forward_only_sample_matches_paired_read() {
        let assigner = assigner("f1,ACGT\n", "S1 f1\n", 0);
        let assignment = assigner.assign(&pair("ACGTAAAA", "NNNN"));
        assert_eq!(assignment.outcome, AssignmentOutcome::Sample(0));
        assert_eq!(assignment.matched_lengths, Some((4, None)));
    }
}
