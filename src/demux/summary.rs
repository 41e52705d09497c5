//! Per-run assignment counts and the JSON run summary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::{Assignment, AssignmentOutcome, UnassignedReason};
use crate::parsing::sample_sheet::ResolvedSample;

/// File name of the run summary inside the output directory
pub const SUMMARY_FILE_NAME: &str = "demux_summary.json";

/// Running tally of assignment outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentCounts {
    /// Reads per sample, in sample order
    pub per_sample: Vec<usize>,
    pub no_match: usize,
    pub ambiguous: usize,
}

impl AssignmentCounts {
    #[must_use]
    pub fn new(samples: usize) -> Self {
        Self {
            per_sample: vec![0; samples],
            ..Self::default()
        }
    }

    pub fn record(&mut self, assignment: &Assignment) {
        match assignment.outcome {
            AssignmentOutcome::Sample(index) => {
                if let Some(count) = self.per_sample.get_mut(index) {
                    *count += 1;
                }
            }
            AssignmentOutcome::Unassigned(UnassignedReason::NoMatch) => self.no_match += 1,
            AssignmentOutcome::Unassigned(UnassignedReason::Ambiguous) => self.ambiguous += 1,
        }
    }

    #[must_use]
    pub fn assigned(&self) -> usize {
        self.per_sample.iter().sum()
    }

    #[must_use]
    pub fn unassigned(&self) -> usize {
        self.no_match + self.ambiguous
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.assigned() + self.unassigned()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub name: String,
    pub forward_barcodes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_barcodes: Option<String>,
    pub reads: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnassignedSummary {
    pub no_match: usize,
    pub ambiguous: usize,
    pub total: usize,
}

/// Parameters a run was started with
#[derive(Debug, Clone, Serialize)]
pub struct RunParameters {
    pub forward_fastq: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_fastq: Option<PathBuf>,
    pub sample_sheet: PathBuf,
    pub barcodes: PathBuf,
    pub max_mismatches: usize,
    pub workers: usize,
    pub chunk_size: usize,
    pub gzip: bool,
    pub trim_barcodes: bool,
}

/// Everything recorded about a completed run
#[derive(Debug, Clone, Serialize)]
pub struct DemuxSummary {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub parameters: RunParameters,
    pub total_reads: usize,
    pub paired: bool,
    pub orphan_reverse_reads: usize,
    pub samples: Vec<SampleSummary>,
    pub unassigned: UnassignedSummary,
    pub output_files: Vec<PathBuf>,
}

impl DemuxSummary {
    #[must_use]
    pub fn new(
        started_at: DateTime<Utc>,
        parameters: RunParameters,
        samples: &[ResolvedSample],
        counts: &AssignmentCounts,
        paired: bool,
        orphan_reverse_reads: usize,
        output_files: Vec<PathBuf>,
    ) -> Self {
        let samples = samples
            .iter()
            .zip(&counts.per_sample)
            .map(|(sample, &reads)| SampleSummary {
                name: sample.name.clone(),
                forward_barcodes: sample.forward_barcodes.clone(),
                reverse_barcodes: sample.reverse_barcodes.clone(),
                reads,
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at,
            finished_at: Utc::now(),
            parameters,
            total_reads: counts.total(),
            paired,
            orphan_reverse_reads,
            samples,
            unassigned: UnassignedSummary {
                no_match: counts.no_match,
                ambiguous: counts.ambiguous,
                total: counts.unassigned(),
            },
            output_files,
        }
    }

    /// Write the summary as pretty JSON into `directory`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json(&self, directory: &Path) -> anyhow::Result<PathBuf> {
        let path = directory.join(SUMMARY_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

impl std::fmt::Display for DemuxSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reads processed: {}", self.total_reads)?;
        for sample in &self.samples {
            writeln!(f, "  {}: {}", sample.name, sample.reads)?;
        }
        writeln!(
            f,
            "  unassigned: {} (no match: {}, ambiguous: {})",
            self.unassigned.total, self.unassigned.no_match, self.unassigned.ambiguous
        )?;
        if self.orphan_reverse_reads > 0 {
            writeln!(f, "Orphan reverse reads skipped: {}", self.orphan_reverse_reads)?;
        }
        Ok(())
    }
}
