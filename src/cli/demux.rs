use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use tracing::{info, warn};

use crate::catalog::ambiguity::ensure_unambiguous;
use crate::catalog::store::BarcodeCatalog;
use crate::demux::cancel::CancellationToken;
use crate::demux::scheduler::{Scheduler, SchedulerConfig};
use crate::demux::summary::{DemuxSummary, RunParameters};
use crate::demux::writer::{OutputConfig, OutputSet, DEFAULT_OUTPUT_DIRECTORY};
use crate::matching::engine::{Assigner, AssignerConfig};
use crate::parsing::fastq::ReadCollection;
use crate::parsing::sample_sheet;
use crate::utils::validation::resolve_worker_count;

#[derive(Args)]
pub struct DemuxArgs {
    /// Forward (R1) FASTQ file, optionally gzip-compressed
    #[arg(short = 'f', long, required = true)]
    pub forward_fastq: PathBuf,

    /// Reverse (R2) FASTQ file, optionally gzip-compressed
    #[arg(short = 'r', long)]
    pub reverse_fastq: Option<PathBuf>,

    /// Sample sheet: `sample forward_barcodes [reverse_barcodes]` per line
    #[arg(short = 's', long, required = true)]
    pub sample_sheet: PathBuf,

    /// Barcode file: `name,sequence` per line
    #[arg(short = 'b', long, required = true)]
    pub barcodes: PathBuf,

    /// Maximum mismatches allowed (forward and reverse barcodes combined)
    #[arg(short = 'e', long = "error", default_value = "1")]
    pub max_mismatches: usize,

    /// Directory for the per-sample FASTQ files and run summary
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIRECTORY)]
    pub output_directory: PathBuf,

    /// Worker threads (default 1); without a value, use every available core
    #[arg(short = 'j', long = "parallel", value_name = "N")]
    pub parallel: Option<Option<usize>>,

    /// Reads per work chunk (derived from read and worker counts by default)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,

    /// Write gzip-compressed output (.fastq.gz)
    #[arg(long)]
    pub gzip: bool,

    /// Remove the matched barcode from the start of assigned reads
    #[arg(long)]
    pub trim_barcodes: bool,

    /// Milliseconds to wait for workers to stop after an interrupt
    #[arg(long, default_value = "5000")]
    pub grace_period_ms: u64,
}

impl DemuxArgs {
    fn requested_workers(&self) -> Option<usize> {
        match self.parallel {
            None => Some(1),
            Some(requested) => requested,
        }
    }
}

/// Execute demux subcommand
///
/// Configuration is validated in full before any FASTQ data is read: worker
/// count, barcodes and their ambiguity, then the sample sheet and overlap between
/// its samples.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the input cannot be read, the
/// run is interrupted, or output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: DemuxArgs) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let workers = resolve_worker_count(args.requested_workers())?;

    let catalog = BarcodeCatalog::load(&args.barcodes)?;
    ensure_unambiguous(&catalog)
        .with_context(|| format!("Barcodes in {} are ambiguous", args.barcodes.display()))?;

    let entries = sample_sheet::load(&args.sample_sheet)?;
    let samples = sample_sheet::resolve(&entries, &catalog)?;
    sample_sheet::ensure_distinct_samples(&samples).with_context(|| {
        format!(
            "Samples in {} share barcodes",
            args.sample_sheet.display()
        )
    })?;
    if args.reverse_fastq.is_none() {
        for sample in samples.iter().filter(|s| s.reverse.is_some()) {
            warn!(
                "Sample {} has reverse barcodes but no reverse FASTQ was given; no reads can match it",
                sample.name
            );
        }
    }

    let reads = ReadCollection::load(&args.forward_fastq, args.reverse_fastq.as_deref())?;
    let paired = reads.is_paired();
    let orphans = reads.orphans();
    info!("Loaded {} reads", reads.len());

    // Installed before any output exists, so an interrupt always goes through cleanup
    let token = CancellationToken::new();
    if let Err(e) = token.cancel_on_signal() {
        warn!("Could not install interrupt handler: {e}");
    }

    let output_config = OutputConfig {
        directory: args.output_directory.clone(),
        gzip: args.gzip,
        trim_barcodes: args.trim_barcodes,
    };
    let outputs = OutputSet::create(
        &output_config,
        samples.iter().map(|s| s.name.as_str()),
        paired,
    )
    .with_context(|| {
        format!(
            "Failed to create output files in {}",
            args.output_directory.display()
        )
    })?;

    let assigner = Arc::new(Assigner::with_config(
        samples,
        AssignerConfig {
            max_mismatches: args.max_mismatches,
        },
    ));
    let scheduler_config = SchedulerConfig {
        workers,
        chunk_size: args
            .chunk_size
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        grace_period: Duration::from_millis(args.grace_period_ms),
    };

    let scheduler = Scheduler::new(Arc::clone(&assigner), scheduler_config, token);
    let report = scheduler.run(reads.into_reads(), outputs)?;

    let parameters = RunParameters {
        forward_fastq: args.forward_fastq.clone(),
        reverse_fastq: args.reverse_fastq.clone(),
        sample_sheet: args.sample_sheet.clone(),
        barcodes: args.barcodes.clone(),
        max_mismatches: args.max_mismatches,
        workers,
        chunk_size: report.chunk_size,
        gzip: args.gzip,
        trim_barcodes: args.trim_barcodes,
    };
    let summary = DemuxSummary::new(
        started_at,
        parameters,
        assigner.samples(),
        &report.counts,
        paired,
        orphans,
        report.output_files,
    );
    let path = summary
        .write_json(&args.output_directory)
        .context("Failed to write run summary")?;
    info!("Wrote run summary to {}", path.display());

    print!("{summary}");
    Ok(())
}
