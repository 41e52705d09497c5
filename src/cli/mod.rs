//! Command-line interface for barcseek.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **demux**: Assign reads to samples by barcode and write one FASTQ per sample
//! - **check**: Validate a barcode file (and optionally a sample sheet) without
//!   reading any FASTQ data
//!
//! ## Usage
//!
//! ```text
//! # Single-end, one mismatch allowed
//! barcseek demux -f reads.fastq.gz -s samples.txt -b barcodes.csv
//!
//! # Paired-end on every available core, gzip output
//! barcseek demux -f R1.fastq.gz -r R2.fastq.gz -s samples.txt -b barcodes.csv \
//!     --parallel --gzip -o demuxed
//!
//! # Check barcodes for ambiguity, JSON report
//! barcseek check -b barcodes.csv -s samples.txt --format json
//! ```
//!
//! ## Exit status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Runtime failure (I/O, worker crash) |
//! | 2 | Configuration error (barcodes, ambiguity, sample sheet, options) |
//! | 3 | Input data error (malformed or duplicate reads) |
//! | 130 | Interrupted |

use clap::{Parser, Subcommand};

use crate::catalog::store::CatalogError;
use crate::core::iupac::IupacError;
use crate::demux::scheduler::DemuxError;
use crate::parsing::fastq::ReadError;
use crate::parsing::sample_sheet::SampleSheetError;
use crate::utils::validation::ValidationError;

pub mod check;
pub mod demux;

pub const EXIT_RUNTIME_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_INPUT_ERROR: u8 = 3;
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "barcseek")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Demultiplex FASTQ reads into samples by barcode")]
#[command(
    long_about = "barcseek assigns sequencing reads to samples by matching the start of each read against the samples' barcodes.\n\nBarcodes may use IUPAC ambiguity codes and N wildcards, a sample may list several synonymous barcodes, and paired-end runs match a forward and a reverse barcode. Reads that match no sample, or match two samples equally well, are written to 'unassigned'."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity (RUST_LOG overrides this when set)
    #[arg(short, long, global = true, value_enum, default_value = "info")]
    pub verbosity: Verbosity,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Demultiplex reads into per-sample FASTQ files
    Demux(demux::DemuxArgs),

    /// Check barcodes and sample sheet without processing reads
    Check(check::CheckArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Verbosity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Verbosity {
    /// `tracing` level name for this verbosity
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Map an error chain to the process exit status.
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<DemuxError>() {
            return match e {
                DemuxError::Interrupted => EXIT_INTERRUPTED,
                DemuxError::WorkerPanicked | DemuxError::Io(_) => EXIT_RUNTIME_ERROR,
            };
        }
        if let Some(e) = cause.downcast_ref::<ReadError>() {
            return match e {
                ReadError::NotFound(_) => EXIT_CONFIG_ERROR,
                _ => EXIT_INPUT_ERROR,
            };
        }
        if cause.is::<CatalogError>()
            || cause.is::<SampleSheetError>()
            || cause.is::<IupacError>()
            || cause.is::<ValidationError>()
        {
            return EXIT_CONFIG_ERROR;
        }
    }
    EXIT_RUNTIME_ERROR
}
