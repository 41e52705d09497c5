//! # barcseek
//!
//! A library for demultiplexing sequencing reads into samples by barcode.
//!
//! Each sample is identified by one or more barcodes at the start of its reads
//! (and, for paired-end runs, of its reverse mates). Barcodes may contain IUPAC
//! ambiguity codes, which are expanded into every concrete sequence they stand
//! for, and `N` wildcards, which are never compared.
//!
//! ## Features
//!
//! - **IUPAC expansion**: `ACRT` matches both `ACAT` and `ACGT`
//! - **Ambiguity check**: barcode sets whose expansions overlap are rejected before
//!   any read is processed
//! - **Mismatch tolerance**: Hamming distance with a per-barcode threshold
//! - **Tie detection**: reads equally close to two samples are never guessed
//! - **Paired-end**: forward and reverse barcodes matched together
//! - **Parallel**: chunks of reads assigned across a worker pool, with output
//!   identical to a single-threaded run
//!
//! ## Example
//!
//! ```rust
//! use barcseek::catalog::ambiguity::check_ambiguity;
//! use barcseek::parsing::sample_sheet::{parse_sample_sheet_text, resolve};
//! use barcseek::{Assigner, BarcodeCatalog, Read};
//!
//! let catalog = BarcodeCatalog::from_text("bc1,ACGT\nbc2,TTRY\n").unwrap();
//! assert!(check_ambiguity(&catalog).unwrap().is_empty());
//!
//! let entries = parse_sample_sheet_text("S1 bc1\nS2 bc2\n").unwrap();
//! let assigner = Assigner::new(resolve(&entries, &catalog).unwrap());
//!
//! let read = Read::new("read1", "TTGCAAAA", "IIIIIIII").unwrap();
//! let assignment = assigner.assign(&read);
//! assert_eq!(assignment.outcome.sample_index(), Some(1));
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Barcode catalog storage and ambiguity checking
//! - [`core`]: IUPAC expansion, barcode sets, reads, and assignment types
//! - [`parsing`]: Barcode file, sample sheet, and FASTQ parsers
//! - [`matching`]: Distance and read assignment
//! - [`demux`]: Partitioned, cancellable run and per-sample output
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod demux;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::ambiguity::AmbiguityReport;
pub use catalog::store::BarcodeCatalog;
pub use core::barcode::BarcodeSet;
pub use core::read::Read;
pub use core::types::*;
pub use demux::cancel::CancellationToken;
pub use demux::scheduler::{Scheduler, SchedulerConfig};
pub use matching::engine::{Assigner, AssignerConfig};
pub use parsing::fastq::ReadCollection;
pub use parsing::sample_sheet::ResolvedSample;
