//! Parsers for the run's input files.
//!
//! This module provides parsers for:
//!
//! - **Barcode files**: `name,sequence` CSV defining the barcode catalog
//! - **Sample sheets**: whitespace-delimited `sample forward [reverse]` lines
//! - **FASTQ files**: forward and optional reverse reads, plain or gzip-compressed
//!
//! ## Example
//!
//! ```rust
//! use barcseek::parsing::sample_sheet::{parse_sample_sheet_text, resolve};
//! use barcseek::BarcodeCatalog;
//!
//! let catalog = BarcodeCatalog::from_text("bc1,ACGT\nbc2,TTGY\n").unwrap();
//! let entries = parse_sample_sheet_text("S1 bc1\nS2 bc2,AAAA\n").unwrap();
//! let samples = resolve(&entries, &catalog).unwrap();
//!
//! assert_eq!(samples[1].forward_barcodes, "TTGY,AAAA");
//! assert_eq!(samples[1].forward.len(), 3);
//! ```

pub mod barcodes;
pub mod fastq;
pub mod sample_sheet;
