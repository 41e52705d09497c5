//! Core data types for barcode resolution and read assignment.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`iupac`]: Expansion of degenerate barcodes into concrete sequences
//! - [`BarcodeSet`](barcode::BarcodeSet): The concrete sequences one barcode reference can match
//! - [`Read`](read::Read): A FASTQ read, optionally carrying its reverse mate
//! - [`Assignment`](types::Assignment): The sample (or unassigned bucket) a read matched
//!
//! ## Barcode Alphabet
//!
//! Raw barcodes use `A`, `C`, `G`, `T`, the IUPAC ambiguity codes, and `N`.
//! `N` marks wildcard/UMI positions and is dropped before matching, so
//! `ACGTNNNN` is matched as `ACGT` against the start of a read.

pub mod barcode;
pub mod iupac;
pub mod read;
pub mod types;
