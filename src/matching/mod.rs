//! Barcode matching and read assignment.
//!
//! This module provides the core matching functionality:
//!
//! - [`distance`]: Hamming distance that stops as soon as a limit is exceeded
//! - [`engine::Assigner`]: Assigns each read (or read pair) to one sample
//!
//! ## Assignment rules
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | One sample has the lowest combined distance | that sample |
//! | Two or more samples tie at the lowest distance | unassigned (ambiguous) |
//! | No sample within `max_mismatches` (both sides summed) | unassigned (no match) |
//! | Sample has reverse barcodes, read has no mate | sample is not a candidate |
//!
//! The barcode is compared against the read prefix of the same length; `N`
//! positions in a barcode were removed during expansion and are never compared.
//!
//! ## Example
//!
//! ```rust
//! use barcseek::matching::engine::{Assigner, AssignerConfig};
//! use barcseek::parsing::sample_sheet::{parse_sample_sheet_text, resolve};
//! use barcseek::{BarcodeCatalog, Read};
//!
//! let catalog = BarcodeCatalog::from_text("bc1,ACGT\nbc2,TTTT\n").unwrap();
//! let entries = parse_sample_sheet_text("S1 bc1\nS2 bc2\n").unwrap();
//! let samples = resolve(&entries, &catalog).unwrap();
//! let assigner = Assigner::with_config(samples, AssignerConfig { max_mismatches: 1 });
//!
//! let read = Read::new("r1", "ACGAGGGG", "IIIIIIII").unwrap();
//! let assignment = assigner.assign(&read);
//! assert_eq!(assignment.outcome.sample_index(), Some(0));
//! ```

pub mod distance;
pub mod engine;
