//! Barcode catalog storage and ambiguity checking.
//!
//! The catalog maps barcode names to raw (possibly degenerate) barcode sequences,
//! loaded from a `name,sequence` CSV file:
//!
//! ```text
//! # name,sequence
//! bc01,ACGTAC
//! bc02,TGCAYN
//! ```
//!
//! Before any reads are processed the catalog is checked for ambiguity: two entries
//! that expand to the same concrete sequence would make assignment undefined.
//!
//! ## Example
//!
//! ```rust
//! use barcseek::catalog::ambiguity::check_ambiguity;
//! use barcseek::BarcodeCatalog;
//!
//! let catalog = BarcodeCatalog::from_text("b1,AY\nb2,AW\n").unwrap();
//! let report = check_ambiguity(&catalog).unwrap();
//!
//! // Both AY and AW recognize AT
//! assert_eq!(report.count("AT"), 2);
//! ```

pub mod ambiguity;
pub mod store;
