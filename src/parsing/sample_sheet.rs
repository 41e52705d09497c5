//! Sample sheet parsing and barcode resolution.
//!
//! A sample sheet is whitespace-delimited, one sample per line:
//!
//! ```text
//! # sample   forward      [reverse]
//! S1         bc01
//! S2         bc02,bc03    bc10
//! S3         ACGTRC
//! ```
//!
//! Each barcode reference is a catalog key, a literal sequence, or a comma-joined
//! list of either (synonyms). Resolution substitutes catalog sequences for keys and
//! leaves anything else as a literal.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::ambiguity::AmbiguityReport;
use crate::catalog::store::BarcodeCatalog;
use crate::core::barcode::BarcodeSet;
use crate::core::iupac::IupacError;
use crate::utils::validation::{validate_sample_name, ValidationError};

#[derive(Error, Debug)]
pub enum SampleSheetError {
    #[error("Sample sheet not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read sample sheet: {0}")]
    Io(#[from] std::io::Error),

    #[error("No samples found in the sample sheet")]
    Empty,

    #[error("Each sample can have at most two barcode sets; sample '{sample}' on line {line} has {count}")]
    TooManyBarcodes {
        sample: String,
        line: usize,
        count: usize,
    },

    #[error("Sample '{sample}' on line {line} has no barcodes")]
    NoBarcodes { sample: String, line: usize },

    #[error("Sample '{sample}' is listed more than once (line {line})")]
    DuplicateSample { sample: String, line: usize },

    #[error("Invalid sample name on line {line}: {source}")]
    InvalidSampleName {
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Sample '{sample}' has an invalid barcode '{reference}': {source}")]
    InvalidBarcode {
        sample: String,
        reference: String,
        #[source]
        source: IupacError,
    },

    #[error("Sample '{sample}' has a barcode '{reference}' with no matchable bases")]
    EmptyBarcode { sample: String, reference: String },

    #[error("Samples share barcodes: {count} sequences are claimed by more than one sample")]
    OverlappingSamples { count: usize },
}

/// One line of the sample sheet, before catalog substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSheetEntry {
    pub name: String,
    pub forward: String,
    pub reverse: Option<String>,
}

/// A sample with its barcode references resolved and expanded
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSample {
    pub name: String,

    /// Forward references with catalog keys substituted, comma-joined
    pub forward_barcodes: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_barcodes: Option<String>,

    #[serde(skip)]
    pub forward: BarcodeSet,

    #[serde(skip)]
    pub reverse: Option<BarcodeSet>,
}

/// Load a sample sheet file.
///
/// # Errors
///
/// Returns `SampleSheetError::NotFound` if the path does not exist,
/// `SampleSheetError::Io` if it cannot be read, or any error from
/// [`parse_sample_sheet_text`].
pub fn load(path: &Path) -> Result<Vec<SampleSheetEntry>, SampleSheetError> {
    if !path.exists() {
        return Err(SampleSheetError::NotFound(path.to_path_buf()));
    }
    info!("Reading in sample sheet {}", path.display());
    let start = Instant::now();
    let content = std::fs::read_to_string(path)?;
    let entries = parse_sample_sheet_text(&content)?;
    debug!(
        "Reading in the sample sheet took {:.3} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(entries)
}

/// Parse sample sheet text.
///
/// # Errors
///
/// Returns `SampleSheetError::TooManyBarcodes` for more than two references,
/// `SampleSheetError::NoBarcodes` for a sample with none,
/// `SampleSheetError::DuplicateSample` for a repeated name,
/// `SampleSheetError::InvalidSampleName` for names unusable as file names, or
/// `SampleSheetError::Empty` if no samples are found.
pub fn parse_sample_sheet_text(text: &str) -> Result<Vec<SampleSheetEntry>, SampleSheetError> {
    let mut entries = Vec::new();
    let mut names = HashSet::new();

    for (i, line) in text.lines().enumerate() {
        let line_num = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        let references: Vec<&str> = tokens.collect();

        validate_sample_name(name).map_err(|source| SampleSheetError::InvalidSampleName {
            line: line_num,
            source,
        })?;

        let (forward, reverse) = match references.as_slice() {
            [] => {
                return Err(SampleSheetError::NoBarcodes {
                    sample: name.to_string(),
                    line: line_num,
                })
            }
            [forward] => ((*forward).to_string(), None),
            [forward, reverse] => ((*forward).to_string(), Some((*reverse).to_string())),
            _ => {
                return Err(SampleSheetError::TooManyBarcodes {
                    sample: name.to_string(),
                    line: line_num,
                    count: references.len(),
                })
            }
        };

        if !names.insert(name.to_string()) {
            return Err(SampleSheetError::DuplicateSample {
                sample: name.to_string(),
                line: line_num,
            });
        }

        entries.push(SampleSheetEntry {
            name: name.to_string(),
            forward,
            reverse,
        });
    }

    if entries.is_empty() {
        return Err(SampleSheetError::Empty);
    }
    Ok(entries)
}

/// Substitute catalog sequences into a comma-joined reference list.
///
/// Unknown keys are kept unchanged as literal sequences. Returns the raw barcodes
/// in order.
pub fn substitute<'a>(reference: &'a str, catalog: &'a BarcodeCatalog) -> Vec<&'a str> {
    reference
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| catalog.get(key).unwrap_or(key))
        .collect()
}

/// Resolve every sample's barcode references against the catalog.
///
/// # Errors
///
/// Returns `SampleSheetError::InvalidBarcode` if a literal (or catalog sequence) is
/// not a valid barcode, or `SampleSheetError::EmptyBarcode` if a reference list is
/// empty or a barcode has no bases left after `N` removal.
pub fn resolve(
    entries: &[SampleSheetEntry],
    catalog: &BarcodeCatalog,
) -> Result<Vec<ResolvedSample>, SampleSheetError> {
    info!("Matching barcodes for {} samples", entries.len());
    let start = Instant::now();

    let samples = entries
        .iter()
        .map(|entry| resolve_entry(entry, catalog))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Matching barcodes took {:.3} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(samples)
}

/// Find barcodes that more than one sample would claim.
///
/// A forward-only sample collides with any sample sharing one of its forward
/// sequences, since a read carrying that sequence matches both exactly. Two
/// paired samples collide only when they share a forward and a reverse sequence;
/// such collisions are keyed as `FORWARD+REVERSE`.
#[must_use]
pub fn check_sample_overlap(samples: &[ResolvedSample]) -> AmbiguityReport {
    let mut by_forward: BTreeMap<&[u8], Vec<usize>> = BTreeMap::new();
    for (index, sample) in samples.iter().enumerate() {
        for sequence in sample.forward.sequences() {
            by_forward.entry(sequence.as_slice()).or_default().push(index);
        }
    }

    let mut collisions: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (forward, indices) in by_forward.iter().filter(|(_, v)| v.len() > 1) {
        let forward = String::from_utf8_lossy(forward);
        for (n, &a) in indices.iter().enumerate() {
            for &b in &indices[n + 1..] {
                for key in shared_keys(&forward, &samples[a], &samples[b]) {
                    let names = collisions.entry(key).or_default();
                    for name in [&samples[a].name, &samples[b].name] {
                        if !names.contains(name) {
                            names.push(name.clone());
                        }
                    }
                }
            }
        }
    }
    for names in collisions.values_mut() {
        names.sort();
    }
    AmbiguityReport { collisions }
}

fn shared_keys(forward: &str, a: &ResolvedSample, b: &ResolvedSample) -> Vec<String> {
    match (&a.reverse, &b.reverse) {
        (Some(ra), Some(rb)) => ra
            .sequences()
            .iter()
            .filter(|r| rb.contains(r.as_slice()))
            .map(|r| format!("{forward}+{}", String::from_utf8_lossy(r)))
            .collect(),
        _ => vec![forward.to_string()],
    }
}

/// Fail unless every barcode (or barcode pair) belongs to a single sample.
///
/// Each collision is logged before the error is returned.
///
/// # Errors
///
/// Returns `SampleSheetError::OverlappingSamples` if any collision is found.
pub fn ensure_distinct_samples(samples: &[ResolvedSample]) -> Result<(), SampleSheetError> {
    let report = check_sample_overlap(samples);
    if report.is_empty() {
        return Ok(());
    }
    for (sequence, names) in &report.collisions {
        error!(
            "Barcode {sequence} is claimed by {} samples: {}",
            names.len(),
            names.join(", ")
        );
    }
    Err(SampleSheetError::OverlappingSamples {
        count: report.len(),
    })
}

fn resolve_entry(
    entry: &SampleSheetEntry,
    catalog: &BarcodeCatalog,
) -> Result<ResolvedSample, SampleSheetError> {
    let (forward_barcodes, forward) = resolve_reference(&entry.name, &entry.forward, catalog)?;
    let (reverse_barcodes, reverse) = match &entry.reverse {
        Some(reference) => {
            let (joined, set) = resolve_reference(&entry.name, reference, catalog)?;
            (Some(joined), Some(set))
        }
        None => (None, None),
    };

    debug!(
        "Sample {}: {} forward sequences{}",
        entry.name,
        forward.len(),
        reverse
            .as_ref()
            .map(|r| format!(", {} reverse sequences", r.len()))
            .unwrap_or_default()
    );

    Ok(ResolvedSample {
        name: entry.name.clone(),
        forward_barcodes,
        reverse_barcodes,
        forward,
        reverse,
    })
}

fn resolve_reference(
    sample: &str,
    reference: &str,
    catalog: &BarcodeCatalog,
) -> Result<(String, BarcodeSet), SampleSheetError> {
    let raw = substitute(reference, catalog);
    if raw.is_empty() {
        return Err(SampleSheetError::EmptyBarcode {
            sample: sample.to_string(),
            reference: reference.to_string(),
        });
    }

    let set = BarcodeSet::from_raw(raw.iter().copied()).map_err(|source| {
        SampleSheetError::InvalidBarcode {
            sample: sample.to_string(),
            reference: reference.to_string(),
            source,
        }
    })?;

    if set.is_empty() || set.has_empty_sequence() {
        return Err(SampleSheetError::EmptyBarcode {
            sample: sample.to_string(),
            reference: reference.to_string(),
        });
    }

    Ok((raw.join(","), set))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> BarcodeCatalog {
        BarcodeCatalog::from_text("bc1,ACGT\nbc2,TTGY\nbc3,GGGGNN\n").unwrap()
    }

    #[test]
    fn test_parse_sample_sheet_text() {
        let sheet = "# sample fwd rev\nS1\tbc1\nS2  bc2,bc3   bc1\n\n";
        let entries = parse_sample_sheet_text(sheet).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "S1");
        assert_eq!(entries[0].forward, "bc1");
        assert_eq!(entries[0].reverse, None);
        assert_eq!(entries[1].forward, "bc2,bc3");
        assert_eq!(entries[1].reverse.as_deref(), Some("bc1"));
    }

    #[test]
    fn test_too_many_barcodes() {
        let result = parse_sample_sheet_text("S1 bc1 bc2 bc3\n");
        assert!(matches!(
            result,
            Err(SampleSheetError::TooManyBarcodes { count: 3, line: 1, .. })
        ));
    }

    #[test]
    fn test_no_barcodes() {
        let result = parse_sample_sheet_text("S1 bc1\nS2\n");
        assert!(matches!(
            result,
            Err(SampleSheetError::NoBarcodes { line: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_sample() {
        let result = parse_sample_sheet_text("S1 bc1\nS1 bc2\n");
        assert!(matches!(result, Err(SampleSheetError::DuplicateSample { .. })));
    }

    #[test]
    fn test_reserved_and_unsafe_names() {
        assert!(matches!(
            parse_sample_sheet_text("unassigned bc1\n"),
            Err(SampleSheetError::InvalidSampleName {
                source: ValidationError::ReservedName(_),
                ..
            })
        ));
        assert!(parse_sample_sheet_text("../S1 bc1\n").is_err());
    }

    #[test]
    fn test_empty_sheet() {
        assert!(matches!(
            parse_sample_sheet_text("# nothing here\n"),
            Err(SampleSheetError::Empty)
        ));
    }

    #[test]
    fn test_substitute_with_fallback() {
        let catalog = catalog();
        assert_eq!(substitute("bc1", &catalog), vec!["ACGT"]);
        assert_eq!(substitute("bc1,CCCC,bc2", &catalog), vec!["ACGT", "CCCC", "TTGY"]);
        assert_eq!(substitute("unknown", &catalog), vec!["unknown"]);
    }

    #[test]
    fn test_resolve() {
        let entries = parse_sample_sheet_text("S1 bc1\nS2 bc2,AAAA bc3\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();

        assert_eq!(samples[0].forward_barcodes, "ACGT");
        assert!(samples[0].reverse.is_none());
        assert!(samples[0].forward.contains(b"ACGT"));

        assert_eq!(samples[1].forward_barcodes, "TTGY,AAAA");
        assert_eq!(samples[1].forward.len(), 3);
        assert_eq!(samples[1].reverse_barcodes.as_deref(), Some("GGGGNN"));
        assert!(samples[1].reverse.as_ref().unwrap().contains(b"GGGG"));
    }

    #[test]
    fn test_resolve_invalid_literal() {
        // A misspelled key falls back to a literal, which is not a valid barcode
        let entries = parse_sample_sheet_text("S1 bc9\n").unwrap();
        let result = resolve(&entries, &catalog());
        assert!(matches!(
            result,
            Err(SampleSheetError::InvalidBarcode { ref sample, .. }) if sample == "S1"
        ));
    }

    #[test]
    fn test_resolve_all_n_barcode() {
        let entries = parse_sample_sheet_text("S1 NNNN\n").unwrap();
        assert!(matches!(
            resolve(&entries, &catalog()),
            Err(SampleSheetError::EmptyBarcode { .. })
        ));
    }

    #[test]
    fn test_literal_overlapping_catalog_key() {
        let entries = parse_sample_sheet_text("S1 bc1\nS2 ACGT\nS3 bc2\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();

        let report = check_sample_overlap(&samples);
        assert_eq!(report.len(), 1);
        assert_eq!(report.collisions["ACGT"], vec!["S1", "S2"]);
        assert!(matches!(
            ensure_distinct_samples(&samples),
            Err(SampleSheetError::OverlappingSamples { count: 1 })
        ));
    }

    #[test]
    fn test_degenerate_overlap_between_samples() {
        // TTGY covers TTGC, which S2 names directly
        let entries = parse_sample_sheet_text("S1 bc2\nS2 TTGC\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();
        assert_eq!(check_sample_overlap(&samples).count("TTGC"), 2);
    }

    #[test]
    fn test_paired_samples_distinct_by_reverse() {
        let entries =
            parse_sample_sheet_text("S1 bc1 GGCC\nS2 bc1 GGCA\nS3 CCCC GGCC\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();
        assert!(check_sample_overlap(&samples).is_empty());
        assert!(ensure_distinct_samples(&samples).is_ok());

        let entries = parse_sample_sheet_text("S1 bc1 GGCY\nS2 bc1 GGCT\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();
        let report = check_sample_overlap(&samples);
        assert_eq!(report.collisions["ACGT+GGCT"], vec!["S1", "S2"]);
    }

    #[test]
    fn test_forward_only_sample_overlaps_paired_sample() {
        let entries = parse_sample_sheet_text("S1 bc1\nS2 bc1 GGCC\n").unwrap();
        let samples = resolve(&entries, &catalog()).unwrap();
        assert_eq!(check_sample_overlap(&samples).collisions["ACGT"], vec!["S1", "S2"]);
    }

    #[test]
    fn test_resolve_empty_reference_list() {
        let entries = parse_sample_sheet_text("S1 ,\n").unwrap();
        assert!(matches!(
            resolve(&entries, &catalog()),
            Err(SampleSheetError::EmptyBarcode { .. })
        ));
    }
}
