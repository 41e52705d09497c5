use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, error};

use crate::catalog::store::{BarcodeCatalog, CatalogError};
use crate::core::iupac::expand;

/// Concrete sequences recognized by more than one catalog entry.
///
/// Any non-empty report makes sample assignment undefined and must stop the run
/// before reads are processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmbiguityReport {
    /// Concrete sequence -> names of the entries that expand to it (sorted, len > 1)
    pub collisions: BTreeMap<String, Vec<String>>,
}

impl AmbiguityReport {
    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collisions.len()
    }

    /// Number of distinct entries expanding to `sequence` (0 if not ambiguous)
    pub fn count(&self, sequence: &str) -> usize {
        self.collisions.get(sequence).map_or(0, Vec::len)
    }

    /// `(sequence, count)` pairs in sequence order
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.collisions.iter().map(|(s, names)| (s.as_str(), names.len()))
    }
}

impl std::fmt::Display for AmbiguityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (sequence, names) in &self.collisions {
            writeln!(f, "{sequence}\t{}\t{}", names.len(), names.join(","))?;
        }
        Ok(())
    }
}

/// Find concrete sequences shared by two or more catalog entries.
///
/// Every entry is expanded; an entry contributes each of its sequences once, so
/// a count above one always means distinct entries collide. Like the expansion
/// itself, `N` positions are not considered: `ACGN` and `ACGT` are reported only
/// if they collide after `N` removal (`ACG` vs `ACGT` do not).
///
/// # Errors
///
/// Returns `CatalogError::Iupac` naming the first entry with an invalid code.
pub fn check_ambiguity(catalog: &BarcodeCatalog) -> Result<AmbiguityReport, CatalogError> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, raw) in catalog.iter() {
        let expanded = expand(raw).map_err(|source| CatalogError::Iupac {
            name: name.to_string(),
            source,
        })?;
        for sequence in expanded {
            seen.entry(sequence).or_default().push(name.to_string());
        }
    }
    debug!("Expanded {} barcodes into {} sequences", catalog.len(), seen.len());

    seen.retain(|_, names| names.len() > 1);
    Ok(AmbiguityReport { collisions: seen })
}

/// Fail unless no concrete sequence is shared between catalog entries.
///
/// Each collision is logged before the error is returned.
///
/// # Errors
///
/// Returns `CatalogError::Ambiguous` if the report is non-empty, or
/// `CatalogError::Iupac` if an entry cannot be expanded.
pub fn ensure_unambiguous(catalog: &BarcodeCatalog) -> Result<(), CatalogError> {
    let report = check_ambiguity(catalog)?;
    if report.is_empty() {
        return Ok(());
    }
    for (sequence, names) in &report.collisions {
        error!(
            "Sequence {sequence} is recognized by {} barcodes: {}",
            names.len(),
            names.join(", ")
        );
    }
    Err(CatalogError::Ambiguous {
        count: report.len(),
    })
}
