use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::iupac::{expand, IupacError};

/// The concrete sequences one barcode reference can match.
///
/// Built from one or more raw barcodes (synonyms), each expanded through the IUPAC
/// table. Sequences are unique, upper-case, and sorted by length and then
/// lexicographically, which gives matching a deterministic scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeSet {
    sequences: Vec<Vec<u8>>,
}

impl BarcodeSet {
    /// Expand and merge a list of raw barcodes.
    ///
    /// # Errors
    ///
    /// Returns an `IupacError` if any raw barcode contains an invalid code or
    /// expands past the limit.
    pub fn from_raw<'a>(raw: impl IntoIterator<Item = &'a str>) -> Result<Self, IupacError> {
        let mut merged = BTreeSet::new();
        for barcode in raw {
            merged.extend(expand(barcode)?);
        }
        Ok(Self::from_concrete(merged))
    }

    fn from_concrete(sequences: BTreeSet<String>) -> Self {
        let mut sequences: Vec<Vec<u8>> = sequences.into_iter().map(String::into_bytes).collect();
        sequences.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        Self { sequences }
    }

    pub fn sequences(&self) -> &[Vec<u8>] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// True if any concrete sequence is empty (the raw barcode was all `N`)
    pub fn has_empty_sequence(&self) -> bool {
        self.sequences.iter().any(Vec::is_empty)
    }

    pub fn contains(&self, sequence: &[u8]) -> bool {
        self.sequences.iter().any(|s| s.as_slice() == sequence)
    }

    /// Length of the longest concrete sequence
    pub fn max_len(&self) -> usize {
        self.sequences.last().map_or(0, Vec::len)
    }
}
