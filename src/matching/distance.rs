//! Bounded Hamming distance between read prefixes and barcodes.

use crate::core::barcode::BarcodeSet;

/// Best match of a read prefix against a barcode set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarcodeHit {
    /// Mismatches between the read prefix and the barcode
    pub distance: usize,
    /// Length of the matched barcode (and so of the read prefix compared)
    pub length: usize,
}

/// Hamming distance between two equal-length sequences, or `None` once it
/// exceeds `limit`.
///
/// Comparison is case-insensitive. Sequences of different length never match.
///
/// ```
/// use barcseek::matching::distance::bounded_hamming;
///
/// assert_eq!(bounded_hamming(b"ACGT", b"acgA", 1), Some(1));
/// assert_eq!(bounded_hamming(b"ACGT", b"TTTT", 2), None);
/// ```
#[must_use]
pub fn bounded_hamming(a: &[u8], b: &[u8], limit: usize) -> Option<usize> {
    if a.len() != b.len() {
        return None;
    }
    let mut distance = 0;
    for (x, y) in a.iter().zip(b) {
        if !x.eq_ignore_ascii_case(y) {
            distance += 1;
            if distance > limit {
                return None;
            }
        }
    }
    Some(distance)
}

/// Distance between the barcode and the read prefix of the same length.
///
/// A read shorter than the barcode never matches.
#[must_use]
pub fn prefix_distance(read: &[u8], barcode: &[u8], limit: usize) -> Option<usize> {
    read.get(..barcode.len())
        .and_then(|prefix| bounded_hamming(prefix, barcode, limit))
}

/// Minimum prefix distance over every sequence in the set, within `limit`.
///
/// Among equally close sequences the first in set order (shortest, then
/// lexicographic) is reported. The running best tightens the limit, so later
/// comparisons stop as soon as they cannot improve on it.
#[must_use]
pub fn best_match(read: &[u8], set: &BarcodeSet, limit: usize) -> Option<BarcodeHit> {
    let mut best: Option<BarcodeHit> = None;

    for barcode in set.sequences() {
        if best.is_some_and(|hit| hit.distance == 0) {
            break;
        }
        let bound = best.map_or(limit, |hit| hit.distance - 1);
        if let Some(distance) = prefix_distance(read, barcode, bound) {
            best = Some(BarcodeHit {
                distance,
                length: barcode.len(),
            });
        }
    }

    best
}
