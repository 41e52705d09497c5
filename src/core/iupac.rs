//! Expansion of degenerate (IUPAC) barcode strings into concrete sequences.
//!
//! | Code | Bases   | Code | Bases   |
//! |------|---------|------|---------|
//! | R    | A, G    | K    | G, T    |
//! | Y    | C, T    | M    | A, C    |
//! | S    | C, G    | B    | C, G, T |
//! | W    | A, T    | D    | A, G, T |
//! | H    | A, C, T | V    | A, C, G |
//!
//! `N` is a wildcard (typically a UMI position). It is never matched literally,
//! so it is removed before expansion and does not multiply the result.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::utils::validation::check_expansion_limit;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IupacError {
    #[error("Invalid nucleotide code '{code}' at position {position} in barcode '{barcode}'")]
    InvalidCode {
        barcode: String,
        code: char,
        position: usize,
    },

    #[error("Barcode '{barcode}' expands to more than {limit} sequences")]
    TooManyExpansions { barcode: String, limit: usize },
}

/// Concrete bases denoted by an IUPAC ambiguity code.
///
/// Returns `None` for the plain bases `A`, `C`, `G`, `T`, `N` and for anything that
/// is not a recognized code.
#[must_use]
pub fn ambiguity_bases(code: u8) -> Option<&'static [u8]> {
    match code {
        b'R' => Some(b"AG"),
        b'Y' => Some(b"CT"),
        b'S' => Some(b"CG"),
        b'W' => Some(b"AT"),
        b'K' => Some(b"GT"),
        b'M' => Some(b"AC"),
        b'B' => Some(b"CGT"),
        b'D' => Some(b"AGT"),
        b'H' => Some(b"ACT"),
        b'V' => Some(b"ACG"),
        _ => None,
    }
}

fn is_plain_base(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T' | b'N')
}

/// Expand a raw barcode into the set of concrete sequences it denotes.
///
/// The input is upper-cased, `N` positions are dropped, and every ambiguity code
/// is replaced by each of its bases in turn. Expansion runs over an explicit
/// work stack, so barcode length does not bound call depth.
///
/// ```
/// use barcseek::core::iupac::expand;
///
/// let expanded = expand("AY").unwrap();
/// assert_eq!(expanded.into_iter().collect::<Vec<_>>(), vec!["AC", "AT"]);
/// assert_eq!(expand("ACGN").unwrap().len(), 1);
/// ```
///
/// # Errors
///
/// Returns `IupacError::InvalidCode` for a character that is neither a base nor an
/// ambiguity code, or `IupacError::TooManyExpansions` if the result would exceed
/// the expansion limit.
pub fn expand(barcode: &str) -> Result<BTreeSet<String>, IupacError> {
    let normalized = barcode.trim().to_ascii_uppercase();

    // Validate up front so errors report positions in the caller's string
    for (position, code) in normalized.bytes().enumerate() {
        if !is_plain_base(code) && ambiguity_bases(code).is_none() {
            return Err(IupacError::InvalidCode {
                barcode: barcode.to_string(),
                code: normalized[position..].chars().next().unwrap_or('?'),
                position,
            });
        }
    }

    let stripped: Vec<u8> = normalized.bytes().filter(|&b| b != b'N').collect();
    let mut expanded = BTreeSet::new();
    let mut stack = vec![stripped];

    while let Some(mut candidate) = stack.pop() {
        let Some(position) = candidate.iter().position(|&b| ambiguity_bases(b).is_some()) else {
            // Only A/C/G/T remain, so this is valid UTF-8
            expanded.insert(String::from_utf8_lossy(&candidate).into_owned());
            if let Some(limit) = check_expansion_limit(expanded.len()) {
                return Err(IupacError::TooManyExpansions {
                    barcode: barcode.to_string(),
                    limit,
                });
            }
            continue;
        };

        let Some((last, rest)) = ambiguity_bases(candidate[position]).and_then(<[u8]>::split_last)
        else {
            continue;
        };
        for &base in rest {
            let mut branch = candidate.clone();
            branch[position] = base;
            stack.push(branch);
        }
        candidate[position] = *last;
        stack.push(candidate);
    }

    Ok(expanded)
}

/// Whether a barcode contains any ambiguity codes (ignoring `N`).
#[must_use]
pub fn is_degenerate(barcode: &str) -> bool {
    barcode
        .bytes()
        .any(|b| ambiguity_bases(b.to_ascii_uppercase()).is_some())
}
