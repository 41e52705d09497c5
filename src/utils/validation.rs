//! Centralized validation and helper functions.

use std::num::NonZeroUsize;

use tracing::warn;

use crate::core::types::UNASSIGNED;

/// Maximum number of concrete sequences a single raw barcode may expand to
pub const MAX_EXPANSIONS: usize = 1 << 16;

/// Maximum number of reads in one in-memory read collection
pub const MAX_READS: usize = 500_000_000;

/// Sample names become file names, so they share the file name length limit
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Validation error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    NameTooLong,
    #[error("Invalid name '{0}': contains path separators, '..', or control characters")]
    InvalidName(String),
    #[error("Empty name provided")]
    EmptyName,
    #[error("'{0}' is reserved for reads that match no sample")]
    ReservedName(String),
    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// Check if one more expanded sequence would exceed the maximum allowed.
///
/// Call this with the count AFTER adding. Returns the limit if it has been exceeded,
/// None if still within bounds.
#[must_use]
pub fn check_expansion_limit(count: usize) -> Option<usize> {
    if count > MAX_EXPANSIONS {
        Some(MAX_EXPANSIONS)
    } else {
        None
    }
}

/// Check if adding another read would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new read.
#[must_use]
pub fn check_read_limit(count: usize) -> Option<String> {
    if count >= MAX_READS {
        Some(format!(
            "Too many reads: adding another would exceed maximum of {MAX_READS}"
        ))
    } else {
        None
    }
}

/// Validate a sample name for use as an output file stem.
///
/// Unlike a general-purpose sanitizer, names are never rewritten: two samples
/// must never collapse onto the same file, so anything unsafe is rejected.
///
/// # Errors
///
/// Returns `ValidationError::EmptyName` for empty names, `ValidationError::NameTooLong`
/// if it exceeds the limit, `ValidationError::ReservedName` for the unassigned bucket
/// name, or `ValidationError::InvalidName` for path traversal, separators, control
/// characters, or hidden-file names.
pub fn validate_sample_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if name.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    if name.eq_ignore_ascii_case(UNASSIGNED) {
        return Err(ValidationError::ReservedName(name.to_string()));
    }

    if name.contains("..") || name.contains('/') || name.contains('\\') || name.starts_with('.')
    {
        return Err(ValidationError::InvalidName(name.to_string()));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(name.escape_default().to_string()));
    }

    Ok(())
}

/// Number of cores available to this process, falling back to 1.
#[must_use]
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Resolve the requested worker count.
///
/// `None` means "use every available core". Requests above the available core
/// count are clamped with a warning.
///
/// # Errors
///
/// Returns `ValidationError::NoWorkers` if zero workers are requested.
pub fn resolve_worker_count(requested: Option<usize>) -> Result<usize, ValidationError> {
    let cores = available_cores();
    match requested {
        None => Ok(cores),
        Some(0) => Err(ValidationError::NoWorkers),
        Some(n) if n > cores => {
            warn!("Requested {n} workers but only {cores} cores are available; using {cores}");
            Ok(cores)
        }
        Some(n) => Ok(n),
    }
}
