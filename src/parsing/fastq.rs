//! FASTQ read store with mate pairing.
//!
//! Forward reads are streamed first and keyed by read name (see
//! [`crate::core::read::read_name`]); reverse reads are then attached to their
//! forward mate by the same name. Files ending in `.gz` or `.bgz` are decompressed
//! transparently.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::read::MultiGzDecoder;
use seq_io::fastq::{Error as FastqError, Reader as FastqReader, Record};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::read::{read_name, MalformedReadError, Read};
use crate::utils::validation::{check_read_limit, MAX_READS};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("FASTQ file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read FASTQ file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse FASTQ record in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error(transparent)]
    Malformed(#[from] MalformedReadError),

    #[error("Read '{read_id}' appears more than once in {source_name}")]
    DuplicateId {
        read_id: String,
        source_name: String,
    },

    #[error("Too many reads in {source_name} (maximum {limit})")]
    TooManyReads { source_name: String, limit: usize },
}

/// Check if a path looks gzip-compressed by its extension
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a FASTQ file, decompressing if needed.
///
/// # Errors
///
/// Returns `ReadError::NotFound` if the path does not exist or `ReadError::Io` if
/// it cannot be opened.
pub fn open_fastq(path: &Path) -> Result<FastqReader<Box<dyn BufRead + Send>>, ReadError> {
    if !path.exists() {
        return Err(ReadError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader: Box<dyn BufRead + Send> = if is_gzipped(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(FastqReader::new(reader))
}

/// Convert a FASTQ reader error, keeping length mismatches as malformed reads
fn record_error(error: FastqError, source_name: &str) -> ReadError {
    match error {
        FastqError::UnequalLengths { seq, qual, pos } => {
            let read_id = pos
                .id
                .unwrap_or_else(|| format!("record at line {}", pos.line));
            MalformedReadError::new(
                &read_id,
                format!("sequence length {seq} does not match quality length {qual}"),
            )
            .into()
        }
        FastqError::Io(e) => ReadError::Io(e),
        other => ReadError::Parse {
            source_name: source_name.to_string(),
            message: other.to_string(),
        },
    }
}

/// All reads of a run, in forward-file order, with reverse mates attached.
#[derive(Debug, Default)]
pub struct ReadCollection {
    reads: Vec<Read>,
    index: HashMap<String, usize>,
    orphans: usize,
    paired: bool,
}

impl ReadCollection {
    /// Load forward reads and, if given, attach reverse mates.
    ///
    /// # Errors
    ///
    /// Returns a `ReadError` if either file is missing, unreadable, contains a
    /// malformed record or duplicate read name, or exceeds the read limit. Orphan
    /// reverse reads are logged and counted, not errors.
    pub fn load(forward: &Path, reverse: Option<&Path>) -> Result<Self, ReadError> {
        let mut collection = Self::default();

        info!("Reading forward reads from {}", forward.display());
        let start = Instant::now();
        let count = collection.add_forward(open_fastq(forward)?, &forward.display().to_string())?;
        debug!(
            "Read {count} forward reads in {:.3} seconds",
            start.elapsed().as_secs_f64()
        );

        if let Some(reverse) = reverse {
            info!("Reading reverse reads from {}", reverse.display());
            let start = Instant::now();
            let paired =
                collection.add_reverse(open_fastq(reverse)?, &reverse.display().to_string())?;
            debug!(
                "Paired {paired} reverse reads in {:.3} seconds",
                start.elapsed().as_secs_f64()
            );
        }

        if collection.is_empty() {
            warn!("No reads found in {}", forward.display());
        }
        Ok(collection)
    }

    /// Stream forward records from a reader, returning the number added.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::Parse` for unparseable records, `ReadError::Malformed`
    /// for sequence/quality length mismatches, `ReadError::DuplicateId` if a read
    /// name repeats, or `ReadError::TooManyReads` past the read limit.
    pub fn add_forward<R: std::io::Read>(
        &mut self,
        mut reader: FastqReader<R>,
        source_name: &str,
    ) -> Result<usize, ReadError> {
        let before = self.reads.len();

        while let Some(result) = reader.next() {
            let record = result.map_err(|e| record_error(e, source_name))?;

            if check_read_limit(self.reads.len()).is_some() {
                return Err(ReadError::TooManyReads {
                    source_name: source_name.to_string(),
                    limit: MAX_READS,
                });
            }

            let header = String::from_utf8_lossy(record.head()).into_owned();
            let read = Read::new(header, record.seq(), record.qual())?;
            let name = read.name().to_string();

            if self.index.contains_key(&name) {
                return Err(ReadError::DuplicateId {
                    read_id: name,
                    source_name: source_name.to_string(),
                });
            }
            self.index.insert(name, self.reads.len());
            self.reads.push(read);
        }

        Ok(self.reads.len() - before)
    }

    /// Stream reverse records from a reader and attach each to its forward mate.
    ///
    /// Returns the number of reverse reads that were paired. A reverse read with no
    /// forward mate is logged and counted as an orphan.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::Parse` for unparseable records, or
    /// `ReadError::Malformed` for length mismatches and repeated mates.
    pub fn add_reverse<R: std::io::Read>(
        &mut self,
        mut reader: FastqReader<R>,
        source_name: &str,
    ) -> Result<usize, ReadError> {
        self.paired = true;
        let mut paired = 0;

        while let Some(result) = reader.next() {
            let record = result.map_err(|e| record_error(e, source_name))?;

            let header = String::from_utf8_lossy(record.head()).into_owned();
            let Some(&position) = self.index.get(read_name(&header)) else {
                error!(
                    "Reverse read '{}' has no forward mate; skipping it",
                    read_name(&header)
                );
                self.orphans += 1;
                continue;
            };

            self.reads[position].add_reverse(header, record.seq(), record.qual())?;
            paired += 1;
        }

        if self.orphans > 0 {
            warn!("{} reverse reads had no forward mate", self.orphans);
        }
        let unpaired = self.reads.len() - paired;
        if unpaired > 0 {
            warn!("{unpaired} forward reads have no reverse mate");
        }
        Ok(paired)
    }

    /// Look up a read by name
    pub fn get(&self, name: &str) -> Option<&Read> {
        self.index.get(name).map(|&i| &self.reads[i])
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Reverse reads dropped for lack of a forward mate
    pub fn orphans(&self) -> usize {
        self.orphans
    }

    /// True if a reverse file was loaded
    pub fn is_paired(&self) -> bool {
        self.paired
    }

    pub fn reads(&self) -> &[Read] {
        &self.reads
    }

    pub fn iter(&self) -> impl Iterator<Item = &Read> {
        self.reads.iter()
    }

    /// Consume the collection, returning reads in forward-file order
    pub fn into_reads(self) -> Vec<Read> {
        self.reads
    }
}
