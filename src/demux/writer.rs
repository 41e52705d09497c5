//! Per-sample FASTQ output.
//!
//! Every output stream is owned by a single [`OutputSet`], which lives on the
//! writer thread only. Data goes to a temporary file in the output directory
//! first; [`OutputSet::finish`] moves each file to its final name, while
//! [`OutputSet::abandon`] keeps what was written under a `.partial` name.
//!
//! | Run | Files per sample |
//! |-----|------------------|
//! | single-end | `<sample>.fastq` |
//! | paired-end | `<sample>_R1.fastq`, `<sample>_R2.fastq`, `<sample>_unpaired.fastq` |
//!
//! In a paired-end run the `_R1`/`_R2` files always hold the same records in the
//! same order; forward reads whose mate was missing go to `_unpaired`.
//! With gzip enabled each name gains a `.gz` suffix. Reads that match no sample
//! go to the same layout under the name `unassigned`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::read::Read;
use crate::core::types::{Assignment, UNASSIGNED};

/// Default output directory
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "output";

/// Suffix for files left behind by an interrupted or failed run
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Where and how output files are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Compress output with gzip
    pub gzip: bool,
    /// Remove the matched barcode from the start of assigned reads
    pub trim_barcodes: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            gzip: false,
            trim_barcodes: false,
        }
    }
}

/// File name for one output stream.
///
/// `mate` is `None` for single-end runs and `Some(1)` / `Some(2)` for paired runs.
#[must_use]
pub fn output_file_name(stem: &str, mate: Option<u8>, gzip: bool) -> String {
    let mut name = match mate {
        Some(mate) => format!("{stem}_R{mate}.fastq"),
        None => format!("{stem}.fastq"),
    };
    if gzip {
        name.push_str(".gz");
    }
    name
}

/// File name for forward reads without a mate in a paired-end run
#[must_use]
pub fn unpaired_file_name(stem: &str, gzip: bool) -> String {
    let mut name = format!("{stem}_unpaired.fastq");
    if gzip {
        name.push_str(".gz");
    }
    name
}

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Plain(writer) => writer,
            Self::Gzip(writer) => writer,
        }
    }

    /// Flush everything and hand back the temporary file
    fn into_temp_file(self) -> io::Result<NamedTempFile> {
        let buffered = match self {
            Self::Plain(writer) => writer,
            Self::Gzip(writer) => writer.finish()?,
        };
        buffered.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

/// One output file, written to a temporary name until persisted
struct OutputFile {
    sink: Sink,
    path: PathBuf,
}

impl OutputFile {
    fn create(directory: &Path, file_name: &str, gzip: bool) -> io::Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix(".barcseek-")
            .suffix(".tmp")
            .tempfile_in(directory)?;
        let buffered = BufWriter::new(temp);
        let sink = if gzip {
            Sink::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            Sink::Plain(buffered)
        };
        Ok(Self {
            sink,
            path: directory.join(file_name),
        })
    }

    fn persist_as(self, path: PathBuf) -> io::Result<PathBuf> {
        let temp = self.sink.into_temp_file()?;
        let file: File = temp.persist(&path).map_err(|e| e.error)?;
        file.sync_all()?;
        Ok(path)
    }

    fn finish(self) -> io::Result<PathBuf> {
        let path = self.path.clone();
        self.persist_as(path)
    }

    fn abandon(self) -> io::Result<PathBuf> {
        let mut partial = self.path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        self.persist_as(PathBuf::from(partial))
    }
}

enum SampleOutput {
    Single(OutputFile),
    Paired {
        forward: OutputFile,
        reverse: OutputFile,
        unpaired: OutputFile,
    },
}

impl SampleOutput {
    fn create(config: &OutputConfig, stem: &str, paired: bool) -> io::Result<Self> {
        let directory = &config.directory;
        let gzip = config.gzip;
        if !paired {
            let file = OutputFile::create(directory, &output_file_name(stem, None, gzip), gzip)?;
            return Ok(Self::Single(file));
        }
        Ok(Self::Paired {
            forward: OutputFile::create(directory, &output_file_name(stem, Some(1), gzip), gzip)?,
            reverse: OutputFile::create(directory, &output_file_name(stem, Some(2), gzip), gzip)?,
            unpaired: OutputFile::create(directory, &unpaired_file_name(stem, gzip), gzip)?,
        })
    }

    fn into_files(self) -> Vec<OutputFile> {
        match self {
            Self::Single(file) => vec![file],
            Self::Paired {
                forward,
                reverse,
                unpaired,
            } => vec![forward, reverse, unpaired],
        }
    }
}

/// Output streams for every sample plus the unassigned bucket.
pub struct OutputSet {
    /// Sample outputs in sample order, then the unassigned bucket
    outputs: Vec<SampleOutput>,
    trim_barcodes: bool,
}

impl OutputSet {
    /// Create output files for the given samples and the unassigned bucket.
    ///
    /// The output directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from creating the directory or temporary files.
    pub fn create<'a>(
        config: &OutputConfig,
        sample_names: impl IntoIterator<Item = &'a str>,
        paired: bool,
    ) -> io::Result<Self> {
        std::fs::create_dir_all(&config.directory)?;

        let outputs = sample_names
            .into_iter()
            .chain(std::iter::once(UNASSIGNED))
            .map(|stem| SampleOutput::create(config, stem, paired))
            .collect::<io::Result<Vec<_>>>()?;
        debug!(
            "Opened {} output streams in {}",
            outputs.len(),
            config.directory.display()
        );

        Ok(Self {
            outputs,
            trim_barcodes: config.trim_barcodes,
        })
    }

    /// Write a read to the stream its assignment selects.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying file.
    pub fn write(&mut self, read: &Read, assignment: &Assignment) -> io::Result<()> {
        let unassigned = self.outputs.len() - 1;
        let index = assignment
            .outcome
            .sample_index()
            .filter(|&i| i < unassigned)
            .unwrap_or(unassigned);

        let trimmed;
        let read = match assignment.matched_lengths {
            Some((forward, reverse)) if self.trim_barcodes && index != unassigned => {
                let mut copy = read.clone();
                copy.trim_prefix(forward, reverse);
                trimmed = copy;
                &trimmed
            }
            _ => read,
        };

        match &mut self.outputs[index] {
            SampleOutput::Single(file) => read.write_forward(file.sink.writer()),
            SampleOutput::Paired {
                forward, reverse, ..
            } if read.is_paired() => {
                read.write_forward(forward.sink.writer())?;
                read.write_reverse(reverse.sink.writer())
            }
            SampleOutput::Paired { unpaired, .. } => read.write_forward(unpaired.sink.writer()),
        }
    }

    /// Flush every stream and move it to its final name.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered. Streams not yet persisted when it
    /// occurs are discarded.
    pub fn finish(self) -> io::Result<Vec<PathBuf>> {
        self.outputs
            .into_iter()
            .flat_map(SampleOutput::into_files)
            .map(OutputFile::finish)
            .collect()
    }

    /// Flush every stream and keep it under a `.partial` name.
    ///
    /// Best effort: failures are logged and the remaining streams are still kept.
    pub fn abandon(self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for file in self.outputs.into_iter().flat_map(SampleOutput::into_files) {
            let target = file.path.clone();
            match file.abandon() {
                Ok(path) => paths.push(path),
                Err(e) => warn!("Failed to keep partial output {}: {e}", target.display()),
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnassignedReason;
    use std::io::Read as _;

    fn config(dir: &Path) -> OutputConfig {
        OutputConfig {
            directory: dir.to_path_buf(),
            ..OutputConfig::default()
        }
    }

    fn read(header: &str, seq: &str) -> Read {
        Read::new(header, seq, "I".repeat(seq.len())).unwrap()
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("S1", None, false), "S1.fastq");
        assert_eq!(output_file_name("S1", Some(1), false), "S1_R1.fastq");
        assert_eq!(output_file_name("S1", Some(2), true), "S1_R2.fastq.gz");
        assert_eq!(unpaired_file_name("S1", false), "S1_unpaired.fastq");
    }

    #[test]
    fn test_single_end_routing() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputSet::create(&config(dir.path()), ["S1", "S2"], false).unwrap();

        outputs
            .write(&read("r1", "ACGT"), &Assignment::assigned("r1", 1, 0, (2, None)))
            .unwrap();
        outputs
            .write(
                &read("r2", "TTTT"),
                &Assignment::unassigned("r2", UnassignedReason::NoMatch, None),
            )
            .unwrap();
        let paths = outputs.finish().unwrap();
        assert_eq!(paths.len(), 3);

        let s1 = std::fs::read_to_string(dir.path().join("S1.fastq")).unwrap();
        let s2 = std::fs::read_to_string(dir.path().join("S2.fastq")).unwrap();
        let unassigned = std::fs::read_to_string(dir.path().join("unassigned.fastq")).unwrap();
        assert!(s1.is_empty());
        assert_eq!(s2, "@r1\nACGT\n+r1\nIIII\n");
        assert_eq!(unassigned, "@r2\nTTTT\n+r2\nIIII\n");

        // No temporary files are left behind
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_paired_files_and_trimming() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            trim_barcodes: true,
            ..config(dir.path())
        };
        let mut outputs = OutputSet::create(&config, ["S1"], true).unwrap();

        let mut pair = read("r1/1", "ACGTAAAA");
        pair.add_reverse("r1/2", "GGCC", "####").unwrap();
        outputs
            .write(&pair, &Assignment::assigned("r1/1", 0, 0, (4, Some(2))))
            .unwrap();
        outputs.finish().unwrap();

        let r1 = std::fs::read_to_string(dir.path().join("S1_R1.fastq")).unwrap();
        let r2 = std::fs::read_to_string(dir.path().join("S1_R2.fastq")).unwrap();
        assert_eq!(r1, "@r1/1\nAAAA\n+r1/1\nIIII\n");
        assert_eq!(r2, "@r1/2\nCC\n+r1/2\n##\n");
        assert!(dir.path().join("unassigned_R1.fastq").exists());
        assert!(dir.path().join("unassigned_R2.fastq").exists());
        assert!(dir.path().join("unassigned_unpaired.fastq").exists());
    }

    #[test]
    fn test_mateless_read_in_paired_run_goes_to_unpaired() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputSet::create(&config(dir.path()), ["S1"], true).unwrap();

        let mut pair = read("r1/1", "ACGTAAAA");
        pair.add_reverse("r1/2", "GGCC", "####").unwrap();
        outputs
            .write(&pair, &Assignment::assigned("r1/1", 0, 0, (4, None)))
            .unwrap();
        outputs
            .write(&read("r2/1", "ACGTCCCC"), &Assignment::assigned("r2/1", 0, 0, (4, None)))
            .unwrap();
        let paths = outputs.finish().unwrap();
        assert_eq!(paths.len(), 6);

        let r1 = std::fs::read_to_string(dir.path().join("S1_R1.fastq")).unwrap();
        let r2 = std::fs::read_to_string(dir.path().join("S1_R2.fastq")).unwrap();
        let unpaired = std::fs::read_to_string(dir.path().join("S1_unpaired.fastq")).unwrap();
        assert_eq!(r1.lines().count(), r2.lines().count());
        assert_eq!(r1, "@r1/1\nACGTAAAA\n+r1/1\nIIIIIIII\n");
        assert_eq!(unpaired, "@r2/1\nACGTCCCC\n+r2/1\nIIIIIIII\n");
    }

    #[test]
    fn test_gzip_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            gzip: true,
            ..config(dir.path())
        };
        let mut outputs = OutputSet::create(&config, ["S1"], false).unwrap();
        outputs
            .write(&read("r1", "ACGT"), &Assignment::assigned("r1", 0, 0, (4, None)))
            .unwrap();
        outputs.finish().unwrap();

        let file = File::open(dir.path().join("S1.fastq.gz")).unwrap();
        let mut text = String::new();
        flate2::read::MultiGzDecoder::new(file)
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "@r1\nACGT\n+r1\nIIII\n");
    }

    #[test]
    fn test_abandon_keeps_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputSet::create(&config(dir.path()), ["S1"], false).unwrap();
        outputs
            .write(&read("r1", "ACGT"), &Assignment::assigned("r1", 0, 0, (4, None)))
            .unwrap();
        let paths = outputs.abandon();

        assert_eq!(paths.len(), 2);
        assert!(!dir.path().join("S1.fastq").exists());
        let partial = std::fs::read_to_string(dir.path().join("S1.fastq.partial")).unwrap();
        assert_eq!(partial, "@r1\nACGT\n+r1\nIIII\n");
    }
}
