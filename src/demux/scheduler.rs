//! Partition scheduler: drives assignment over all reads and writes the output.
//!
//! Reads are split into contiguous chunks by count. With one worker the chunks
//! are assigned and written inline. With more, a feeder thread sends chunks over
//! a bounded channel to a pool of worker threads; finished chunks come back over
//! a second channel to the calling thread, which restores chunk order with a
//! [`ReorderBuffer`] and is the only writer of the output files.
//!
//! ```text
//! feeder ──chunks──▶ worker × N ──assignments──▶ reorder ──▶ OutputSet
//! ```
//!
//! Cancellation stops the feeder, asks workers to drop their current chunk,
//! waits up to the grace period for them to exit, and keeps whatever was
//! already written as `.partial` files.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::read::Read;
use crate::core::types::Assignment;
use crate::demux::cancel::CancellationToken;
use crate::demux::reorder::ReorderBuffer;
use crate::demux::summary::AssignmentCounts;
use crate::demux::writer::OutputSet;
use crate::matching::engine::Assigner;

/// Default wait for workers to stop after cancellation
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(5_000);

const MIN_CHUNK_SIZE: usize = 1_000;
const MAX_CHUNK_SIZE: usize = 100_000;
const CHUNKS_PER_WORKER: usize = 4;

/// Reads assigned between cancellation checks within a chunk
const CANCEL_CHECK_INTERVAL: usize = 1_024;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum DemuxError {
    #[error("Demultiplexing was interrupted")]
    Interrupted,

    #[error("A worker thread panicked; the run was aborted")]
    WorkerPanicked,

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; 1 runs inline on the calling thread
    pub workers: usize,
    /// Reads per chunk; derived from the read and worker counts when `None`
    pub chunk_size: Option<usize>,
    /// How long to wait for workers after cancellation
    pub grace_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            chunk_size: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl SchedulerConfig {
    /// Chunk size for a run over `total` reads
    #[must_use]
    pub fn chunk_size_for(&self, total: usize) -> usize {
        match self.chunk_size {
            Some(size) => size.max(1),
            None => total
                .div_ceil(self.workers.max(1) * CHUNKS_PER_WORKER)
                .clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct DemuxReport {
    pub counts: AssignmentCounts,
    pub output_files: Vec<PathBuf>,
    pub chunk_size: usize,
}

/// A chunk of reads with their assignments, in input order
struct ChunkResult {
    seq: u64,
    reads: Vec<Read>,
    assignments: Vec<Assignment>,
}

pub struct Scheduler {
    assigner: Arc<Assigner>,
    config: SchedulerConfig,
    token: CancellationToken,
}

impl Scheduler {
    pub fn new(assigner: Arc<Assigner>, config: SchedulerConfig, token: CancellationToken) -> Self {
        Self {
            assigner,
            config,
            token,
        }
    }

    /// Assign every read and write it to its sample's output.
    ///
    /// Within each output file reads appear in input order, whatever the worker
    /// count. On success every output is moved to its final name; on failure the
    /// written data is kept under `.partial` names.
    ///
    /// # Errors
    ///
    /// Returns `DemuxError::Interrupted` if the token is cancelled,
    /// `DemuxError::WorkerPanicked` if a worker dies, or `DemuxError::Io` if
    /// output cannot be written.
    pub fn run(&self, reads: Vec<Read>, mut outputs: OutputSet) -> Result<DemuxReport, DemuxError> {
        let total = reads.len();
        let workers = self.config.workers.max(1);
        let chunk_size = self.config.chunk_size_for(total);
        info!(
            "Assigning {total} reads in chunks of {chunk_size} using {workers} worker{}",
            if workers == 1 { "" } else { "s" }
        );

        let start = Instant::now();
        let mut counts = AssignmentCounts::new(self.assigner.samples().len());
        let result = if workers == 1 {
            self.run_sequential(reads, chunk_size, &mut outputs, &mut counts)
        } else {
            self.run_parallel(reads, chunk_size, workers, &mut outputs, &mut counts)
        };

        match result {
            Ok(()) => {
                let output_files = outputs.finish()?;
                debug!(
                    "Assignment and output took {:.3} seconds",
                    start.elapsed().as_secs_f64()
                );
                info!(
                    "Assigned {} of {} reads ({} unassigned)",
                    counts.assigned(),
                    counts.total(),
                    counts.unassigned()
                );
                Ok(DemuxReport {
                    counts,
                    output_files,
                    chunk_size,
                })
            }
            Err(e) => {
                let kept = outputs.abandon();
                warn!(
                    "Stopped after writing {} reads; kept {} partial output files",
                    counts.total(),
                    kept.len()
                );
                Err(e)
            }
        }
    }

    fn run_sequential(
        &self,
        reads: Vec<Read>,
        chunk_size: usize,
        outputs: &mut OutputSet,
        counts: &mut AssignmentCounts,
    ) -> Result<(), DemuxError> {
        for chunk in into_chunks(reads, chunk_size) {
            let assignments =
                assign_chunk(&self.assigner, &chunk, &self.token).ok_or(DemuxError::Interrupted)?;
            write_chunk(outputs, counts, &chunk, &assignments)?;
        }
        Ok(())
    }

    fn run_parallel(
        &self,
        reads: Vec<Read>,
        chunk_size: usize,
        workers: usize,
        outputs: &mut OutputSet,
        counts: &mut AssignmentCounts,
    ) -> Result<(), DemuxError> {
        let expected_chunks = reads.len().div_ceil(chunk_size) as u64;

        // Stops the feeder and workers; set on interrupt or on a write failure
        let halt = CancellationToken::new();
        let (work_tx, work_rx) = bounded::<(u64, Vec<Read>)>(workers * 2);
        let (result_tx, result_rx) = bounded::<ChunkResult>(workers * 2);

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers + 1);
        let spawned = (|| -> io::Result<()> {
            for id in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let assigner = Arc::clone(&self.assigner);
                let halt = halt.clone();
                handles.push(
                    thread::Builder::new()
                        .name(format!("barcseek-worker-{id}"))
                        .spawn(move || {
                            for (seq, reads) in work_rx {
                                let Some(assignments) = assign_chunk(&assigner, &reads, &halt)
                                else {
                                    break;
                                };
                                let result = ChunkResult {
                                    seq,
                                    reads,
                                    assignments,
                                };
                                if result_tx.send(result).is_err() {
                                    break;
                                }
                            }
                        })?,
                );
            }

            let halt = halt.clone();
            handles.push(
                thread::Builder::new()
                    .name("barcseek-feeder".to_string())
                    .spawn(move || {
                        for (seq, chunk) in (0u64..).zip(into_chunks(reads, chunk_size)) {
                            if halt.is_cancelled() || work_tx.send((seq, chunk)).is_err() {
                                break;
                            }
                        }
                    })?,
            );
            Ok(())
        })();
        drop(work_rx);
        drop(result_tx);

        let outcome = match spawned {
            Ok(()) => self.collect(&result_rx, &halt, expected_chunks, outputs, counts),
            Err(e) => Err(DemuxError::Io(e)),
        };
        if outcome.is_err() {
            halt.cancel();
        }
        drop(result_rx);

        let panicked = join_workers(handles, self.config.grace_period);
        match outcome {
            Ok(()) if panicked => Err(DemuxError::WorkerPanicked),
            other => other,
        }
    }

    /// Receive finished chunks and write them in chunk order
    fn collect(
        &self,
        results: &Receiver<ChunkResult>,
        halt: &CancellationToken,
        expected_chunks: u64,
        outputs: &mut OutputSet,
        counts: &mut AssignmentCounts,
    ) -> Result<(), DemuxError> {
        let mut reorder = ReorderBuffer::new();

        loop {
            if self.token.is_cancelled() {
                halt.cancel();
                return Err(DemuxError::Interrupted);
            }
            match results.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => {
                    reorder.insert(chunk.seq, chunk);
                    while let Some(chunk) = reorder.try_pop_next() {
                        write_chunk(outputs, counts, &chunk.reads, &chunk.assignments)?;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Every worker has exited; a missing chunk means one of them died
        if reorder.next_seq() < expected_chunks {
            return Err(DemuxError::WorkerPanicked);
        }
        Ok(())
    }
}

/// Split reads into owned, contiguous chunks
fn into_chunks(reads: Vec<Read>, chunk_size: usize) -> impl Iterator<Item = Vec<Read>> {
    let mut reads = reads.into_iter();
    std::iter::from_fn(move || {
        let chunk: Vec<Read> = reads.by_ref().take(chunk_size).collect();
        (!chunk.is_empty()).then_some(chunk)
    })
}

/// Assign a chunk, or `None` if cancelled part way
fn assign_chunk(
    assigner: &Assigner,
    reads: &[Read],
    token: &CancellationToken,
) -> Option<Vec<Assignment>> {
    let mut assignments = Vec::with_capacity(reads.len());
    for (i, read) in reads.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
            return None;
        }
        assignments.push(assigner.assign(read));
    }
    Some(assignments)
}

fn write_chunk(
    outputs: &mut OutputSet,
    counts: &mut AssignmentCounts,
    reads: &[Read],
    assignments: &[Assignment],
) -> io::Result<()> {
    for (read, assignment) in reads.iter().zip(assignments) {
        outputs.write(read, assignment)?;
        counts.record(assignment);
    }
    Ok(())
}

/// Join every thread, waiting at most `grace` in total. Returns true if any
/// thread panicked.
fn join_workers(handles: Vec<JoinHandle<()>>, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    let mut panicked = false;

    for handle in handles {
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL.min(grace));
        }
        if handle.is_finished() {
            panicked |= handle.join().is_err();
        } else {
            warn!(
                "Thread {} did not stop within {} ms; leaving it behind",
                handle.thread().name().unwrap_or("unnamed"),
                grace.as_millis()
            );
        }
    }
    panicked
}
