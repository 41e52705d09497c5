//! Demultiplexing run: scheduling, cancellation and output.
//!
//! - [`scheduler::Scheduler`]: splits reads into chunks and drives assignment
//!   across a worker pool
//! - [`writer::OutputSet`]: one FASTQ stream per sample plus `unassigned`
//! - [`cancel::CancellationToken`]: stops a run on SIGINT/SIGTERM
//! - [`summary::DemuxSummary`]: counts and parameters, saved as JSON

pub mod cancel;
pub mod reorder;
pub mod scheduler;
pub mod summary;
pub mod writer;
