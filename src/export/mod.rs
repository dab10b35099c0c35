//! # Export
//!
//! Turns a batch into files: every item in every catalog format, in a fixed
//! order, with paced delivery and a single aggregate progress value.

pub mod progress;
pub mod sequencer;
pub mod sink;

pub use progress::{ExportProgress, ProgressReporter};
pub use sequencer::{artifact_name, ExportFailure, ExportReport, ExportSequencer};
pub use sink::{Artifact, ArtifactSink, CollectingSink, DirectorySink};
