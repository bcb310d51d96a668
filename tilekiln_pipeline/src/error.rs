//! Closed error taxonomy for the feature-to-tiles pipeline.
//!
//! Most fallible internals of this crate return `anyhow::Result`, decorated
//! with `.context(...)` the way the rest of the workspace's internal helpers
//! are. `PipelineError` exists only at the few points where the *kind* of
//! failure must be matched on: the supervisor's error channel and the CLI's
//! exit-code mapping.

use std::path::PathBuf;
use tilekiln_core::TileCoord;

/// A closed set of failure kinds a running pipeline can report.
///
/// Programmer errors (assertion/invariant violations) are not part of this
/// enum: they `panic!`/`assert!` directly, per the "abort" policy for that
/// kind.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
	/// Bad output URI, missing source file, unsupported archive format, ...
	#[error("configuration error: {0}")]
	Configuration(String),

	/// Corrupt or unreadable source data for one feature. Callers that hit
	/// this for a single feature should log and continue; this variant is
	/// only surfaced on the error channel when a source as a whole fails.
	#[error("input error: {0}")]
	Input(String),

	/// Recoverable geometry failure (e.g. a profile's post-process step
	/// raised on self-intersecting output). Handled locally by falling back
	/// to the original features; not normally sent on the error channel.
	#[error("geometry error: {0}")]
	Geometry(String),

	/// Failure writing a spill chunk or the archive itself. Fatal: the
	/// pipeline is poisoned and any partial output is deleted.
	#[error("I/O error during {during} ({path:?}): {source}")]
	Io {
		during: &'static str,
		path: Option<PathBuf>,
		#[source]
		source: std::io::Error,
	},

	/// A spill chunk's length prefix didn't match its payload, or the file
	/// ended mid-record.
	#[error("corrupted spill chunk {path:?} at offset {offset}: {reason}")]
	CorruptedChunk { path: PathBuf, offset: u64, reason: String },

	/// Disk full while spilling, or an allocation failure.
	#[error("resource exhausted: {0}")]
	ResourceExhausted(String),

	/// The pipeline was cancelled; surfaced to the caller so it can
	/// distinguish "cancelled" from "failed".
	#[error("pipeline cancelled")]
	Cancelled,
}

impl PipelineError {
	/// Maps this error to the process exit code documented for the
	/// `generate` CLI surface: `1` usage, `2` input, `3` output, `4` internal.
	#[must_use]
	pub fn exit_code(&self) -> i32 {
		match self {
			PipelineError::Configuration(_) => 1,
			PipelineError::Input(_) => 2,
			PipelineError::Geometry(_) => 2,
			PipelineError::Io { .. } | PipelineError::CorruptedChunk { .. } => 3,
			PipelineError::ResourceExhausted(_) => 4,
			PipelineError::Cancelled => 3,
		}
	}
}

/// Emitted on the batcher/encoder/writer error channel alongside a
/// `PipelineError`, so the supervisor can log where in the pyramid the
/// failure happened even though the tile itself may never reach the writer.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
	pub coord: Option<TileCoord>,
}

impl ErrorContext {
	#[must_use]
	pub fn none() -> Self {
		Self { coord: None }
	}

	#[must_use]
	pub fn at(coord: TileCoord) -> Self {
		Self { coord: Some(coord) }
	}
}
