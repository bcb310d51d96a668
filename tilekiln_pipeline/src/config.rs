//! Tunables that shape a [`crate::pipeline::Pipeline`] run.
//!
//! Every field here is reachable from the `generate` CLI surface; defaults
//! match the values documented there.

use std::path::PathBuf;
use tilekiln_core::{ConcurrencyLimits, TileCompression};

/// Bounds and zoom range of the pyramid to generate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
	pub min: u8,
	pub max: u8,
}

impl ZoomRange {
	#[must_use]
	pub fn contains(&self, level: u8) -> bool {
		(self.min..=self.max).contains(&level)
	}
}

/// Everything a [`crate::pipeline::Pipeline`] needs to know before it starts
/// reading sources.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	/// Zoom levels to render, inclusive.
	pub zoom: ZoomRange,
	/// Tile ordering the archive is written in.
	pub order: crate::sort_key::TileOrder,
	/// Restrict generation to this geographic bounding box
	/// `[min_lon, min_lat, max_lon, max_lat]`, if set.
	pub bounds: Option<[f64; 4]>,
	/// Upper bound on in-memory feature bytes before the external sorter
	/// spills a chunk to disk.
	pub chunk_max_bytes: usize,
	/// Directory spill chunks and other scratch files are created in.
	pub tmp_dir: PathBuf,
	/// Tiles at or above this encoded size (before compression) are logged
	/// as a warning but still written.
	pub tile_warning_size_bytes: u64,
	/// Skip writing tiles whose single layer is a fill covering the whole
	/// tile with no attribute variation (see `RenderedFeature::is_fill`).
	pub skip_filled_tiles: bool,
	/// Compression applied to each tile payload before it reaches the
	/// archive writer.
	pub tile_compression: TileCompression,
	/// Concurrency budget for the rendering and encoding stages.
	pub concurrency: ConcurrencyLimits,
	/// Soft cap on total process memory; the sorter's chunk size is derived
	/// from this when `chunk_max_bytes` is left at its default.
	pub max_memory_bytes: Option<u64>,
}

impl PipelineConfig {
	/// Default spill-chunk size: 64 MiB of feature payload per chunk.
	pub const DEFAULT_CHUNK_MAX_BYTES: usize = 64 * 1024 * 1024;
	/// Default tile-size warning threshold, matching the MVT spec's
	/// recommended maximum of 500 KiB.
	pub const DEFAULT_TILE_WARNING_SIZE_BYTES: u64 = 500 * 1024;

	/// Builds a config for `[zoom.min, zoom.max]` with every other field at
	/// its documented default.
	#[must_use]
	pub fn new(min_zoom: u8, max_zoom: u8, tmp_dir: PathBuf) -> Self {
		Self {
			zoom: ZoomRange { min: min_zoom, max: max_zoom },
			order: crate::sort_key::TileOrder::Tms,
			bounds: None,
			chunk_max_bytes: Self::DEFAULT_CHUNK_MAX_BYTES,
			tmp_dir,
			tile_warning_size_bytes: Self::DEFAULT_TILE_WARNING_SIZE_BYTES,
			skip_filled_tiles: true,
			tile_compression: TileCompression::Gzip,
			concurrency: ConcurrencyLimits::default(),
			max_memory_bytes: None,
		}
	}

	/// Chunk size to use for the external sorter: `max_memory_bytes / 4` when
	/// a memory cap is set (leaving headroom for rendering and encoding
	/// buffers running concurrently), otherwise `chunk_max_bytes` verbatim.
	#[must_use]
	pub fn effective_chunk_max_bytes(&self) -> usize {
		match self.max_memory_bytes {
			Some(cap) => usize::try_from(cap / 4).unwrap_or(usize::MAX).min(self.chunk_max_bytes),
			None => self.chunk_max_bytes,
		}
	}
}
