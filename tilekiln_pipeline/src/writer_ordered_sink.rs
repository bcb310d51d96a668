//! `WriterOrderedSink` (§4.6): the single writer thread's view of the world.
//!
//! Consumes [`EncodedTile`]s in strict submission order (the batcher enqueues
//! a batch to the writer at the same moment it hands it to the encoder
//! pool, so batches arrive here in the order the sorter produced them even
//! though the encoder pool may finish them out of order) and resolves
//! content-hash collisions into a single payload write per distinct hash.

use crate::archive_writer::{ArchiveMetadata, ArchiveWriter};
use crate::sort_key::TileOrder;
use crate::stats::Stats;
use crate::tile_encoder_pool::EncodedTile;
use anyhow::{ensure, Result};
use std::collections::HashMap;

/// Wraps an [`ArchiveWriter`], tracking which content hashes have already had
/// their bytes written so a repeated hash only ever costs a coordinate
/// record (§4.6 property: at-most-once payload write per distinct hash).
pub struct WriterOrderedSink<W: ArchiveWriter> {
	writer: W,
	stats: Stats,
	seen_hashes: HashMap<u64, ()>,
	last_tile_id: Option<u32>,
}

impl<W: ArchiveWriter> WriterOrderedSink<W> {
	#[must_use]
	pub fn new(writer: W, stats: Stats) -> Self {
		Self { writer, stats, seen_hashes: HashMap::new(), last_tile_id: None }
	}

	/// Begins the archive; must be called before any `write_batch`.
	///
	/// # Errors
	/// Propagates `ArchiveWriter::initialize`'s error.
	pub fn initialize(&mut self, metadata: &ArchiveMetadata) -> Result<()> {
		self.writer.initialize(metadata)
	}

	/// Writes every tile in one encoder batch, in the order given.
	///
	/// # Errors
	/// Returns an error if a tile arrives out of `order()` relative to the
	/// previous tile written (a programmer-error invariant violation, §7),
	/// or if the underlying writer fails.
	pub fn write_batch(&mut self, tiles: Vec<EncodedTile>) -> Result<()> {
		for tile in tiles {
			self.write_one(tile)?;
		}
		Ok(())
	}

	fn write_one(&mut self, tile: EncodedTile) -> Result<()> {
		if let Some(last) = self.last_tile_id {
			ensure!(tile.tile_id > last, "writer received tile {} out of order after tile {last}", tile.tile_id);
		}
		self.last_tile_id = Some(tile.tile_id);

		let dedup = self.writer.deduplicates();
		let (bytes, hash) = match (tile.bytes, tile.content_hash) {
			(Some(bytes), Some(hash)) if dedup => {
				let already_written = self.seen_hashes.insert(hash, ()).is_some();
				if already_written {
					self.stats.inc_tiles_deduplicated();
				}
				(if already_written { None } else { Some(bytes) }, Some(hash))
			}
			(bytes, hash) => (bytes, hash),
		};
		self.stats.inc_tiles_written();
		self.writer.write_tile(tile.coord, bytes, hash)
	}

	/// Closes the archive.
	///
	/// # Errors
	/// Propagates `ArchiveWriter::finish`'s error.
	pub fn finish(mut self, metadata: &ArchiveMetadata) -> Result<()> {
		self.writer.finish(metadata)
	}

	#[must_use]
	pub fn order(&self) -> TileOrder {
		self.writer.order()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ZoomRange;
	use tilekiln_core::types::Blob;
	use tilekiln_core::TileCoord;

	struct RecordingWriter {
		dedup: bool,
		calls: Vec<(TileCoord, Option<Blob>, Option<u64>)>,
	}

	impl ArchiveWriter for RecordingWriter {
		fn order(&self) -> TileOrder {
			TileOrder::Tms
		}
		fn deduplicates(&self) -> bool {
			self.dedup
		}
		fn initialize(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
			Ok(())
		}
		fn write_tile(&mut self, coord: TileCoord, bytes: Option<Blob>, content_hash: Option<u64>) -> Result<()> {
			self.calls.push((coord, bytes, content_hash));
			Ok(())
		}
		fn finish(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
			Ok(())
		}
	}

	fn metadata() -> ArchiveMetadata {
		ArchiveMetadata {
			name: "t".into(),
			description: String::new(),
			attribution: String::new(),
			version: "1".into(),
			is_overlay: false,
			zoom: ZoomRange { min: 0, max: 1 },
			bounds: None,
		}
	}

	fn encoded(tile_id: u32, coord: TileCoord, bytes: Option<Vec<u8>>, hash: Option<u64>) -> EncodedTile {
		EncodedTile { tile_id, coord, bytes: bytes.map(Blob::from), content_hash: hash }
	}

	#[test]
	fn repeated_hash_writes_bytes_only_once() {
		let mut sink = WriterOrderedSink::new(RecordingWriter { dedup: true, calls: Vec::new() }, Stats::new());
		sink.initialize(&metadata()).unwrap();
		sink.write_batch(vec![
			encoded(0, TileCoord::new(0, 0, 0).unwrap(), Some(vec![1, 2, 3]), Some(99)),
			encoded(1, TileCoord::new(1, 0, 0).unwrap(), Some(vec![1, 2, 3]), Some(99)),
		])
		.unwrap();
		assert_eq!(sink.writer.calls[0].1.as_ref().map(Blob::len), Some(3));
		assert!(sink.writer.calls[1].1.is_none());
		assert_eq!(sink.writer.calls[1].2, Some(99));
	}

	#[test]
	fn non_deduplicating_writer_always_gets_bytes() {
		let mut sink = WriterOrderedSink::new(RecordingWriter { dedup: false, calls: Vec::new() }, Stats::new());
		sink.initialize(&metadata()).unwrap();
		sink.write_batch(vec![
			encoded(0, TileCoord::new(0, 0, 0).unwrap(), Some(vec![1]), Some(5)),
			encoded(1, TileCoord::new(1, 0, 0).unwrap(), Some(vec![1]), Some(5)),
		])
		.unwrap();
		assert!(sink.writer.calls[0].1.is_some());
		assert!(sink.writer.calls[1].1.is_some());
	}

	#[test]
	fn out_of_order_tile_id_is_rejected() {
		let mut sink = WriterOrderedSink::new(RecordingWriter { dedup: true, calls: Vec::new() }, Stats::new());
		sink.initialize(&metadata()).unwrap();
		sink.write_batch(vec![encoded(5, TileCoord::new(2, 0, 0).unwrap(), Some(vec![1]), Some(1))]).unwrap();
		let err = sink.write_batch(vec![encoded(3, TileCoord::new(2, 0, 1).unwrap(), Some(vec![1]), Some(2))]).unwrap_err();
		assert!(err.to_string().contains("out of order"));
	}
}
