//! Memory-bounded external sort over records keyed by a `u64` sort key.
//!
//! Records accumulate in memory until a chunk exceeds
//! [`PipelineConfig::effective_chunk_max_bytes`](crate::config::PipelineConfig),
//! at which point the chunk is sorted and spilled to a temp file on a
//! background thread while appending continues into a new chunk. Once
//! [`ExternalMergeSort::finish`] is called, [`ExternalMergeSort::iter`]
//! streams the spilled chunks back in non-decreasing key order via a 4-ary
//! min-heap k-way merge.

use anyhow::{ensure, Context, Result};
use byteorder::LittleEndian;
use std::marker::PhantomData;
use std::path::Path;
use std::thread::JoinHandle;
use tempfile::NamedTempFile;
use tilekiln_core::io::{ValueReader, ValueReaderFile, ValueWriter, ValueWriterFile};
use tilekiln_core::types::Blob;

use crate::stats::Stats;

/// A fixed-schema record the sorter can spill and replay without
/// interpreting its payload.
pub trait SpillRecord: Sized {
	fn sort_key(&self) -> u64;
	fn encode(&self) -> Result<Blob>;
	fn decode(data: &Blob) -> Result<Self>;
}

impl SpillRecord for crate::rendered_feature::RenderedFeature {
	fn sort_key(&self) -> u64 {
		self.sort_key
	}

	fn encode(&self) -> Result<Blob> {
		crate::rendered_feature::RenderedFeature::encode(self)
	}

	fn decode(data: &Blob) -> Result<Self> {
		crate::rendered_feature::RenderedFeature::decode(data)
	}
}

/// Branching factor of the merge heap. Chosen over a binary heap because it
/// lowers the comparison count for the typical chunk counts this sorter
/// produces (tens to low hundreds).
const HEAP_ARITY: usize = 4;

/// A minimal d-ary min-heap, specialized to [`HeapEntry`] so the merge loop
/// never needs a comparator closure.
struct QuaternaryHeap {
	data: Vec<HeapEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
	key: u64,
	chunk_index: usize,
}

impl QuaternaryHeap {
	fn new() -> Self {
		Self { data: Vec::new() }
	}

	fn push(&mut self, entry: HeapEntry) {
		self.data.push(entry);
		let mut i = self.data.len() - 1;
		while i > 0 {
			let parent = (i - 1) / HEAP_ARITY;
			if self.data[i] < self.data[parent] {
				self.data.swap(i, parent);
				i = parent;
			} else {
				break;
			}
		}
	}

	fn pop(&mut self) -> Option<HeapEntry> {
		if self.data.is_empty() {
			return None;
		}
		let last = self.data.len() - 1;
		self.data.swap(0, last);
		let top = self.data.pop();
		let len = self.data.len();
		let mut i = 0;
		loop {
			let first_child = i * HEAP_ARITY + 1;
			if first_child >= len {
				break;
			}
			let mut smallest = i;
			for c in first_child..(first_child + HEAP_ARITY).min(len) {
				if self.data[c] < self.data[smallest] {
					smallest = c;
				}
			}
			if smallest == i {
				break;
			}
			self.data.swap(i, smallest);
			i = smallest;
		}
		top
	}
}

/// Sorts and spills one chunk of `(key, payload)` pairs to a fresh temp
/// file. The sort is stable, so records with equal keys keep their
/// append-time relative order.
fn spill_chunk(tmp_dir: &Path, mut records: Vec<(u64, Blob)>) -> Result<NamedTempFile> {
	records.sort_by_key(|(key, _)| *key);
	let temp = tempfile::Builder::new()
		.prefix("tilekiln-spill-")
		.suffix(".bin")
		.tempfile_in(tmp_dir)
		.context("creating spill chunk file")?;
	{
		let file = temp.reopen().context("reopening spill chunk file for writing")?;
		let mut writer = ValueWriterFile::<LittleEndian>::new_le(file);
		for (key, payload) in &records {
			writer.write_u64(*key)?;
			writer.write_pbf_blob(payload)?;
		}
	}
	Ok(temp)
}

/// Memory-bounded sorter. Owns every spilled chunk file; dropping it (on any
/// exit path, including a cancelled pipeline) deletes them.
pub struct ExternalMergeSort<R: SpillRecord> {
	tmp_dir: std::path::PathBuf,
	chunk_max_bytes: usize,
	stats: Stats,
	current: Vec<(u64, Blob)>,
	current_bytes: usize,
	pending_spill: Option<JoinHandle<Result<NamedTempFile>>>,
	chunks: Vec<NamedTempFile>,
	finished: bool,
	_marker: PhantomData<R>,
}

impl<R: SpillRecord + Send + 'static> ExternalMergeSort<R> {
	/// Creates a sorter spilling chunks under `tmp_dir`, each at most
	/// `chunk_max_bytes` of payload before being sorted and flushed.
	pub fn new(tmp_dir: impl Into<std::path::PathBuf>, chunk_max_bytes: usize, stats: Stats) -> Result<Self> {
		let tmp_dir = tmp_dir.into();
		std::fs::create_dir_all(&tmp_dir).with_context(|| format!("creating spill directory {}", tmp_dir.display()))?;
		Ok(Self {
			tmp_dir,
			chunk_max_bytes,
			stats,
			current: Vec::new(),
			current_bytes: 0,
			pending_spill: None,
			chunks: Vec::new(),
			finished: false,
			_marker: PhantomData,
		})
	}

	/// Buffers `record`, spilling the current chunk to disk on a background
	/// thread once it exceeds `chunk_max_bytes`.
	///
	/// # Errors
	/// Returns an error if encoding `record` fails or a previously spilling
	/// chunk's background thread reports an I/O failure.
	pub fn append(&mut self, record: &R) -> Result<()> {
		ensure!(!self.finished, "cannot append to a finished ExternalMergeSort");
		let key = record.sort_key();
		let payload = record.encode().context("encoding record for spill")?;
		self.current_bytes += 8 + payload.len() as usize;
		self.current.push((key, payload));
		if self.current_bytes >= self.chunk_max_bytes {
			self.spill_current()?;
		}
		Ok(())
	}

	/// Moves the in-memory chunk to a background spill thread, first joining
	/// whatever chunk was already spilling (bounding the sorter to at most
	/// one chunk being written and one being filled at a time).
	fn spill_current(&mut self) -> Result<()> {
		self.join_pending_spill()?;
		let records = std::mem::take(&mut self.current);
		self.current_bytes = 0;
		let tmp_dir = self.tmp_dir.clone();
		self.pending_spill = Some(std::thread::spawn(move || spill_chunk(&tmp_dir, records)));
		self.stats.inc_spill_chunks();
		Ok(())
	}

	fn join_pending_spill(&mut self) -> Result<()> {
		if let Some(handle) = self.pending_spill.take() {
			let temp = handle.join().map_err(|_| anyhow::anyhow!("spill thread panicked"))??;
			self.chunks.push(temp);
		}
		Ok(())
	}

	/// Flushes any remaining in-memory chunk and transitions to read-only
	/// mode. Must be called before [`ExternalMergeSort::iter`].
	///
	/// # Errors
	/// Returns an error if flushing the final chunk fails.
	pub fn finish(&mut self) -> Result<()> {
		self.join_pending_spill()?;
		if !self.current.is_empty() {
			let records = std::mem::take(&mut self.current);
			self.current_bytes = 0;
			let temp = spill_chunk(&self.tmp_dir, records)?;
			self.chunks.push(temp);
			self.stats.inc_spill_chunks();
		}
		self.finished = true;
		Ok(())
	}

	/// Returns a lazy, single-consumer iterator over every record in
	/// non-decreasing `sortKey` order.
	///
	/// # Errors
	/// Returns an error if `finish` was not already called, or if opening a
	/// chunk file for reading fails.
	pub fn iter(self) -> Result<MergeIter<R>> {
		ensure!(self.finished, "ExternalMergeSort::finish must be called before iter");
		let mut cursors = Vec::with_capacity(self.chunks.len());
		for temp in &self.chunks {
			let file = temp.reopen().context("reopening spill chunk file for reading")?;
			cursors.push(ChunkCursor { reader: ValueReaderFile::<LittleEndian>::new_le(file)? });
		}
		let mut heap = QuaternaryHeap::new();
		let mut pending = Vec::with_capacity(cursors.len());
		for (i, cursor) in cursors.iter_mut().enumerate() {
			let next = cursor.advance()?;
			if let Some((key, _)) = &next {
				heap.push(HeapEntry { key: *key, chunk_index: i });
			}
			pending.push(next);
		}
		Ok(MergeIter { cursors, pending, heap, _chunks: self.chunks, _marker: PhantomData })
	}
}

struct ChunkCursor {
	reader: ValueReaderFile<LittleEndian>,
}

impl ChunkCursor {
	fn advance(&mut self) -> Result<Option<(u64, Blob)>> {
		if !self.reader.has_remaining() {
			return Ok(None);
		}
		let key = self.reader.read_u64()?;
		let len = self.reader.read_varint()?;
		let payload = self.reader.read_blob(len)?;
		Ok(Some((key, payload)))
	}
}

/// Streams merged records in sort-key order. Holds every spilled chunk file
/// alive; dropping it deletes them.
pub struct MergeIter<R: SpillRecord> {
	cursors: Vec<ChunkCursor>,
	pending: Vec<Option<(u64, Blob)>>,
	heap: QuaternaryHeap,
	_chunks: Vec<NamedTempFile>,
	_marker: PhantomData<R>,
}

impl<R: SpillRecord> Iterator for MergeIter<R> {
	type Item = Result<R>;

	fn next(&mut self) -> Option<Self::Item> {
		let entry = self.heap.pop()?;
		let (_, payload) = self.pending[entry.chunk_index].take().expect("heap entry without a pending payload");
		match self.cursors[entry.chunk_index].advance() {
			Ok(Some((key, payload))) => {
				self.heap.push(HeapEntry { key, chunk_index: entry.chunk_index });
				self.pending[entry.chunk_index] = Some((key, payload));
			}
			Ok(None) => {}
			Err(err) => return Some(Err(err)),
		}
		Some(R::decode(&payload))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rendered_feature::RenderedFeature;

	fn feature(sort_key: u64, id: u64) -> RenderedFeature {
		RenderedFeature {
			sort_key,
			geometry_kind: crate::geometry_codec::GeometryKind::Point,
			geometry: vec![vec![(2048, 2048)]],
			attributes: vec![],
			id: Some(id),
			contains_only_fill: false,
		}
	}

	#[test]
	fn merges_in_sort_key_order_across_chunks() {
		let dir = tempfile::tempdir().unwrap();
		let mut sorter = ExternalMergeSort::new(dir.path(), 64, Stats::new()).unwrap();

		for id in [5u64, 1, 3, 2, 4] {
			sorter.append(&feature(id, id)).unwrap();
		}
		sorter.finish().unwrap();

		let results: Vec<u64> = sorter.iter().unwrap().map(|r| r.unwrap().sort_key).collect();
		assert_eq!(results, vec![1, 2, 3, 4, 5]);
	}

	#[test]
	fn forces_multiple_chunks_and_preserves_multiset() {
		let dir = tempfile::tempdir().unwrap();
		// Tiny chunk size forces a spill roughly every record.
		let mut sorter = ExternalMergeSort::new(dir.path(), 1, Stats::new()).unwrap();

		let mut keys: Vec<u64> = (0..500).rev().collect();
		for &key in &keys {
			sorter.append(&feature(key, key)).unwrap();
		}
		sorter.finish().unwrap();
		assert!(sorter.stats.spill_chunks() >= 8);

		let results: Vec<u64> = sorter.iter().unwrap().map(|r| r.unwrap().sort_key).collect();
		keys.sort_unstable();
		assert_eq!(results, keys);
	}

	#[test]
	fn ties_preserve_append_order() {
		let dir = tempfile::tempdir().unwrap();
		let mut sorter = ExternalMergeSort::new(dir.path(), 1024, Stats::new()).unwrap();
		for id in 0..5u64 {
			sorter.append(&feature(42, id)).unwrap();
		}
		sorter.finish().unwrap();
		let ids: Vec<u64> = sorter.iter().unwrap().map(|r| r.unwrap().id.unwrap()).collect();
		assert_eq!(ids, vec![0, 1, 2, 3, 4]);
	}

	#[test]
	fn drop_deletes_spill_files() {
		let dir = tempfile::tempdir().unwrap();
		let mut sorter = ExternalMergeSort::<RenderedFeature>::new(dir.path(), 1, Stats::new()).unwrap();
		for id in 0..10u64 {
			sorter.append(&feature(id, id)).unwrap();
		}
		sorter.finish().unwrap();
		drop(sorter);
		let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
		assert!(remaining.is_empty());
	}
}
