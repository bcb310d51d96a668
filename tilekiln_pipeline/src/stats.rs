//! Lock-free run counters shared across every pipeline stage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cloneable handle to a single run's counters. Every field is an
/// independent monotone counter; readers should not assume they advance in
/// lockstep (a feature read now may not produce a tile until much later).
#[derive(Debug, Clone, Default)]
pub struct Stats(Arc<Counters>);

#[derive(Debug, Default)]
struct Counters {
	features_read: AtomicU64,
	features_skipped: AtomicU64,
	tiles_written: AtomicU64,
	tiles_deduplicated: AtomicU64,
	bytes_written: AtomicU64,
	spill_chunks: AtomicU64,
}

impl Stats {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_features_read(&self, count: u64) {
		self.0.features_read.fetch_add(count, Ordering::Relaxed);
	}

	pub fn add_features_skipped(&self, count: u64) {
		self.0.features_skipped.fetch_add(count, Ordering::Relaxed);
	}

	pub fn inc_tiles_written(&self) {
		self.0.tiles_written.fetch_add(1, Ordering::Relaxed);
	}

	pub fn inc_tiles_deduplicated(&self) {
		self.0.tiles_deduplicated.fetch_add(1, Ordering::Relaxed);
	}

	pub fn add_bytes_written(&self, count: u64) {
		self.0.bytes_written.fetch_add(count, Ordering::Relaxed);
	}

	pub fn inc_spill_chunks(&self) {
		self.0.spill_chunks.fetch_add(1, Ordering::Relaxed);
	}

	#[must_use]
	pub fn features_read(&self) -> u64 {
		self.0.features_read.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn features_skipped(&self) -> u64 {
		self.0.features_skipped.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn tiles_written(&self) -> u64 {
		self.0.tiles_written.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn tiles_deduplicated(&self) -> u64 {
		self.0.tiles_deduplicated.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn bytes_written(&self) -> u64 {
		self.0.bytes_written.load(Ordering::Relaxed)
	}

	#[must_use]
	pub fn spill_chunks(&self) -> u64 {
		self.0.spill_chunks.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate_across_clones() {
		let stats = Stats::new();
		let other = stats.clone();

		stats.add_features_read(10);
		other.add_features_read(5);
		stats.inc_tiles_written();
		other.inc_tiles_deduplicated();

		assert_eq!(stats.features_read(), 15);
		assert_eq!(stats.tiles_written(), 1);
		assert_eq!(stats.tiles_deduplicated(), 1);
	}
}
