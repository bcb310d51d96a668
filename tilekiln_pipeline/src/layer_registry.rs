//! Stable, concurrency-safe interning of output-layer names to the 8-bit
//! `layerId` [`crate::sort_key`] packs, and of each layer's attribute keys to
//! the `keyId`s [`crate::rendered_feature::RenderedFeature::attributes`]
//! carries.
//!
//! Interning happens while `R` feature-emitter threads (§4.8) are rendering
//! concurrently, so both directions use [`dashmap`] rather than a mutex
//! around a `HashMap` — the same lock-free-map choice the workspace already
//! standardizes on for its caches (see `tilekiln_core::cache`).

use anyhow::{ensure, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

/// Interns layer names to `layerId`s in first-seen order, and owns one
/// [`KeyInterner`] per layer for that layer's attribute keys.
#[derive(Default)]
pub struct LayerRegistry {
	by_name: DashMap<String, u8>,
	by_id: DashMap<u8, String>,
	// Widened past `u8` so the 256th layer (id 255) and the 257th (which
	// would otherwise wrap back to id 0) are distinguishable.
	next_id: AtomicU16,
	keys: DashMap<u8, KeyInterner>,
}

impl LayerRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the `layerId` for `name`, assigning the next free id the
	/// first time this layer name is seen.
	///
	/// # Errors
	/// Returns an error once more than 256 distinct layers have been
	/// interned (the packed `SortKey` has an 8-bit `layerId`).
	pub fn layer_id(&self, name: &str) -> Result<u8> {
		if let Some(id) = self.by_name.get(name) {
			return Ok(*id);
		}
		// `entry` resolves the races the lookup above leaves open: only the
		// caller that actually inserts the entry pays for a fresh id.
		match self.by_name.entry(name.to_string()) {
			Entry::Occupied(entry) => Ok(*entry.get()),
			Entry::Vacant(entry) => {
				let raw_id = self.next_id.fetch_add(1, Ordering::Relaxed);
				ensure!(raw_id <= u16::from(u8::MAX), "more than 256 distinct output layers");
				let id = raw_id as u8;
				entry.insert(id);
				self.by_id.insert(id, name.to_string());
				self.keys.insert(id, KeyInterner::default());
				Ok(id)
			}
		}
	}

	/// Looks up the layer name for a previously-interned `layerId`.
	#[must_use]
	pub fn layer_name(&self, id: u8) -> Option<String> {
		self.by_id.get(&id).map(|v| v.clone())
	}

	/// Interns `key` for layer `layer_id`, assigning a fresh `keyId` the
	/// first time this (layer, key) pair is seen.
	pub fn key_id(&self, layer_id: u8, key: &str) -> u32 {
		self.keys.entry(layer_id).or_default().intern(key)
	}

	/// Looks up the key string for a previously-interned `(layer_id, key_id)`.
	#[must_use]
	pub fn key_name(&self, layer_id: u8, key_id: u32) -> Option<String> {
		self.keys.get(&layer_id)?.resolve(key_id)
	}
}

/// Bidirectional string &lt;-&gt; id interner for one layer's attribute keys.
#[derive(Default)]
pub struct KeyInterner {
	by_key: DashMap<String, u32>,
	by_id: DashMap<u32, String>,
	next_id: AtomicU32,
}

impl KeyInterner {
	fn intern(&self, key: &str) -> u32 {
		if let Some(id) = self.by_key.get(key) {
			return *id;
		}
		let id = *self.by_key.entry(key.to_string()).or_insert_with(|| self.next_id.fetch_add(1, Ordering::Relaxed));
		self.by_id.entry(id).or_insert_with(|| key.to_string());
		id
	}

	fn resolve(&self, id: u32) -> Option<String> {
		self.by_id.get(&id).map(|v| v.clone())
	}
}
