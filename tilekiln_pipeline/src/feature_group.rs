//! `FeatureGroup` (§4.4): consumes the externally-sorted stream of
//! [`RenderedFeature`]s in `sortKey` order and regroups it by tile, then by
//! layer within each tile, running each layer through
//! [`Profile::post_process_layer_features`] before handing the tile's
//! complete layer set to [`crate::tile_encoder_pool::TileEncoderPool`].
//!
//! Grouping is a pure linear scan: because the merge already yields records
//! ordered `(tileId, layerId, sortOrder, featureOrder)`, a tile's features
//! and, within it, a layer's features are always contiguous.

use crate::layer_registry::LayerRegistry;
use crate::profile::Profile;
use crate::rendered_feature::RenderedFeature;
use crate::sort_key::{self, TileOrder};
use anyhow::Result;
use std::iter::Peekable;
use tilekiln_core::TileCoord;

/// One output layer's post-processed features for one tile.
pub struct GroupedLayer {
	pub layer_id: u8,
	pub layer_name: String,
	pub features: Vec<RenderedFeature>,
}

/// Every layer covering one tile, ready for MVT encoding.
pub struct TileGroup {
	pub tile_id: u32,
	pub coord: TileCoord,
	pub layers: Vec<GroupedLayer>,
}

/// Regroups a sort-key-ordered feature stream into per-tile, per-layer runs.
pub struct FeatureGroup<I: Iterator<Item = Result<RenderedFeature>>> {
	inner: Peekable<I>,
	order: TileOrder,
}

impl<I: Iterator<Item = Result<RenderedFeature>>> FeatureGroup<I> {
	#[must_use]
	pub fn new(inner: I, order: TileOrder) -> Self {
		Self { inner: inner.peekable(), order }
	}

	/// Pulls the next tile's complete, post-processed layer set, or `None`
	/// once the underlying stream is exhausted.
	///
	/// # Errors
	/// Propagates any error from the underlying merge stream, or a decode
	/// error reconstructing a tile's coordinate from its packed id. A
	/// profile's own `post_process_layer_features` error is not propagated
	/// here: per §7 it is logged and that layer's original features pass
	/// through unchanged.
	pub fn next_tile(&mut self, profile: &dyn Profile, registry: &LayerRegistry) -> Result<Option<TileGroup>> {
		let Some(first) = self.take_next()? else {
			return Ok(None);
		};
		let tile_id = sort_key::tile_id(first.sort_key);
		let coord = self.order.tile_coord(tile_id)?;
		let mut layers = Vec::new();
		let mut current_layer_id = sort_key::layer_id(first.sort_key);
		let mut current_features = vec![first];

		loop {
			match self.inner.peek() {
				Some(Ok(next)) if sort_key::tile_id(next.sort_key) == tile_id => {
					let next_layer_id = sort_key::layer_id(next.sort_key);
					if next_layer_id != current_layer_id {
						layers.push(self.finish_layer(profile, registry, coord.level, current_layer_id, std::mem::take(&mut current_features)));
						current_layer_id = next_layer_id;
					}
					current_features.push(self.take_next()?.expect("peeked Some"));
				}
				_ => break,
			}
		}
		layers.push(self.finish_layer(profile, registry, coord.level, current_layer_id, current_features));

		Ok(Some(TileGroup { tile_id, coord, layers }))
	}

	fn take_next(&mut self) -> Result<Option<RenderedFeature>> {
		self.inner.next().transpose()
	}

	fn finish_layer(&self, profile: &dyn Profile, registry: &LayerRegistry, zoom: u8, layer_id: u8, features: Vec<RenderedFeature>) -> GroupedLayer {
		let layer_name = registry.layer_name(layer_id).unwrap_or_else(|| format!("layer-{layer_id}"));
		let original = features.clone();
		let processed = match profile.post_process_layer_features(&layer_name, zoom, features) {
			Ok(processed) => processed,
			Err(err) => {
				log::warn!("postProcessLayerFeatures failed for layer {layer_name} at zoom {zoom}: {err:#}; passing original features through");
				original
			}
		};
		GroupedLayer { layer_id, layer_name, features: processed }
	}
}
