//! `TileEncoderPool` (§4.5): turns ordered [`TileGroup`]s into
//! [`EncodedTile`]s — MVT bytes, compressed, content-hashed — running the
//! actual encode+compress work for a batch concurrently while preserving
//! batch order, the same `futures::stream(...).buffered(n)` idiom
//! `tilekiln_core`'s tile streams already use for CPU-bound per-tile work.

use crate::config::PipelineConfig;
use crate::feature_group::TileGroup;
use crate::geometry_codec::GeometryKind;
use crate::rendered_feature::{AttributeValue, RenderedFeature};
use crate::stats::Stats;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tilekiln_core::types::Blob;
use tilekiln_core::utils::compress;
use tilekiln_core::TileCoord;
use tilekiln_geometry::geo::{GeoFeature, GeoProperties, GeoValue, Geometry};
use tilekiln_geometry::math::area_ring;
use tilekiln_geometry::vector_tile::{VectorTile, VectorTileLayer};

/// A fully-encoded, fully-compressed tile, or a pointer to one identical to
/// it already produced in this run (`bytes: None`, §4.7 `writeTile`).
#[derive(Debug, Clone)]
pub struct EncodedTile {
	pub tile_id: u32,
	pub coord: TileCoord,
	pub bytes: Option<Blob>,
	/// Present whenever the archive deduplicates (§4.5: this crate always
	/// computes it in that case rather than relying on the "likely
	/// duplicated" heuristic — §9's open question resolves this way).
	pub content_hash: Option<u64>,
}

/// Max tile groups accumulated into one batch before it is dispatched (§4.5).
pub const MAX_TILES_PER_BATCH: usize = 1000;
/// Max total features accumulated into one batch before it is dispatched.
pub const MAX_FEATURES_PER_BATCH: usize = 10_000;

/// Stateless encoder entry point; concurrency and batch sizing live in the
/// caller ([`crate::pipeline::Pipeline`]), matching how this crate's other
/// CPU-bound stages take their concurrency limit as a plain argument rather
/// than owning a thread pool.
pub struct TileEncoderPool {
	config: PipelineConfig,
	stats: Stats,
}

impl TileEncoderPool {
	#[must_use]
	pub fn new(config: PipelineConfig, stats: Stats) -> Self {
		Self { config, stats }
	}

	/// Encodes one ordered batch of tile groups, run-length-memoizing
	/// adjacent fill tiles with identical contents (§4.5) and encoding the
	/// rest concurrently up to `concurrency` at a time, yielding results in
	/// the batch's original order.
	///
	/// # Errors
	/// Returns an error if any group fails to encode; the caller is expected
	/// to treat that as an I/O-class fatal error (§7) since encoding itself
	/// cannot fail on well-formed `RenderedFeature`s except through
	/// allocation or compression failure.
	pub async fn encode_batch(&self, groups: Vec<TileGroup>, concurrency: usize) -> Result<Vec<EncodedTile>> {
		let plan = self.plan_batch(&groups);
		let metas: Vec<(u32, TileCoord)> = groups.iter().map(|g| (g.tile_id, g.coord)).collect();

		let config = self.config.clone();
		let stats = self.stats.clone();
		let to_encode = groups.into_iter().zip(plan.iter()).filter(|(_, step)| matches!(step, BatchStep::Encode)).map(|(group, _)| group);
		let encoded: Vec<Result<(Blob, u64)>> = stream::iter(to_encode)
			.map(|group| {
				let config = config.clone();
				let stats = stats.clone();
				async move { tokio::task::spawn_blocking(move || encode_group(&group, &config, &stats)).await.context("tile encoder task panicked")? }
			})
			.buffered(concurrency.max(1))
			.collect()
			.await;

		let mut encoded = encoded.into_iter();
		let mut out = Vec::with_capacity(plan.len());
		let mut last_fresh: Option<(Blob, u64)> = None;
		for ((tile_id, coord), step) in metas.into_iter().zip(plan) {
			match step {
				BatchStep::Encode => {
					let (bytes, hash) = encoded.next().expect("one encoded result per Encode step")?;
					last_fresh = Some((bytes.clone(), hash));
					out.push(EncodedTile { tile_id, coord, bytes: Some(bytes), content_hash: Some(hash) });
				}
				BatchStep::Reuse => {
					let (_, hash) = last_fresh.clone().expect("a Reuse step only ever follows a Fresh one");
					out.push(EncodedTile { tile_id, coord, bytes: None, content_hash: Some(hash) });
				}
			}
		}

		Ok(out)
	}

	/// Decides, for each group in the batch, whether it must be freshly
	/// encoded or can reuse the immediately preceding group's bytes — only
	/// legal when both are lone full-tile fills with identical fingerprints
	/// and `skip_filled_tiles` is enabled.
	fn plan_batch(&self, groups: &[TileGroup]) -> Vec<BatchStep> {
		let mut plan = Vec::with_capacity(groups.len());
		let mut last_fingerprint: Option<u64> = None;
		let mut last_was_fill = false;
		for group in groups {
			let fingerprint = group_fingerprint(group);
			let is_fill = is_lone_fill(group);
			let reuse = self.config.skip_filled_tiles && is_fill && last_was_fill && Some(fingerprint) == last_fingerprint;
			plan.push(if reuse { BatchStep::Reuse } else { BatchStep::Encode });
			last_fingerprint = Some(fingerprint);
			last_was_fill = is_fill;
		}
		plan
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BatchStep {
	Encode,
	Reuse,
}

/// A stable fingerprint over a tile group's ordered layer/feature contents,
/// used for memoization (§4.4 `hasSameContents`). Deliberately excludes the
/// group's `tile_id`: two distinct tiles (e.g. neighboring ocean tiles) with
/// identical contents must fingerprint equal so `plan_batch` can reuse the
/// previous tile's encoded bytes instead of re-encoding. The low 32 bits of
/// each feature's `sort_key` (layer/sortOrder/featureOrder, not the tile-id
/// high bits) are used for the same reason.
fn group_fingerprint(group: &TileGroup) -> u64 {
	let mut hasher = Fnv1a64::new();
	for layer in &group.layers {
		hasher.write(layer.layer_name.as_bytes());
		for feature in &layer.features {
			hasher.write(&(feature.sort_key as u32).to_le_bytes());
			for part in &feature.geometry {
				for &(x, y) in part {
					hasher.write(&x.to_le_bytes());
					hasher.write(&y.to_le_bytes());
				}
			}
			for (key_id, value) in &feature.attributes {
				hasher.write(&key_id.to_le_bytes());
				hash_attribute_value(&mut hasher, value);
			}
		}
	}
	hasher.finish()
}

fn hash_attribute_value(hasher: &mut Fnv1a64, value: &AttributeValue) {
	match value {
		AttributeValue::String(s) => hasher.write(s.as_bytes()),
		AttributeValue::Long(n) => hasher.write(&n.to_le_bytes()),
		AttributeValue::Double(d) => hasher.write(&d.to_bits().to_le_bytes()),
		AttributeValue::Bool(b) => hasher.write(&[u8::from(*b)]),
	}
}

/// A tile group qualifies for fill-skip memoization when it is exactly one
/// layer with exactly one feature, that feature a full-tile fill.
fn is_lone_fill(group: &TileGroup) -> bool {
	group.layers.len() == 1 && group.layers[0].features.len() == 1 && group.layers[0].features[0].contains_only_fill
}

/// FNV-1a-64: small, dependency-free, and already precedented in this
/// workspace's style of hand-rolling short, well-known algorithms
/// (`tilekiln_geometry::math::area_ring`) rather than pulling in a crate for
/// a ten-line function.
struct Fnv1a64(u64);

impl Fnv1a64 {
	const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
	const PRIME: u64 = 0x0000_0100_0000_01B3;

	fn new() -> Self {
		Self(Self::OFFSET_BASIS)
	}

	fn write(&mut self, bytes: &[u8]) {
		for &b in bytes {
			self.0 ^= u64::from(b);
			self.0 = self.0.wrapping_mul(Self::PRIME);
		}
	}

	fn finish(&self) -> u64 {
		self.0
	}
}

/// Hashes already-compressed bytes for the writer's dedup map (§4.6).
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u64 {
	let mut hasher = Fnv1a64::new();
	hasher.write(bytes);
	hasher.finish()
}

fn encode_group(group: &TileGroup, config: &PipelineConfig, stats: &Stats) -> Result<(Blob, u64)> {
	let mut layers = Vec::with_capacity(group.layers.len());
	for layer in &group.layers {
		let features = layer.features.iter().map(|f| rendered_feature_to_geo_feature(f)).collect::<Result<Vec<_>>>().with_context(|| format!("converting layer {} at tile {}", layer.layer_name, group.tile_id))?;
		layers.push(VectorTileLayer::from_features(layer.layer_name.clone(), features, 4096, 2).with_context(|| format!("encoding layer {}", layer.layer_name))?);
	}
	let tile = VectorTile::new(layers);
	let uncompressed = tile.to_blob().context("serializing vector tile")?;
	if uncompressed.len() > config.tile_warning_size_bytes {
		log::warn!("tile {} is {} bytes uncompressed, exceeding the {}-byte warning threshold", group.tile_id, uncompressed.len(), config.tile_warning_size_bytes);
	}
	let compressed = compress(uncompressed, &config.tile_compression).context("compressing vector tile")?;
	let hash = content_hash(compressed.as_slice());
	stats.add_bytes_written(compressed.len());
	Ok((compressed, hash))
}

fn rendered_feature_to_geo_feature(feature: &RenderedFeature) -> Result<GeoFeature> {
	let geometry = parts_to_geometry(feature.geometry_kind, &feature.geometry)?;
	let mut properties = GeoProperties::new();
	for (key_id, value) in &feature.attributes {
		properties.insert(key_id.to_string(), attribute_value_to_geo_value(value));
	}
	let mut geo_feature = GeoFeature::new(geometry);
	geo_feature.set_properties(properties);
	if let Some(id) = feature.id {
		geo_feature.set_id(id);
	}
	Ok(geo_feature)
}

fn attribute_value_to_geo_value(value: &AttributeValue) -> GeoValue {
	match value {
		AttributeValue::String(s) => GeoValue::from(s.as_str()),
		AttributeValue::Long(n) => GeoValue::from(*n),
		AttributeValue::Double(d) => GeoValue::from(*d),
		AttributeValue::Bool(b) => GeoValue::from(*b),
	}
}

/// Converts tile-local integer parts back into the workspace's `geo::Geometry`
/// model, grouping polygon rings by signed area exactly the way
/// `VectorTileFeature::to_geometry` classifies outer/inner rings on decode.
fn parts_to_geometry(kind: GeometryKind, parts: &[Vec<(i32, i32)>]) -> Result<Geometry> {
	let as_f64 = |part: &[(i32, i32)]| part.iter().map(|&(x, y)| [f64::from(x), f64::from(y)]).collect::<Vec<_>>();
	Ok(match kind {
		GeometryKind::Point => {
			let part = parts.first().context("point geometry missing its single part")?;
			let point = part.first().context("point part has no coordinate")?;
			Geometry::new_point([f64::from(point.0), f64::from(point.1)])
		}
		GeometryKind::MultiPoint => Geometry::new_multi_point(parts.iter().filter_map(|p| p.first()).map(|&(x, y)| [f64::from(x), f64::from(y)]).collect()),
		GeometryKind::Line => Geometry::new_line_string(as_f64(parts.first().context("line geometry missing its single part")?)),
		GeometryKind::MultiLine => Geometry::new_multi_line_string(parts.iter().map(|p| as_f64(p)).collect()),
		GeometryKind::Polygon => Geometry::new_polygon(parts.iter().map(|p| as_f64(p)).collect()),
		GeometryKind::MultiPolygon => Geometry::new_multi_polygon(group_rings_into_polygons(parts)),
	})
}

/// Groups a flat ring list into per-polygon ring groups: a ring with
/// positive signed area starts a new polygon, a non-positive one is a hole
/// attached to the current polygon.
fn group_rings_into_polygons(parts: &[Vec<(i32, i32)>]) -> Vec<Vec<Vec<[f64; 2]>>> {
	let mut polygons: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
	let mut current: Vec<Vec<[f64; 2]>> = Vec::new();
	for part in parts {
		let ring: Vec<[f64; 2]> = part.iter().map(|&(x, y)| [f64::from(x), f64::from(y)]).collect();
		let area = area_ring(&ring);
		if area > 1e-9 && !current.is_empty() {
			polygons.push(std::mem::take(&mut current));
		}
		current.push(ring);
	}
	if !current.is_empty() {
		polygons.push(current);
	}
	polygons
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::feature_group::GroupedLayer;

	fn fill_feature(tile_id: u32) -> RenderedFeature {
		RenderedFeature {
			sort_key: crate::sort_key::pack(tile_id, 0, 0, 0),
			geometry_kind: GeometryKind::Polygon,
			geometry: vec![vec![(0, 0), (4096, 0), (4096, 4096), (0, 4096), (0, 0)]],
			attributes: vec![],
			id: None,
			contains_only_fill: true,
		}
	}

	fn fill_group(tile_id: u32) -> TileGroup {
		TileGroup {
			tile_id,
			coord: TileCoord::new(0, 0, 0).unwrap(),
			layers: vec![GroupedLayer { layer_id: 0, layer_name: "water".into(), features: vec![fill_feature(tile_id)] }],
		}
	}

	#[test]
	fn fingerprint_is_stable_across_equal_groups_with_different_tile_ids() {
		// Two different tiles with byte-for-byte identical contents (the
		// common "adjacent ocean tile" case §4.5 optimizes for) must
		// fingerprint equal, or cross-tile memoization could never trigger.
		let a = group_fingerprint(&fill_group(0));
		let b = group_fingerprint(&fill_group(1));
		assert_eq!(a, b);

		let mut different = fill_group(2);
		different.layers[0].layer_name = "landuse".into();
		let c = group_fingerprint(&different);
		assert_ne!(a, c);
	}

	#[test]
	fn lone_fill_is_detected() {
		assert!(is_lone_fill(&fill_group(0)));
	}

	#[test]
	fn content_hash_is_deterministic() {
		assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
		assert_ne!(content_hash(b"hello"), content_hash(b"world"));
	}
}
