//! The Profile contract (§6): the callback library that decides which
//! source features become which output-layer features, and how a tile's
//! layer is post-processed once every feature covering it is known.
//!
//! This module only defines the contract consumed by
//! [`crate::feature_renderer::FeatureRenderer`] and
//! [`crate::feature_group::FeatureGroup`]; concrete profiles are written by
//! callers of this crate, the same way a `TilesWriterTrait` implementor
//! lives outside `tilekiln_core`.

use crate::rendered_feature::AttributeValue;
use anyhow::Result;
use geo::Geometry;
use std::collections::BTreeMap;

/// One geographic source feature as handed to a profile: an opaque geometry
/// in longitude/latitude degrees plus a string-keyed attribute map. Parsing
/// this out of OSM PBF / Natural Earth / Parquet / Shapefile is out of
/// scope (§1); this crate only consumes the result.
#[derive(Debug, Clone)]
pub struct SourceFeature {
	pub geometry: Geometry<f64>,
	pub attributes: BTreeMap<String, AttributeValue>,
	/// Name of the source this feature came from, used for
	/// `Profile::cares_about_source`.
	pub source_name: String,
}

/// The shape of output a profile requests for one geometry: which kind to
/// derive it into before clipping (§6 `geometryKind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRequest {
	/// Emit the geometry as given (point stays point, line stays line, ...).
	AsIs,
	/// Collapse to a single point at the ring/line centroid.
	Centroid,
	/// Collapse to a single point guaranteed to lie on the surface (for
	/// polygons, inside a ring; falls back to the centroid otherwise).
	PointOnSurface,
}

/// Per-emission render options a profile attaches when it calls
/// [`FeatureEmitter::emit`]. Field names mirror §6 exactly.
#[derive(Debug, Clone)]
pub struct EmitOptions {
	pub layer: String,
	pub geometry_kind: GeometryRequest,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub buffer_pixels: f64,
	/// Minimum on-screen size (in 0..4096 tile units) a clipped/simplified
	/// geometry must retain at zoom `z`, else it is dropped (§4.2 step 4).
	pub min_pixel_size: fn(u8) -> f64,
	/// Douglas-Peucker/Visvalingam-Whyatt tolerance (tile units) at zoom `z`.
	pub pixel_tolerance: fn(u8) -> f64,
	/// Label-grid cell size in tile units at zoom `z`; `0.0` disables
	/// label-grid thinning for this feature.
	pub label_grid_size: fn(u8) -> f64,
	/// Lower values sort first within a (tile, layer) pair.
	pub sort_order: u16,
	/// Feature id to carry into the wire format, if any.
	pub id: Option<u64>,
	/// Emit a single-point fallback at the centroid when clipping +
	/// simplification collapses the geometry to nothing (§4.2 step 4).
	pub keep_collapsed: bool,
}

impl EmitOptions {
	/// A reasonable starting point: one zoom, no buffer, the §4.2 default
	/// outermost-zoom `minPixelSize` (one wire unit), no simplification.
	#[must_use]
	pub fn new(layer: impl Into<String>, min_zoom: u8, max_zoom: u8) -> Self {
		Self {
			layer: layer.into(),
			geometry_kind: GeometryRequest::AsIs,
			min_zoom,
			max_zoom,
			buffer_pixels: 0.0,
			min_pixel_size: |_| 1.0,
			pixel_tolerance: |_| 0.0,
			label_grid_size: |_| 0.0,
			sort_order: 0,
			id: None,
			keep_collapsed: false,
		}
	}
}

/// One attribute a profile attaches to an emission, optionally restricted
/// to zoom levels `>= min_zoom` (§6 `attrWithMinZoom`).
#[derive(Debug, Clone)]
pub struct Attr {
	pub key: String,
	pub value: AttributeValue,
	pub min_zoom: u8,
}

/// One `FeatureEmitter::emit` call, buffered for
/// [`crate::feature_renderer::FeatureRenderer`] to expand into per-tile
/// [`crate::rendered_feature::RenderedFeature`]s.
#[derive(Debug, Clone)]
pub struct Emission {
	pub geometry: Geometry<f64>,
	pub options: EmitOptions,
	pub attrs: Vec<Attr>,
}

/// Exposed to a profile's [`Profile::process_feature`] so it can emit zero
/// or more render requests for one source feature. The pipeline buffers
/// emissions synchronously; a profile never sees a queue or a future.
#[derive(Debug, Default)]
pub struct FeatureEmitter {
	emissions: Vec<Emission>,
}

impl FeatureEmitter {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Buffers `geometry` for rendering with `options`. The geometry is
	/// expected in mercator-projectable longitude/latitude degrees, the
	/// same coordinate space as [`SourceFeature::geometry`].
	pub fn emit(&mut self, geometry: Geometry<f64>, options: EmitOptions) -> EmissionBuilder<'_> {
		self.emissions.push(Emission { geometry, options, attrs: Vec::new() });
		EmissionBuilder { emitter: self }
	}

	/// Drains every emission buffered for this source feature.
	pub fn into_emissions(self) -> Vec<Emission> {
		self.emissions
	}
}

/// Fluent handle returned by [`FeatureEmitter::emit`] for attaching
/// attributes (§6 `attr`, `attrWithMinZoom`) to the emission just pushed.
pub struct EmissionBuilder<'a> {
	emitter: &'a mut FeatureEmitter,
}

impl EmissionBuilder<'_> {
	#[must_use]
	pub fn attr(self, key: impl Into<String>, value: AttributeValue) -> Self {
		self.attr_with_min_zoom(key, value, 0)
	}

	#[must_use]
	pub fn attr_with_min_zoom(self, key: impl Into<String>, value: AttributeValue, min_zoom: u8) -> Self {
		self.emitter.emissions.last_mut().expect("emit pushed an emission").attrs.push(Attr { key: key.into(), value, min_zoom });
		self
	}
}

/// A tile-grouped, per-layer run of render-features ready for
/// `postProcessLayerFeatures` (§4.4). Built by [`crate::feature_group::FeatureGroup`].
pub struct LayerFeatures<'a> {
	pub layer: &'a str,
	pub zoom: u8,
	pub features: Vec<crate::rendered_feature::RenderedFeature>,
}

/// The callback contract a caller of this crate implements to decide which
/// source features to render and how to post-process a tile's layer.
pub trait Profile: Send + Sync {
	/// Called once per source feature; the profile emits zero or more
	/// render requests via `emitter`.
	///
	/// # Errors
	/// A returned error is an input error (§7): logged, this feature is
	/// dropped, and processing continues.
	fn process_feature(&self, source: &SourceFeature, emitter: &mut FeatureEmitter) -> Result<()>;

	/// Called once per (tile, layer) with every feature already ordered by
	/// `sortOrder`/emission order. May add, remove, or reorder features.
	///
	/// # Errors
	/// A returned error is a geometry error (§7): logged, and the *original*
	/// `features` are passed through unchanged by the caller.
	fn post_process_layer_features(&self, layer: &str, zoom: u8, features: Vec<crate::rendered_feature::RenderedFeature>) -> Result<Vec<crate::rendered_feature::RenderedFeature>> {
		let _ = (layer, zoom);
		Ok(features)
	}

	/// Whether this profile wants to see features from source `name` at all.
	fn cares_about_source(&self, name: &str) -> bool {
		let _ = name;
		true
	}

	fn name(&self) -> &str;
	fn description(&self) -> &str {
		""
	}
	fn attribution(&self) -> &str {
		""
	}
	fn version(&self) -> &str {
		"1"
	}
	/// Whether the rendered archive should be presented as an overlay
	/// (transparent base) rather than a standalone basemap.
	fn is_overlay(&self) -> bool {
		false
	}
}
