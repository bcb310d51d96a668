//! `FeatureRenderer` (§4.2): turns one profile [`crate::profile::Emission`]
//! into zero or more [`crate::rendered_feature::RenderedFeature`]s, one per
//! covered `(tile, layer)` pair.
//!
//! Re-projection, bounding-box coverage, and simplification lean on the
//! `geo` crate the rest of the workspace already depends on
//! (`tilekiln_geometry::tile_outline` uses `geo::{Polygon, unary_union}`);
//! clipping against a tile's buffered extent is [`crate::clip::ClipRect`].

use crate::clip::ClipRect;
use crate::geometry_codec::{GeometryKind, Part, TilePoint};
use crate::layer_registry::LayerRegistry;
use crate::profile::{Attr, Emission, GeometryRequest};
use crate::rendered_feature::RenderedFeature;
use crate::sort_key::{self, TileOrder, MAX_ZOOM};
use anyhow::Result;
use geo::{BoundingRect, Centroid, Geometry, InteriorPoint, LineString, MultiPolygon, Point, Polygon, Simplify};
use tilekiln_core::TileCoord;

/// Extent of the 4096-unit tile-local integer grid (§3).
pub const TILE_EXTENT: f64 = 4096.0;

/// Stateless rendering logic, parameterized by the shared layer/key
/// interner and the archive's chosen tile ordering.
pub struct FeatureRenderer<'a> {
	registry: &'a LayerRegistry,
	order: TileOrder,
}

impl<'a> FeatureRenderer<'a> {
	#[must_use]
	pub fn new(registry: &'a LayerRegistry, order: TileOrder) -> Self {
		Self { registry, order }
	}

	/// Expands one emission into every covered `(tile, layer)` render-feature.
	///
	/// `feature_order` breaks ties between emissions sharing the same
	/// `(tile, layer, sortOrder)`; it is truncated to 8 bits (§3), so callers
	/// only need it to be locally monotone, not globally unique.
	///
	/// # Errors
	/// Returns an error if the emission's geometry kind is unsupported or a
	/// covered tile's id cannot be packed (zoom above [`MAX_ZOOM`]).
	pub fn render(&self, emission: &Emission, feature_order: u8) -> Result<Vec<RenderedFeature>> {
		let layer_id = self.registry.layer_id(&emission.options.layer)?;
		let max_zoom = emission.options.max_zoom.min(MAX_ZOOM);
		let mut out = Vec::new();
		for z in emission.options.min_zoom..=max_zoom {
			self.render_at_zoom(emission, layer_id, z, feature_order, &mut out)?;
		}
		Ok(out)
	}

	fn render_at_zoom(&self, emission: &Emission, layer_id: u8, z: u8, feature_order: u8, out: &mut Vec<RenderedFeature>) -> Result<()> {
		let geometry = apply_geometry_request(&emission.geometry, emission.options.geometry_kind);
		let n = 1u32 << u32::from(z);
		let buffer = emission.options.buffer_pixels;
		let min_pixel_size = (emission.options.min_pixel_size)(z);
		let tolerance = (emission.options.pixel_tolerance)(z);

		let (tiles, mut parts_by_tile) = project_and_clip(&geometry, z, buffer)?;
		let _ = tiles;

		for (coord, mut parts) in parts_by_tile.drain() {
			if coord.x >= n || coord.y >= n {
				continue;
			}
			let kind = geometry_kind_of(&geometry);
			if tolerance > 0.0 {
				parts = simplify_parts(&kind, parts, tolerance);
			}
			let size = parts_extent(&parts);
			let contains_only_fill = is_full_tile_fill(&kind, &parts, buffer);
			// A point never "collapses": minPixelSize only bounds geometry that can
			// shrink under simplification, which a single coordinate never does.
			let can_collapse = !matches!(kind, GeometryKind::Point | GeometryKind::MultiPoint);

			if can_collapse && size < min_pixel_size && !contains_only_fill {
				if emission.options.keep_collapsed {
					let centroid = parts_centroid(&parts).unwrap_or((TILE_EXTENT / 2.0, TILE_EXTENT / 2.0));
					parts = vec![vec![round_point(centroid)]];
				} else {
					continue;
				}
			}

			let tile_id = self.order.tile_id(&coord)?;
			let sort_key = sort_key::pack(tile_id, layer_id, emission.options.sort_order, feature_order);
			let geometry_kind = if parts.len() == 1 && parts[0].len() == 1 { GeometryKind::Point } else { kind };
			let attributes = resolve_attrs(self.registry, layer_id, &emission.attrs, z);

			out.push(RenderedFeature {
				sort_key,
				geometry_kind,
				geometry: rounded_parts(&parts),
				attributes,
				id: emission.options.id,
				contains_only_fill,
			});
		}
		Ok(())
	}
}

fn geometry_kind_of(geometry: &Geometry<f64>) -> GeometryKind {
	match geometry {
		Geometry::Point(_) => GeometryKind::Point,
		Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
		Geometry::LineString(_) => GeometryKind::Line,
		Geometry::MultiLineString(_) => GeometryKind::MultiLine,
		Geometry::Polygon(_) => GeometryKind::Polygon,
		Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
		_ => GeometryKind::Point,
	}
}

/// Applies the profile-requested collapse (§6 `geometryKind`), if any.
fn apply_geometry_request(geometry: &Geometry<f64>, request: GeometryRequest) -> Geometry<f64> {
	match request {
		GeometryRequest::AsIs => geometry.clone(),
		GeometryRequest::Centroid => {
			let centroid = geo_centroid(geometry);
			Geometry::Point(centroid)
		}
		GeometryRequest::PointOnSurface => {
			let point = geo_interior_point(geometry);
			Geometry::Point(point)
		}
	}
}

fn geo_centroid(geometry: &Geometry<f64>) -> Point<f64> {
	match geometry {
		Geometry::Point(p) => *p,
		Geometry::LineString(g) => g.centroid().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::Polygon(g) => g.centroid().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiPoint(g) => g.centroid().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiLineString(g) => g.centroid().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiPolygon(g) => g.centroid().unwrap_or_else(|| Point::new(0.0, 0.0)),
		_ => Point::new(0.0, 0.0),
	}
}

fn geo_interior_point(geometry: &Geometry<f64>) -> Point<f64> {
	match geometry {
		Geometry::Point(p) => *p,
		Geometry::LineString(g) => g.interior_point().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::Polygon(g) => g.interior_point().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiPoint(g) => g.interior_point().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiLineString(g) => g.interior_point().unwrap_or_else(|| Point::new(0.0, 0.0)),
		Geometry::MultiPolygon(g) => g.interior_point().unwrap_or_else(|| Point::new(0.0, 0.0)),
		_ => Point::new(0.0, 0.0),
	}
}

/// Projects `lon`/`lat` (degrees) to continuous world-pixel units at zoom
/// `z`, where one tile spans [`TILE_EXTENT`] units — the standard
/// web-mercator slippy-map formula.
fn project(lon: f64, lat: f64, z: u8) -> (f64, f64) {
	let n = f64::from(1u32 << u32::from(z));
	let lat_rad = lat.to_radians().clamp(-1.484_422_229_745_11, 1.484_422_229_745_11);
	let x = (lon + 180.0) / 360.0 * n;
	let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n;
	(x * TILE_EXTENT, y * TILE_EXTENT)
}

fn project_line(line: &LineString<f64>, z: u8) -> Vec<(f64, f64)> {
	line.coords().map(|c| project(c.x, c.y, z)).collect()
}

fn project_polygon(polygon: &Polygon<f64>, z: u8) -> (Vec<(f64, f64)>, Vec<Vec<(f64, f64)>>) {
	let exterior = project_line(polygon.exterior(), z);
	let holes = polygon.interiors().iter().map(|r| project_line(r, z)).collect();
	(exterior, holes)
}

fn world_bbox(points: impl Iterator<Item = (f64, f64)>) -> Option<((f64, f64), (f64, f64))> {
	let mut min = (f64::INFINITY, f64::INFINITY);
	let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
	let mut any = false;
	for (x, y) in points {
		any = true;
		min.0 = min.0.min(x);
		min.1 = min.1.min(y);
		max.0 = max.0.max(x);
		max.1 = max.1.max(y);
	}
	any.then_some((min, max))
}

fn tile_range(min: (f64, f64), max: (f64, f64), buffer: f64, n: u32) -> (u32, u32, u32, u32) {
	let tx0 = ((min.0 - buffer) / TILE_EXTENT).floor().max(0.0) as u32;
	let ty0 = ((min.1 - buffer) / TILE_EXTENT).floor().max(0.0) as u32;
	let tx1 = (((max.0 + buffer) / TILE_EXTENT).floor() as i64).clamp(0, i64::from(n) - 1) as u32;
	let ty1 = (((max.1 + buffer) / TILE_EXTENT).floor() as i64).clamp(0, i64::from(n) - 1) as u32;
	(tx0.min(n.saturating_sub(1)), ty0.min(n.saturating_sub(1)), tx1, ty1)
}

type PartsByTile = std::collections::HashMap<TileCoord, Vec<Part>>;

/// Computes every tile this (already-collapsed) geometry covers at zoom `z`
/// and, for each, its clipped tile-local parts.
fn project_and_clip(geometry: &Geometry<f64>, z: u8, buffer: f64) -> Result<(Vec<TileCoord>, PartsByTile)> {
	let n = 1u32 << u32::from(z);
	let rect = ClipRect::buffered(buffer);
	let mut by_tile: PartsByTile = PartsByTile::new();

	match geometry {
		Geometry::Point(p) => {
			let (x, y) = project(p.x(), p.y(), z);
			let (tx, ty) = ((x / TILE_EXTENT).floor() as i64, (y / TILE_EXTENT).floor() as i64);
			if tx >= 0 && ty >= 0 && tx < i64::from(n) && ty < i64::from(n) {
				let coord = TileCoord::new(z, tx as u32, ty as u32)?;
				let local = (x - tx as f64 * TILE_EXTENT, y - ty as f64 * TILE_EXTENT);
				by_tile.entry(coord).or_default().push(vec![round_point(local)]);
			}
		}
		Geometry::MultiPoint(mp) => {
			for p in mp {
				let (tiles, parts) = project_and_clip(&Geometry::Point(*p), z, buffer)?;
				let _ = tiles;
				merge_parts(&mut by_tile, parts);
			}
		}
		Geometry::LineString(line) => {
			let world = project_line(line, z);
			if let Some((min, max)) = world_bbox(world.iter().copied()) {
				let (tx0, ty0, tx1, ty1) = tile_range(min, max, buffer, n);
				for ty in ty0..=ty1 {
					for tx in tx0..=tx1 {
						let origin = (f64::from(tx) * TILE_EXTENT, f64::from(ty) * TILE_EXTENT);
						let local: Vec<(f64, f64)> = world.iter().map(|&(x, y)| (x - origin.0, y - origin.1)).collect();
						let clipped = rect.clip_line(&local);
						if !clipped.is_empty() {
							let coord = TileCoord::new(z, tx, ty)?;
							by_tile.entry(coord).or_default().extend(clipped.into_iter().map(|line| line.into_iter().map(round_point).collect()));
						}
					}
				}
			}
		}
		Geometry::MultiLineString(mls) => {
			for line in mls {
				let (_, parts) = project_and_clip(&Geometry::LineString(line.clone()), z, buffer)?;
				merge_parts(&mut by_tile, parts);
			}
		}
		Geometry::Polygon(polygon) => {
			let (exterior, holes) = project_polygon(polygon, z);
			if let Some((min, max)) = world_bbox(exterior.iter().copied()) {
				let (tx0, ty0, tx1, ty1) = tile_range(min, max, buffer, n);
				for ty in ty0..=ty1 {
					for tx in tx0..=tx1 {
						let origin = (f64::from(tx) * TILE_EXTENT, f64::from(ty) * TILE_EXTENT);
						let shift = |pts: &[(f64, f64)]| pts.iter().map(|&(x, y)| (x - origin.0, y - origin.1)).collect::<Vec<_>>();
						let local_ext = shift(&exterior);
						let local_holes: Vec<Vec<(f64, f64)>> = holes.iter().map(|h| shift(h)).collect();
						let clipped = rect.clip_polygon(&local_ext, &local_holes);
						if !clipped.is_empty() {
							let coord = TileCoord::new(z, tx, ty)?;
							let entry = by_tile.entry(coord).or_default();
							for (ext, hs) in clipped {
								entry.push(ext.into_iter().map(round_point).collect());
								for h in hs {
									entry.push(h.into_iter().map(round_point).collect());
								}
							}
						}
					}
				}
			}
		}
		Geometry::MultiPolygon(mp) => {
			for polygon in mp {
				let (_, parts) = project_and_clip(&Geometry::Polygon(polygon.clone()), z, buffer)?;
				merge_parts(&mut by_tile, parts);
			}
		}
		other => anyhow::bail!("unsupported geometry kind for rendering: {other:?}"),
	}

	Ok((by_tile.keys().copied().collect(), by_tile))
}

fn merge_parts(into: &mut PartsByTile, from: PartsByTile) {
	for (coord, parts) in from {
		into.entry(coord).or_default().extend(parts);
	}
}

fn round_point(p: (f64, f64)) -> TilePoint {
	(p.0.round() as i32, p.1.round() as i32)
}

fn rounded_parts(parts: &[Vec<TilePoint>]) -> Vec<Part> {
	parts.to_vec()
}

/// Simplifies each part's float ring/line via Douglas-Peucker before it is
/// rounded to integer tile units. Applied post-clip, per §4.2 step 4.
fn simplify_parts(kind: &GeometryKind, parts: Vec<Part>, tolerance: f64) -> Vec<Part> {
	parts
		.into_iter()
		.map(|part| {
			let coords: Vec<geo::Coord<f64>> = part.iter().map(|&(x, y)| geo::Coord { x: f64::from(x), y: f64::from(y) }).collect();
			let simplified = match kind {
				GeometryKind::Polygon | GeometryKind::MultiPolygon if part.len() >= 4 => {
					Polygon::new(LineString::new(coords), vec![]).simplify(&tolerance).exterior().coords().map(|c| (c.x, c.y)).collect()
				}
				GeometryKind::Line | GeometryKind::MultiLine if part.len() >= 2 => LineString::new(coords).simplify(&tolerance).coords().map(|c| (c.x, c.y)).collect(),
				_ => part.iter().map(|&(x, y)| (f64::from(x), f64::from(y))).collect(),
			};
			simplified.into_iter().map(round_point).collect()
		})
		.collect()
}

/// A rough on-screen size proxy: the longer side of the part's bounding box
/// (in tile units), used against `minPixelSize` (§4.2 step 4).
fn parts_extent(parts: &[Part]) -> f64 {
	let mut max_extent = 0.0f64;
	for part in parts {
		if let Some((min, max)) = world_bbox(part.iter().map(|&(x, y)| (f64::from(x), f64::from(y)))) {
			max_extent = max_extent.max((max.0 - min.0).max(max.1 - min.1));
		}
	}
	max_extent
}

fn parts_centroid(parts: &[Part]) -> Option<(f64, f64)> {
	let mut sum = (0.0, 0.0);
	let mut count = 0usize;
	for part in parts {
		for &(x, y) in part {
			sum.0 += f64::from(x);
			sum.1 += f64::from(y);
			count += 1;
		}
	}
	(count > 0).then_some((sum.0 / count as f64, sum.1 / count as f64))
}

/// A polygon ring is flagged `containsOnlyFill` (§4.2 step 5, §3) when its
/// single, hole-free exterior is exactly the buffered tile boundary.
fn is_full_tile_fill(kind: &GeometryKind, parts: &[Part], buffer: f64) -> bool {
	if !matches!(kind, GeometryKind::Polygon | GeometryKind::MultiPolygon) || parts.len() != 1 {
		return false;
	}
	let Some((min, max)) = world_bbox(parts[0].iter().map(|&(x, y)| (f64::from(x), f64::from(y)))) else {
		return false;
	};
	let eps = 1.0;
	(min.0 + buffer).abs() < eps && (min.1 + buffer).abs() < eps && (max.0 - (TILE_EXTENT + buffer)).abs() < eps && (max.1 - (TILE_EXTENT + buffer)).abs() < eps
}

fn resolve_attrs(registry: &LayerRegistry, layer_id: u8, attrs: &[Attr], zoom: u8) -> Vec<(u32, crate::rendered_feature::AttributeValue)> {
	attrs.iter().filter(|a| a.min_zoom <= zoom).map(|a| (registry.key_id(layer_id, &a.key), a.value.clone())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::EmitOptions;
	use geo::{Point, Polygon};

	fn registry() -> LayerRegistry {
		LayerRegistry::new()
	}

	#[test]
	fn single_point_covers_exactly_its_tiles() {
		let registry = registry();
		let renderer = FeatureRenderer::new(&registry, TileOrder::Tms);
		let emission = Emission {
			geometry: Geometry::Point(Point::new(0.0, 0.0)),
			options: EmitOptions::new("poi", 0, 1),
			attrs: vec![],
		};
		let features = renderer.render(&emission, 0).unwrap();
		assert_eq!(features.len(), 2);
		for f in &features {
			assert_eq!(f.geometry_kind, GeometryKind::Point);
			assert_eq!(f.geometry, vec![vec![(2048, 2048)]]);
		}
	}

	#[test]
	fn world_covering_polygon_is_flagged_as_fill_at_every_tile() {
		let registry = registry();
		let renderer = FeatureRenderer::new(&registry, TileOrder::Tms);
		let world = Polygon::new(LineString::new(vec![geo::coord! {x: -180.0, y: -85.0}, geo::coord! {x: 180.0, y: -85.0}, geo::coord! {x: 180.0, y: 85.0}, geo::coord! {x: -180.0, y: 85.0}, geo::coord! {x: -180.0, y: -85.0}]), vec![]);
		let mut options = EmitOptions::new("ocean", 0, 2);
		options.min_pixel_size = |_| 0.0;
		let emission = Emission { geometry: Geometry::Polygon(world), options, attrs: vec![] };
		let features = renderer.render(&emission, 0).unwrap();
		// z0: 1 tile, z1: 4 tiles, z2: 16 tiles = 21 total (matches E2).
		assert_eq!(features.len(), 21);
		assert!(features.iter().all(|f| f.contains_only_fill));
	}

	#[test]
	fn tie_break_uses_feature_order() {
		let registry = registry();
		let renderer = FeatureRenderer::new(&registry, TileOrder::Tms);
		let emission = Emission { geometry: Geometry::Point(Point::new(0.0, 0.0)), options: EmitOptions::new("poi", 0, 0), attrs: vec![] };
		let a = renderer.render(&emission, 0).unwrap();
		let b = renderer.render(&emission, 1).unwrap();
		assert!(a[0].sort_key < b[0].sort_key);
	}
}
