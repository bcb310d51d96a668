//! Clipping helpers used by [`crate::feature_renderer::FeatureRenderer`] to
//! cut a reprojected geometry down to one tile's buffered extent (§4.2 step 3).
//!
//! Polygon clipping reuses `geo::BooleanOps` (already relied on elsewhere in
//! this workspace for `tilekiln_geometry::tile_outline`'s `unary_union`).
//! Line clipping is a small self-contained Cohen–Sutherland implementation:
//! the `geo` crate has no line-clipping algorithm, and pulling in a second
//! geometry crate for one function would be the outlier here, not the norm.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon, Rect};

/// A rectangular clip window in tile-local float coordinates (pre-rounding).
#[derive(Debug, Clone, Copy)]
pub struct ClipRect {
	pub min: (f64, f64),
	pub max: (f64, f64),
}

impl ClipRect {
	#[must_use]
	pub fn buffered(buffer: f64) -> Self {
		Self { min: (-buffer, -buffer), max: (4096.0 + buffer, 4096.0 + buffer) }
	}

	fn as_geo_rect(&self) -> Rect<f64> {
		Rect::new(Coord { x: self.min.0, y: self.min.1 }, Coord { x: self.max.0, y: self.max.1 })
	}

	fn as_polygon(&self) -> Polygon<f64> {
		self.as_geo_rect().to_polygon()
	}

	/// Outcode bits for Cohen–Sutherland clipping.
	fn outcode(&self, p: (f64, f64)) -> u8 {
		let mut code = 0u8;
		if p.0 < self.min.0 {
			code |= 1;
		} else if p.0 > self.max.0 {
			code |= 2;
		}
		if p.1 < self.min.1 {
			code |= 4;
		} else if p.1 > self.max.1 {
			code |= 8;
		}
		code
	}

	/// Clips one segment against this rectangle. Returns `None` if the
	/// segment lies entirely outside.
	fn clip_segment(&self, mut a: (f64, f64), mut b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
		loop {
			let code_a = self.outcode(a);
			let code_b = self.outcode(b);
			if code_a == 0 && code_b == 0 {
				return Some((a, b));
			}
			if code_a & code_b != 0 {
				return None;
			}
			let code_out = if code_a != 0 { code_a } else { code_b };
			let (dx, dy) = (b.0 - a.0, b.1 - a.1);
			let p = if code_out & 8 != 0 {
				(a.0 + dx * (self.max.1 - a.1) / dy, self.max.1)
			} else if code_out & 4 != 0 {
				(a.0 + dx * (self.min.1 - a.1) / dy, self.min.1)
			} else if code_out & 2 != 0 {
				(self.max.0, a.1 + dy * (self.max.0 - a.0) / dx)
			} else {
				(self.min.0, a.1 + dy * (self.min.0 - a.0) / dx)
			};
			if code_out == code_a {
				a = p;
			} else {
				b = p;
			}
		}
	}

	/// Clips a polyline (not assumed closed) against this rectangle,
	/// returning zero or more contiguous sub-polylines.
	#[must_use]
	pub fn clip_line(&self, points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
		let mut result = Vec::new();
		let mut current: Vec<(f64, f64)> = Vec::new();
		for window in points.windows(2) {
			match self.clip_segment(window[0], window[1]) {
				Some((a, b)) => {
					if current.last().is_none_or(|&last| last != a) {
						if !current.is_empty() {
							result.push(std::mem::take(&mut current));
						}
						current.push(a);
					}
					current.push(b);
				}
				None => {
					if !current.is_empty() {
						result.push(std::mem::take(&mut current));
					}
				}
			}
		}
		if current.len() >= 2 {
			result.push(current);
		}
		result
	}

	/// Clips a polygon ring set (exterior + holes, in `(f64, f64)` pairs,
	/// first point repeated as last) against this rectangle via
	/// `geo::BooleanOps::intersection`. Returns each resulting polygon as
	/// `(exterior, holes)` ring point lists.
	#[must_use]
	pub fn clip_polygon(&self, exterior: &[(f64, f64)], holes: &[Vec<(f64, f64)>]) -> Vec<(Vec<(f64, f64)>, Vec<Vec<(f64, f64)>>)> {
		let to_ring = |pts: &[(f64, f64)]| LineString::new(pts.iter().map(|&(x, y)| Coord { x, y }).collect());
		let polygon = Polygon::new(to_ring(exterior), holes.iter().map(|h| to_ring(h)).collect());
		let clipped: MultiPolygon<f64> = polygon.intersection(&self.as_polygon());
		clipped
			.into_iter()
			.map(|p| {
				let ext = p.exterior().coords().map(|c| (c.x, c.y)).collect();
				let holes = p.interiors().iter().map(|r| r.coords().map(|c| (c.x, c.y)).collect()).collect();
				(ext, holes)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clip_line_drops_segments_outside_window() {
		let rect = ClipRect { min: (0.0, 0.0), max: (10.0, 10.0) };
		let points = [(-5.0, 5.0), (5.0, 5.0), (20.0, 5.0)];
		let clipped = rect.clip_line(&points);
		assert_eq!(clipped.len(), 1);
		assert_eq!(clipped[0][0], (0.0, 5.0));
		assert_eq!(*clipped[0].last().unwrap(), (10.0, 5.0));
	}

	#[test]
	fn clip_line_splits_into_multiple_runs() {
		let rect = ClipRect { min: (0.0, 0.0), max: (10.0, 10.0) };
		// Dips outside the window in the middle, re-enters.
		let points = [(2.0, 2.0), (2.0, 20.0), (2.0, 2.0), (8.0, 8.0)];
		let clipped = rect.clip_line(&points);
		assert!(clipped.len() >= 2);
	}

	#[test]
	fn clip_polygon_full_tile_square_stays_whole() {
		let rect = ClipRect::buffered(0.0);
		let square = vec![(0.0, 0.0), (4096.0, 0.0), (4096.0, 4096.0), (0.0, 4096.0), (0.0, 0.0)];
		let result = rect.clip_polygon(&square, &[]);
		assert_eq!(result.len(), 1);
		assert_eq!(result[0].1.len(), 0);
	}

	#[test]
	fn clip_polygon_outside_window_is_empty() {
		let rect = ClipRect { min: (0.0, 0.0), max: (10.0, 10.0) };
		let far_away = vec![(100.0, 100.0), (110.0, 100.0), (110.0, 110.0), (100.0, 110.0), (100.0, 100.0)];
		assert!(rect.clip_polygon(&far_away, &[]).is_empty());
	}
}
