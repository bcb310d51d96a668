//! Compact wire format for [`crate::rendered_feature::RenderedFeature`]
//! geometry: a packed sequence of tile-local, 4096-unit integer coordinates
//! encoded as zigzag varint deltas, the same technique the MVT encoder in
//! `tilekiln_geometry::vector_tile::feature` uses for its own geometry
//! commands.

use anyhow::Result;
use tilekiln_core::io::{ValueReader, ValueReaderBlob, ValueWriter, ValueWriterBlob};
use tilekiln_core::types::Blob;

/// The six geometry shapes a render-feature may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
	Point,
	Line,
	Polygon,
	MultiPoint,
	MultiLine,
	MultiPolygon,
}

impl GeometryKind {
	/// `true` for the `Multi*`/`Polygon` variants that are encoded as more
	/// than one part (ring or sub-geometry).
	#[must_use]
	pub fn is_multi(&self) -> bool {
		matches!(self, GeometryKind::Polygon | GeometryKind::MultiPoint | GeometryKind::MultiLine | GeometryKind::MultiPolygon)
	}
}

/// A tile-local coordinate, in `0..=4096` units nominally, but allowed to
/// stray slightly negative/above 4096 while a buffer has been applied and
/// clipping has not yet run.
pub type TilePoint = (i32, i32);

/// One ring (polygon), line, or point cluster (multipoint) of a geometry.
pub type Part = Vec<TilePoint>;

/// Encodes `parts` as: `varint(part count)`, then per part `varint(point
/// count)` followed by zigzag-delta-encoded `(dx, dy)` pairs, each point
/// delta-coded against the previous point *within the same part* (the first
/// point of a part is delta-coded against the origin).
pub fn encode_parts(parts: &[Part]) -> Result<Blob> {
	let mut writer = ValueWriterBlob::<byteorder::LittleEndian>::new_le();
	writer.write_varint(parts.len() as u64)?;
	for part in parts {
		writer.write_varint(part.len() as u64)?;
		let mut prev = (0i32, 0i32);
		for &(x, y) in part {
			writer.write_svarint(i64::from(x - prev.0))?;
			writer.write_svarint(i64::from(y - prev.1))?;
			prev = (x, y);
		}
	}
	Ok(writer.into_blob())
}

/// Inverse of [`encode_parts`].
pub fn decode_parts(data: &Blob) -> Result<Vec<Part>> {
	let mut reader = ValueReaderBlob::<byteorder::LittleEndian>::new_le(data.clone());
	let part_count = reader.read_varint()?;
	let mut parts = Vec::with_capacity(part_count as usize);
	for _ in 0..part_count {
		let point_count = reader.read_varint()?;
		let mut part = Vec::with_capacity(point_count as usize);
		let mut prev = (0i32, 0i32);
		for _ in 0..point_count {
			let dx = reader.read_svarint()? as i32;
			let dy = reader.read_svarint()? as i32;
			let point = (prev.0 + dx, prev.1 + dy);
			part.push(point);
			prev = point;
		}
		parts.push(part);
	}
	Ok(parts)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrips_single_part() {
		let parts = vec![vec![(2048, 2048)]];
		let encoded = encode_parts(&parts).unwrap();
		assert_eq!(decode_parts(&encoded).unwrap(), parts);
	}

	#[test]
	fn roundtrips_multiple_parts_with_negative_deltas() {
		let parts = vec![
			vec![(0, 0), (4096, 0), (4096, 4096), (0, 4096), (0, 0)],
			vec![(100, 100), (50, 200), (-10, 50)],
		];
		let encoded = encode_parts(&parts).unwrap();
		assert_eq!(decode_parts(&encoded).unwrap(), parts);
	}

	#[test]
	fn empty_parts_roundtrip() {
		let parts: Vec<Part> = vec![];
		let encoded = encode_parts(&parts).unwrap();
		assert_eq!(decode_parts(&encoded).unwrap(), parts);
	}
}
