//! `RenderedFeature`: the compact, fixed-schema record that crosses the
//! spill boundary between [`crate::feature_renderer::FeatureRenderer`] and
//! [`crate::external_merge_sort::ExternalMergeSort`].

use crate::geometry_codec::{decode_parts, encode_parts, GeometryKind, Part};
use anyhow::Result;
use tilekiln_core::io::{ValueReader, ValueReaderBlob, ValueWriter, ValueWriterBlob};
use tilekiln_core::types::Blob;

/// One attribute value, keyed by an interned per-layer key id. Mirrors the
/// value kinds the vector-tile wire format itself supports.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
	String(String),
	Long(i64),
	Double(f64),
	Bool(bool),
}

const TAG_STRING: u8 = 0;
const TAG_LONG: u8 = 1;
const TAG_DOUBLE: u8 = 2;
const TAG_BOOL: u8 = 3;

/// Encodes `(keyId, valueType, value)` triples as a length-prefixed varint
/// sequence: `varint(count)`, then per entry `varint(keyId)`, `u8(tag)`,
/// value payload.
pub fn encode_attributes(attrs: &[(u32, AttributeValue)]) -> Result<Blob> {
	let mut writer = ValueWriterBlob::<byteorder::LittleEndian>::new_le();
	writer.write_varint(attrs.len() as u64)?;
	for (key_id, value) in attrs {
		writer.write_varint(u64::from(*key_id))?;
		match value {
			AttributeValue::String(s) => {
				writer.write_u8(TAG_STRING)?;
				writer.write_pbf_string(s)?;
			}
			AttributeValue::Long(n) => {
				writer.write_u8(TAG_LONG)?;
				writer.write_svarint(*n)?;
			}
			AttributeValue::Double(d) => {
				writer.write_u8(TAG_DOUBLE)?;
				writer.write_f64(*d)?;
			}
			AttributeValue::Bool(b) => {
				writer.write_u8(TAG_BOOL)?;
				writer.write_u8(u8::from(*b))?;
			}
		}
	}
	Ok(writer.into_blob())
}

/// Inverse of [`encode_attributes`].
pub fn decode_attributes(data: &Blob) -> Result<Vec<(u32, AttributeValue)>> {
	let mut reader = ValueReaderBlob::<byteorder::LittleEndian>::new_le(data.clone());
	let count = reader.read_varint()?;
	let mut attrs = Vec::with_capacity(count as usize);
	for _ in 0..count {
		let key_id = u32::try_from(reader.read_varint()?)?;
		let tag = reader.read_u8()?;
		let value = match tag {
			TAG_STRING => {
				let len = reader.read_varint()?;
				AttributeValue::String(reader.read_string(len)?)
			}
			TAG_LONG => AttributeValue::Long(reader.read_svarint()?),
			TAG_DOUBLE => AttributeValue::Double(reader.read_f64()?),
			TAG_BOOL => AttributeValue::Bool(reader.read_u8()? != 0),
			other => anyhow::bail!("unknown attribute value tag {other}"),
		};
		attrs.push((key_id, value));
	}
	Ok(attrs)
}

/// The spill record: a sort key plus enough to re-encode the feature into
/// the wire format without going back to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
	pub sort_key: u64,
	pub geometry_kind: GeometryKind,
	pub geometry: Vec<Part>,
	pub attributes: Vec<(u32, AttributeValue)>,
	pub id: Option<u64>,
	/// Set by the renderer when this feature's geometry is a polygon ring
	/// exactly coincident with the tile boundary; lets the encoder flag the
	/// tile as a fill candidate without re-inspecting geometry.
	pub contains_only_fill: bool,
}

impl RenderedFeature {
	/// Serializes this record to the spill wire format: `sortKey:u64`,
	/// `geometryKind:u8`, `containsOnlyFill:u8`, `id` (`0` then absent, or `1`
	/// then `u64`), geometry blob (pbf length-prefixed), attributes blob
	/// (pbf length-prefixed).
	pub fn encode(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<byteorder::LittleEndian>::new_le();
		writer.write_u64(self.sort_key)?;
		writer.write_u8(geometry_kind_tag(self.geometry_kind))?;
		writer.write_u8(u8::from(self.contains_only_fill))?;
		match self.id {
			None => writer.write_u8(0)?,
			Some(id) => {
				writer.write_u8(1)?;
				writer.write_u64(id)?;
			}
		}
		writer.write_pbf_blob(&encode_parts(&self.geometry)?)?;
		writer.write_pbf_blob(&encode_attributes(&self.attributes)?)?;
		Ok(writer.into_blob())
	}

	/// Inverse of [`RenderedFeature::encode`].
	pub fn decode(data: &Blob) -> Result<Self> {
		let mut reader = ValueReaderBlob::<byteorder::LittleEndian>::new_le(data.clone());
		let sort_key = reader.read_u64()?;
		let geometry_kind = geometry_kind_from_tag(reader.read_u8()?)?;
		let contains_only_fill = reader.read_u8()? != 0;
		let id = match reader.read_u8()? {
			0 => None,
			_ => Some(reader.read_u64()?),
		};
		let geometry_len = reader.read_varint()?;
		let geometry = decode_parts(&reader.read_blob(geometry_len)?)?;
		let attributes_len = reader.read_varint()?;
		let attributes = decode_attributes(&reader.read_blob(attributes_len)?)?;
		Ok(Self { sort_key, geometry_kind, geometry, attributes, id, contains_only_fill })
	}
}

fn geometry_kind_tag(kind: GeometryKind) -> u8 {
	match kind {
		GeometryKind::Point => 0,
		GeometryKind::Line => 1,
		GeometryKind::Polygon => 2,
		GeometryKind::MultiPoint => 3,
		GeometryKind::MultiLine => 4,
		GeometryKind::MultiPolygon => 5,
	}
}

fn geometry_kind_from_tag(tag: u8) -> Result<GeometryKind> {
	Ok(match tag {
		0 => GeometryKind::Point,
		1 => GeometryKind::Line,
		2 => GeometryKind::Polygon,
		3 => GeometryKind::MultiPoint,
		4 => GeometryKind::MultiLine,
		5 => GeometryKind::MultiPolygon,
		other => anyhow::bail!("unknown geometry kind tag {other}"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> RenderedFeature {
		RenderedFeature {
			sort_key: crate::sort_key::pack(7, 0, 10, 0),
			geometry_kind: GeometryKind::Point,
			geometry: vec![vec![(2048, 2048)]],
			attributes: vec![
				(0, AttributeValue::String("residential".into())),
				(1, AttributeValue::Long(-42)),
				(2, AttributeValue::Double(1.5)),
				(3, AttributeValue::Bool(true)),
			],
			id: Some(123),
			contains_only_fill: false,
		}
	}

	#[test]
	fn attributes_roundtrip() {
		let attrs = sample().attributes;
		let encoded = encode_attributes(&attrs).unwrap();
		assert_eq!(decode_attributes(&encoded).unwrap(), attrs);
	}

	#[test]
	fn rendered_feature_roundtrips() {
		let feature = sample();
		let encoded = feature.encode().unwrap();
		assert_eq!(RenderedFeature::decode(&encoded).unwrap(), feature);
	}

	#[test]
	fn rendered_feature_without_id_roundtrips() {
		let mut feature = sample();
		feature.id = None;
		feature.contains_only_fill = true;
		let encoded = feature.encode().unwrap();
		assert_eq!(RenderedFeature::decode(&encoded).unwrap(), feature);
	}
}
