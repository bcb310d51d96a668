//! A small, dependency-free JSON value type used for metadata documents
//! (TileJSON, data-source descriptors) that don't warrant pulling in `serde_json`.
//!
//! Parsing is built on the [`crate::byte_iterator`] primitives already used
//! elsewhere in this crate for header/config parsing.

use crate::byte_iterator::{
	ByteIterator, parse_array_entries, parse_number_as_string, parse_object_entries, parse_quoted_json_string, parse_tag,
};
use anyhow::{Result, bail};
use std::io::Cursor;

mod pretty;
pub use pretty::stringify_pretty_multi_line;

/// A JSON value: one of the six JSON types.
///
/// Object keys preserve insertion order (via [`JsonObject`]) so that
/// round-tripped metadata documents stay stable and diff-friendly.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Null,
	Boolean(bool),
	Number(f64),
	String(String),
	Array(Vec<JsonValue>),
	Object(JsonObject),
}

impl JsonValue {
	/// Parses a single JSON value from a string.
	///
	/// # Errors
	/// Returns an error if `text` is not valid JSON.
	pub fn parse_str(text: &str) -> Result<JsonValue> {
		let mut iter = ByteIterator::from_reader(Cursor::new(text.as_bytes().to_vec()), true);
		iter.skip_whitespace();
		let value = Self::parse(&mut iter)?;
		iter.skip_whitespace();
		Ok(value)
	}

	fn parse(iter: &mut ByteIterator) -> Result<JsonValue> {
		iter.skip_whitespace();
		match iter.expect_peeked_byte()? {
			b'"' => Ok(JsonValue::String(parse_quoted_json_string(iter)?)),
			b'{' => Ok(JsonValue::Object(JsonObject::parse(iter)?)),
			b'[' => Ok(JsonValue::Array(parse_array_entries(iter, JsonValue::parse)?)),
			b't' => {
				parse_tag(iter, "true")?;
				Ok(JsonValue::Boolean(true))
			}
			b'f' => {
				parse_tag(iter, "false")?;
				Ok(JsonValue::Boolean(false))
			}
			b'n' => {
				parse_tag(iter, "null")?;
				Ok(JsonValue::Null)
			}
			b'-' | b'0'..=b'9' => Ok(JsonValue::Number(parse_number_as_string(iter)?.parse()?)),
			_ => bail!(iter.format_error("expected a JSON value")),
		}
	}

	/// Returns this value as an owned [`String`] if it is `JsonValue::String`.
	///
	/// # Errors
	/// Returns an error if this value is not a string.
	pub fn to_string(&self) -> Result<String> {
		match self {
			JsonValue::String(s) => Ok(s.clone()),
			other => bail!("expected a JSON string, found {other:?}"),
		}
	}

	/// Consumes this value and returns the inner [`JsonObject`] if it is `JsonValue::Object`.
	///
	/// # Errors
	/// Returns an error if this value is not an object.
	pub fn into_object(self) -> Result<JsonObject> {
		match self {
			JsonValue::Object(o) => Ok(o),
			other => bail!("expected a JSON object, found {other:?}"),
		}
	}

	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			JsonValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			JsonValue::String(s) => Some(s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_array(&self) -> Option<&[JsonValue]> {
		match self {
			JsonValue::Array(a) => Some(a),
			_ => None,
		}
	}

	/// Serializes this value to compact (single-line) JSON text.
	#[must_use]
	pub fn stringify(&self) -> String {
		match self {
			JsonValue::Null => "null".to_string(),
			JsonValue::Boolean(b) => b.to_string(),
			JsonValue::Number(n) => format_number(*n),
			JsonValue::String(s) => quote(s),
			JsonValue::Array(items) => format!("[{}]", items.iter().map(JsonValue::stringify).collect::<Vec<_>>().join(",")),
			JsonValue::Object(o) => o.stringify(),
		}
	}
}

fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.abs() < 1e15 {
		format!("{n:.0}")
	} else {
		format!("{n}")
	}
}

fn quote(s: &str) -> String {
	let mut out = String::with_capacity(s.len() + 2);
	out.push('"');
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
			c => out.push(c),
		}
	}
	out.push('"');
	out
}

macro_rules! impl_from {
	($ty:ty, $variant:ident, $conv:expr) => {
		impl From<$ty> for JsonValue {
			fn from(value: $ty) -> Self {
				JsonValue::$variant($conv(value))
			}
		}
	};
}

impl_from!(bool, Boolean, |v| v);
impl_from!(f64, Number, |v| v);
impl_from!(f32, Number, |v: f32| f64::from(v));
impl_from!(i64, Number, |v: i64| v as f64);
impl_from!(i32, Number, |v: i32| f64::from(v));
impl_from!(u64, Number, |v: u64| v as f64);
impl_from!(u32, Number, |v: u32| f64::from(v));
impl_from!(usize, Number, |v: usize| v as f64);
impl_from!(String, String, |v| v);
impl_from!(Vec<JsonValue>, Array, |v| v);
impl_from!(JsonObject, Object, |v| v);

impl From<&str> for JsonValue {
	fn from(value: &str) -> Self {
		JsonValue::String(value.to_string())
	}
}

impl From<[f64; 2]> for JsonValue {
	fn from(value: [f64; 2]) -> Self {
		JsonValue::Array(vec![JsonValue::from(value[0]), JsonValue::from(value[1])])
	}
}

impl<T> From<Option<T>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(value: Option<T>) -> Self {
		match value {
			Some(v) => JsonValue::from(v),
			None => JsonValue::Null,
		}
	}
}

/// An ordered collection of JSON key/value pairs.
///
/// Keys are unique; setting an existing key replaces its value in place so
/// iteration order stays stable across repeated `set` calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonObject {
	entries: Vec<(String, JsonValue)>,
}

impl JsonObject {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a JSON object from a string.
	///
	/// # Errors
	/// Returns an error if `text` is not a valid JSON object.
	pub fn parse_str(text: &str) -> Result<JsonObject> {
		let mut iter = ByteIterator::from_reader(Cursor::new(text.as_bytes().to_vec()), true);
		Self::parse(&mut iter)
	}

	fn parse(iter: &mut ByteIterator) -> Result<JsonObject> {
		let mut object = JsonObject::new();
		parse_object_entries(iter, |key, iter| {
			let value = JsonValue::parse(iter)?;
			object.set(key, value);
			Ok(())
		})?;
		Ok(object)
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
		let key = key.into();
		let value = value.into();
		if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
			entry.1 = value;
		} else {
			self.entries.push((key, value));
		}
	}

	pub fn remove(&mut self, key: &str) {
		self.entries.retain(|(k, _)| k != key);
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Merges `other` into `self`, with `other`'s values winning on key collisions.
	pub fn merge(&mut self, other: &JsonObject) {
		for (key, value) in &other.entries {
			self.set(key.clone(), value.clone());
		}
	}

	#[must_use]
	pub fn stringify(&self) -> String {
		let body = self
			.entries
			.iter()
			.map(|(k, v)| format!("{}:{}", quote(k), v.stringify()))
			.collect::<Vec<_>>()
			.join(",");
		format!("{{{body}}}")
	}
}

impl FromIterator<(String, JsonValue)> for JsonObject {
	fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
		let mut obj = JsonObject::new();
		for (k, v) in iter {
			obj.set(k, v);
		}
		obj
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_scalars() {
		assert_eq!(JsonValue::parse_str("null").unwrap(), JsonValue::Null);
		assert_eq!(JsonValue::parse_str("true").unwrap(), JsonValue::Boolean(true));
		assert_eq!(JsonValue::parse_str("-12.5").unwrap(), JsonValue::Number(-12.5));
		assert_eq!(JsonValue::parse_str("\"hi\"").unwrap(), JsonValue::String("hi".into()));
	}

	#[test]
	fn parses_object_and_array() {
		let v = JsonValue::parse_str(r#"{"a":1,"b":[1,2,3],"c":"x"}"#).unwrap();
		let obj = v.into_object().unwrap();
		assert_eq!(obj.get("a"), Some(&JsonValue::Number(1.0)));
		assert_eq!(obj.get("b").unwrap().as_array().unwrap().len(), 3);
		assert_eq!(obj.get("c").unwrap().to_string().unwrap(), "x");
	}

	#[test]
	fn stringify_roundtrip() {
		let mut obj = JsonObject::new();
		obj.set("name", JsonValue::from("berlin"));
		obj.set("zoom", JsonValue::from(5i64));
		let text = obj.stringify();
		let reparsed = JsonValue::parse_str(&text).unwrap().into_object().unwrap();
		assert_eq!(reparsed, obj);
	}

	#[test]
	fn merge_overwrites_existing_keys() {
		let mut a = JsonObject::new();
		a.set("x", JsonValue::from(1i64));
		let mut b = JsonObject::new();
		b.set("x", JsonValue::from(2i64));
		b.set("y", JsonValue::from(3i64));
		a.merge(&b);
		assert_eq!(a.get("x"), Some(&JsonValue::Number(2.0)));
		assert_eq!(a.get("y"), Some(&JsonValue::Number(3.0)));
	}
}
