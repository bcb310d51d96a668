//! Pretty-printing for [`super::JsonValue`], wrapping long arrays/objects onto
//! multiple lines once they would exceed a target width.

use super::JsonValue;

/// Renders `value` as JSON text, wrapping onto multiple lines once the
/// single-line form would exceed `width` columns.
///
/// `indent_level` is the starting indentation depth (in units of two spaces)
/// and `first_line_offset` accounts for a key/prefix already written on the
/// current line so the width check stays accurate for the first line.
#[must_use]
pub fn stringify_pretty_multi_line(value: &JsonValue, width: usize, indent_level: usize, first_line_offset: usize) -> String {
	let compact = value.stringify();
	if first_line_offset + compact.len() <= width {
		return compact;
	}
	render(value, width, indent_level)
}

fn indent(level: usize) -> String {
	"  ".repeat(level)
}

fn render(value: &JsonValue, width: usize, level: usize) -> String {
	match value {
		JsonValue::Array(items) if !items.is_empty() => {
			let inner = items
				.iter()
				.map(|v| format!("{}{}", indent(level + 1), stringify_pretty_multi_line(v, width, level + 1, 0)))
				.collect::<Vec<_>>()
				.join(",\n");
			format!("[\n{inner}\n{}]", indent(level))
		}
		JsonValue::Object(obj) if !obj.is_empty() => {
			let inner = obj
				.iter()
				.map(|(k, v)| {
					let prefix = format!("{}\"{k}\": ", indent(level + 1));
					format!("{prefix}{}", stringify_pretty_multi_line(v, width, level + 1, prefix.len()))
				})
				.collect::<Vec<_>>()
				.join(",\n");
			format!("{{\n{inner}\n{}}}", indent(level))
		}
		other => other.stringify(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::json::JsonObject;

	#[test]
	fn short_values_stay_single_line() {
		let v = JsonValue::from("hi");
		assert_eq!(stringify_pretty_multi_line(&v, 80, 0, 0), "\"hi\"");
	}

	#[test]
	fn long_arrays_wrap() {
		let items: Vec<JsonValue> = (0..20).map(JsonValue::from).collect();
		let v = JsonValue::Array(items);
		let out = stringify_pretty_multi_line(&v, 20, 0, 0);
		assert!(out.contains('\n'));
		assert!(out.starts_with("[\n"));
	}

	#[test]
	fn objects_wrap_with_quoted_keys() {
		let mut obj = JsonObject::new();
		obj.set("alpha", JsonValue::from("a long enough value to force wrapping"));
		obj.set("beta", JsonValue::from(2i64));
		let out = stringify_pretty_multi_line(&JsonValue::Object(obj), 20, 0, 0);
		assert!(out.contains("\"alpha\": "));
	}
}
