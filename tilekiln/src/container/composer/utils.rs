use crate::utils::geometry::{GeoProperties, GeoValue};
use anyhow::{Context, Result};
use std::{io::Read, path::Path};

/// Reads a CSV file from the given path and returns a vector of `GeoProperties`.
///
/// # Arguments
///
/// * `path` - A reference to the path of the CSV file.
///
/// # Returns
///
/// * `Result<Vec<GeoProperties>>` - A vector of `GeoProperties` or an error if the file could not be read.
pub fn read_csv_file(path: &Path) -> Result<Vec<GeoProperties>> {
	std::fs::File::open(path)
		.with_context(|| format!("Failed to open file at path: {:?}", path))
		.and_then(|file| parse_csv(&mut std::io::BufReader::new(file)))
}

/// Parses CSV data from a reader and returns a vector of `GeoProperties`.
///
/// # Arguments
///
/// * `reader` - A mutable reference to a reader that implements the `Read` trait.
///
/// # Returns
///
/// * `Result<Vec<GeoProperties>>` - A vector of `GeoProperties` or an error if the CSV data could not be parsed.
pub fn parse_csv(reader: &mut dyn Read) -> Result<Vec<GeoProperties>> {
	let mut data: Vec<GeoProperties> = Vec::new();

	let mut csv_reader = csv::Reader::from_reader(reader);
	let header: Vec<(usize, String)> = csv_reader
		.headers()
		.context("Failed to read CSV headers")?
		.iter()
		.map(|s| s.to_string())
		.enumerate()
		.collect();

	for record in csv_reader.records() {
		let record = record.context("Failed to read CSV record")?;
		let mut entry = GeoProperties::new();
		for (col_index, name) in header.iter() {
			entry.insert(
				name.to_string(),
				GeoValue::parse_str(
					record
						.get(*col_index)
						.with_context(|| format!("Failed to get value for column: {name}"))?,
				),
			);
		}
		data.push(entry);
	}

	Ok(data)
}
