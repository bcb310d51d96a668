//! Module `getter` provides functionalities to read and write tile containers from various sources such as local files, directories, and URLs.
//!
//! # Example Usage
//!
//! ```rust
//! use tilekiln::container::{get_reader, TilesReader, write_to_filename};
//! use tilekiln::types::TileFormat;
//! use std::path::Path;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Define the input filename (local file or URL)
//!     let input_filename = "../testdata/berlin.pmtiles";
//!     let mut reader = get_reader(input_filename).await?;
//!
//!     // Define the output filename
//!     let output_filename = "../testdata/temp3.tilekiln";
//!
//!     // Write the tiles to the output file
//!     write_to_filename(&mut *reader, output_filename).await?;
//!
//!     println!("Tiles have been successfully converted and saved to {output_filename}");
//!     Ok(())
//! }
//! ```

use crate::{
	container::{
		DirectoryTilesReader, DirectoryTilesWriter, MBTilesReader, MBTilesWriter, PMTilesReader,
		PMTilesWriter, TarTilesReader, TarTilesWriter, TileComposerReader, TilesReader, TilesWriter,
		TileKilnReader, TileKilnWriter,
	},
	io::{DataReader, DataReaderHttp},
};
use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::env;

/// Get a reader for a given filename or URL.
pub async fn get_reader(filename: &str) -> Result<Box<dyn TilesReader>> {
	let extension = get_extension(filename);

	if let Ok(reader) = parse_as_url(filename) {
		match extension {
			"pmtiles" => return Ok(PMTilesReader::open_reader(reader).await?.boxed()),
			"tilekiln" => return Ok(TileKilnReader::open_reader(reader).await?.boxed()),
			_ => bail!("Error when reading: file extension '{extension:?}' unknown"),
		}
	}

	let path = env::current_dir()?.join(filename);

	if !path.exists() {
		bail!("path '{path:?}' does not exist")
	}

	if path.is_dir() {
		return Ok(DirectoryTilesReader::open_path(&path)
			.with_context(|| format!("Failed opening {path:?} as directory"))?
			.boxed());
	}

	match extension {
		"mbtiles" => Ok(MBTilesReader::open_path(&path)?.boxed()),
		"pmtiles" => Ok(PMTilesReader::open_path(&path).await?.boxed()),
		"tar" => Ok(TarTilesReader::open_path(&path)?.boxed()),
		"tilekiln" => Ok(TileKilnReader::open_path(&path).await?.boxed()),
		"yaml" => Ok(TileComposerReader::open_path(&path).await?.boxed()),
		_ => bail!("Error when reading: file extension '{extension:?}' unknown"),
	}
}

/// Parse a filename as a URL and return a DataReader if successful.
fn parse_as_url(filename: &str) -> Result<DataReader> {
	if filename.starts_with("http://") || filename.starts_with("https://") {
		Ok(DataReaderHttp::from_url(Url::parse(filename)?)?)
	} else {
		bail!("not an url")
	}
}

/// Write tiles from a reader to a file.
pub async fn write_to_filename(reader: &mut dyn TilesReader, filename: &str) -> Result<()> {
	let path = env::current_dir()?.join(filename);

	if path.is_dir() {
		return DirectoryTilesWriter::write_to_path(reader, &path).await;
	}

	let extension = get_extension(filename);
	match extension {
		"mbtiles" => MBTilesWriter::write_to_path(reader, &path).await,
		"pmtiles" => PMTilesWriter::write_to_path(reader, &path).await,
		"tar" => TarTilesWriter::write_to_path(reader, &path).await,
		"tilekiln" => TileKilnWriter::write_to_path(reader, &path).await,
		_ => bail!("Error when writing: file extension '{extension:?}' unknown"),
	}
}

/// Get the file extension from a filename.
fn get_extension(filename: &str) -> &str {
	filename
		.split('?')
		.next()
		.map(|filename| filename.rsplit('.').next().unwrap_or(""))
		.unwrap_or("")
}
