//! `ArchiveWriter` (§4.7): the push-based contract a concrete tile archive
//! format implements, plus three self-contained backends exercising it.
//!
//! This is a different shape than `tilekiln_container::TilesWriterTrait`
//! (pull-based: `write_to_writer(reader, writer, config)` drives itself from
//! a `TilesReaderTrait`). The pipeline pushes one already-encoded tile at a
//! time in strict archive order instead, so the contract here is its own
//! trait rather than a reuse of the container crate's.

use crate::sort_key::TileOrder;
use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::{rusqlite::params, SqliteConnectionManager};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tilekiln_core::json::{JsonObject, JsonValue};
use tilekiln_core::types::Blob;
use tilekiln_core::TileCoord;

/// Archive-level metadata an `ArchiveWriter` persists once at `finish`,
/// mirroring the fields `Profile` exposes (§6).
#[derive(Debug, Clone)]
pub struct ArchiveMetadata {
	pub name: String,
	pub description: String,
	pub attribution: String,
	pub version: String,
	pub is_overlay: bool,
	pub zoom: crate::config::ZoomRange,
	pub bounds: Option<[f64; 4]>,
}

/// Operations a concrete archive format must satisfy (§4.7). Not required to
/// be `Sync`: the pipeline guarantees a single writer thread ever touches an
/// implementor.
pub trait ArchiveWriter {
	fn order(&self) -> TileOrder;
	fn deduplicates(&self) -> bool;

	/// Called once before any `write_tile`.
	///
	/// # Errors
	/// Returns an error if the archive cannot be created (e.g. the output
	/// path is not writable).
	fn initialize(&mut self, metadata: &ArchiveMetadata) -> Result<()>;

	/// Writes one tile. `bytes` is `None` when the caller already knows
	/// `content_hash` names a payload this writer has stored before (§4.6) —
	/// implementors that do not `deduplicates()` never receive `None`.
	///
	/// # Errors
	/// Returns an error on any underlying I/O failure.
	fn write_tile(&mut self, coord: TileCoord, bytes: Option<Blob>, content_hash: Option<u64>) -> Result<()>;

	/// Closes and persists the archive, including whatever indexes the
	/// format needs built from the tiles already written.
	///
	/// # Errors
	/// Returns an error if persisting the final archive fails.
	fn finish(&mut self, metadata: &ArchiveMetadata) -> Result<()>;
}

/// SQLite-backed archive, grounded on
/// `tilekiln_container::container::mbtiles::MBTilesWriter`'s schema and its
/// use of a pooled, bundled-SQLite connection.
pub struct MbtilesArchiveWriter {
	pool: Pool<SqliteConnectionManager>,
	order: TileOrder,
}

impl MbtilesArchiveWriter {
	/// Creates (overwriting) an mbtiles file at `path`.
	///
	/// # Errors
	/// Returns an error if the file exists and cannot be removed, or the
	/// SQLite connection/schema cannot be created.
	pub fn create(path: &Path, order: TileOrder) -> Result<Self> {
		if path.exists() {
			fs::remove_file(path).with_context(|| format!("removing existing archive at {}", path.display()))?;
		}
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder().max_size(4).build(manager).context("opening mbtiles sqlite pool")?;
		pool.get()?.execute_batch(
			"CREATE TABLE metadata (name TEXT, value TEXT, UNIQUE (name));
			 CREATE TABLE map (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_id TEXT);
			 CREATE TABLE images (tile_id TEXT, tile_data BLOB);
			 CREATE UNIQUE INDEX map_index ON map (zoom_level, tile_column, tile_row);
			 CREATE UNIQUE INDEX images_index ON images (tile_id);
			 CREATE VIEW tiles AS
			   SELECT map.zoom_level AS zoom_level, map.tile_column AS tile_column, map.tile_row AS tile_row, images.tile_data AS tile_data
			   FROM map JOIN images ON map.tile_id = images.tile_id;",
		)?;
		Ok(Self { pool, order })
	}
}

impl ArchiveWriter for MbtilesArchiveWriter {
	fn order(&self) -> TileOrder {
		self.order
	}

	fn deduplicates(&self) -> bool {
		true
	}

	fn initialize(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
		Ok(())
	}

	fn write_tile(&mut self, coord: TileCoord, bytes: Option<Blob>, content_hash: Option<u64>) -> Result<()> {
		let hash = content_hash.context("MbtilesArchiveWriter requires a content hash for every tile")?;
		let tile_id = format!("{hash:016x}");
		let y_tms = (1u32 << u32::from(coord.level)) - 1 - coord.y;
		let conn = self.pool.get()?;
		if let Some(bytes) = bytes {
			conn.execute("INSERT OR IGNORE INTO images (tile_id, tile_data) VALUES (?1, ?2)", params![tile_id, bytes.as_slice()])?;
		}
		conn.execute(
			"INSERT INTO map (zoom_level, tile_column, tile_row, tile_id) VALUES (?1, ?2, ?3, ?4)",
			params![coord.level, coord.x, y_tms, tile_id],
		)?;
		Ok(())
	}

	fn finish(&mut self, metadata: &ArchiveMetadata) -> Result<()> {
		let conn = self.pool.get()?;
		let rows = [
			("name", metadata.name.clone()),
			("description", metadata.description.clone()),
			("attribution", metadata.attribution.clone()),
			("version", metadata.version.clone()),
			("type", if metadata.is_overlay { "overlay".to_string() } else { "baselayer".to_string() }),
			("format", "pbf".to_string()),
			("minzoom", metadata.zoom.min.to_string()),
			("maxzoom", metadata.zoom.max.to_string()),
		];
		for (name, value) in rows {
			conn.execute("INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)", params![name, value])?;
		}
		if let Some(bounds) = metadata.bounds {
			let value = bounds.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
			conn.execute("INSERT OR REPLACE INTO metadata (name, value) VALUES ('bounds', ?1)", params![value])?;
		}
		Ok(())
	}
}

/// Per-file archive writing `{z}/{x}/{y}.pbf` under a root directory,
/// grounded on `tilekiln_container`'s directory reader/writer pair.
pub struct DirectoryArchiveWriter {
	root: PathBuf,
	order: TileOrder,
}

impl DirectoryArchiveWriter {
	/// # Errors
	/// Returns an error if `root` cannot be created.
	pub fn create(root: PathBuf, order: TileOrder) -> Result<Self> {
		fs::create_dir_all(&root).with_context(|| format!("creating archive directory {}", root.display()))?;
		Ok(Self { root, order })
	}
}

impl ArchiveWriter for DirectoryArchiveWriter {
	fn order(&self) -> TileOrder {
		self.order
	}

	fn deduplicates(&self) -> bool {
		// A directory archive cannot express "two coordinates, one file"
		// without symlinks or hardlinks; simplest to always write bytes.
		false
	}

	fn initialize(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
		Ok(())
	}

	fn write_tile(&mut self, coord: TileCoord, bytes: Option<Blob>, _content_hash: Option<u64>) -> Result<()> {
		let bytes = bytes.context("DirectoryArchiveWriter does not deduplicate; bytes must always be present")?;
		let dir = self.root.join(coord.level.to_string()).join(coord.x.to_string());
		fs::create_dir_all(&dir).with_context(|| format!("creating tile directory {}", dir.display()))?;
		let path = dir.join(format!("{}.pbf", coord.y));
		fs::write(&path, bytes.as_slice()).with_context(|| format!("writing tile file {}", path.display()))?;
		Ok(())
	}

	fn finish(&mut self, metadata: &ArchiveMetadata) -> Result<()> {
		let mut object = JsonObject::new();
		object.set("name", metadata.name.clone());
		object.set("description", metadata.description.clone());
		object.set("attribution", metadata.attribution.clone());
		object.set("version", metadata.version.clone());
		object.set("minzoom", u32::from(metadata.zoom.min));
		object.set("maxzoom", u32::from(metadata.zoom.max));
		if let Some(bounds) = metadata.bounds {
			object.set("bounds", bounds.to_vec().into_iter().map(JsonValue::from).collect::<Vec<_>>());
		}
		let path = self.root.join("metadata.json");
		fs::write(&path, object.stringify()).with_context(|| format!("writing {}", path.display()))?;
		Ok(())
	}
}

/// Emits one newline-delimited JSON record per tile to a writer, with no
/// deduplication — the non-deduplicating path §8's property 6 exists to
/// contrast with.
pub struct StreamingArchiveWriter<W: Write> {
	sink: W,
	order: TileOrder,
}

impl<W: Write> StreamingArchiveWriter<W> {
	#[must_use]
	pub fn new(sink: W, order: TileOrder) -> Self {
		Self { sink, order }
	}
}

impl<W: Write> ArchiveWriter for StreamingArchiveWriter<W> {
	fn order(&self) -> TileOrder {
		self.order
	}

	fn deduplicates(&self) -> bool {
		false
	}

	fn initialize(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
		Ok(())
	}

	fn write_tile(&mut self, coord: TileCoord, bytes: Option<Blob>, content_hash: Option<u64>) -> Result<()> {
		let bytes = bytes.context("StreamingArchiveWriter does not deduplicate; bytes must always be present")?;
		let mut object = JsonObject::new();
		object.set("z", u32::from(coord.level));
		object.set("x", coord.x);
		object.set("y", coord.y);
		object.set("bytes", bytes.len());
		if let Some(hash) = content_hash {
			object.set("contentHash", format!("{hash:016x}"));
		}
		writeln!(self.sink, "{}", object.stringify()).context("writing streaming archive record")?;
		Ok(())
	}

	fn finish(&mut self, _metadata: &ArchiveMetadata) -> Result<()> {
		self.sink.flush().context("flushing streaming archive")?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ZoomRange;

	fn metadata() -> ArchiveMetadata {
		ArchiveMetadata {
			name: "test".into(),
			description: String::new(),
			attribution: String::new(),
			version: "1".into(),
			is_overlay: false,
			zoom: ZoomRange { min: 0, max: 2 },
			bounds: Some([-180.0, -85.0, 180.0, 85.0]),
		}
	}

	#[test]
	fn mbtiles_dedup_writes_one_image_row_for_repeated_hash() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.mbtiles");
		let mut writer = MbtilesArchiveWriter::create(&path, TileOrder::Tms).unwrap();
		writer.initialize(&metadata()).unwrap();
		let blob = Blob::from(vec![1u8, 2, 3]);
		writer.write_tile(TileCoord::new(0, 0, 0).unwrap(), Some(blob.clone()), Some(42)).unwrap();
		writer.write_tile(TileCoord::new(1, 0, 0).unwrap(), None, Some(42)).unwrap();
		writer.finish(&metadata()).unwrap();

		let conn = writer.pool.get().unwrap();
		let images: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0)).unwrap();
		let maps: i64 = conn.query_row("SELECT COUNT(*) FROM map", [], |row| row.get(0)).unwrap();
		assert_eq!(images, 1);
		assert_eq!(maps, 2);
	}

	#[test]
	fn directory_writer_creates_zxy_layout() {
		let dir = tempfile::tempdir().unwrap();
		let mut writer = DirectoryArchiveWriter::create(dir.path().to_path_buf(), TileOrder::Tms).unwrap();
		writer.initialize(&metadata()).unwrap();
		writer.write_tile(TileCoord::new(2, 1, 3).unwrap(), Some(Blob::from(vec![9u8])), None).unwrap();
		writer.finish(&metadata()).unwrap();
		assert!(dir.path().join("2").join("1").join("3.pbf").exists());
		assert!(dir.path().join("metadata.json").exists());
	}

	#[test]
	fn streaming_writer_emits_one_line_per_tile() {
		let mut buffer = Vec::new();
		{
			let mut writer = StreamingArchiveWriter::new(&mut buffer, TileOrder::Tms);
			writer.initialize(&metadata()).unwrap();
			writer.write_tile(TileCoord::new(0, 0, 0).unwrap(), Some(Blob::from(vec![0x0a, 0x02])), Some(7)).unwrap();
			writer.finish(&metadata()).unwrap();
		}
		let text = String::from_utf8(buffer).unwrap();
		assert_eq!(text.lines().count(), 1);
		assert!(text.contains("\"contentHash\""));
	}
}
