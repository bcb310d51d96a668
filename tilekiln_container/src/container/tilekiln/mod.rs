//! `*.tilekiln` container
//!
//! see [specification](https://github.com/tilekiln-org/tilekiln-spec)
//!
//! This module provides functionality to read from and write to `*.tilekiln` container files.
//!
//! # Usage Example
//!
//! ```rust
//! use tilekiln_container::*;
//! use tilekiln_core::*;
//! use std::path::Path;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let path_mbtiles = std::env::current_dir()?.join("../testdata/berlin.mbtiles");
//!     let path_tilekiln = std::env::current_dir()?.join("../testdata/temp4.tilekiln");
//!
//!     // Create a mbtiles reader
//!     let mut reader = MBTilesReader::open_path(&path_mbtiles)?;
//!
//!     // Write the tiles to the .tilekiln file
//!     TileKilnWriter::write_to_path(
//!         &mut reader,
//!         &path_tilekiln,
//!         WriterConfig::default()
//!     ).await?;
//!
//!     println!("Tiles have been successfully written to {path_tilekiln:?}");
//!
//!     // Read the tiles back from the .tilekiln file
//!     let mut reader = TileKilnReader::open_path(&path_tilekiln).await?;
//!
//!     // Get tile data
//!     if let Some(tile) = reader.get_tile(&TileCoord::new(12, 2200, 1345)?).await? {
//!         println!("Tile data: {tile:?}");
//!     } else {
//!         println!("No tile data found");
//!     }
//!
//!     Ok(())
//! }
//! ```

mod types;

mod reader;
pub use reader::TileKilnReader;

mod writer;
pub use writer::TileKilnWriter;
