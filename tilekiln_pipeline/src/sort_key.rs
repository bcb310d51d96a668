//! Packing of `(tile, layer, sort-order, feature-order)` into the 64-bit
//! comparable key that drives the external sort and, transitively, archive
//! write order.

use anyhow::{ensure, Result};
use tilekiln_core::{utils::HilbertIndex, TileCoord};

/// Highest zoom level this pipeline's 32-bit `TileId` packing supports.
///
/// At `z = 15` the cumulative tile count across all levels `<= 15` is
/// `(4^16 - 1) / 3 ≈ 1.43e9`, comfortably inside `u32::MAX`; one more level
/// would already overflow it.
pub const MAX_ZOOM: u8 = 15;

/// The two admissible total orderings over tiles an archive can commit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileOrder {
	/// Lexicographic `(z, x, y_flipped)` — rectangular, row/column-major
	/// archives (SQLite-backed, per-file directories).
	Tms,
	/// `z` first, then the Hilbert-curve index within the level — used when
	/// spatial locality of nearby tiles on disk matters (single-file
	/// indexed archives).
	Hilbert,
}

impl TileOrder {
	/// Packs `coord` into a dense 32-bit id, monotone under this ordering.
	///
	/// # Errors
	/// Returns an error if `coord.level > MAX_ZOOM`.
	pub fn tile_id(&self, coord: &TileCoord) -> Result<u32> {
		ensure!(
			coord.level <= MAX_ZOOM,
			"tile level {} exceeds the maximum supported zoom {MAX_ZOOM}",
			coord.level
		);
		let id = match self {
			TileOrder::Tms => tms_tile_id(coord),
			TileOrder::Hilbert => coord.get_hilbert_index()?,
		};
		Ok(u32::try_from(id).expect("tile id fits u32 for level <= MAX_ZOOM"))
	}

	/// Reconstructs the `(level, x, y)` tile addressed by `id` under this
	/// ordering. Inverse of [`TileOrder::tile_id`].
	///
	/// # Errors
	/// Returns an error if `id` does not correspond to a valid tile.
	pub fn tile_coord(&self, id: u32) -> Result<TileCoord> {
		match self {
			TileOrder::Tms => tms_tile_coord(u64::from(id)),
			TileOrder::Hilbert => TileCoord::from_hilbert_index(u64::from(id)),
		}
	}
}

/// Cumulative number of tiles at all zoom levels strictly below `level`.
fn levels_below(level: u8) -> u64 {
	let size = 1u64 << u32::from(level);
	(size * size - 1) / 3
}

fn tms_tile_id(coord: &TileCoord) -> u64 {
	let size = 1u64 << u32::from(coord.level);
	let y_flipped = (size - 1) - u64::from(coord.y);
	levels_below(coord.level) + size * u64::from(coord.x) + y_flipped
}

fn tms_tile_coord(id: u64) -> Result<TileCoord> {
	let mut level = 0u8;
	loop {
		ensure!(level <= MAX_ZOOM, "tile id {id} exceeds the maximum supported zoom {MAX_ZOOM}");
		let size = 1u64 << u32::from(level);
		let count = size * size;
		if levels_below(level) + count > id {
			let offset = id - levels_below(level);
			let x = offset / size;
			let y_flipped = offset % size;
			let y = (size - 1) - y_flipped;
			return TileCoord::new(level, u32::try_from(x)?, u32::try_from(y)?);
		}
		level += 1;
	}
}

/// Pack `(tile, layer, sort-order, feature-order)` into the 64-bit key that
/// sorting by `u64` comparison reproduces exactly: tiles in archive order,
/// within a tile layers in declared order, within a layer features ordered
/// by the profile's `sortOrder` (lower first), ties broken by emission order.
///
/// `[ tileId:32 | layerId:8 | sortOrder:16 | featureOrder:8 ]`
#[must_use]
pub fn pack(tile_id: u32, layer_id: u8, sort_order: u16, feature_order: u8) -> u64 {
	(u64::from(tile_id) << 32) | (u64::from(layer_id) << 24) | (u64::from(sort_order) << 8) | u64::from(feature_order)
}

/// Extracts the `tileId` (top 32 bits) from a packed sort key.
#[must_use]
pub fn tile_id(key: u64) -> u32 {
	(key >> 32) as u32
}

/// Extracts the `layerId` from a packed sort key.
#[must_use]
pub fn layer_id(key: u64) -> u8 {
	((key >> 24) & 0xFF) as u8
}

/// Extracts the `sortOrder` from a packed sort key.
#[must_use]
pub fn sort_order(key: u64) -> u16 {
	((key >> 8) & 0xFFFF) as u16
}

/// Extracts the `featureOrder` from a packed sort key.
#[must_use]
pub fn feature_order(key: u64) -> u8 {
	(key & 0xFF) as u8
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn pack_roundtrip() {
		let key = pack(0xDEAD_BEEF, 7, 1234, 9);
		assert_eq!(tile_id(key), 0xDEAD_BEEF);
		assert_eq!(layer_id(key), 7);
		assert_eq!(sort_order(key), 1234);
		assert_eq!(feature_order(key), 9);
	}

	#[test]
	fn pack_orders_tile_first() {
		let a = pack(1, 255, 0xFFFF, 255);
		let b = pack(2, 0, 0, 0);
		assert!(a < b);
	}

	#[test]
	fn pack_ties_preserve_feature_order() {
		let a = pack(5, 1, 10, 0);
		let b = pack(5, 1, 10, 1);
		assert!(a < b);
	}

	#[rstest]
	#[case(TileOrder::Tms)]
	#[case(TileOrder::Hilbert)]
	fn tile_id_roundtrip(#[case] order: TileOrder) {
		for level in 0..=6u8 {
			let n = 1u32 << u32::from(level);
			for x in 0..n {
				for y in 0..n {
					let coord = TileCoord::new(level, x, y).unwrap();
					let id = order.tile_id(&coord).unwrap();
					assert_eq!(order.tile_coord(id).unwrap(), coord);
				}
			}
		}
	}

	#[test]
	fn tms_order_is_x_major_then_y_flipped() {
		let a = TileCoord::new(3, 1, 5).unwrap();
		let b = TileCoord::new(3, 2, 0).unwrap();
		assert!(TileOrder::Tms.tile_id(&a).unwrap() < TileOrder::Tms.tile_id(&b).unwrap());
	}

	#[test]
	fn tile_id_rejects_excess_zoom() {
		let coord = TileCoord::new(MAX_ZOOM + 1, 0, 0).unwrap();
		assert!(TileOrder::Tms.tile_id(&coord).is_err());
		assert!(TileOrder::Hilbert.tile_id(&coord).is_err());
	}
}
