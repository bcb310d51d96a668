//! This module defines the `DataWriterTrait` and associated types for writing data to various destinations.
//!
//! # Overview
//!
//! The `DataWriterTrait` trait provides an interface for writing data to different destinations.
//! Implementations of this trait can append data, overwrite the data from the start, and manage
//! the write position. This module also defines the `DataWriter` type alias for a boxed dynamic
//! implementation of the trait.
//!
//! # Examples
//!
//! ```rust
//! use tilekiln_core::{io::{DataWriterTrait, DataWriter}, Blob, ByteRange};
//! use anyhow::Result;
//!
//! struct MockDataWriter {
//!     data: Vec<u8>,
//! }
//!
//! impl DataWriterTrait for MockDataWriter {
//!     fn append(&mut self, blob: &Blob) -> Result<ByteRange> {
//!         let offset = self.data.len() as u64;
//!         self.data.extend_from_slice(blob.as_slice());
//!         Ok(ByteRange::new(offset, blob.len()))
//!     }
//!
//!     fn write_start(&mut self, blob: &Blob) -> Result<()> {
//!         self.data[..blob.len() as usize].copy_from_slice(blob.as_slice());
//!         Ok(())
//!     }
//!
//!     fn get_position(&mut self) -> Result<u64> {
//!         Ok(self.data.len() as u64)
//!     }
//!
//!     fn set_position(&mut self, _position: u64) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut writer: DataWriter = Box::new(MockDataWriter { data: Vec::new() });
//!     let range = writer.append(&Blob::from(vec![1, 2, 3]))?;
//!     assert_eq!(range.length, 3);
//!     Ok(())
//! }
//! ```

use crate::{Blob, ByteRange};
use anyhow::Result;

/// Type alias for a boxed dynamic implementation of the `DataWriterTrait`.
pub type DataWriter = Box<dyn DataWriterTrait>;

/// A trait for writing data to various destinations.
///
/// # Required Methods
/// - `append`: Appends data at the current write position, returning the range it occupies.
/// - `write_start`: Overwrites data at the very start of the destination, leaving the position unchanged.
/// - `get_position`: Returns the current write position.
/// - `set_position`: Moves the current write position.
pub trait DataWriterTrait: Send {
	/// Appends data at the current write position.
	///
	/// # Arguments
	///
	/// * `blob` - A reference to the `Blob` to append.
	///
	/// # Returns
	///
	/// * A Result containing a `ByteRange` indicating the position and length of the appended data, or an error.
	fn append(&mut self, blob: &Blob) -> Result<ByteRange>;

	/// Overwrites data at the start of the destination without moving the current position.
	///
	/// # Arguments
	///
	/// * `blob` - A reference to the `Blob` to write.
	///
	/// # Returns
	///
	/// * A Result indicating success or an error.
	fn write_start(&mut self, blob: &Blob) -> Result<()>;

	/// Returns the current write position.
	///
	/// # Returns
	///
	/// * A Result containing the current write position in bytes, or an error.
	fn get_position(&mut self) -> Result<u64>;

	/// Sets the current write position.
	///
	/// # Arguments
	///
	/// * `position` - The position to set, in bytes.
	///
	/// # Returns
	///
	/// * A Result indicating success or an error.
	fn set_position(&mut self, position: u64) -> Result<()>;
}
