//! This module provides the `ValueWriterFile` struct for writing values to a file.
//!
//! # Overview
//!
//! The `ValueWriterFile` struct allows for writing various data types to a file using
//! either little-endian or big-endian byte order. It implements the `ValueWriter` trait to provide
//! methods for writing integers, floating-point numbers, strings, and custom binary formats.
//! The module also provides methods for managing the write position within the file.
//!
//! # Examples
//!
//! ```rust
//! use tilekiln_core::io::{ValueWriter, ValueWriterFile};
//! use anyhow::Result;
//! use std::fs::File;
//!
//! fn main() -> Result<()> {
//!     let path = std::env::temp_dir().join("temp2.txt");
//!     let file = File::create(&path)?;
//!     let mut writer = ValueWriterFile::new_le(file);
//!
//!     // Writing a string
//!     writer.write_string("hello")?;
//!
//!     Ok(())
//! }
//! ```

#![allow(dead_code)]

use super::ValueWriter;
use anyhow::Result;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::marker::PhantomData;

/// A struct that provides writing capabilities to a file using a specified byte order.
pub struct ValueWriterFile<E: ByteOrder> {
	_phantom: PhantomData<E>,
	writer: BufWriter<File>,
}

impl<E: ByteOrder> ValueWriterFile<E> {
	/// Creates a new `ValueWriterFile` instance from a `File`.
	///
	/// # Arguments
	///
	/// * `file` - A `File` instance to write to.
	///
	/// # Returns
	///
	/// * A new `ValueWriterFile` instance.
	#[must_use]
	pub fn new(file: File) -> ValueWriterFile<E> {
		ValueWriterFile {
			_phantom: PhantomData,
			writer: BufWriter::new(file),
		}
	}
}

impl ValueWriterFile<LittleEndian> {
	/// Creates a new `ValueWriterFile` instance with little-endian byte order from a `File`.
	///
	/// # Arguments
	///
	/// * `file` - A `File` instance to write to.
	///
	/// # Returns
	///
	/// * A new `ValueWriterFile` instance with little-endian byte order.
	#[must_use]
	pub fn new_le(file: File) -> ValueWriterFile<LittleEndian> {
		ValueWriterFile::new(file)
	}
}

impl ValueWriterFile<BigEndian> {
	/// Creates a new `ValueWriterFile` instance with big-endian byte order from a `File`.
	///
	/// # Arguments
	///
	/// * `file` - A `File` instance to write to.
	///
	/// # Returns
	///
	/// * A new `ValueWriterFile` instance with big-endian byte order.
	#[must_use]
	pub fn new_be(file: File) -> ValueWriterFile<BigEndian> {
		ValueWriterFile::new(file)
	}
}

impl<E: ByteOrder> ValueWriter<E> for ValueWriterFile<E> {
	fn get_writer(&mut self) -> &mut dyn Write {
		&mut self.writer
	}

	fn position(&mut self) -> Result<u64> {
		Ok(self.writer.stream_position()?)
	}
}
