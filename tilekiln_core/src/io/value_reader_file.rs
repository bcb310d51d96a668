//! This module provides the `ValueReaderFile` struct for reading values from a file.
//!
//! # Overview
//!
//! The `ValueReaderFile` struct allows for reading various data types from a file using
//! either little-endian or big-endian byte order. It implements the `ValueReader` trait to
//! provide methods for reading integers, floating-point numbers, and other types of data
//! directly off disk without first loading the whole file into memory.
//!
//! # Examples
//!
//! ```rust
//! use tilekiln_core::io::{ValueReader, ValueReaderFile};
//! use anyhow::Result;
//! use std::fs::File;
//!
//! fn main() -> Result<()> {
//!     let path = std::env::temp_dir().join("temp3.txt");
//!     std::fs::write(&path, [0x01, 0x02, 0x03, 0x04])?;
//!     let file = File::open(&path)?;
//!     let mut reader = ValueReaderFile::new_le(file)?;
//!     assert_eq!(reader.read_u16()?, 0x0201);
//!     Ok(())
//! }
//! ```

#![allow(dead_code)]

use super::{SeekRead, ValueReader, ValueReaderBlob};
use anyhow::Result;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::{fs::File, io::BufReader, marker::PhantomData};

impl SeekRead for BufReader<File> {}

/// A struct that provides reading capabilities from a file using a specified byte order.
pub struct ValueReaderFile<E: ByteOrder> {
	_phantom: PhantomData<E>,
	reader: BufReader<File>,
	len: u64,
}

impl<E: ByteOrder> ValueReaderFile<E> {
	/// Creates a new `ValueReaderFile` instance from a `File`.
	///
	/// # Arguments
	///
	/// * `file` - A `File` instance to read from.
	///
	/// # Errors
	///
	/// Returns an error if the file's metadata cannot be read.
	pub fn new(file: File) -> Result<ValueReaderFile<E>> {
		let len = file.metadata()?.len();
		Ok(ValueReaderFile {
			_phantom: PhantomData,
			reader: BufReader::with_capacity(256 * 1024, file),
			len,
		})
	}
}

impl ValueReaderFile<LittleEndian> {
	/// Creates a new `ValueReaderFile` instance with little-endian byte order from a `File`.
	pub fn new_le(file: File) -> Result<ValueReaderFile<LittleEndian>> {
		ValueReaderFile::new(file)
	}
}

impl ValueReaderFile<BigEndian> {
	/// Creates a new `ValueReaderFile` instance with big-endian byte order from a `File`.
	pub fn new_be(file: File) -> Result<ValueReaderFile<BigEndian>> {
		ValueReaderFile::new(file)
	}
}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderFile<E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.reader
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		use std::io::Seek;
		self.reader.stream_position().unwrap_or(0)
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		use std::io::{Seek, SeekFrom};
		self.reader.seek(SeekFrom::Start(position))?;
		Ok(())
	}

	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let blob = self.read_blob(length)?;
		Ok(Box::new(ValueReaderBlob::<E>::new(blob)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::NamedTempFile;
	use std::{fs::File, io::Write};

	fn write_temp(data: &[u8]) -> NamedTempFile {
		let temp = NamedTempFile::new("temp_read.bin").unwrap();
		let mut f = File::create(temp.path()).unwrap();
		f.write_all(data).unwrap();
		temp
	}

	#[test]
	fn test_read_varint() -> Result<()> {
		let temp = write_temp(&[0b10101100, 0b00000010]);
		let mut reader = ValueReaderFile::new_le(File::open(temp.path())?)?;
		assert_eq!(reader.read_varint()?, 300);
		Ok(())
	}

	#[test]
	fn test_len_and_position() -> Result<()> {
		let temp = write_temp(&[1, 2, 3, 4, 5]);
		let mut reader = ValueReaderFile::new_le(File::open(temp.path())?)?;
		assert_eq!(reader.len(), 5);
		reader.set_position(2)?;
		assert_eq!(reader.read_u8()?, 3);
		Ok(())
	}

	#[test]
	fn test_get_sub_reader() -> Result<()> {
		let temp = write_temp(&[1, 2, 3, 4, 5]);
		let mut reader = ValueReaderFile::new_le(File::open(temp.path())?)?;
		reader.set_position(1)?;
		let mut sub = reader.get_sub_reader(3)?;
		assert_eq!(sub.read_u8()?, 2);
		assert_eq!(sub.read_u8()?, 3);
		assert_eq!(sub.read_u8()?, 4);
		Ok(())
	}
}
