//! This module provides functionality for reading data from in-memory blobs.
//!
//! # Overview
//!
//! The `DataReaderBlob` struct allows for reading data held entirely in memory as a `Vec<u8>`.
//! It implements the `DataReaderTrait` so in-memory data can be consumed through the same
//! interface as file- or network-backed readers.
//!
//! # Examples
//!
//! ```rust
//! use tilekiln_core::{io::{DataReaderBlob, DataReaderTrait}, Blob, ByteRange};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reader = DataReaderBlob::from(vec![1, 2, 3, 4, 5]);
//!     let range = ByteRange::new(1, 3);
//!     assert_eq!(reader.read_range(&range).await?.as_slice(), &[2, 3, 4]);
//!     Ok(())
//! }
//! ```

use super::{DataReaderTrait, DataWriterBlob};
use crate::{Blob, ByteRange};
use anyhow::{Result, ensure};
use async_trait::async_trait;

/// A reader backed by an in-memory byte buffer.
#[derive(Debug, Clone)]
pub struct DataReaderBlob {
	data: Vec<u8>,
}

impl From<Vec<u8>> for DataReaderBlob {
	fn from(data: Vec<u8>) -> Self {
		DataReaderBlob { data }
	}
}

impl From<DataWriterBlob> for DataReaderBlob {
	fn from(writer: DataWriterBlob) -> Self {
		DataReaderBlob {
			data: writer.into_blob().into_vec(),
		}
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderBlob {
	async fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		let start = range.offset as usize;
		let end = start + range.length as usize;
		ensure!(end <= self.data.len(), "range {range} outside of {} bytes", self.data.len());
		Ok(Blob::from(self.data[start..end].to_vec()))
	}

	async fn read_all(&self) -> Result<Blob> {
		Ok(Blob::from(self.data.clone()))
	}

	fn get_name(&self) -> &str {
		"DataReaderBlob"
	}
}
