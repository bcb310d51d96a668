//! Traits shared by the in-memory and on-disk cache backends.

use anyhow::Result;
use std::io::{Read, Write};

/// A key that can be used to address entries in a [`Cache`].
pub trait CacheKey {
	/// Borrow the key as the string used to address the cache entry.
	fn as_cache_key(&self) -> &str;

	/// Convert the key into the owned string used to address the cache entry.
	fn to_cache_key(&self) -> String {
		self.as_cache_key().to_string()
	}
}

impl CacheKey for String {
	fn as_cache_key(&self) -> &str {
		self.as_str()
	}
}

impl CacheKey for &str {
	fn as_cache_key(&self) -> &str {
		self
	}
}

/// A value that can be serialized into and read back from a cache entry.
pub trait CacheValue: Clone {
	/// Read one value from the front of `reader`.
	fn read_from_cache(reader: &mut dyn Read) -> Result<Self>
	where
		Self: Sized;

	/// Append this value's bytes to `writer`.
	fn write_to_cache(&self, writer: &mut dyn Write) -> Result<()>;
}

impl CacheValue for String {
	fn read_from_cache(reader: &mut dyn Read) -> Result<Self> {
		let mut len_buf = [0u8; 8];
		reader.read_exact(&mut len_buf)?;
		let len = u64::from_le_bytes(len_buf) as usize;
		let mut buf = vec![0u8; len];
		reader.read_exact(&mut buf)?;
		Ok(String::from_utf8(buf)?)
	}

	fn write_to_cache(&self, writer: &mut dyn Write) -> Result<()> {
		let bytes = self.as_bytes();
		writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
		writer.write_all(bytes)?;
		Ok(())
	}
}

impl CacheValue for Vec<u8> {
	fn read_from_cache(reader: &mut dyn Read) -> Result<Self> {
		let mut len_buf = [0u8; 8];
		reader.read_exact(&mut len_buf)?;
		let len = u64::from_le_bytes(len_buf) as usize;
		let mut buf = vec![0u8; len];
		reader.read_exact(&mut buf)?;
		Ok(buf)
	}

	fn write_to_cache(&self, writer: &mut dyn Write) -> Result<()> {
		writer.write_all(&(self.len() as u64).to_le_bytes())?;
		writer.write_all(self)?;
		Ok(())
	}
}

/// A store of `Vec<V>` entries addressed by `K`, shared by the memory and on-disk backends.
pub trait Cache<K, V>
where
	K: CacheKey,
	V: CacheValue,
{
	/// Returns `true` if an entry exists for `key`.
	fn contains_key(&self, key: &K) -> bool;

	/// Returns a clone of the entry for `key`, if present.
	fn get_clone(&self, key: &K) -> Result<Option<Vec<V>>>;

	/// Removes and returns the entry for `key`, if present.
	fn remove(&mut self, key: &K) -> Result<Option<Vec<V>>>;

	/// Replaces the entry for `key` with `values`.
	fn insert(&mut self, key: &K, values: Vec<V>) -> Result<()>;

	/// Appends `values` to the entry for `key`, creating it if missing.
	fn append(&mut self, key: &K, values: Vec<V>) -> Result<()>;

	/// Removes all entries, releasing any backing storage.
	fn clean_up(&mut self);
}
