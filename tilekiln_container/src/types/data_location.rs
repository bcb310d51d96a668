//! `DataLocation` is a general abstraction representing the location of data,
//! supporting URLs, filesystem paths, and in-memory blobs.
//!
//! It is used to accept flexible inputs in CLI tools and server components and provides
//! convenience methods like `resolve`, `filename`, `name`, `extension`, and parsing helpers.
//!
//! The enum has three variants:
//! - `Url(reqwest::Url)` for absolute URLs (e.g., `https://example.org/file.txt`)
//! - `Path(std::path::PathBuf)` for absolute or relative filesystem paths (e.g., `/data/a.txt` or `./a/b`)
//! - `Blob(Blob)` for in-memory data blobs

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use std::{
	fmt::Debug,
	path::{Path, PathBuf},
};
use tilekiln_core::Blob;
use tilekiln_derive::context;

/// A flexible location of data used across I/O code.
///
/// # Examples
/// Creating from strings:
/// ```
/// use tilekiln_container::DataLocation;
/// let a = DataLocation::try_from("https://example.org/x.png").unwrap();
/// let b = DataLocation::try_from("./data/x.png").unwrap();
/// assert!(matches!(a, DataLocation::Url(_)));
/// assert!(matches!(b, DataLocation::Path(_)));
/// ```
/// Resolving against a base:
/// ```
/// # use tilekiln_container::DataLocation;
/// let base = DataLocation::try_from("/tiles/").unwrap();
/// let mut tgt = DataLocation::try_from("z/x/y.mvt").unwrap();
/// tgt.resolve(&base).unwrap();
/// assert_eq!(tgt.to_string().replace('\\', "/"), "/tiles/z/x/y.mvt");
/// ```
#[derive(Clone, PartialEq)]
pub enum DataLocation {
	/// An absolute URL with scheme.
	Url(Url),
	/// An absolute file path or a relative path/url.
	Path(PathBuf),
	/// In-memory blob data.
	Blob(Blob),
}

impl DataLocation {
	/// Borrow the underlying filesystem path.
	///
	/// Returns an error if this value is a URL or Blob.
	///
	/// Useful when the caller expects a path-only input and wants a clear error otherwise.
	#[context("Getting filesystem path from DataLocation {self:?}")]
	pub fn as_path(&self) -> Result<&Path> {
		match self {
			DataLocation::Path(path) => Ok(path.as_path()),
			_ => Err(anyhow!("{self:?} is not a Path")),
		}
	}

	/// Borrow the underlying URL.
	///
	/// Returns an error if this value is a Path or Blob.
	/// Useful when the caller expects a URL-only input and wants a clear error otherwise.
	#[context("Getting URL from DataLocation {self:?}")]
	pub fn as_url(&self) -> Result<&Url> {
		match self {
			DataLocation::Url(url) => Ok(url),
			_ => Err(anyhow!("{self:?} is not a Url")),
		}
	}

	/// Resolve this value against `base` in-place.
	///
	/// Rules:
	/// - If `self` is already a URL, it remains unchanged.
	/// - If `base` is a URL and `self` is a relative path, `self` becomes a URL via `base.join()`.
	/// - If both are paths, they are joined and normalized (handling `.` and `..`).
	///
	/// Returns an error only when URL joining fails or inputs are invalid.
	#[context("Resolving DataLocation {self:?} against base {base:?}")]
	pub fn resolve(&mut self, base: &DataLocation) -> Result<()> {
		use DataLocation as UP;
		match (base, &mut *self) {
			// Resolve a Path (relative) against a URL base -> turn into absolute URL
			(UP::Url(base_url), UP::Path(p)) => {
				let s = p.to_str().ok_or(anyhow!("Invalid Path (non-utf8)"))?;
				*self = UP::Url(base_url.join(s)?);
			}
			// Resolve a Path against a Path base -> join + normalize
			(UP::Path(base_p), UP::Path(p)) => {
				*p = normalize(&base_p.join(&*p));
			}
			// All other combinations leave `self` unchanged
			(_, _) => {}
		}
		Ok(())
	}

	/// Return the last path segment (e.g., `file.tar.gz`).
	///
	/// For URLs, the segment is derived from the URL path. For filesystem paths, it is the
	/// filename component. Errors if the source has no terminal segment.
	#[context("Getting filename from DataLocation {self:?}")]
	pub fn filename(&self) -> Result<String> {
		let filename = match self {
			DataLocation::Url(url) => url
				.path_segments()
				.ok_or(anyhow!("Invalid URL"))?
				.next_back()
				.ok_or(anyhow!("Invalid URL"))?,
			DataLocation::Path(path) => path
				.file_name()
				.ok_or(anyhow!("Invalid Path"))?
				.to_str()
				.ok_or(anyhow!("Invalid Path"))?,
			DataLocation::Blob(_) => bail!("Blob has no filename"),
		};
		Ok(filename.to_string())
	}

	/// Return the filename **without** its last extension.
	///
	/// `"/a/file.tar.gz" -> "file.tar"`, `"/a/README" -> "README"`.
	#[context("Getting name without extension from DataLocation {self:?}")]
	pub fn name(&self) -> Result<String> {
		let filename = self.filename()?;
		if let Some(pos) = filename.rfind('.') {
			Ok(filename[..pos].to_string())
		} else {
			Ok(filename)
		}
	}

	/// Return the filename's last extension (without the dot).
	///
	/// For files, this is the last suffix after a dot (e.g. `"/a/file.tar.gz" -> "gz"`).
	/// For directories (both URLs ending in `/` and filesystem directories), this returns `"directory"`.
	/// If no extension is present on a non-directory path, this returns an error.
	#[context("Getting extension from DataLocation {self:?}")]
	pub fn extension(&self) -> Result<String> {
		match self {
			DataLocation::Url(url) => {
				if url.path().ends_with('/') {
					return Ok(String::from("directory"));
				}
				let filename = self.filename()?;
				if let Some(pos) = filename.rfind('.') {
					Ok(filename[pos + 1..].to_string())
				} else {
					bail!("No extension found")
				}
			}
			DataLocation::Path(path) => {
				if path.is_dir() {
					Ok(String::from("directory"))
				} else if let Some(ext) = path.extension() {
					Ok(ext.to_string_lossy().to_string())
				} else {
					bail!("No extension found")
				}
			}
			DataLocation::Blob(_) => bail!("Blob has no extension"),
		}
	}

	/// Create a DataLocation representing the current working directory.
	pub fn cwd() -> Result<Self> {
		Ok(DataLocation::Path(std::env::current_dir()?))
	}

	/// Parse a DataLocation from a string, reading from `stdin` if input is `"-"`.
	pub fn parse_with_stdin<R: std::io::Read>(input: &str, mut stdin: R) -> Result<Self> {
		Ok(if input == "-" {
			let mut buffer = Vec::new();
			stdin.read_to_end(&mut buffer).context("Failed to read from stdin")?;
			DataLocation::Blob(Blob::from(buffer))
		} else if let Ok(url) = reqwest::Url::parse(input)
			&& url.has_host()
		{
			DataLocation::Url(url)
		} else {
			DataLocation::Path(PathBuf::from(input))
		})
	}

	/// Parse a DataLocation from a string.
	pub fn parse(input: &str) -> Result<Self> {
		Self::parse_with_stdin(input, std::io::stdin().lock())
	}
}

// Normalize a path by resolving `.` and `..`, preserving drive prefixes, and handling
// Windows UNC shares (`\\server\\share`). Relative parents (`..`) are preserved if there
// is nothing left to pop. Used by `resolve` for Path+Path cases.
fn normalize(path: &Path) -> PathBuf {
	use std::ffi::OsString;
	use std::path::Component::*;

	let mut prefix: Option<OsString> = None;
	let mut is_abs = false;
	let mut parts: Vec<OsString> = Vec::new();
	let mut leading_parents: usize = 0;

	#[cfg(windows)]
	let mut is_unc: bool = false;
	#[cfg(windows)]
	let mut unc_share_consumed: bool = false;

	for comp in path.components() {
		match comp {
			Prefix(p) => {
				prefix = Some(p.as_os_str().to_os_string());
				#[cfg(windows)]
				{
					use std::path::Prefix::*;
					is_unc = matches!(p.kind(), UNC(_, _) | VerbatimUNC(_, _));
				}
			}
			RootDir => {
				is_abs = true;
			}
			CurDir => {}
			ParentDir => {
				if !parts.is_empty() {
					#[cfg(windows)]
					{
						// Only protect the share for UNC paths.
						if !(is_abs && is_unc && unc_share_consumed && parts.len() == 1) {
							let _ = parts.pop();
						}
					}
					#[cfg(not(windows))]
					{
						let _ = parts.pop();
					}
				} else if !is_abs {
					leading_parents += 1;
				}
			}
			Normal(s) => {
				#[cfg(windows)]
				{
					// The first normal component after \\server\ (with RootDir) is the share.
					if is_abs && is_unc && !unc_share_consumed && parts.is_empty() {
						parts.push(s.to_os_string());
						unc_share_consumed = true;
					} else {
						parts.push(s.to_os_string());
					}
				}
				#[cfg(not(windows))]
				{
					parts.push(s.to_os_string());
				}
			}
		}
	}

	let mut out = PathBuf::new();
	if let Some(p) = prefix {
		out.push(p);
	}
	if is_abs {
		#[cfg(windows)]
		{
			out.push(Path::new("\\"));
		}
		#[cfg(not(windows))]
		{
			out.push(Path::new("/"));
		}
	} else {
		for _ in 0..leading_parents {
			out.push("..");
		}
	}
	for seg in parts {
		out.push(seg);
	}
	out
}

/// Display as a plain URL string for `Url`, as a path using `Path::display()` for `Path`,
/// and as `<blob len=N>` for in-memory `Blob` values.
impl std::fmt::Display for DataLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DataLocation::Url(url) => write!(f, "{url}"),
			DataLocation::Path(path) => write!(f, "{}", path.display()),
			DataLocation::Blob(blob) => write!(f, "<blob len={}>", blob.len()),
		}
	}
}

impl From<String> for DataLocation {
	fn from(s: String) -> Self {
		DataLocation::try_from(s.as_str()).unwrap()
	}
}

impl TryFrom<&str> for DataLocation {
	type Error = anyhow::Error;
	fn try_from(s: &str) -> Result<Self> {
		DataLocation::parse(s)
	}
}

impl From<&PathBuf> for DataLocation {
	fn from(p: &PathBuf) -> Self {
		DataLocation::Path(p.clone())
	}
}

impl From<PathBuf> for DataLocation {
	fn from(p: PathBuf) -> Self {
		DataLocation::Path(p)
	}
}

impl From<&Path> for DataLocation {
	fn from(p: &Path) -> Self {
		DataLocation::Path(p.to_path_buf())
	}
}

impl From<Url> for DataLocation {
	fn from(u: Url) -> Self {
		DataLocation::Url(u)
	}
}

impl From<&DataLocation> for DataLocation {
	fn from(u: &DataLocation) -> Self {
		u.clone()
	}
}

impl From<Blob> for DataLocation {
	fn from(b: Blob) -> Self {
		DataLocation::Blob(b)
	}
}

impl Debug for DataLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DataLocation::Url(url) => write!(f, "Url({})", url),
			DataLocation::Path(path) => write!(f, "Path({})", path.display()),
			DataLocation::Blob(blob) => write!(f, "Blob(len={})", blob.len()),
		}
	}
}
