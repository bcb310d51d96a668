//! Core image trait extensions for TileKiln.
//!
//! This module aggregates several traits that extend [`image::DynamicImage`] with additional
//! functionality used throughout the TileKiln image pipeline:
//!
//! - [`DynamicImageTraitConvert`] — conversion between formats, raw buffers, and iteration over pixel bytes.
//! - [`DynamicImageTraitInfo`] — lightweight metadata, comparison, and introspection helpers.
//! - [`DynamicImageTraitOperation`] — higher‑level image manipulation (flattening, scaling, cropping, etc.).

mod convert;
mod info;
mod operation;

pub use convert::*;
pub use info::*;
pub use operation::*;
#[cfg(any(test, feature = "test"))]
pub use test::*;
