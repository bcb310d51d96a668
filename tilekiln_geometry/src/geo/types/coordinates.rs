use std::fmt::{self, Debug};
use tilekiln_core::json::JsonValue;

/// A single `(x, y)` pair, in whatever coordinate space the caller is using
/// (geographic degrees, Web Mercator meters, or tile-local units).
///
/// Unlike the raw `[f64; 2]` aliases below (used for bulk geometry-command
/// buffers), `Coordinates` carries named accessors and the mercator/JSON
/// conversions that `PointGeometry` and `RingGeometry` build on.
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinates {
	x: f64,
	y: f64,
}

/// Spherical Mercator radius (WGS84 semi-major axis), matching `GeoBBox::to_mercator`.
const MERCATOR_RADIUS: f64 = 6_378_137.0;

impl Coordinates {
	#[must_use]
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	#[must_use]
	pub fn x(&self) -> f64 {
		self.x
	}

	#[must_use]
	pub fn y(&self) -> f64 {
		self.y
	}

	/// Renders this coordinate as a `[x, y]` JSON array, optionally rounded to `precision` decimals.
	#[must_use]
	pub fn to_json(&self, precision: Option<u8>) -> JsonValue {
		match precision {
			Some(p) => {
				let factor = 10f64.powi(i32::from(p));
				JsonValue::from([(self.x * factor).round() / factor, (self.y * factor).round() / factor])
			}
			None => JsonValue::from([self.x, self.y]),
		}
	}

	/// Projects this coordinate from WGS84 (EPSG:4326) degrees to Web Mercator (EPSG:3857) meters.
	#[must_use]
	pub fn to_mercator(&self) -> Self {
		let lon = self.x.clamp(-180.0, 180.0);
		let lat = self.y.clamp(-85.051_128_779_806_59, 85.051_128_779_806_59);
		let phi = lat.to_radians();
		Self {
			x: MERCATOR_RADIUS * lon.to_radians(),
			y: MERCATOR_RADIUS * ((std::f64::consts::FRAC_PI_4 + phi / 2.0).tan()).ln(),
		}
	}
}

impl Debug for Coordinates {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{:?}, {:?}]", self.x, self.y)
	}
}

impl<T: Convertible> From<[T; 2]> for Coordinates {
	fn from(value: [T; 2]) -> Self {
		let [x, y] = T::convert_coordinates0(value);
		Self { x, y }
	}
}

impl<T: Convertible> From<&[T; 2]> for Coordinates {
	fn from(value: &[T; 2]) -> Self {
		Self::from(*value)
	}
}

impl From<geo::Coord<f64>> for Coordinates {
	fn from(value: geo::Coord<f64>) -> Self {
		Self { x: value.x, y: value.y }
	}
}

pub type Coordinates0 = [f64; 2];

pub type Coordinates1 = Vec<Coordinates0>;

pub type Coordinates2 = Vec<Coordinates1>;

pub type Coordinates3 = Vec<Coordinates2>;

pub trait Convertible
where
	Self: Copy,
{
	fn convert_coordinates0(value: [Self; 2]) -> Coordinates0
	where
		Self: Sized;
	fn convert_coordinates1(value: Vec<[Self; 2]>) -> Coordinates1
	where
		Self: Sized;
	fn convert_coordinates2(value: Vec<Vec<[Self; 2]>>) -> Coordinates2
	where
		Self: Sized;
	fn convert_coordinates3(value: Vec<Vec<Vec<[Self; 2]>>>) -> Coordinates3
	where
		Self: Sized;
}

macro_rules! impl_from_array {
	($($t:ty),*) => {$(
		impl Convertible for $t {
			fn convert_coordinates0(value: [$t; 2]) -> Coordinates0 {
				[value[0] as f64, value[1] as f64]
			}
			fn convert_coordinates1(value: Vec<[$t; 2]>) -> Coordinates1 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates0))
			}
			fn convert_coordinates2(value: Vec<Vec<[$t; 2]>>) -> Coordinates2 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates1))
			}
			fn convert_coordinates3(value: Vec<Vec<Vec<[$t; 2]>>>) -> Coordinates3 {
				Vec::from_iter(value.into_iter().map(<$t>::convert_coordinates2))
			}
		}
	)*}
}
impl_from_array!(i8, u8, i16, u16, i32, u32, i64, u64, f32);

impl Convertible for f64 {
	fn convert_coordinates0(value: [f64; 2]) -> Coordinates0 {
		value
	}
	fn convert_coordinates1(value: Vec<[f64; 2]>) -> Coordinates1 {
		value
	}
	fn convert_coordinates2(value: Vec<Vec<[f64; 2]>>) -> Coordinates2 {
		value
	}
	fn convert_coordinates3(value: Vec<Vec<Vec<[f64; 2]>>>) -> Coordinates3 {
		value
	}
}
