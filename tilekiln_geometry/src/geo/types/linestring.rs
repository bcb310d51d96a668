use super::*;
use anyhow::{Result, ensure};
use std::fmt::Debug;
use tilekiln_core::json::JsonValue;

#[derive(Clone, PartialEq)]
pub struct LineStringGeometry(pub Coordinates1);

impl LineStringGeometry {
	pub fn new(c: Vec<[f64; 2]>) -> Self {
		Self(c)
	}
}

impl GeometryTrait for LineStringGeometry {
	fn area(&self) -> f64 {
		0.0
	}

	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 2, "LineString must have at least 2 points");
		Ok(())
	}

	fn to_coord_json(&self, precision: Option<u8>) -> JsonValue {
		JsonValue::from(
			self
				.0
				.iter()
				.map(|c| Coordinates::from(*c).to_json(precision))
				.collect::<Vec<_>>(),
		)
	}

	fn contains_point(&self, _x: f64, _y: f64) -> bool {
		false
	}

	fn to_mercator(&self) -> LineStringGeometry {
		LineStringGeometry(
			self
				.0
				.iter()
				.map(|c| {
					let m = Coordinates::from(*c).to_mercator();
					[m.x(), m.y()]
				})
				.collect(),
		)
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		if self.0.is_empty() {
			return None;
		}
		let mut x_min = f64::MAX;
		let mut y_min = f64::MAX;
		let mut x_max = f64::MIN;
		let mut y_max = f64::MIN;
		for [x, y] in &self.0 {
			x_min = x_min.min(*x);
			y_min = y_min.min(*y);
			x_max = x_max.max(*x);
			y_max = y_max.max(*y);
		}
		Some([x_min, y_min, x_max, y_max])
	}
}

impl SingleGeometryTrait<MultiLineStringGeometry> for LineStringGeometry {
	fn into_multi(self) -> MultiLineStringGeometry {
		MultiLineStringGeometry(vec![self.0])
	}
}

impl Debug for LineStringGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

impl<T: Convertible> From<Vec<[T; 2]>> for LineStringGeometry {
	fn from(value: Vec<[T; 2]>) -> Self {
		Self(T::convert_coordinates1(value))
	}
}
