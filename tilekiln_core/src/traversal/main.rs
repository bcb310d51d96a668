use crate::{
	TileBBox, TileBBoxPyramid,
	traversal::{TraversalOrder, TraversalSize},
};
use anyhow::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
	order: TraversalOrder,
	size: TraversalSize,
}

impl Traversal {
	pub fn new(order: TraversalOrder, min_size: u32, max_size: u32) -> Result<Traversal> {
		Ok(Traversal {
			order,
			size: TraversalSize::new(min_size, max_size)?,
		})
	}

	pub fn new_any_size(min_size: u32, max_size: u32) -> Result<Traversal> {
		Ok(Traversal {
			order: TraversalOrder::AnyOrder,
			size: TraversalSize::new(min_size, max_size)?,
		})
	}

	pub const fn new_any() -> Self {
		const {
			Traversal {
				order: TraversalOrder::AnyOrder,
				size: TraversalSize::new_default(),
			}
		}
	}

	pub fn get_max_size(&self) -> Result<u32> {
		self.size.get_max_size()
	}

	pub fn order(&self) -> &TraversalOrder {
		&self.order
	}

	pub fn intersect(&mut self, other: &Traversal) -> Result<()> {
		self.size.intersect(&other.size)?;
		self.order.intersect(&other.order)
	}

	pub fn get_intersected(&self, other: &Traversal) -> Result<Traversal> {
		let mut result = self.clone();
		result.intersect(other)?;
		Ok(result)
	}

	pub fn traverse_pyramid(&self, pyramid: &TileBBoxPyramid) -> Result<Vec<TileBBox>> {
		let size = self.get_max_size()?;
		let mut bboxes: Vec<TileBBox> = pyramid.level_bbox.iter().flat_map(|b| b.iter_bbox_grid(size)).collect();
		bboxes = self.order.sort_bboxes(bboxes, size);
		Ok(bboxes)
	}
}

impl Default for Traversal {
	fn default() -> Self {
		Traversal::new_any()
	}
}
