use crate::geo::Coordinates1;

/// Signed shoelace area of a single ring. Positive for clockwise-wound rings.
pub fn area_ring(c: &Coordinates1) -> f64 {
	let mut sum = 0f64;
	let mut p2 = c.last().unwrap();
	for p1 in c.iter() {
		sum += (p2[0] - p1[0]) * (p1[1] + p2[1]);
		p2 = p1
	}
	sum
}
