use nalgebra::{Matrix3x4, Point3, Vector3};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///Axis-aligned 3D box, primarily for bounding.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB {
	pub min: Point3<f64>,
	pub max: Point3<f64>,
}

impl Default for AABB {
	///Default constructor is an infinite box that contains no finite point
	///(min = +inf, max = -inf). It is the identity element of union.
	fn default() -> Self {
		Self {
			min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
			max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
		}
	}
}

impl AABB {
	///Creates a box that contains the two given points.
	pub fn new(p1: Point3<f64>, p2: Point3<f64>) -> Self {
		Self {
			min: p1.inf(&p2),
			max: p1.sup(&p2),
		}
	}

	///Creates the smallest box containing all the given points.
	pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
		let mut out = Self::default();
		for p in points {
			out.union_point(*p);
		}
		out
	}

	///Returns the dimensions of the Box.
	pub fn size(&self) -> Vector3<f64> {
		self.max - self.min
	}

	///Returns the center point of the Box.
	pub fn center(&self) -> Point3<f64> {
		nalgebra::center(&self.min, &self.max)
	}

	///Returns the absolute-largest coordinate value of any contained
	///point.
	pub fn scale(&self) -> f64 {
		self.min.coords.abs().sup(&self.max.coords.abs()).max()
	}

	///Does this box contain (includes equal) the given box?
	pub fn contains(&self, other: &Self) -> bool {
		other.min.coords.iter().zip(self.min.coords.iter()).all(|(o, s)| o >= s)
			&& self.max.coords.iter().zip(other.max.coords.iter()).all(|(s, o)| s >= o)
	}

	///Does this box contain (includes on border) the given point?
	pub fn contains_point(&self, p: &Point3<f64>) -> bool {
		(0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
	}

	///True for the default box and anything else with min > max on some axis.
	pub fn is_empty(&self) -> bool {
		(0..3).any(|i| self.min[i] > self.max[i])
	}

	///Expand this box to include the given point.
	pub fn union_point(&mut self, p: Point3<f64>) {
		self.min = self.min.inf(&p);
		self.max = self.max.sup(&p);
	}

	///Expand this box to include the given box.
	pub fn union_aabb(&self, other: &Self) -> Self {
		Self {
			min: self.min.inf(&other.min),
			max: self.max.sup(&other.max),
		}
	}

	///Transform the given box by the given axis-aligned affine transform.
	///
	///Ensure the transform passed in is axis-aligned (rotations are all
	///multiples of 90 degrees), or else the resulting bounding box will no longer
	///bound properly.
	pub fn transform(&self, transform: &Matrix3x4<f64>) -> Self {
		if self.is_empty() {
			return Self::default();
		}
		let min_t = Point3::from(transform * self.min.coords.push(1.0));
		let max_t = Point3::from(transform * self.max.coords.push(1.0));
		Self::new(min_t, max_t)
	}

	///Does this box have finite bounds?
	pub fn is_finite(&self) -> bool {
		self.min.iter().all(|x| x.is_finite()) && self.max.iter().all(|x| x.is_finite())
	}
}

///Shift this box by the given vector.
impl Add<Vector3<f64>> for AABB {
	type Output = AABB;
	fn add(mut self, shift: Vector3<f64>) -> Self::Output {
		self += shift;
		self
	}
}

impl AddAssign<Vector3<f64>> for AABB {
	fn add_assign(&mut self, shift: Vector3<f64>) {
		self.min += shift;
		self.max += shift;
	}
}

///Scale this box by the given vector. A negative factor mirrors that axis, so
///its bounds are swapped to keep min <= max.
impl Mul<Vector3<f64>> for AABB {
	type Output = AABB;
	fn mul(mut self, scale: Vector3<f64>) -> Self::Output {
		self *= scale;
		self
	}
}

impl MulAssign<Vector3<f64>> for AABB {
	fn mul_assign(&mut self, scale: Vector3<f64>) {
		for i in 0..3 {
			let a = self.min[i] * scale[i];
			let b = self.max[i] * scale[i];
			if scale[i] < 0.0 {
				self.min[i] = b;
				self.max[i] = a;
			} else {
				self.min[i] = a;
				self.max[i] = b;
			}
		}
	}
}

impl fmt::Display for AABB {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"min: {}, {}, {}, max: {}, {}, {}",
			self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
		)
	}
}

pub trait AABBOverlap<T> {
	fn does_overlap(&self, other: &T) -> bool;
}

impl AABBOverlap<AABB> for AABB {
	///Does this box overlap the one given (including equality)?
	fn does_overlap(&self, other: &AABB) -> bool {
		self.min.x <= other.max.x
			&& self.min.y <= other.max.y
			&& self.min.z <= other.max.z
			&& self.max.x >= other.min.x
			&& self.max.y >= other.min.y
			&& self.max.z >= other.min.z
	}
}

impl AABBOverlap<Point3<f64>> for AABB {
	///Does the given point project within the XY extent of this box
	///(including equality)?
	fn does_overlap(&self, p: &Point3<f64>) -> bool {
		// projected in z
		p.x <= self.max.x && p.x >= self.min.x && p.y <= self.max.y && p.y >= self.min.y
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn unit_boxes() -> (AABB, AABB) {
		(
			AABB::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
			AABB::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0)),
		)
	}

	#[test]
	fn union_of_disjoint_boxes() {
		let (a, b) = unit_boxes();
		assert!(!a.does_overlap(&b));
		let u = a.union_aabb(&b);
		assert_eq!(u.min, Point3::new(0.0, 0.0, 0.0));
		assert_eq!(u.max, Point3::new(3.0, 3.0, 3.0));
		assert!(u.contains(&a));
		assert!(u.contains(&b));
		assert!(!a.contains(&u));
	}

	#[test]
	fn default_box_is_union_identity() {
		let (a, _) = unit_boxes();
		let empty = AABB::default();
		assert!(empty.is_empty());
		assert!(!empty.is_finite());
		assert_eq!(empty.union_aabb(&a), a);
		assert_eq!(a.union_aabb(&empty), a);
		assert!(!empty.contains_point(&Point3::origin()));
	}

	#[test]
	fn touching_boxes_overlap() {
		let a = AABB::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
		let b = AABB::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
		assert!(a.does_overlap(&b));
		assert!(b.does_overlap(&a));
	}

	#[test]
	fn point_overlap_ignores_z() {
		let (a, _) = unit_boxes();
		assert!(a.does_overlap(&Point3::new(0.5, 1.0, 100.0)));
		assert!(!a.does_overlap(&Point3::new(1.5, 0.5, 0.5)));
	}

	#[test]
	fn measures() {
		let b = AABB::new(Point3::new(-4.0, 1.0, 2.0), Point3::new(2.0, 3.0, 3.0));
		assert_eq!(b.size(), Vector3::new(6.0, 2.0, 1.0));
		assert_eq!(b.center(), Point3::new(-1.0, 2.0, 2.5));
		assert_eq!(b.scale(), 4.0);
		assert!(b.is_finite());

		let points = [Point3::new(2.0, 3.0, 2.0), Point3::new(-4.0, 1.0, 3.0)];
		assert_eq!(AABB::from_points(&points), b);
		assert!(AABB::from_points(std::iter::empty::<&Point3<f64>>()).is_empty());
	}

	#[test]
	fn union_point_grows_in_place() {
		let mut b = AABB::default();
		b.union_point(Point3::new(1.0, -1.0, 0.0));
		assert_eq!(b.min, b.max);
		b.union_point(Point3::new(-1.0, 2.0, 0.5));
		assert_eq!(b.min, Point3::new(-1.0, -1.0, 0.0));
		assert_eq!(b.max, Point3::new(1.0, 2.0, 0.5));
	}

	#[test]
	fn translate_and_scale() {
		let (a, _) = unit_boxes();
		let shifted = a + Vector3::new(1.0, 2.0, 3.0);
		assert_eq!(shifted.min, Point3::new(1.0, 2.0, 3.0));
		assert_eq!(shifted.max, Point3::new(2.0, 3.0, 4.0));

		let mirrored = a * Vector3::new(2.0, -1.0, 1.0);
		assert_eq!(mirrored.min, Point3::new(0.0, -1.0, 0.0));
		assert_eq!(mirrored.max, Point3::new(2.0, 0.0, 1.0));

		let mut empty = AABB::default();
		empty *= Vector3::new(-1.0, 2.0, 1.0);
		assert!(empty.is_empty());
	}

	#[test]
	fn transform_reorders_corners() {
		let (a, _) = unit_boxes();
		// 90 degree turn about z, then shift
		let m = Matrix3x4::new(
			0.0, -1.0, 0.0, 5.0, //
			1.0, 0.0, 0.0, 0.0, //
			0.0, 0.0, 1.0, 0.0,
		);
		let t = a.transform(&m);
		assert_relative_eq!(t.min, Point3::new(4.0, 0.0, 0.0));
		assert_relative_eq!(t.max, Point3::new(5.0, 1.0, 1.0));
		assert!(t.is_finite());
		assert!(AABB::default().transform(&m).is_empty());
	}

	#[test]
	fn display() {
		let (a, _) = unit_boxes();
		assert_eq!(a.to_string(), "min: 0, 0, 0, max: 1, 1, 1");
	}
}
