use crate::utils::mat3;
use core::f64;
use nalgebra::{Matrix2x3, Matrix3, Matrix3x4, Vector3};
use std::cmp;
use std::fmt;
use std::ops::MulAssign;

///Marks a halfedge slot that does not (yet) have a pair.
pub const K_UNPAIRED: i32 = -1;

///The next halfedge around the same triangle.
#[inline]
pub fn next_halfedge(mut current: i32) -> i32 {
	current += 1;
	if current % 3 == 0 {
		current -= 3;
	}
	current
}

pub fn normal_transform(transform: &Matrix3x4<f64>) -> Matrix3<f64> {
	mat3(transform)
		.transpose()
		.try_inverse()
		.unwrap_or_else(|| Matrix3::from_element(f64::NAN))
}

pub fn transform_normal(transform: &Matrix3<f64>, normal: Vector3<f64>) -> Vector3<f64> {
	let normal = (transform * normal).normalize();
	if normal.x.is_nan() {
		return Vector3::zeros();
	}
	normal
}

///By using the closest axis-aligned projection to the normal instead of a
///projection along the normal, we avoid introducing any rounding error.
#[inline]
pub fn get_axis_aligned_projection(normal: Vector3<f64>) -> Matrix2x3<f64> {
	let abs_normal = normal.abs();
	let (xyz_max, mut projection) = if abs_normal.z > abs_normal.x && abs_normal.z > abs_normal.y {
		(normal.z, Matrix2x3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0))
	} else if abs_normal.y > abs_normal.x {
		(normal.y, Matrix2x3::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0))
	} else {
		(normal.x, Matrix2x3::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0))
	};

	if xyz_max < 0.0 {
		projection.row_mut(0).mul_assign(-1.0);
	}
	projection
}

///The fundamental component of the halfedge data structure. Halfedge `h`
///lives in slot `h` of the halfedge array and belongs to triangle `h / 3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Halfedge {
	pub start_vert: i32,
	pub end_vert: i32,
	pub paired_halfedge: i32,
	pub face: i32,
}

impl Default for Halfedge {
	fn default() -> Self {
		Self {
			start_vert: -1,
			end_vert: -1,
			paired_halfedge: K_UNPAIRED,
			face: -1,
		}
	}
}

impl Halfedge {
	///Canonical orientation of the undirected edge.
	pub fn is_forward(&self) -> bool {
		self.start_vert < self.end_vert
	}

	///Lexicographic (start, end) sort key. Sorting halfedges by this key puts
	///duplicated directed edges next to each other.
	pub fn edge_key(&self) -> (i32, i32) {
		(self.start_vert, self.end_vert)
	}

	///Does `other` run along the same edge in the opposite direction?
	pub fn opposes(&self, other: &Halfedge) -> bool {
		self.start_vert == other.end_vert && self.end_vert == other.start_vert
	}
}

///Halfedges order by their directed edge, start vertex first, so a sorted
///slice groups every copy of a directed edge together. Ties fall back to the
///pair and face so the order agrees with equality.
impl Ord for Halfedge {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		self.edge_key()
			.cmp(&other.edge_key())
			.then(self.paired_halfedge.cmp(&other.paired_halfedge))
			.then(self.face.cmp(&other.face))
	}
}

impl PartialOrd for Halfedge {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for Halfedge {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"startVert = {}, endVert = {}, pairedHalfedge = {}, face = {}",
			self.start_vert, self.end_vert, self.paired_halfedge, self.face
		)
	}
}
