use nalgebra::{Matrix3, Matrix3x4, Point2, Rotation3, Unit, Vector3};
use std::f64::consts::PI;

///A reasonable relative tolerance for [`ccw`] when the caller has nothing
///better. Predicates never read it implicitly; it must be passed in.
pub const K_TOLERANCE: f64 = 1e-5;

macro_rules! next3 {
	($i:expr) => {
		match $i {
			0 => 1,
			1 => 2,
			2 => 0,
			_ => panic!("Invalid triangle index"),
		}
	};
}

macro_rules! prev3 {
	($i:expr) => {
		match $i {
			0 => 2,
			1 => 0,
			2 => 1,
			_ => panic!("Invalid triangle index"),
		}
	};
}

#[inline]
pub const fn next3_usize(i: usize) -> usize {
	next3!(i)
}

#[inline]
pub const fn prev3_usize(i: usize) -> usize {
	prev3!(i)
}

///Returns -1, 0 or 1; zero only for an exact zero.
#[inline]
pub fn signum(val: f64) -> i32 {
	(val > 0.0) as i32 - (val < 0.0) as i32
}

///Determines if the three points are wound counter-clockwise, clockwise, or
///colinear within the specified tolerance.
///
///The tolerance is a distance from the line through the longer of the two
///edges leaving p0, so it should be chosen relative to the magnitude of the
///coordinates (e.g. [`K_TOLERANCE`] times the bounding box scale).
///
///@param p0 First point
///@param p1 Second point
///@param p2 Third point
///@param tol Tolerance value for colinearity
///@return int, like Signum, this returns 1 for CCW, -1 for CW, and 0 if within
///tol of colinear. The boundary itself counts as colinear.
#[inline]
pub fn ccw(p0: Point2<f64>, p1: Point2<f64>, p2: Point2<f64>, tol: f64) -> i32 {
	let v1 = p1 - p0;
	let v2 = p2 - p0;
	let area = v1.x * v2.y - v1.y * v2.x;
	let base2 = v1.magnitude_squared().max(v2.magnitude_squared());
	if area * area <= base2 * tol * tol {
		0
	} else if area > 0.0 {
		1
	} else {
		-1
	}
}

///Sine of an angle in degrees. Multiples of 90 degrees come out exact.
pub fn sind(x: f64) -> f64 {
	if !x.is_finite() {
		return x.sin();
	}
	if x < 0.0 {
		return -sind(-x);
	}
	// exact, so the quadrant survives arbitrarily large angles
	let x = x % 360.0;
	let quo = (x / 90.0).round();
	let rem = (x - quo * 90.0).to_radians();
	match (quo as i64).rem_euclid(4) {
		0 => rem.sin(),
		1 => rem.cos(),
		2 => -rem.sin(),
		_ => -rem.cos(),
	}
}

///Cosine of an angle in degrees. Multiples of 90 degrees come out exact.
#[inline]
pub fn cosd(x: f64) -> f64 {
	sind(x % 360.0 + 90.0)
}

///Transform to point the given vector up (0, 0, 1), turning along the shortest
///arc. The input need not be normalized but must not be zero-length.
pub fn rotate_up(up: Vector3<f64>) -> Matrix3x4<f64> {
	let up = up.normalize();
	let z = Vector3::z();
	let axis = up.cross(&z);
	let mut angle = axis.norm().min(1.0).asin();
	if up.dot(&z) < 0.0 {
		angle = PI - angle;
	}

	let rotation = match Unit::try_new(axis, 0.0) {
		Some(axis) => Rotation3::from_axis_angle(&axis, angle),
		// already parallel to z: either nothing to do or a half turn
		None if up.z > 0.0 => Rotation3::identity(),
		None => Rotation3::from_axis_angle(&Vector3::x_axis(), PI),
	};
	let mut result = Matrix3x4::zeros();
	result.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
	result
}

#[inline]
pub fn mat3(a: &Matrix3x4<f64>) -> Matrix3<f64> {
	a.fixed_columns::<3>(0).into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn signum_is_three_way() {
		assert_eq!(signum(2.5), 1);
		assert_eq!(signum(-1e-300), -1);
		assert_eq!(signum(0.0), 0);
		assert_eq!(signum(-0.0), 0);
	}

	#[test]
	fn ccw_boundary_scenarios() {
		let o = Point2::new(0.0, 0.0);
		assert_eq!(ccw(o, Point2::new(1.0, 0.0), Point2::new(0.0, 1.0), 1e-5), 1);
		assert_eq!(ccw(o, Point2::new(0.0, 1.0), Point2::new(1.0, 0.0), 1e-5), -1);
		assert_eq!(ccw(o, Point2::new(1.0, 0.0), Point2::new(2.0, 0.0), 1e-5), 0);
	}

	#[test]
	fn ccw_tolerance_is_relative() {
		// slightly off the line, by less than tol relative to the edge length
		for scale in [1e-6, 1.0, 1e6] {
			let p0 = Point2::new(0.0, 0.0) * scale;
			let p1 = Point2::new(1.0, 0.0) * scale;
			let p2 = Point2::new(2.0, 1e-6) * scale;
			assert_eq!(ccw(p0, p1, p2, 1e-5 * scale), 0);
			assert_eq!(ccw(p0, p1, p2, 1e-7 * scale), 1);
		}
	}

	#[test]
	fn ccw_exact_boundary_is_colinear() {
		// area = 1, base2 = 4, so tol = 0.5 lands exactly on the boundary
		let p0 = Point2::new(0.0, 0.0);
		let p1 = Point2::new(2.0, 0.0);
		let p2 = Point2::new(0.0, 0.5);
		assert_eq!(ccw(p0, p1, p2, 0.5), 0);
		assert_eq!(ccw(p0, p1, p2, 0.49), 1);
	}

	#[test]
	fn degree_trig_is_exact_on_right_angles() {
		for k in -8..=8 {
			let deg = 90.0 * k as f64;
			let s = sind(deg);
			let c = cosd(deg);
			assert!([-1.0, 0.0, 1.0].contains(&s), "sind({deg}) = {s}");
			assert!([-1.0, 0.0, 1.0].contains(&c), "cosd({deg}) = {c}");
		}
		assert_eq!(sind(90.0), 1.0);
		assert_eq!(sind(270.0), -1.0);
		assert_eq!(cosd(180.0), -1.0);
		assert_eq!(cosd(-90.0), 0.0);
		assert_relative_eq!(sind(30.0), 0.5, epsilon = 1e-15);
		assert_relative_eq!(cosd(60.0), 0.5, epsilon = 1e-15);
		assert_relative_eq!(sind(-135.0), -(0.5f64.sqrt()), epsilon = 1e-15);
		assert!(sind(f64::NAN).is_nan());
	}

	#[test]
	fn degree_trig_reduces_huge_angles_exactly() {
		// 360 * 2^70 is a whole number of turns, far past where x / 90 fits an i64
		let turns = 360.0 * 2f64.powi(70);
		assert_eq!(sind(turns), 0.0);
		assert_eq!(cosd(turns), 1.0);
		assert_eq!(sind(-turns), 0.0);

		// 2^70 = 304 (mod 360)
		let x = 2f64.powi(70);
		assert_relative_eq!(sind(x), -sind(56.0), epsilon = 1e-15);
		assert_relative_eq!(cosd(x), cosd(56.0), epsilon = 1e-15);
		// 3 * 2^64 = 48 (mod 360)
		assert_relative_eq!(sind(-3.0 * 2f64.powi(64)), -sind(48.0), epsilon = 1e-15);
		assert!(cosd(f64::INFINITY).is_nan());
	}

	#[test]
	fn rotate_up_maps_vector_onto_z() {
		for up in [
			Vector3::new(1.0, 0.0, 0.0),
			Vector3::new(1.0, 2.0, 3.0),
			Vector3::new(0.3, -0.2, -5.0),
			Vector3::new(0.0, 0.0, 2.0),
			Vector3::new(0.0, 0.0, -1.0),
		] {
			let m = rotate_up(up);
			let mapped = mat3(&m) * up.normalize();
			assert_relative_eq!(mapped, Vector3::z(), epsilon = 1e-12);
			assert_relative_eq!(m.column(3).norm(), 0.0);
		}
	}

	#[test]
	fn corner_cycling() {
		assert_eq!(next3_usize(2), 0);
		assert_eq!(prev3_usize(0), 2);
		assert_eq!(next3_usize(prev3_usize(1)), 1);
	}
}
