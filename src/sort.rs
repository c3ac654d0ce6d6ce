use crate::halfedge_mesh::HalfedgeMesh;
use crate::parallel::{exclusive_scan_in_place, permute, scatter};
use rayon::prelude::*;

impl HalfedgeMesh {
	///Drops every vertex no halfedge starts from, keeping the survivors in their
	///original order, and renumbers the halfedges to match.
	pub fn remove_unreferenced_verts(&mut self) {
		let num_vert = self.num_vert();
		let mut keep = vec![0_i32; num_vert];
		for h in &self.halfedge {
			if h.start_vert >= 0 {
				keep[h.start_vert as usize] = 1;
			}
		}
		if keep.iter().all(|&k| k == 1) {
			return;
		}

		let vert_new2old: Vec<usize> = (0..num_vert).filter(|&v| keep[v] == 1).collect();
		exclusive_scan_in_place(&mut keep, 0);
		let vert_old2new = keep;

		self.reindex_verts(&vert_old2new);
		permute(&mut self.vert_pos, &vert_new2old);
		if !self.vert_normal.is_empty() {
			permute(&mut self.vert_normal, &vert_new2old);
		}
	}

	///Renumbers the vertices each halfedge refers to. Unset halfedges (negative
	///start) are left alone.
	pub fn reindex_verts(&mut self, vert_old2new: &[i32]) {
		self.halfedge.par_iter_mut().for_each(|edge| {
			if edge.start_vert < 0 {
				return;
			}
			edge.start_vert = vert_old2new[edge.start_vert as usize];
			edge.end_vert = vert_old2new[edge.end_vert as usize];
		});
	}

	///The inverse of a new-to-old vertex map over `old_num_vert` vertices;
	///vertices that were dropped map to -1.
	pub fn invert_vert_map(vert_new2old: &[usize], old_num_vert: usize) -> Vec<i32> {
		let mut vert_old2new = vec![-1; old_num_vert];
		let new_indices: Vec<i32> = (0..vert_new2old.len() as i32).collect();
		scatter(&new_indices, vert_new2old, &mut vert_old2new);
		vert_old2new
	}
}

#[cfg(test)]
mod tests {
	use crate::constructors::Shape;
	use crate::halfedge_mesh::HalfedgeMesh;
	use crate::params::ExecutionParams;
	use nalgebra::{Matrix3x4, Point3, Vector3};

	#[test]
	fn reindex_reverses_vertex_order() {
		let mut mesh = HalfedgeMesh::from_shape(Shape::Octahedron, Matrix3x4::identity());
		let before = mesh.clone();
		let num_vert = mesh.num_vert();
		let new2old: Vec<usize> = (0..num_vert).rev().collect();
		let old2new = HalfedgeMesh::invert_vert_map(&new2old, num_vert);
		mesh.reindex_verts(&old2new);
		mesh.vert_pos.reverse();

		for tri in 0..mesh.num_tri() {
			assert_eq!(mesh.tri_positions(tri), before.tri_positions(tri));
		}
		mesh.check_consistency(&ExecutionParams {
			intermediate_checks: true,
			..ExecutionParams::default()
		})
		.unwrap();
	}

	#[test]
	fn dropped_verts_keep_order() {
		let mut mesh = HalfedgeMesh::from_shape(Shape::Tetrahedron, Matrix3x4::identity());
		mesh.vert_pos.push(Point3::new(9.0, 9.0, 9.0));
		mesh.vert_normal = vec![Vector3::z(); mesh.num_vert()];
		mesh.vert_normal[4] = Vector3::x();
		let before = mesh.vert_pos.clone();

		mesh.remove_unreferenced_verts();
		assert_eq!(mesh.num_vert(), 4);
		assert_eq!(mesh.vert_pos[..], before[..4]);
		assert!(mesh.vert_normal.iter().all(|&n| n == Vector3::z()));
	}

	#[test]
	fn inverse_map_marks_dropped_verts() {
		assert_eq!(HalfedgeMesh::invert_vert_map(&[2, 0], 3), vec![1, -1, 0]);
	}
}
