//! Structural edits that keep provenance attached. Each edit computes every
//! fallible value first, then rewrites halfedges and barycentric references
//! together, so an error leaves the mesh untouched.

use crate::error::Result;
use crate::halfedge_mesh::HalfedgeMesh;
use crate::mesh_relation::BaryRef;
use crate::params::ExecutionParams;
use crate::shared::{Halfedge, get_axis_aligned_projection};
use crate::utils::{ccw, next3_usize, prev3_usize};
use nalgebra::{Matrix2x3, Point2, Point3, Vector3};
use tracing::debug;

///Strictly counter-clockwise on the given projection; colinear counts as
///degenerate.
fn winds_forward(projection: &Matrix2x3<f64>, tri: [Point3<f64>; 3]) -> bool {
	let [p0, p1, p2] = tri.map(|p| Point2::from(projection * p.coords));
	ccw(p0, p1, p2, 0.0) > 0
}

impl HalfedgeMesh {
	///Splits triangle `tri` into three at the interior point with barycentric
	///`weights` (normalized here) and returns the new vertex.
	///
	///Triangle `tri` keeps its first edge, the two new triangles are appended.
	///All three keep the origin of `tri`, and the new vertex gets the
	///interpolated coordinate in that origin's frame. A point on or outside the
	///triangle's boundary is a geometry error. Weights that do not sum to a
	///finite non-zero value are a user error, even with errors suppressed.
	pub fn split_face(&mut self, tri: usize, weights: Vector3<f64>, params: &ExecutionParams) -> Result<usize> {
		ensure!(
			tri < self.num_tri(),
			User,
			"triangle {} does not exist ({} triangles)",
			tri,
			self.num_tri()
		);
		ensure!(
			weights.iter().all(|w| w.is_finite()),
			User,
			"split weights {:?} are not finite",
			weights
		);
		let sum = weights.sum();
		// without a usable sum there is no point to split at, degenerate or not
		ensure!(
			sum.is_finite() && sum.abs() > 0.0,
			User,
			"split weights {:?} sum to {}, which cannot be normalized",
			weights,
			sum
		);
		let positive = weights.iter().all(|&w| w > 0.0);
		let weights = weights / sum;

		let [a, b, c] = self.tri_verts(tri);
		let [pos_a, pos_b, pos_c] = self.tri_positions(tri);
		let pos_p = Point3::from(pos_a.coords * weights[0] + pos_b.coords * weights[1] + pos_c.coords * weights[2]);
		let uvw_p = self.mesh_relation.interpolate(tri, &weights)?;

		let projection = get_axis_aligned_projection(self.face_normal(tri));
		let forward = positive
			&& winds_forward(&projection, [pos_a, pos_b, pos_p])
			&& winds_forward(&projection, [pos_b, pos_c, pos_p])
			&& winds_forward(&projection, [pos_c, pos_a, pos_p]);
		if !forward {
			params.tolerate(fail!(
				Geometry,
				"split point inside triangle",
				"splitting triangle {} at weights {:?} leaves a degenerate triangle",
				tri,
				weights
			))?;
		}

		let p = self.num_vert();
		let t1 = self.num_tri();
		let t2 = t1 + 1;
		let outer1 = self.halfedge[3 * tri + 1].paired_halfedge;
		let outer2 = self.halfedge[3 * tri + 2].paired_halfedge;
		let [p_i, a_i, b_i, c_i] = [p, a, b, c].map(|v| v as i32);
		let edge = |start_vert, end_vert, paired_halfedge: usize, face: usize| Halfedge {
			start_vert,
			end_vert,
			paired_halfedge: paired_halfedge as i32,
			face: face as i32,
		};

		self.vert_pos.push(pos_p);
		if !self.vert_normal.is_empty() {
			let normal = self.vert_normal[a] * weights[0] + self.vert_normal[b] * weights[1] + self.vert_normal[c] * weights[2];
			self.vert_normal.push(normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros));
		}

		self.halfedge[3 * tri + 1] = edge(b_i, p_i, 3 * t1 + 2, tri);
		self.halfedge[3 * tri + 2] = edge(p_i, a_i, 3 * t2 + 1, tri);
		self.halfedge.extend([
			Halfedge {
				paired_halfedge: outer1,
				..edge(b_i, c_i, 0, t1)
			},
			edge(c_i, p_i, 3 * t2 + 2, t1),
			edge(p_i, b_i, 3 * tri + 1, t1),
			Halfedge {
				paired_halfedge: outer2,
				..edge(c_i, a_i, 0, t2)
			},
			edge(a_i, p_i, 3 * tri + 2, t2),
			edge(p_i, c_i, 3 * t1 + 1, t2),
		]);
		if outer1 >= 0 {
			self.halfedge[outer1 as usize].paired_halfedge = 3 * t1 as i32;
		}
		if outer2 >= 0 {
			self.halfedge[outer2 as usize].paired_halfedge = 3 * t2 as i32;
		}

		let relation = &mut self.mesh_relation;
		let bary_p = relation.push_uvw(uvw_p);
		let [bary_a, bary_b, bary_c] = relation.tri_bary[tri].vert_bary;
		let origin = relation.tri_bary[tri];
		relation.tri_bary[tri].vert_bary = [bary_a, bary_b, bary_p];
		relation.tri_bary.push(BaryRef {
			vert_bary: [bary_b, bary_c, bary_p],
			..origin
		});
		relation.tri_bary.push(BaryRef {
			vert_bary: [bary_c, bary_a, bary_p],
			..origin
		});

		self.halfedge_tangent.clear();
		self.bbox.union_point(pos_p);
		if params.verbose {
			debug!(tri, vert = p, uvw = ?uvw_p, "split face");
		}
		self.check_consistency(params)?;
		Ok(p)
	}

	///Splits the edge of halfedge `h` at parameter `t` along it (0 at its start,
	///1 at its end) and returns the new vertex. Both triangles sharing the edge
	///are split in two; the halves keep their origins.
	///
	///A `t` outside (0, 1), or a split that leaves a degenerate triangle, is a
	///geometry error. An unpaired edge is a topology error.
	pub fn split_edge(&mut self, h: usize, t: f64, params: &ExecutionParams) -> Result<usize> {
		ensure!(
			h < self.halfedge.len(),
			User,
			"halfedge {} does not exist ({} halfedges)",
			h,
			self.halfedge.len()
		);
		ensure!(t.is_finite(), User, "split parameter {} is not finite", t);
		let Some(g) = self.pair(h) else {
			return Err(fail!(
				Topology,
				"paired_halfedge >= 0",
				"halfedge {} ({}) is unpaired",
				h,
				self.halfedge[h]
			));
		};

		let (tri_t, i) = (h / 3, h % 3);
		let (tri_u, j) = (g / 3, g % 3);
		let e1 = 3 * tri_t + next3_usize(i);
		let f1 = 3 * tri_u + next3_usize(j);
		let a = self.halfedge[h].start_vert as usize;
		let b = self.halfedge[h].end_vert as usize;
		let c = self.halfedge[3 * tri_t + prev3_usize(i)].start_vert as usize;
		let d = self.halfedge[3 * tri_u + prev3_usize(j)].start_vert as usize;

		let (pos_a, pos_b) = (self.vert_pos[a], self.vert_pos[b]);
		let (pos_c, pos_d) = (self.vert_pos[c], self.vert_pos[d]);
		let pos_p = pos_a + (pos_b - pos_a) * t;
		let uvw_t = self.mesh_relation.uvw(tri_t, i)? * (1.0 - t) + self.mesh_relation.uvw(tri_t, next3_usize(i))? * t;
		let uvw_u = self.mesh_relation.uvw(tri_u, j)? * t + self.mesh_relation.uvw(tri_u, next3_usize(j))? * (1.0 - t);

		let projection_t = get_axis_aligned_projection(self.face_normal(tri_t));
		let projection_u = get_axis_aligned_projection(self.face_normal(tri_u));
		let forward = t > 0.0
			&& t < 1.0
			&& winds_forward(&projection_t, [pos_a, pos_p, pos_c])
			&& winds_forward(&projection_t, [pos_p, pos_b, pos_c])
			&& winds_forward(&projection_u, [pos_b, pos_p, pos_d])
			&& winds_forward(&projection_u, [pos_p, pos_a, pos_d]);
		if !forward {
			params.tolerate(fail!(
				Geometry,
				"0 < t < 1",
				"splitting halfedge {} at t = {} leaves a degenerate triangle",
				h,
				t
			))?;
		}

		let p = self.num_vert();
		let new_t = self.num_tri();
		let new_u = new_t + 1;
		let outer_t = self.halfedge[e1].paired_halfedge;
		let outer_u = self.halfedge[f1].paired_halfedge;
		let [p_i, a_i, b_i, c_i, d_i] = [p, a, b, c, d].map(|v| v as i32);
		let edge = |start_vert, end_vert, paired_halfedge: usize, face: usize| Halfedge {
			start_vert,
			end_vert,
			paired_halfedge: paired_halfedge as i32,
			face: face as i32,
		};

		self.vert_pos.push(pos_p);
		if !self.vert_normal.is_empty() {
			let normal = self.vert_normal[a] * (1.0 - t) + self.vert_normal[b] * t;
			self.vert_normal.push(normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros));
		}

		self.halfedge[h] = edge(a_i, p_i, 3 * new_u, tri_t);
		self.halfedge[e1] = edge(p_i, c_i, 3 * new_t + 2, tri_t);
		self.halfedge[g] = edge(b_i, p_i, 3 * new_t, tri_u);
		self.halfedge[f1] = edge(p_i, d_i, 3 * new_u + 2, tri_u);
		self.halfedge.extend([
			edge(p_i, b_i, g, new_t),
			Halfedge {
				paired_halfedge: outer_t,
				..edge(b_i, c_i, 0, new_t)
			},
			edge(c_i, p_i, e1, new_t),
			edge(p_i, a_i, h, new_u),
			Halfedge {
				paired_halfedge: outer_u,
				..edge(a_i, d_i, 0, new_u)
			},
			edge(d_i, p_i, f1, new_u),
		]);
		if outer_t >= 0 {
			self.halfedge[outer_t as usize].paired_halfedge = 3 * new_t as i32 + 1;
		}
		if outer_u >= 0 {
			self.halfedge[outer_u as usize].paired_halfedge = 3 * new_u as i32 + 1;
		}

		let relation = &mut self.mesh_relation;
		let bary_pt = relation.push_uvw(uvw_t);
		let bary_pu = relation.push_uvw(uvw_u);
		let origin_t = relation.tri_bary[tri_t];
		let origin_u = relation.tri_bary[tri_u];
		relation.tri_bary[tri_t].vert_bary[next3_usize(i)] = bary_pt;
		relation.tri_bary[tri_u].vert_bary[next3_usize(j)] = bary_pu;
		relation.tri_bary.push(BaryRef {
			vert_bary: [bary_pt, origin_t.vert_bary[next3_usize(i)], origin_t.vert_bary[prev3_usize(i)]],
			..origin_t
		});
		relation.tri_bary.push(BaryRef {
			vert_bary: [bary_pu, origin_u.vert_bary[next3_usize(j)], origin_u.vert_bary[prev3_usize(j)]],
			..origin_u
		});

		self.halfedge_tangent.clear();
		self.bbox.union_point(pos_p);
		if params.verbose {
			debug!(halfedge = h, t, vert = p, "split edge");
		}
		self.check_consistency(params)?;
		Ok(p)
	}
}
