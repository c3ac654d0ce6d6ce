use crate::common::AABB;
use crate::error::Result;
use crate::exchange::Mesh;
use crate::mesh_relation::MeshRelation;
use crate::params::ExecutionParams;
use crate::shared::{Halfedge, K_UNPAIRED, normal_transform, transform_normal};
use crate::utils::{mat3, next3_usize};
use nalgebra::{Matrix3x4, Matrix4, Point3, Vector3, Vector4};
use rayon::prelude::*;
use std::mem;
use tracing::debug;

///@brief The kernel's representation of an oriented, 2-manifold triangle
///mesh.
///
///Vertex positions, halfedges and barycentric references are parallel arrays
///addressed by index: halfedge `3 * tri + i` runs from corner `i` of triangle
///`tri` to corner `i + 1`, and `mesh_relation.tri_bary[tri]` records where
///that triangle came from. The halfedge array and the mesh relation form one
///unit; every structural edit rewrites both before returning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HalfedgeMesh {
	pub bbox: AABB,
	pub vert_pos: Vec<Point3<f64>>,
	///Empty, or one normal per vertex.
	pub vert_normal: Vec<Vector3<f64>>,
	pub halfedge: Vec<Halfedge>,
	///Empty, or one tangent per halfedge. Structural edits drop them.
	pub halfedge_tangent: Vec<Vector4<f64>>,
	pub mesh_relation: MeshRelation,
}

impl HalfedgeMesh {
	pub fn is_empty(&self) -> bool {
		self.num_tri() == 0
	}

	pub fn num_vert(&self) -> usize {
		self.vert_pos.len()
	}

	pub fn num_edge(&self) -> usize {
		self.halfedge.len() / 2
	}

	pub fn num_tri(&self) -> usize {
		self.halfedge.len() / 3
	}

	///The halfedge running opposite `h`, if it has been paired.
	pub fn pair(&self, h: usize) -> Option<usize> {
		let paired = self.halfedge[h].paired_halfedge;
		(paired >= 0).then_some(paired as usize)
	}

	///The triangles across each of the three edges of `tri`.
	pub fn face_neighbors(&self, tri: usize) -> [Option<usize>; 3] {
		[0, 1, 2].map(|i| {
			self.pair(3 * tri + i)
				.map(|p| self.halfedge[p].face as usize)
		})
	}

	pub fn tri_verts(&self, tri: usize) -> [usize; 3] {
		[0, 1, 2].map(|i| self.halfedge[3 * tri + i].start_vert as usize)
	}

	pub fn tri_positions(&self, tri: usize) -> [Point3<f64>; 3] {
		self.tri_verts(tri).map(|v| self.vert_pos[v])
	}

	///Unit normal of `tri` by the right-hand rule, or zero if degenerate.
	pub fn face_normal(&self, tri: usize) -> Vector3<f64> {
		let [p0, p1, p2] = self.tri_positions(tri);
		(p1 - p0)
			.cross(&(p2 - p0))
			.try_normalize(0.0)
			.unwrap_or_else(Vector3::zeros)
	}

	///Builds the halfedge structure for a triangle soup and makes it an
	///original: every triangle maps to itself under a new mesh ID.
	///
	///Bad indices, degenerate triangles, mismatched attribute arrays and
	///non-manifold connectivity are user errors. Non-finite positions are a
	///geometry error, which `params` may suppress.
	pub fn from_mesh(mesh: &Mesh, params: &ExecutionParams) -> Result<Self> {
		let num_vert = mesh.num_vert();
		let num_tri = mesh.num_tri();
		ensure!(
			mesh.vert_normal.is_empty() || mesh.vert_normal.len() == num_vert,
			User,
			"vert_normal has {} entries for {} vertices",
			mesh.vert_normal.len(),
			num_vert
		);
		ensure!(
			mesh.halfedge_tangent.is_empty() || mesh.halfedge_tangent.len() == 3 * num_tri,
			User,
			"halfedge_tangent has {} entries for {} halfedges",
			mesh.halfedge_tangent.len(),
			3 * num_tri
		);
		ensure!(
			num_vert < i32::MAX as usize && 3 * num_tri < i32::MAX as usize,
			User,
			"mesh is too large to index: {} vertices, {} triangles",
			num_vert,
			num_tri
		);
		for (tri, verts) in mesh.tri_verts.iter().enumerate() {
			ensure!(
				verts.iter().all(|&v| (v as usize) < num_vert),
				User,
				"triangle {} refers to a vertex past the {} given",
				tri,
				num_vert
			);
			ensure!(
				verts[0] != verts[1] && verts[1] != verts[2] && verts[2] != verts[0],
				User,
				"triangle {} repeats a vertex: {:?}",
				tri,
				verts
			);
		}
		if mesh.vert_pos.iter().any(|p| p.iter().any(|x| !x.is_finite())) {
			params.tolerate(fail!(Geometry, "vert_pos.is_finite()", "input mesh has non-finite vertices"))?;
		}

		let mut result = Self {
			vert_pos: mesh.vert_pos.clone(),
			vert_normal: mesh.vert_normal.clone(),
			halfedge_tangent: mesh.halfedge_tangent.clone(),
			..Self::default()
		};
		let tri_verts: Vec<[i32; 3]> = mesh
			.tri_verts
			.iter()
			.map(|t| [t[0] as i32, t[1] as i32, t[2] as i32])
			.collect();
		result.create_halfedges(&tri_verts)?;
		ensure!(
			result.is_2_manifold(),
			User,
			"input mesh is not manifold: some edge is shared by more than two triangles"
		);

		result.mesh_relation = MeshRelation::new_original(num_tri)?;
		result.remove_unreferenced_verts();
		result.calculate_bbox();

		if params.verbose {
			debug!(
				num_vert = result.num_vert(),
				num_tri = result.num_tri(),
				mesh_id = ?result.mesh_relation.original_id,
				"created halfedge mesh"
			);
		}
		result.check_consistency(params)?;
		Ok(result)
	}

	///Fills the halfedge array from triangle corners and pairs every halfedge
	///with its opposite by sorting on a packed edge key.
	pub(crate) fn create_halfedges(&mut self, tri_verts: &[[i32; 3]]) -> Result<()> {
		let num_halfedge = 3 * tri_verts.len();
		self.halfedge = (0..num_halfedge)
			.into_par_iter()
			.map(|e| {
				let tri = e / 3;
				let i = e % 3;
				Halfedge {
					start_vert: tri_verts[tri][i],
					end_vert: tri_verts[tri][next3_usize(i)],
					paired_halfedge: K_UNPAIRED,
					face: tri as i32,
				}
			})
			.collect();

		ensure!(
			num_halfedge % 2 == 0,
			User,
			"{} halfedges cannot all be paired",
			num_halfedge
		);

		// Backward halfedges sort into the first half and forward ones into the
		// second, each ordered by their undirected edge.
		let edge: Vec<u64> = self
			.halfedge
			.par_iter()
			.map(|h| {
				let (v0, v1) = (h.start_vert as u64, h.end_vert as u64);
				(if v0 < v1 { 1 } else { 0 }) << 63 | v0.min(v1) << 32 | v0.max(v1)
			})
			.collect();
		let mut ids: Vec<usize> = (0..num_halfedge).collect();
		ids.par_sort_by_key(|&i| edge[i]);

		let num_edge = num_halfedge / 2;
		for i in 0..num_edge {
			let pair0 = ids[i];
			let pair1 = ids[i + num_edge];
			let h0 = self.halfedge[pair0];
			let h1 = self.halfedge[pair1];
			ensure!(
				h0.opposes(&h1),
				User,
				"input mesh is not manifold: halfedge {} ({}) has no opposite",
				pair0,
				h0
			);
			self.halfedge[pair0].paired_halfedge = pair1 as i32;
			self.halfedge[pair1].paired_halfedge = pair0 as i32;
		}
		Ok(())
	}

	///Converts back to the exchange structure.
	pub fn to_mesh(&self) -> Mesh {
		Mesh {
			vert_pos: self.vert_pos.clone(),
			vert_normal: self.vert_normal.clone(),
			tri_verts: (0..self.num_tri())
				.map(|tri| self.tri_verts(tri).map(|v| v as u32).into())
				.collect(),
			halfedge_tangent: self.halfedge_tangent.clone(),
		}
	}

	///This removes all relations to ancestor meshes and marks the result as an
	///original with a fresh mesh ID.
	pub fn as_original(&self) -> Result<Self> {
		let mut result = self.clone();
		result.mesh_relation = MeshRelation::new_original(self.num_tri())?;
		Ok(result)
	}

	///If this mesh is an original, the mesh ID its descendants refer back to.
	pub fn original_id(&self) -> Option<u32> {
		self.mesh_relation.original_id
	}

	///Transform this mesh in space. The first three columns form a 3x3 matrix
	///transform and the last is a translation vector. A mirroring transform
	///also reverses every triangle so the surface keeps facing outward.
	pub fn transform(&self, m: &Matrix3x4<f64>) -> Self {
		let mut result = self.clone();
		result.vert_pos.par_iter_mut().for_each(|v| {
			*v = Point3::from(m * v.coords.push(1.0));
		});

		let normal_m = normal_transform(m);
		result
			.vert_normal
			.par_iter_mut()
			.for_each(|n| *n = transform_normal(&normal_m, *n));

		let linear = mat3(m);
		result.halfedge_tangent.par_iter_mut().for_each(|t| {
			let xyz = linear * t.xyz();
			*t = Vector4::new(xyz.x, xyz.y, xyz.z, t.w);
		});

		let invert = linear.determinant() < 0.0;
		for relation in result.mesh_relation.originals.values_mut() {
			let composed = mat4(m) * mat4(&relation.transform);
			relation.transform = composed.fixed_view::<3, 4>(0, 0).into_owned();
			relation.back_side ^= invert;
		}
		if invert {
			result.flip_tris();
		}

		result.calculate_bbox();
		result
	}

	pub fn translate(&self, v: Vector3<f64>) -> Self {
		let mut m = Matrix3x4::<f64>::identity();
		m.set_column(3, &v);
		self.transform(&m)
	}

	pub fn scale(&self, v: Vector3<f64>) -> Self {
		let mut m = Matrix3x4::<f64>::identity();
		for i in 0..3 {
			m[(i, i)] = v[i];
		}
		self.transform(&m)
	}

	///Reverses the winding of every triangle, along with its barycentric corners.
	fn flip_tris(&mut self) {
		fn flip_halfedge(halfedge: i32) -> i32 {
			let tri = halfedge / 3;
			let vert = 2 - (halfedge - 3 * tri);
			3 * tri + vert
		}

		self.halfedge.par_chunks_mut(3).for_each(|tri| {
			tri.swap(0, 2);
			for edge in tri.iter_mut() {
				mem::swap(&mut edge.start_vert, &mut edge.end_vert);
				if edge.paired_halfedge >= 0 {
					edge.paired_halfedge = flip_halfedge(edge.paired_halfedge);
				}
			}
		});
		for tri in 0..self.mesh_relation.num_tri() {
			self.mesh_relation.flip(tri);
		}
		// tangents belong to the old halfedge directions
		self.halfedge_tangent.clear();
	}
}

#[inline]
fn mat4(a: &Matrix3x4<f64>) -> Matrix4<f64> {
	let mut result = Matrix4::identity();
	result.fixed_view_mut::<3, 4>(0, 0).copy_from(a);
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use approx::assert_relative_eq;

	fn tetrahedron_mesh() -> Mesh {
		Mesh {
			vert_pos: vec![
				Point3::new(-1.0, -1.0, 1.0),
				Point3::new(-1.0, 1.0, -1.0),
				Point3::new(1.0, -1.0, -1.0),
				Point3::new(1.0, 1.0, 1.0),
			],
			tri_verts: vec![
				Vector3::new(2, 0, 1),
				Vector3::new(0, 3, 1),
				Vector3::new(2, 3, 0),
				Vector3::new(3, 2, 1),
			],
			..Mesh::default()
		}
	}

	fn strict() -> ExecutionParams {
		ExecutionParams {
			intermediate_checks: true,
			..ExecutionParams::default()
		}
	}

	#[test]
	fn pairing_round_trip() {
		let mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		assert_eq!(mesh.num_tri(), 4);
		assert_eq!(mesh.num_edge(), 6);
		for h in 0..mesh.halfedge.len() {
			let p = mesh.pair(h).unwrap();
			assert_eq!(mesh.pair(p), Some(h));
			assert!(mesh.halfedge[h].opposes(&mesh.halfedge[p]));
			assert_eq!(mesh.halfedge[h].face as usize, h / 3);
		}
	}

	#[test]
	fn neighbors_are_one_hop() {
		let mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		for tri in 0..4 {
			let neighbors = mesh.face_neighbors(tri);
			let mut others: Vec<usize> = neighbors.iter().map(|n| n.unwrap()).collect();
			others.sort();
			let expected: Vec<usize> = (0..4).filter(|&t| t != tri).collect();
			assert_eq!(others, expected);
		}
	}

	#[test]
	fn starts_as_identity_original() {
		let mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		let id = mesh.original_id().unwrap();
		for (tri, bary_ref) in mesh.mesh_relation.tri_bary.iter().enumerate() {
			assert_eq!(bary_ref.mesh_id, id);
			assert_eq!(bary_ref.tri as usize, tri);
		}
		let again = mesh.as_original().unwrap();
		assert!(again.original_id().unwrap() > id);
		assert_eq!(mesh.to_mesh(), tetrahedron_mesh());
	}

	#[test]
	fn rejects_open_and_bad_input() {
		let mut open = tetrahedron_mesh();
		open.tri_verts.pop();
		let err = HalfedgeMesh::from_mesh(&open, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::User);

		let mut out_of_range = tetrahedron_mesh();
		out_of_range.tri_verts[0].x = 9;
		let err = HalfedgeMesh::from_mesh(&out_of_range, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::User);

		let mut degenerate = tetrahedron_mesh();
		degenerate.tri_verts[1] = Vector3::new(0, 0, 1);
		let err = HalfedgeMesh::from_mesh(&degenerate, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::User);

		let mut normals = tetrahedron_mesh();
		normals.vert_normal = vec![Vector3::z()];
		let err = HalfedgeMesh::from_mesh(&normals, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::User);
	}

	#[test]
	fn rejects_doubled_edges() {
		// two copies of the same tetrahedron share every edge four ways
		let mut doubled = tetrahedron_mesh();
		let tris = doubled.tri_verts.clone();
		doubled.tri_verts.extend(tris);
		let err = HalfedgeMesh::from_mesh(&doubled, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::User);
	}

	#[test]
	fn non_finite_input_is_a_geometry_error() {
		let mut nan = tetrahedron_mesh();
		nan.vert_pos[3].x = f64::NAN;
		let err = HalfedgeMesh::from_mesh(&nan, &strict()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Geometry);

		let lenient = ExecutionParams {
			suppress_errors: true,
			..ExecutionParams::default()
		};
		let mesh = HalfedgeMesh::from_mesh(&nan, &lenient).unwrap();
		assert!(!mesh.bbox.is_finite() || mesh.vert_pos.iter().any(|p| p.x.is_nan()));
	}

	#[test]
	fn unreferenced_verts_are_dropped() {
		let mut extra = tetrahedron_mesh();
		extra.vert_pos.insert(0, Point3::new(50.0, 50.0, 50.0));
		for t in extra.tri_verts.iter_mut() {
			*t += Vector3::repeat(1);
		}
		let mesh = HalfedgeMesh::from_mesh(&extra, &strict()).unwrap();
		assert_eq!(mesh.num_vert(), 4);
		assert_eq!(mesh.bbox.max, Point3::new(1.0, 1.0, 1.0));
		assert!(mesh.is_manifold());
	}

	#[test]
	fn mirror_flips_winding_and_provenance() {
		let mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		let volume = mesh.volume();
		let mirrored = mesh.scale(Vector3::new(-1.0, 1.0, 1.0));
		mirrored.check_consistency(&strict()).unwrap();
		assert_relative_eq!(mirrored.volume(), volume, epsilon = 1e-12);
		assert!(volume > 0.0);

		let id = mesh.original_id().unwrap();
		let relation = mirrored.mesh_relation.originals[&id];
		assert!(relation.back_side);
		assert_eq!(relation.transform[(0, 0)], -1.0);

		// corner 1 of each flipped triangle is the old corner 2
		for tri in 0..mirrored.num_tri() {
			let old = mesh.tri_verts(tri);
			let new = mirrored.tri_verts(tri);
			assert_eq!(new, [old[0], old[2], old[1]]);
			assert_eq!(mirrored.mesh_relation.uvw(tri, 1).unwrap(), Vector3::new(0.0, 0.0, 1.0));
		}
	}

	#[test]
	fn transform_carries_normals_and_tangents() {
		let mut mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		mesh.vert_normal = mesh.vert_pos.iter().map(|p| p.coords.normalize()).collect();
		mesh.halfedge_tangent = (0..mesh.halfedge.len())
			.map(|h| Vector4::new(1.0, 0.0, 0.0, if h % 2 == 0 { 1.0 } else { -1.0 }))
			.collect();

		// normals take the inverse transpose, tangents the linear part
		let stretched = mesh.scale(Vector3::new(2.0, 1.0, 1.0));
		assert_eq!(stretched.vert_normal.len(), mesh.num_vert());
		for (n, p) in stretched.vert_normal.iter().zip(&mesh.vert_pos) {
			assert_relative_eq!(*n, Vector3::new(p.x / 2.0, p.y, p.z).normalize(), epsilon = 1e-12);
		}
		assert_eq!(stretched.halfedge_tangent.len(), mesh.halfedge.len());
		for (t, before) in stretched.halfedge_tangent.iter().zip(&mesh.halfedge_tangent) {
			assert_eq!(*t, Vector4::new(2.0, 0.0, 0.0, before.w));
		}

		let quarter_turn = Matrix3x4::from_columns(&[
			Vector3::new(0.0, 1.0, 0.0),
			Vector3::new(-1.0, 0.0, 0.0),
			Vector3::new(0.0, 0.0, 1.0),
			Vector3::zeros(),
		]);
		let turned = mesh.transform(&quarter_turn);
		for (n, before) in turned.vert_normal.iter().zip(&mesh.vert_normal) {
			assert_relative_eq!(*n, Vector3::new(-before.y, before.x, before.z), epsilon = 1e-12);
			assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
		}
		for (t, before) in turned.halfedge_tangent.iter().zip(&mesh.halfedge_tangent) {
			assert_relative_eq!(*t, Vector4::new(0.0, 1.0, 0.0, before.w), epsilon = 1e-12);
		}

		// mirroring reverses the halfedges the tangents were attached to
		let mirrored = mesh.scale(Vector3::new(-1.0, 1.0, 1.0));
		assert!(mirrored.halfedge_tangent.is_empty());
		for (n, before) in mirrored.vert_normal.iter().zip(&mesh.vert_normal) {
			assert_relative_eq!(*n, Vector3::new(-before.x, before.y, before.z), epsilon = 1e-12);
		}
		mirrored.check_consistency(&strict()).unwrap();
	}

	#[test]
	fn translate_moves_bbox() {
		let mesh = HalfedgeMesh::from_mesh(&tetrahedron_mesh(), &strict()).unwrap();
		let moved = mesh.translate(Vector3::new(10.0, 0.0, 0.0));
		assert_eq!(moved.bbox, mesh.bbox + Vector3::new(10.0, 0.0, 0.0));
		let id = mesh.original_id().unwrap();
		assert_eq!(moved.mesh_relation.originals[&id].transform[(0, 3)], 10.0);
		assert!(!moved.mesh_relation.originals[&id].back_side);
	}
}
