use crate::halfedge_mesh::HalfedgeMesh;
use crate::mesh_relation::MeshRelation;
use crate::shared::Halfedge;
use nalgebra::{Matrix3x4, Point3, Vector3};
use rayon::prelude::*;
use tracing::warn;

///The reference solids every test and demo starts from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
	Tetrahedron,
	Cube,
	Octahedron,
}

impl HalfedgeMesh {
	///Builds `shape` with its vertices mapped through `m`, as a fresh original.
	///A mirroring `m` leaves the solid inside out. Once mesh IDs are exhausted
	///the result is empty.
	pub fn from_shape(shape: Shape, m: Matrix3x4<f64>) -> Self {
		let (vert_pos, tri_verts): (Vec<[f64; 3]>, Vec<[i32; 3]>) = match shape {
			Shape::Tetrahedron => (
				vec![
					[-1.0, -1.0, 1.0],
					[-1.0, 1.0, -1.0],
					[1.0, -1.0, -1.0],
					[1.0, 1.0, 1.0],
				],
				vec![[2, 0, 1], [0, 3, 1], [2, 3, 0], [3, 2, 1]],
			),
			Shape::Cube => (
				vec![
					[0.0, 0.0, 0.0],
					[0.0, 0.0, 1.0],
					[0.0, 1.0, 0.0],
					[0.0, 1.0, 1.0],
					[1.0, 0.0, 0.0],
					[1.0, 0.0, 1.0],
					[1.0, 1.0, 0.0],
					[1.0, 1.0, 1.0],
				],
				vec![
					[1, 0, 4],
					[2, 4, 0],
					[1, 3, 0],
					[3, 1, 5],
					[3, 2, 0],
					[3, 7, 2],
					[5, 4, 6],
					[5, 1, 4],
					[6, 4, 2],
					[7, 6, 2],
					[7, 3, 5],
					[7, 5, 6],
				],
			),
			Shape::Octahedron => (
				vec![
					[1.0, 0.0, 0.0],
					[-1.0, 0.0, 0.0],
					[0.0, 1.0, 0.0],
					[0.0, -1.0, 0.0],
					[0.0, 0.0, 1.0],
					[0.0, 0.0, -1.0],
				],
				vec![
					[0, 2, 4],
					[1, 5, 3],
					[2, 1, 4],
					[3, 5, 0],
					[1, 3, 4],
					[0, 5, 2],
					[3, 0, 4],
					[2, 5, 1],
				],
			),
		};

		let mut mesh = Self {
			vert_pos: vert_pos
				.into_iter()
				.map(|v| Point3::from(m * Vector3::from(v).push(1.0)))
				.collect(),
			..Self::default()
		};
		// The fixed tables are closed 2-manifolds, so pairing cannot fail.
		if mesh.create_halfedges(&tri_verts).is_err() {
			return Self::default();
		}
		mesh.mesh_relation = match MeshRelation::new_original(mesh.num_tri()) {
			Ok(relation) => relation,
			Err(err) => {
				warn!(?shape, %err, "cannot register a new original");
				return Self::default();
			}
		};
		mesh.calculate_bbox();
		mesh
	}

	///Constructs a tetrahedron centered at the origin with one vertex at (1,1,1)
	///and the rest at similarly symmetric points.
	pub fn tetrahedron() -> Self {
		Self::from_shape(Shape::Tetrahedron, Matrix3x4::identity())
	}

	///Constructs a box with the given edge lengths, by default in the first
	///octant, touching the origin. If any dimensions in size are negative, or if
	///all are zero, an empty mesh is returned.
	///
	///@param size The X, Y, and Z dimensions of the box.
	///@param center Set to true to shift the center to the origin.
	pub fn cube(size: Vector3<f64>, center: bool) -> Self {
		if size.x < 0.0 || size.y < 0.0 || size.z < 0.0 || size.magnitude_squared() == 0.0 {
			return Self::default();
		}

		let m = Matrix3x4::from_columns(&[
			Vector3::new(size.x, 0.0, 0.0),
			Vector3::new(0.0, size.y, 0.0),
			Vector3::new(0.0, 0.0, size.z),
			if center { -size / 2.0 } else { Vector3::zeros() },
		]);
		Self::from_shape(Shape::Cube, m)
	}

	///Constructs an octahedron with its six vertices on the unit axes.
	pub fn octahedron() -> Self {
		Self::from_shape(Shape::Octahedron, Matrix3x4::identity())
	}

	///Constructs a new mesh from a list of meshes, without checking for
	///overlaps: the pieces simply sit side by side in one set of arrays. Every
	///triangle keeps its provenance, so the result is not an original.
	pub fn compose(meshes: &[HalfedgeMesh]) -> Self {
		match meshes {
			[] => return Self::default(),
			[mesh] => return mesh.clone(),
			_ => {}
		}

		let with_normals = meshes.iter().all(|m| m.vert_normal.len() == m.num_vert());
		let with_tangents = meshes
			.iter()
			.all(|m| !m.halfedge_tangent.is_empty() && m.halfedge_tangent.len() == m.halfedge.len());

		let mut result = Self::default();
		for mesh in meshes {
			let vert_offset = result.num_vert() as i32;
			let edge_offset = result.halfedge.len() as i32;
			let tri_offset = result.num_tri() as i32;

			result.vert_pos.extend_from_slice(&mesh.vert_pos);
			if with_normals {
				result.vert_normal.extend_from_slice(&mesh.vert_normal);
			}
			if with_tangents {
				result.halfedge_tangent.extend_from_slice(&mesh.halfedge_tangent);
			}
			let shifted: Vec<Halfedge> = mesh
				.halfedge
				.par_iter()
				.map(|h| Halfedge {
					start_vert: h.start_vert + vert_offset,
					end_vert: h.end_vert + vert_offset,
					paired_halfedge: if h.paired_halfedge < 0 {
						h.paired_halfedge
					} else {
						h.paired_halfedge + edge_offset
					},
					face: h.face + tri_offset,
				})
				.collect();
			result.halfedge.extend(shifted);
			result.mesh_relation.append(&mesh.mesh_relation);
			result.bbox = result.bbox.union_aabb(&mesh.bbox);
		}
		result
	}
}
