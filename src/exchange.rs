//! The data shapes that format importers and exporters trade with the kernel.
//! No file is ever read or written here: collaborators own the formats, this
//! module owns the checks every format needs.

use crate::error::Result;
use nalgebra::{Point3, Vector3, Vector4};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///Plain triangle mesh: the sole input/output shape of the kernel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
	pub vert_pos: Vec<Point3<f64>>,
	///Optional: empty, or one normal per vertex.
	pub vert_normal: Vec<Vector3<f64>>,
	///Vertex indices of the three corners of each triangle, CCW from outside.
	pub tri_verts: Vec<Vector3<u32>>,
	///Optional: empty, or one weighted tangent per halfedge (3 per triangle).
	pub halfedge_tangent: Vec<Vector4<f64>>,
}

impl Mesh {
	///Builds a mesh from arbitrary polygon faces as read by an importer. Any
	///face that is not a triangle is rejected, as is any out-of-range index.
	pub fn from_faces(vert_pos: Vec<Point3<f64>>, faces: &[Vec<u32>], up: UpAxis) -> Result<Self> {
		let mut tri_verts = Vec::with_capacity(faces.len());
		for (i, face) in faces.iter().enumerate() {
			ensure!(
				face.len() == 3,
				User,
				"non-triangular face {} with {} vertices",
				i,
				face.len()
			);
			ensure!(
				face.iter().all(|&v| (v as usize) < vert_pos.len()),
				User,
				"face {} refers to a vertex past the {} given",
				i,
				vert_pos.len()
			);
			tri_verts.push(Vector3::new(face[0], face[1], face[2]));
		}

		Ok(Self {
			vert_pos: vert_pos.into_iter().map(|p| up.to_z_up_point(p)).collect(),
			tri_verts,
			..Self::default()
		})
	}

	pub fn num_vert(&self) -> usize {
		self.vert_pos.len()
	}

	pub fn num_tri(&self) -> usize {
		self.tri_verts.len()
	}
}

///Which axis a file format treats as up. The kernel itself is axis-agnostic
///and works in Z-up; conversion is a pure coordinate permutation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpAxis {
	///glTF and friends.
	Y,
	#[default]
	Z,
}

impl UpAxis {
	///Picks the convention by file extension: glb and gltf are Y-up.
	pub fn from_extension(ext: &str) -> Self {
		match ext.to_ascii_lowercase().as_str() {
			"glb" | "gltf" => Self::Y,
			_ => Self::Z,
		}
	}

	pub fn to_z_up(self, v: Vector3<f64>) -> Vector3<f64> {
		match self {
			Self::Y => Vector3::new(v.z, v.x, v.y),
			Self::Z => v,
		}
	}

	pub fn from_z_up(self, v: Vector3<f64>) -> Vector3<f64> {
		match self {
			Self::Y => Vector3::new(v.y, v.z, v.x),
			Self::Z => v,
		}
	}

	fn to_z_up_point(self, p: Point3<f64>) -> Point3<f64> {
		Point3::from(self.to_z_up(p.coords))
	}

	fn from_z_up_point(self, p: Point3<f64>) -> Point3<f64> {
		Point3::from(self.from_z_up(p.coords))
	}
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
	pub roughness: f64,
	pub metalness: f64,
	///RGBA base color.
	pub color: Vector4<f64>,
	///Optional: empty, or one RGBA color per vertex.
	pub vert_color: Vec<Vector4<f64>>,
}

impl Default for Material {
	fn default() -> Self {
		Self {
			roughness: 0.2,
			metalness: 1.0,
			color: Vector4::repeat(1.0),
			vert_color: Vec::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportOptions {
	///When false, per-vertex normals are written and must be present.
	pub faceted: bool,
	pub mat: Material,
}

impl Default for ExportOptions {
	fn default() -> Self {
		Self {
			faceted: true,
			mat: Material::default(),
		}
	}
}

///Everything an exporter needs, already validated and in the target axis
///convention.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportBuffers {
	pub positions: Vec<Point3<f64>>,
	pub normals: Option<Vec<Vector3<f64>>>,
	pub colors: Option<Vec<Vector4<f64>>>,
	pub tri_verts: Vec<Vector3<u32>>,
	pub roughness: f64,
	pub metalness: f64,
	pub base_color: Vector4<f64>,
}

///Validates a mesh against the export options and lays it out for the target
///axis convention. Fails before producing anything if attribute arrays do not
///match the vertex count. An empty mesh produces nothing (and a warning).
pub fn prepare_export(mesh: &Mesh, options: &ExportOptions, up: UpAxis) -> Result<Option<ExportBuffers>> {
	if mesh.tri_verts.is_empty() {
		warn!("mesh was not exported because it is empty");
		return Ok(None);
	}

	let num_vert = mesh.num_vert();
	if !options.faceted {
		ensure!(
			mesh.vert_normal.len() == num_vert,
			User,
			"vert_normal must be the same length as vert_pos when faceted is false ({} != {})",
			mesh.vert_normal.len(),
			num_vert
		);
	}
	let vert_color = &options.mat.vert_color;
	if !vert_color.is_empty() {
		ensure!(
			vert_color.len() == num_vert,
			User,
			"if present, vert_color must be the same length as vert_pos ({} != {})",
			vert_color.len(),
			num_vert
		);
	}
	ensure!(
		mesh.tri_verts.iter().flat_map(|t| t.iter()).all(|&v| (v as usize) < num_vert),
		User,
		"triangle refers to a vertex past the {} given",
		num_vert
	);

	Ok(Some(ExportBuffers {
		positions: mesh.vert_pos.iter().map(|&p| up.from_z_up_point(p)).collect(),
		normals: (!options.faceted).then(|| mesh.vert_normal.iter().map(|&n| up.from_z_up(n)).collect()),
		colors: (!vert_color.is_empty()).then(|| vert_color.clone()),
		tri_verts: mesh.tri_verts.clone(),
		roughness: options.mat.roughness,
		metalness: options.mat.metalness,
		base_color: options.mat.color,
	}))
}
