//! Barycentric provenance: for every current triangle, which original mesh and
//! original triangle it descends from, and where each of its corners sits in
//! that original triangle.

use crate::error::Result;
use nalgebra::{Matrix3x4, Vector3};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static MESH_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

///How far a stored barycentric coordinate may drift from summing to one.
pub const K_BARY_TOLERANCE: f64 = 1e-9;

///Returns the first of n sequential new unique mesh IDs. IDs are never handed
///out twice within a process; once the ID space is used up every further
///reservation fails and the counter stays where it is.
pub fn reserve_ids(n: u32) -> Result<u32> {
	reserve_from(&MESH_ID_COUNTER, n)
}

fn reserve_from(counter: &AtomicU32, n: u32) -> Result<u32> {
	counter
		.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(n))
		.map_err(|next| {
			fail!(
				Logic,
				"next.checked_add(n).is_some()",
				"mesh IDs exhausted: cannot reserve {} more after {}",
				n,
				next
			)
		})
}

///One past the largest mesh ID handed out so far. Any reference at or above it
///was never issued.
pub fn current_generation() -> u32 {
	MESH_ID_COUNTER.load(Ordering::Relaxed)
}

///Where one corner of a current triangle sits in its origin triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaryIndex {
	///Index into the shared barycentric table.
	Table(u32),
	///Coincides with corner k (0, 1 or 2) of the origin triangle.
	Corner(u8),
}

impl BaryIndex {
	///The sign-packed integer form: table indices as-is, corner k as -(k+1).
	///Table indices past `i32::MAX` have no packed form.
	///
	///Some exchange formats count the negative values from the other end, with
	///-1 meaning corner 2 and -3 corner 0. Data in that convention must have
	///its corners mapped through `k -> 2 - k` before going through
	///[`BaryIndex::from_packed`], or corners 0 and 2 come out swapped.
	pub fn to_packed(self) -> Result<i32> {
		match self {
			Self::Table(idx) => i32::try_from(idx).map_err(|_| {
				fail!(
					Logic,
					"idx <= i32::MAX",
					"barycentric table index {} does not fit the packed form",
					idx
				)
			}),
			Self::Corner(k) => Ok(-(k as i32) - 1),
		}
	}

	pub fn from_packed(packed: i32) -> Result<Self> {
		ensure!(
			packed >= -3,
			Logic,
			"packed barycentric index {} is not a corner (-1..=-3) or table index",
			packed
		);
		Ok(if packed < 0 {
			Self::Corner((-packed - 1) as u8)
		} else {
			Self::Table(packed as u32)
		})
	}
}

impl fmt::Display for BaryIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Table(idx) => write!(f, "{}", idx),
			Self::Corner(k) => write!(f, "{}", -(*k as i32) - 1),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaryRef {
	///The original mesh this triangle descends from.
	pub mesh_id: u32,
	///Triangle index within that original mesh.
	pub tri: u32,
	pub vert_bary: [BaryIndex; 3],
}

impl BaryRef {
	///A triangle that is exactly its own origin triangle.
	pub fn identity(mesh_id: u32, tri: u32) -> Self {
		Self {
			mesh_id,
			tri,
			vert_bary: [BaryIndex::Corner(0), BaryIndex::Corner(1), BaryIndex::Corner(2)],
		}
	}

	pub fn same_origin(&self, other: &BaryRef) -> bool {
		self.mesh_id == other.mesh_id && self.tri == other.tri
	}
}

impl fmt::Display for BaryRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"meshID: {}, tri: {}, uvw idx: {}, {}, {}",
			self.mesh_id, self.tri, self.vert_bary[0], self.vert_bary[1], self.vert_bary[2]
		)
	}
}

///What is known about an original mesh that triangles refer back to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Relation {
	///Number of triangles the original had; every `BaryRef::tri` is below it.
	pub num_tri: u32,
	///Accumulated transform from the original's frame to the current one.
	pub transform: Matrix3x4<f64>,
	///Set when the accumulated transform mirrors, turning the surface inside out.
	pub back_side: bool,
}

impl Relation {
	pub fn new(num_tri: u32) -> Self {
		Self {
			num_tri,
			transform: Matrix3x4::identity(),
			back_side: false,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshRelation {
	///Shared table of barycentric coordinates referenced by `BaryIndex::Table`.
	pub barycentric: Vec<Vector3<f64>>,
	///One entry per current triangle.
	pub tri_bary: Vec<BaryRef>,
	///Every original mesh referenced from `tri_bary`.
	pub originals: BTreeMap<u32, Relation>,
	///The mesh ID of this mesh if it is itself an original.
	pub original_id: Option<u32>,
}

impl MeshRelation {
	///Provenance for a fresh original with `num_tri` triangles: every triangle
	///maps to itself under a newly reserved mesh ID.
	pub fn new_original(num_tri: usize) -> Result<Self> {
		let mesh_id = reserve_ids(1)?;
		let mut originals = BTreeMap::new();
		originals.insert(mesh_id, Relation::new(num_tri as u32));
		Ok(Self {
			barycentric: Vec::new(),
			tri_bary: (0..num_tri as u32)
				.map(|tri| BaryRef::identity(mesh_id, tri))
				.collect(),
			originals,
			original_id: Some(mesh_id),
		})
	}

	pub fn num_tri(&self) -> usize {
		self.tri_bary.len()
	}

	///The barycentric coordinate of corner `vert` of current triangle `tri`
	///within its origin triangle. Always sums to one.
	pub fn uvw(&self, tri: usize, vert: usize) -> Result<Vector3<f64>> {
		ensure!(
			tri < self.tri_bary.len(),
			Logic,
			"triangle {} has no barycentric reference ({} recorded)",
			tri,
			self.tri_bary.len()
		);
		ensure!(vert < 3, Logic, "triangle corner {} is not in 0..3", vert);
		match self.tri_bary[tri].vert_bary[vert] {
			BaryIndex::Corner(k) => {
				ensure!(k < 3, Logic, "original corner {} of triangle {} is not in 0..3", k, tri);
				let mut uvw = Vector3::zeros();
				uvw[k as usize] = 1.0;
				Ok(uvw)
			}
			BaryIndex::Table(idx) => {
				ensure!(
					(idx as usize) < self.barycentric.len(),
					Logic,
					"barycentric index {} of triangle {} is past the table ({} entries)",
					idx,
					tri,
					self.barycentric.len()
				);
				Ok(self.barycentric[idx as usize])
			}
		}
	}

	///The three corner coordinates of `tri`, as columns.
	pub fn tri_uvw(&self, tri: usize) -> Result<[Vector3<f64>; 3]> {
		Ok([self.uvw(tri, 0)?, self.uvw(tri, 1)?, self.uvw(tri, 2)?])
	}

	///Origin-frame coordinate of the point with the given barycentric weights in
	///current triangle `tri`.
	pub fn interpolate(&self, tri: usize, weights: &Vector3<f64>) -> Result<Vector3<f64>> {
		let corners = self.tri_uvw(tri)?;
		Ok(corners[0] * weights[0] + corners[1] * weights[1] + corners[2] * weights[2])
	}

	///Stores a coordinate and returns its index. Exact original corners are
	///encoded without a table entry.
	pub fn push_uvw(&mut self, uvw: Vector3<f64>) -> BaryIndex {
		for k in 0..3 {
			let mut corner = Vector3::zeros();
			corner[k] = 1.0;
			if uvw == corner {
				return BaryIndex::Corner(k as u8);
			}
		}
		self.barycentric.push(uvw);
		BaryIndex::Table((self.barycentric.len() - 1) as u32)
	}

	///Reverses the winding of `tri`: corner 0 stays, corners 1 and 2 swap.
	pub fn flip(&mut self, tri: usize) {
		self.tri_bary[tri].vert_bary.swap(1, 2);
	}

	///Appends another mesh's provenance, shifting its table indices past ours.
	pub fn append(&mut self, other: &MeshRelation) {
		let offset = self.barycentric.len() as u32;
		self.barycentric.extend_from_slice(&other.barycentric);
		self.tri_bary.extend(other.tri_bary.iter().map(|r| BaryRef {
			vert_bary: r.vert_bary.map(|b| match b {
				BaryIndex::Table(idx) => BaryIndex::Table(idx + offset),
				corner => corner,
			}),
			..*r
		}));
		for (mesh_id, relation) in &other.originals {
			self.originals.entry(*mesh_id).or_insert(*relation);
		}
		self.original_id = None;
	}

	///Checks every reference: one per triangle, issued mesh IDs with a known
	///original, triangle indices inside that original, table indices inside the
	///table, and table entries that are true barycentric coordinates.
	pub fn validate(&self, num_tri: usize) -> Result<()> {
		ensure!(
			self.tri_bary.len() == num_tri,
			Logic,
			"{} barycentric references for {} triangles",
			self.tri_bary.len(),
			num_tri
		);

		for (idx, uvw) in self.barycentric.iter().enumerate() {
			let sum = uvw.sum();
			ensure!(
				uvw.iter().all(|x| x.is_finite()) && (sum - 1.0).abs() <= K_BARY_TOLERANCE,
				Logic,
				"barycentric entry {} = {:?} does not sum to one",
				idx,
				uvw
			);
		}

		let generation = current_generation();
		for (tri, bary_ref) in self.tri_bary.iter().enumerate() {
			ensure!(
				bary_ref.mesh_id < generation,
				Logic,
				"triangle {} refers to mesh {} which was never issued (generation {})",
				tri,
				bary_ref.mesh_id,
				generation
			);
			let relation = self.originals.get(&bary_ref.mesh_id);
			ensure!(
				relation.is_some(),
				Logic,
				"triangle {} refers to unknown mesh {}",
				tri,
				bary_ref.mesh_id
			);
			if let Some(relation) = relation {
				ensure!(
					bary_ref.tri < relation.num_tri,
					Logic,
					"triangle {} refers to triangle {} of mesh {}, which has {}",
					tri,
					bary_ref.tri,
					bary_ref.mesh_id,
					relation.num_tri
				);
			}
			for vert in 0..3 {
				self.uvw(tri, vert)?;
			}
		}
		Ok(())
	}
}
