use crate::common::AABB;
use crate::error::Result;
use crate::halfedge_mesh::HalfedgeMesh;
use crate::params::ExecutionParams;
use crate::shared::{Halfedge, get_axis_aligned_projection, next_halfedge};
use crate::utils::ccw;
use nalgebra::Point2;
use rayon::prelude::*;
use tracing::debug;

struct CheckHalfedges<'a> {
	halfedges: &'a [Halfedge],
}

impl<'a> CheckHalfedges<'a> {
	///Describes what is wrong with halfedge `edge`, if anything.
	fn call(&self, edge: usize) -> Option<String> {
		let halfedge = self.halfedges[edge];
		if halfedge.face != (edge / 3) as i32 {
			return Some(format!("halfedge {} ({}) is not owned by face {}", edge, halfedge, edge / 3));
		}
		if halfedge.start_vert < 0 || halfedge.end_vert < 0 || halfedge.start_vert == halfedge.end_vert {
			return Some(format!("halfedge {} ({}) is degenerate", edge, halfedge));
		}

		let next = self.halfedges[next_halfedge(edge as i32) as usize];
		if halfedge.end_vert != next.start_vert {
			return Some(format!(
				"face {} does not close: halfedge {} ends at {} but the next starts at {}",
				edge / 3,
				edge,
				halfedge.end_vert,
				next.start_vert
			));
		}

		if halfedge.paired_halfedge < 0 || halfedge.paired_halfedge as usize >= self.halfedges.len() {
			return Some(format!("halfedge {} ({}) is unpaired", edge, halfedge));
		}
		let paired = self.halfedges[halfedge.paired_halfedge as usize];
		if paired.paired_halfedge != edge as i32 {
			return Some(format!(
				"halfedge {} pairs with {}, which pairs with {}",
				edge, halfedge.paired_halfedge, paired.paired_halfedge
			));
		}
		if !halfedge.opposes(&paired) {
			return Some(format!(
				"halfedge {} ({}) and its pair ({}) do not run opposite",
				edge, halfedge, paired
			));
		}
		None
	}
}

impl HalfedgeMesh {
	///Returns true if every halfedge is paired symmetrically with an opposite
	///halfedge and every face is a closed cycle.
	pub fn is_manifold(&self) -> bool {
		self.check_halfedges().is_ok()
	}

	///Returns true if this mesh is in fact an oriented 2-manifold: also no
	///directed edge appears twice.
	pub fn is_2_manifold(&self) -> bool {
		self.is_manifold() && self.check_edge_multiplicity().is_ok()
	}

	///Walks every halfedge (in parallel) and reports the first broken pairing or
	///face cycle as a topology error.
	pub fn check_halfedges(&self) -> Result<()> {
		ensure!(
			self.halfedge.len() % 3 == 0,
			Topology,
			"{} halfedges do not form whole triangles",
			self.halfedge.len()
		);
		let check = CheckHalfedges {
			halfedges: &self.halfedge,
		};
		let failure = (0..self.halfedge.len())
			.into_par_iter()
			.filter_map(|edge| check.call(edge))
			.find_first(|_| true);
		ensure!(failure.is_none(), Topology, "{}", failure.unwrap_or_default());
		Ok(())
	}

	///Sorts halfedges by (start, end) and reports any directed edge that
	///appears more than once, i.e. an undirected edge with more than two
	///halfedges.
	pub fn check_edge_multiplicity(&self) -> Result<()> {
		let mut sorted: Vec<Halfedge> = self.halfedge.clone();
		sorted.par_sort_unstable();
		let duplicate = sorted
			.windows(2)
			.find(|w| w[0].edge_key() == w[1].edge_key());
		ensure!(
			duplicate.is_none(),
			Topology,
			"edge {:?} has more than two halfedges",
			duplicate.map(|w| w[0].edge_key())
		);
		Ok(())
	}

	///The full self-consistency check, run only when `intermediate_checks` is
	///set: halfedge pairing and face cycles, edge multiplicity, and every
	///barycentric reference.
	pub fn check_consistency(&self, params: &ExecutionParams) -> Result<()> {
		if !params.intermediate_checks {
			return Ok(());
		}
		self.check_halfedges()?;
		self.check_edge_multiplicity()?;
		self.mesh_relation.validate(self.num_tri())?;
		ensure!(
			self.halfedge
				.par_iter()
				.all(|h| (h.start_vert as usize) < self.num_vert()),
			Topology,
			"a halfedge refers to a vertex past the {} stored",
			self.num_vert()
		);
		if params.verbose {
			debug!(
				num_tri = self.num_tri(),
				num_edge = self.num_edge(),
				"consistency check passed"
			);
		}
		Ok(())
	}

	///Recomputes the bounding box from the vertex positions, skipping NaNs.
	pub fn calculate_bbox(&mut self) {
		self.bbox = self
			.vert_pos
			.par_iter()
			.filter(|p| !p.x.is_nan())
			.fold(AABB::default, |mut bbox, p| {
				bbox.union_point(*p);
				bbox
			})
			.reduce(AABB::default, |a, b| a.union_aabb(&b));
	}

	///Determines if all verts are finite. Checking just the bounding box dimensions
	///is insufficient as it ignores NaNs.
	pub fn is_finite(&self) -> bool {
		!self
			.vert_pos
			.par_iter()
			.any(|v| v.iter().any(|f| !f.is_finite()))
	}

	pub fn surface_area(&self) -> f64 {
		(0..self.num_tri())
			.into_par_iter()
			.map(|tri| {
				let [p0, p1, p2] = self.tri_positions(tri);
				0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
			})
			.sum()
	}

	///Signed volume; positive when the triangles face outward.
	pub fn volume(&self) -> f64 {
		(0..self.num_tri())
			.into_par_iter()
			.map(|tri| {
				let [p0, p1, p2] = self.tri_positions(tri);
				p0.coords.cross(&p1.coords).dot(&p2.coords) / 6.0
			})
			.sum()
	}

	///The number of "handles": a sphere is 0, a torus 1.
	pub fn genus(&self) -> i64 {
		let chi = self.num_vert() as i64 - self.num_edge() as i64 + self.num_tri() as i64;
		1 - chi / 2
	}

	///The number of triangles that are colinear within `tol`, judged on the
	///axis-aligned projection closest to each triangle's normal.
	pub fn num_degenerate_tris(&self, tol: f64) -> usize {
		(0..self.num_tri())
			.into_par_iter()
			.filter(|&tri| {
				let positions = self.tri_positions(tri);
				let [p0, p1, p2] = positions;
				let normal = (p1 - p0).cross(&(p2 - p0));
				let projection = get_axis_aligned_projection(normal);
				let [q0, q1, q2] = positions.map(|p| Point2::from(projection * p.coords));
				ccw(q0, q1, q2, tol) == 0
			})
			.count()
	}
}
