//! The geometric core of a manifold mesh kernel: exact-enough orientation
//! predicates, axis-aligned boxes, a half-edge triangle mesh that stays an
//! oriented 2-manifold through every edit, and barycentric provenance that
//! ties each triangle back to the original mesh it came from.
//!
//! Boolean operations, collision acceleration and file formats are built on
//! top of this crate, not in it.

#[macro_use]
pub mod error;

mod common;
mod constructors;
mod edit;
mod exchange;
mod halfedge_mesh;
mod mesh_relation;
mod parallel;
mod params;
mod properties;
mod shared;
mod sort;
mod utils;

pub use crate::common::{AABB, AABBOverlap};
pub use crate::constructors::Shape;
pub use crate::error::{ErrorContext, ErrorKind, ManifoldError, Result};
pub use crate::exchange::{ExportBuffers, ExportOptions, Material, Mesh, UpAxis, prepare_export};
pub use crate::halfedge_mesh::HalfedgeMesh;
pub use crate::mesh_relation::{
	BaryIndex, BaryRef, K_BARY_TOLERANCE, MeshRelation, Relation, current_generation, reserve_ids,
};
pub use crate::params::ExecutionParams;
pub use crate::shared::{Halfedge, K_UNPAIRED, get_axis_aligned_projection, next_halfedge};
pub use crate::utils::{K_TOLERANCE, ccw, cosd, rotate_up, signum, sind};
