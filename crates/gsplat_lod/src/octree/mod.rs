//! Octree module for splat LOD data.
//!
//! An [`Octree`] is a shared, immutable splat asset: a flat list of nodes,
//! each carrying a bounding box and the splat count of every LOD level it
//! provides. An [`OctreeInstance`] is one placement of that asset in the
//! scene, with its own transform, LOD range and per-node runtime state.
//!
//! # LOD Convention
//!
//! LOD 0 = finest detail (most splats), higher LOD = coarser.
//!
//! ```text
//! lods[0].count >= lods[1].count >= ... >= lods[n - 1].count
//! ```
//!
//! # Module Structure
//!
//! - [`bounds`]: `Aabb` - node bounds and distance queries
//! - [`lod`]: `LodLevel` - splat count of one detail level
//! - [`node`]: `OctreeNode`, `Octree` - validated shared splat asset
//! - [`instance`]: `NodeInfo`, `OctreeInstance` - placed occurrence with
//!   per-node `optimal_lod` / `world_distance`
//! - [`error`]: `OctreeError` - construction/validation failures

pub mod bounds;
pub mod error;
pub mod instance;
pub mod lod;
pub mod node;

// Re-exports
pub use bounds::Aabb;
pub use error::OctreeError;
pub use instance::{NodeInfo, OctreeInstance};
pub use lod::LodLevel;
pub use node::{Octree, OctreeNode};
