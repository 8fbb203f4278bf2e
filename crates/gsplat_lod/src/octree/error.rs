//! Validation errors raised while building octrees and instances.

use thiserror::Error;

/// Failure to build a valid [`Octree`](super::Octree) or
/// [`OctreeInstance`](super::OctreeInstance).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OctreeError {
  /// A node was given no LOD levels at all.
  #[error("node {node} has no LOD levels")]
  EmptyLods { node: usize },

  /// LOD splat counts must not grow with the LOD index.
  #[error("node {node}: LOD {lod} has {count} splats, more than the previous level's {previous}")]
  IncreasingLodCounts {
    node: usize,
    lod: usize,
    count: u32,
    previous: u32,
  },

  /// `range_min` must be non-negative and not exceed `range_max`.
  #[error("invalid LOD range [{min}, {max}]")]
  InvalidRange { min: i32, max: i32 },

  /// `range_max` must index an LOD level the octree provides.
  #[error("LOD range max {max} exceeds the octree's {lod_levels} LOD levels")]
  RangeExceedsLods { max: i32, lod_levels: usize },
}
