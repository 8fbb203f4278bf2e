//! OctreeNode / Octree - the shared, immutable splat asset.
//!
//! Nodes are stored flat; tree topology is irrelevant to budgeting, only the
//! per-node bounds and LOD splat counts are kept.
//! LOD 0 = finest detail (most splats), higher LOD = coarser.

use smallvec::SmallVec;

use super::{Aabb, LodLevel, OctreeError};

/// Octree node - bounds plus the splat count of every LOD it provides.
#[derive(Clone, Debug, PartialEq)]
pub struct OctreeNode {
  /// Local-space bounds of the splats in this node
  pub bounds: Aabb,
  /// LOD levels, finest first
  pub lods: SmallVec<[LodLevel; 8]>,
}

impl OctreeNode {
  /// Create a node from its bounds and per-LOD splat counts.
  pub fn new(bounds: Aabb, lods: impl IntoIterator<Item = LodLevel>) -> Self {
    Self {
      bounds,
      lods: lods.into_iter().collect(),
    }
  }

  /// Create a node from raw per-LOD splat counts.
  pub fn from_counts(bounds: Aabb, counts: &[u32]) -> Self {
    Self::new(bounds, counts.iter().copied().map(LodLevel::new))
  }

  /// Number of LOD levels this node provides.
  #[inline]
  pub fn lod_count(&self) -> usize {
    self.lods.len()
  }

  /// Coarsest LOD index this node provides.
  ///
  /// Returns -1 for a node with no LOD levels.
  #[inline]
  pub fn coarsest_lod(&self) -> i32 {
    self.lods.len() as i32 - 1
  }

  /// Splat count at `lod`, clamped to the coarsest level available.
  ///
  /// Returns 0 for a node with no LOD levels.
  #[inline]
  pub fn count_at(&self, lod: usize) -> u32 {
    match self.lods.len() {
      0 => 0,
      n => self.lods[lod.min(n - 1)].count,
    }
  }

  fn validate(&self, index: usize) -> Result<(), OctreeError> {
    if self.lods.is_empty() {
      return Err(OctreeError::EmptyLods { node: index });
    }
    for (lod, pair) in self.lods.windows(2).enumerate() {
      if pair[1].count > pair[0].count {
        return Err(OctreeError::IncreasingLodCounts {
          node: index,
          lod: lod + 1,
          count: pair[1].count,
          previous: pair[0].count,
        });
      }
    }
    Ok(())
  }
}

/// Shared splat asset: nodes plus the number of LOD levels across them.
///
/// Placed in the scene through [`OctreeInstance`](super::OctreeInstance),
/// usually behind an `Arc` so many placements share one asset.
#[derive(Clone, Debug)]
pub struct Octree {
  nodes: Vec<OctreeNode>,
  lod_levels: usize,
}

impl Octree {
  /// Build an octree, validating every node's LOD list.
  ///
  /// Each node needs at least one LOD and counts must be non-increasing
  /// with LOD index.
  pub fn new(nodes: Vec<OctreeNode>) -> Result<Self, OctreeError> {
    for (index, node) in nodes.iter().enumerate() {
      node.validate(index)?;
    }
    let lod_levels = nodes.iter().map(OctreeNode::lod_count).max().unwrap_or(0);
    Ok(Self { nodes, lod_levels })
  }

  /// All nodes, in the order node infos are indexed.
  #[inline]
  pub fn nodes(&self) -> &[OctreeNode] {
    &self.nodes
  }

  /// Number of nodes.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Check if empty.
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Largest LOD count provided by any node.
  #[inline]
  pub fn lod_levels(&self) -> usize {
    self.lod_levels
  }

  /// Splats drawn if every node were shown at `lod`.
  ///
  /// Nodes with fewer levels contribute their coarsest level.
  pub fn total_splats(&self, lod: usize) -> u64 {
    self.nodes.iter().map(|n| n.count_at(lod) as u64).sum()
  }

  /// Union of all node bounds, or `None` for an empty octree.
  pub fn bounds(&self) -> Option<Aabb> {
    let mut iter = self.nodes.iter();
    let first = iter.next()?.bounds;
    Some(iter.fold(first, |acc, node| Aabb {
      min: acc.min.min(node.bounds.min),
      max: acc.max.max(node.bounds.max),
    }))
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
