//! OctreeInstance - one placement of a shared octree in the scene.
//!
//! Each instance carries its own transform, an inclusive LOD range and one
//! [`NodeInfo`] per octree node. Node infos are rewritten every frame: the
//! selection pass fills `world_distance` and a desired `optimal_lod`, then
//! the budget balancer nudges `optimal_lod` within the instance range.

use std::sync::Arc;

use glam::Affine3A;

use super::{Octree, OctreeError, OctreeNode};

/// Per-node runtime LOD state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInfo {
  /// Selected LOD index, or [`NodeInfo::EXCLUDED`] when the node is not
  /// drawn this frame.
  pub optimal_lod: i32,
  /// Camera-to-node distance in world units.
  pub world_distance: f32,
}

impl NodeInfo {
  /// Sentinel LOD for nodes left out of budgeting (culled / empty).
  pub const EXCLUDED: i32 = -1;

  /// Create node info with the given LOD and distance.
  pub fn new(optimal_lod: i32, world_distance: f32) -> Self {
    Self {
      optimal_lod,
      world_distance,
    }
  }

  /// Whether this node takes part in budgeting.
  #[inline]
  pub fn is_included(&self) -> bool {
    self.optimal_lod >= 0
  }
}

impl Default for NodeInfo {
  fn default() -> Self {
    Self {
      optimal_lod: Self::EXCLUDED,
      world_distance: 0.0,
    }
  }
}

/// Placed occurrence of an [`Octree`].
///
/// `node_infos` is parallel to `octree.nodes()` and always has the same
/// length; only the slice contents are exposed mutably.
#[derive(Clone, Debug)]
pub struct OctreeInstance {
  octree: Arc<Octree>,
  node_infos: Vec<NodeInfo>,
  range_min: i32,
  range_max: i32,
  transform: Affine3A,
}

impl OctreeInstance {
  /// Place `octree` with identity transform and LOD range
  /// `[range_min, range_max]`.
  ///
  /// All nodes start excluded until a selection pass runs.
  pub fn new(octree: Arc<Octree>, range_min: i32, range_max: i32) -> Result<Self, OctreeError> {
    validate_range(&octree, range_min, range_max)?;
    let node_infos = vec![NodeInfo::default(); octree.len()];
    Ok(Self {
      octree,
      node_infos,
      range_min,
      range_max,
      transform: Affine3A::IDENTITY,
    })
  }

  /// Place `octree` allowing every LOD level it provides.
  pub fn with_full_range(octree: Arc<Octree>) -> Result<Self, OctreeError> {
    let max = octree.lod_levels() as i32 - 1;
    Self::new(octree, 0, max)
  }

  /// The shared octree asset.
  #[inline]
  pub fn octree(&self) -> &Arc<Octree> {
    &self.octree
  }

  /// Octree nodes, indexed like [`node_infos`](Self::node_infos).
  #[inline]
  pub fn nodes(&self) -> &[OctreeNode] {
    self.octree.nodes()
  }

  /// Per-node runtime state.
  #[inline]
  pub fn node_infos(&self) -> &[NodeInfo] {
    &self.node_infos
  }

  /// Mutable per-node runtime state.
  #[inline]
  pub fn node_infos_mut(&mut self) -> &mut [NodeInfo] {
    &mut self.node_infos
  }

  /// Nodes and mutable node infos at once.
  #[inline]
  pub fn split_mut(&mut self) -> (&[OctreeNode], &mut [NodeInfo]) {
    (self.octree.nodes(), &mut self.node_infos)
  }

  /// Finest LOD nodes of this instance may use.
  #[inline]
  pub fn range_min(&self) -> i32 {
    self.range_min
  }

  /// Coarsest LOD nodes of this instance may use.
  #[inline]
  pub fn range_max(&self) -> i32 {
    self.range_max
  }

  /// Change the permitted LOD range.
  ///
  /// Node infos are not touched; the next selection pass clamps into the
  /// new range.
  pub fn set_range(&mut self, range_min: i32, range_max: i32) -> Result<(), OctreeError> {
    validate_range(&self.octree, range_min, range_max)?;
    self.range_min = range_min;
    self.range_max = range_max;
    Ok(())
  }

  /// Local-to-world transform.
  #[inline]
  pub fn transform(&self) -> &Affine3A {
    &self.transform
  }

  /// Set the local-to-world transform.
  pub fn set_transform(&mut self, transform: Affine3A) {
    self.transform = transform;
  }

  /// Coarsest LOD a node may be degraded to: the instance range capped by
  /// the levels the node actually has.
  #[inline]
  pub fn max_lod_for(&self, node: &OctreeNode) -> i32 {
    self.range_max.min(node.coarsest_lod())
  }

  /// Mark every node as excluded.
  pub fn exclude_all(&mut self) {
    for info in &mut self.node_infos {
      info.optimal_lod = NodeInfo::EXCLUDED;
    }
  }

  /// Number of nodes currently included in budgeting.
  pub fn included_nodes(&self) -> usize {
    self.node_infos.iter().filter(|i| i.is_included()).count()
  }

  /// Splats drawn with the current `optimal_lod` selection.
  pub fn selected_splats(&self) -> u64 {
    self
      .octree
      .nodes()
      .iter()
      .zip(&self.node_infos)
      .filter(|(_, info)| info.is_included())
      .map(|(node, info)| node.count_at(info.optimal_lod as usize) as u64)
      .sum()
  }
}

fn validate_range(octree: &Octree, range_min: i32, range_max: i32) -> Result<(), OctreeError> {
  if range_min < 0 || range_min > range_max {
    return Err(OctreeError::InvalidRange {
      min: range_min,
      max: range_max,
    });
  }
  if range_max as usize >= octree.lod_levels() {
    return Err(OctreeError::RangeExceedsLods {
      max: range_max,
      lod_levels: octree.lod_levels(),
    });
  }
  Ok(())
}

#[cfg(test)]
#[path = "instance_test.rs"]
mod instance_test;
