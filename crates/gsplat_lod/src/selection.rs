//! Per-instance LOD selection: camera distance and desired LOD per node.
//!
//! Runs before balancing each frame. For every node of an instance:
//!
//! 1. Transform the node bounds to world space
//! 2. `world_distance` = distance from the camera to the closest point of
//!    those bounds (0 when the camera is inside)
//! 3. Nodes whose center lies behind the camera get their distance scaled
//!    by `behind_penalty`
//! 4. Desired LOD = number of `lod_distances` thresholds at or below the
//!    distance, clamped into the instance LOD range
//!
//! Nodes without any splats are excluded (`optimal_lod = -1`).

use glam::Vec3;

use crate::octree::{NodeInfo, OctreeInstance};

/// Viewer used for distance evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
  /// World-space position.
  pub position: Vec3,
  /// Unit view direction (zero disables the behind-camera penalty).
  pub forward: Vec3,
}

impl Camera {
  /// Create a camera; `forward` is normalized.
  pub fn new(position: Vec3, forward: Vec3) -> Self {
    Self {
      position,
      forward: forward.normalize_or_zero(),
    }
  }

  /// Camera at `position` looking at `target`.
  pub fn look_at(position: Vec3, target: Vec3) -> Self {
    Self::new(position, target - position)
  }

  /// Whether `point` lies strictly behind the camera plane.
  #[inline]
  pub fn is_behind(&self, point: Vec3) -> bool {
    (point - self.position).dot(self.forward) < 0.0
  }
}

/// LOD selection configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSelectConfig {
  /// Ascending world distances at which each coarser LOD starts.
  /// Distance < lod_distances[0] selects LOD 0.
  pub lod_distances: Vec<f32>,
  /// Distance multiplier for nodes behind the camera. Values below 1 are
  /// treated as 1.
  pub behind_penalty: f32,
}

impl LodSelectConfig {
  /// Build a config from thresholds, sorting them ascending.
  pub fn with_distances(mut lod_distances: Vec<f32>, behind_penalty: f32) -> Self {
    lod_distances.sort_by(f32::total_cmp);
    Self {
      lod_distances,
      behind_penalty,
    }
  }

  /// Geometric thresholds: `base * multiplier^i` for `count` levels.
  pub fn geometric(base: f32, multiplier: f32, count: usize) -> Self {
    let lod_distances = (0..count).map(|i| base * multiplier.powi(i as i32)).collect();
    Self::with_distances(lod_distances, 1.0)
  }

  /// Multiplier actually applied to behind-camera distances.
  #[inline]
  pub fn effective_behind_penalty(&self) -> f32 {
    self.behind_penalty.max(1.0)
  }
}

impl Default for LodSelectConfig {
  fn default() -> Self {
    Self::geometric(5.0, 2.0, 8)
  }
}

/// LOD index for a distance: how many thresholds are at or below it.
#[inline]
pub fn lod_for_distance(distance: f32, lod_distances: &[f32]) -> usize {
  lod_distances.partition_point(|&threshold| threshold <= distance)
}

/// Fill `world_distance` and desired `optimal_lod` for every node of `inst`.
///
/// Returns the largest world distance among included nodes (0 if none).
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "selection::evaluate_instance"))]
pub fn evaluate_instance(inst: &mut OctreeInstance, camera: &Camera, config: &LodSelectConfig) -> f32 {
  let transform = *inst.transform();
  let range_min = inst.range_min();
  let range_max = inst.range_max();
  let penalty = config.effective_behind_penalty();
  let (nodes, infos) = inst.split_mut();

  let mut max_distance = 0.0f32;
  for (node, info) in nodes.iter().zip(infos.iter_mut()) {
    if node.count_at(0) == 0 {
      *info = NodeInfo::default();
      continue;
    }

    let world_bounds = node.bounds.transformed(&transform);
    let mut distance = world_bounds.distance_to_point(camera.position);
    if camera.is_behind(world_bounds.center()) {
      distance *= penalty;
    }

    // Nodes with fewer levels than range_min sit at their coarsest level
    let max_lod = range_max.min(node.coarsest_lod());
    let lod = lod_for_distance(distance, &config.lod_distances) as i32;

    info.optimal_lod = lod.clamp(range_min.min(max_lod), max_lod);
    info.world_distance = distance;
    max_distance = max_distance.max(distance);
  }

  max_distance
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;
