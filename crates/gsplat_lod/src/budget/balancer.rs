//! Budget balancer: fits the selected splat total to a global budget.
//!
//! # Bucketing
//!
//! Included nodes are grouped by a square-root distance mapping:
//!
//! ```text
//! bucket = floor(sqrt(world_distance) * num_buckets / sqrt(global_max_distance))
//! ```
//!
//! clamped to `[0, num_buckets - 1]`. The square root spends more buckets on
//! nearby geometry, where LOD differences are visible. Bucket 0 = nearest.
//!
//! # Adjustment
//!
//! Whole passes over the buckets repeat until the budget condition holds or a
//! pass changes nothing:
//! - **Degrade** (over budget): farthest bucket first, each node at most one
//!   LOD coarser per pass, stop as soon as the total is at or under budget.
//! - **Upgrade** (under budget): nearest bucket first, each node at most one
//!   LOD finer per pass, only when the step keeps the total at or under
//!   budget; stop once the total reaches the budget.
//!
//! Nodes never leave their instance's `[range_min, range_max]` range, and
//! never degrade past the coarsest LOD they provide.

use std::collections::HashMap;
use std::hash::BuildHasher;

use super::{BalanceDirection, BalanceStats, BalancerConfig};
use crate::octree::OctreeInstance;

/// Arena handle to one node: instance slot for this call plus node index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeRef {
  instance: u32,
  node: u32,
}

/// Splat budget balancer.
///
/// Owns its bucket storage, allocated once and cleared on each call so a
/// frame's balancing does not reallocate once capacities have grown.
pub struct BudgetBalancer {
  config: BalancerConfig,
  buckets: Vec<Vec<NodeRef>>,
}

impl BudgetBalancer {
  /// Create a balancer with the default bucket count.
  pub fn new() -> Self {
    Self::with_config(BalancerConfig::DEFAULT)
  }

  /// Create a balancer with the given configuration.
  pub fn with_config(config: BalancerConfig) -> Self {
    Self {
      config,
      buckets: vec![Vec::new(); config.bucket_count()],
    }
  }

  /// Current configuration.
  #[inline]
  pub fn config(&self) -> &BalancerConfig {
    &self.config
  }

  /// Number of distance buckets in use.
  #[inline]
  pub fn num_buckets(&self) -> usize {
    self.buckets.len()
  }

  /// Bucket a node at `distance` lands in for the given
  /// `global_max_distance`.
  pub fn bucket_for_distance(&self, distance: f32, global_max_distance: f32) -> usize {
    let scale = bucket_scale(self.buckets.len(), global_max_distance);
    bucket_index(distance, scale, self.buckets.len())
  }

  /// Balance every instance of a placement map.
  pub fn balance_map<K, S: BuildHasher>(
    &mut self,
    instances: &mut HashMap<K, OctreeInstance, S>,
    budget: u64,
    global_max_distance: f32,
  ) -> BalanceStats {
    self.balance(instances.values_mut(), budget, global_max_distance)
  }

  /// Adjust `optimal_lod` of every included node so the selected splat total
  /// approaches `budget`, preferring detail for nodes near the camera.
  ///
  /// Nodes with `optimal_lod < 0` are ignored. Never fails: an unreachable
  /// budget ends with the best total the LOD ranges allow.
  ///
  /// `global_max_distance <= 0` (or non-finite) disables distance
  /// prioritization: every node shares bucket 0.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "budget::balance"))]
  pub fn balance<'a, I>(&mut self, instances: I, budget: u64, global_max_distance: f32) -> BalanceStats
  where
    I: IntoIterator<Item = &'a mut OctreeInstance>,
  {
    let mut instances: Vec<&'a mut OctreeInstance> = instances.into_iter().collect();
    let mut stats = BalanceStats::default();

    // Phase 1: Bucket included nodes, sum the desired total
    let total = {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("bucketing").entered();
      self.fill_buckets(&instances, global_max_distance, &mut stats)
    };
    stats.total_optimal_splats = total;
    stats.final_splats = total;

    // Phase 2: Early exit
    if total == budget {
      return stats;
    }

    // Phase 3: Adjust one LOD step at a time
    {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("adjust").entered();
      if total > budget {
        stats.direction = BalanceDirection::Degrade;
        stats.final_splats = self.degrade(&mut instances, total, budget, &mut stats);
      } else {
        stats.direction = BalanceDirection::Upgrade;
        stats.final_splats = self.upgrade(&mut instances, total, budget, &mut stats);
      }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
      nodes = stats.nodes_considered,
      from = stats.total_optimal_splats,
      to = stats.final_splats,
      budget,
      passes = stats.passes,
      "splat budget balanced"
    );

    stats
  }

  fn fill_buckets(
    &mut self,
    instances: &[&mut OctreeInstance],
    global_max_distance: f32,
    stats: &mut BalanceStats,
  ) -> u64 {
    for bucket in &mut self.buckets {
      bucket.clear();
    }

    let num_buckets = self.buckets.len();
    let scale = bucket_scale(num_buckets, global_max_distance);
    let mut total = 0u64;

    for (inst_idx, inst) in instances.iter().enumerate() {
      for (node_idx, (node, info)) in inst.nodes().iter().zip(inst.node_infos()).enumerate() {
        if !info.is_included() {
          continue;
        }
        let bucket = bucket_index(info.world_distance, scale, num_buckets);
        self.buckets[bucket].push(NodeRef {
          instance: inst_idx as u32,
          node: node_idx as u32,
        });
        total += node.count_at(info.optimal_lod as usize) as u64;
        stats.nodes_considered += 1;
      }
    }

    total
  }

  /// Over budget: push far nodes coarser until at or under budget.
  fn degrade(
    &self,
    instances: &mut [&mut OctreeInstance],
    mut current: u64,
    budget: u64,
    stats: &mut BalanceStats,
  ) -> u64 {
    while current > budget {
      stats.passes += 1;
      let mut modified = false;

      'pass: for bucket in self.buckets.iter().rev() {
        for node_ref in bucket {
          let inst = &mut *instances[node_ref.instance as usize];
          let range_max = inst.range_max();
          let (nodes, infos) = inst.split_mut();
          let node = &nodes[node_ref.node as usize];
          let info = &mut infos[node_ref.node as usize];

          if info.optimal_lod >= range_max.min(node.coarsest_lod()) {
            continue;
          }

          let lod = info.optimal_lod as usize;
          let freed = node.count_at(lod) - node.count_at(lod + 1);
          info.optimal_lod += 1;
          current = current.saturating_sub(freed as u64);
          stats.degraded_steps += 1;
          modified = true;

          if current <= budget {
            break 'pass;
          }
        }
      }

      // Everything pinned at its coarsest allowed LOD
      if !modified {
        break;
      }
    }
    current
  }

  /// Under budget: pull near nodes finer while the step still fits.
  fn upgrade(
    &self,
    instances: &mut [&mut OctreeInstance],
    mut current: u64,
    budget: u64,
    stats: &mut BalanceStats,
  ) -> u64 {
    while current < budget {
      stats.passes += 1;
      let mut modified = false;

      'pass: for bucket in &self.buckets {
        for node_ref in bucket {
          let inst = &mut *instances[node_ref.instance as usize];
          let range_min = inst.range_min();
          let (nodes, infos) = inst.split_mut();
          let node = &nodes[node_ref.node as usize];
          let info = &mut infos[node_ref.node as usize];

          if info.optimal_lod <= range_min {
            continue;
          }

          let lod = info.optimal_lod as usize;
          let added = (node.count_at(lod - 1) - node.count_at(lod)) as u64;
          if current + added > budget {
            continue;
          }

          info.optimal_lod -= 1;
          current += added;
          stats.upgraded_steps += 1;
          modified = true;

          if current >= budget {
            break 'pass;
          }
        }
      }

      // Nothing left that fits (or everything at its finest allowed LOD)
      if !modified {
        break;
      }
    }
    current
  }
}

impl Default for BudgetBalancer {
  fn default() -> Self {
    Self::new()
  }
}

/// Multiplier applied to `sqrt(distance)`; 0 disables distance ordering.
#[inline]
fn bucket_scale(num_buckets: usize, global_max_distance: f32) -> f32 {
  if global_max_distance > 0.0 && global_max_distance.is_finite() {
    num_buckets as f32 / global_max_distance.sqrt()
  } else {
    0.0
  }
}

/// Bucket for a node distance. NaN/infinite distances go to the last bucket.
#[inline]
fn bucket_index(distance: f32, scale: f32, num_buckets: usize) -> usize {
  let last = num_buckets - 1;
  if scale == 0.0 {
    return 0;
  }
  if distance.is_nan() {
    return last;
  }
  let scaled = distance.max(0.0).sqrt() * scale;
  if !scaled.is_finite() {
    return last;
  }
  (scaled as usize).min(last)
}

#[cfg(test)]
#[path = "balancer_test.rs"]
mod balancer_test;
