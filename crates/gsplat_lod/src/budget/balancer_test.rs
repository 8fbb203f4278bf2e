use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::octree::{Aabb, NodeInfo, Octree, OctreeNode};

/// Node description for test scenes: (per-LOD counts, optimal_lod, distance).
type NodeSpec<'a> = (&'a [u32], i32, f32);

fn instance(nodes: &[NodeSpec], range_min: i32, range_max: i32) -> OctreeInstance {
  let octree_nodes = nodes
    .iter()
    .map(|(counts, _, _)| OctreeNode::from_counts(Aabb::new(Vec3::ZERO, Vec3::ONE), counts))
    .collect();
  let octree = Arc::new(Octree::new(octree_nodes).unwrap());
  let mut inst = OctreeInstance::new(octree, range_min, range_max).unwrap();
  for (info, (_, lod, distance)) in inst.node_infos_mut().iter_mut().zip(nodes) {
    *info = NodeInfo::new(*lod, *distance);
  }
  inst
}

fn lods(inst: &OctreeInstance) -> Vec<i32> {
  inst.node_infos().iter().map(|i| i.optimal_lod).collect()
}

// =========================================================================
// Reference scenarios
// =========================================================================

/// One node degrades a single step to land exactly on budget.
#[test]
fn test_single_node_degrades_to_budget() {
  let mut inst = instance(&[(&[1000, 400, 100], 0, 5.0)], 0, 2);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 400, 10.0);

  assert_eq!(lods(&inst), vec![1]);
  assert_eq!(stats.direction, BalanceDirection::Degrade);
  assert_eq!(stats.total_optimal_splats, 1000);
  assert_eq!(stats.final_splats, 400);
  assert_eq!(inst.selected_splats(), 400);
}

/// Farther node degrades first; the nearer one keeps full detail.
#[test]
fn test_far_node_degrades_first() {
  let mut inst = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 0, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 250, 10.0);

  assert_eq!(lods(&inst), vec![0, 1], "Only the far node (B) should degrade");
  assert_eq!(stats.final_splats, 250);
  assert_eq!(stats.degraded_steps, 1);
}

/// A tighter budget continues degrading into nearer buckets.
#[test]
fn test_tight_budget_degrades_both() {
  let mut inst = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 0, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 100, 10.0);

  assert_eq!(lods(&inst), vec![1, 1]);
  assert_eq!(stats.final_splats, 100);
  assert_eq!(stats.degraded_steps, 2);
}

/// No instances: nothing to do, nothing to fail.
#[test]
fn test_empty_instances_is_noop() {
  let mut balancer = BudgetBalancer::new();
  let mut map: HashMap<u32, OctreeInstance> = HashMap::new();

  let stats = balancer.balance_map(&mut map, 1234, 10.0);

  assert_eq!(stats.nodes_considered, 0);
  assert_eq!(stats.final_splats, 0);
  assert!(!stats.modified());
}

/// Excluded nodes are neither counted nor touched.
#[test]
fn test_excluded_node_untouched() {
  let mut inst = instance(
    &[(&[1000, 400, 100], NodeInfo::EXCLUDED, 0.5), (&[1000, 400, 100], 0, 5.0)],
    0,
    2,
  );
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 0, 10.0);

  assert_eq!(lods(&inst), vec![NodeInfo::EXCLUDED, 2]);
  assert_eq!(stats.nodes_considered, 1);
  assert_eq!(stats.total_optimal_splats, 1000);
  assert_eq!(stats.final_splats, 100);
}

// =========================================================================
// Properties
// =========================================================================

/// Total already equal to budget: early exit, nothing changes.
#[test]
fn test_conservation_when_budget_met() {
  let mut inst = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 1, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 250, 10.0);

  assert_eq!(lods(&inst), vec![0, 1]);
  assert_eq!(stats.direction, BalanceDirection::Satisfied);
  assert_eq!(stats.passes, 0);
}

/// A second call with the same inputs after landing on budget is a no-op.
#[test]
fn test_idempotent_once_balanced() {
  let mut inst = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 0, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  balancer.balance([&mut inst], 250, 10.0);
  let after_first = lods(&inst);
  let stats = balancer.balance([&mut inst], 250, 10.0);

  assert_eq!(lods(&inst), after_first);
  assert!(!stats.modified());
  assert_eq!(stats.direction, BalanceDirection::Satisfied);
}

/// Everything already at range_max: an unreachable budget terminates after
/// one fruitless pass.
#[test]
fn test_terminates_when_pinned_at_range_max() {
  let mut inst = instance(&[(&[200, 50, 10], 2, 1.0), (&[200, 50, 10], 2, 9.0)], 0, 2);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 0, 10.0);

  assert_eq!(lods(&inst), vec![2, 2]);
  assert_eq!(stats.passes, 1);
  assert_eq!(stats.final_splats, 20);
  assert!(!stats.modified());
}

/// Everything already at range_min: a generous budget terminates too.
#[test]
fn test_terminates_when_pinned_at_range_min() {
  let mut inst = instance(&[(&[200, 50, 10], 1, 1.0), (&[200, 50, 10], 1, 9.0)], 1, 2);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 10_000, 10.0);

  assert_eq!(lods(&inst), vec![1, 1], "range_min = 1 forbids LOD 0");
  assert_eq!(stats.direction, BalanceDirection::Upgrade);
  assert!(!stats.modified());
}

/// Each pass moves a node at most one step; repeated passes walk it down.
#[test]
fn test_degrade_takes_multiple_passes() {
  let mut inst = instance(&[(&[100, 50, 25, 10], 0, 3.0)], 0, 3);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 10, 10.0);

  assert_eq!(lods(&inst), vec![3]);
  assert_eq!(stats.passes, 3);
  assert_eq!(stats.degraded_steps, 3);
}

/// Degrade may undershoot the budget within a single step.
#[test]
fn test_degrade_may_undershoot() {
  let mut inst = instance(&[(&[1000, 100], 0, 3.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 900, 10.0);

  assert_eq!(lods(&inst), vec![1]);
  assert_eq!(stats.final_splats, 100);
  assert!(stats.budget_met(900));
}

/// Upgrades go nearest first and stop when nothing else fits.
#[test]
fn test_upgrade_nearest_first() {
  let mut inst = instance(&[(&[200, 50], 1, 1.0), (&[200, 50], 1, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 260, 10.0);

  assert_eq!(lods(&inst), vec![0, 1], "Near node upgrades, far one would overshoot");
  assert_eq!(stats.direction, BalanceDirection::Upgrade);
  assert_eq!(stats.final_splats, 250);
  assert_eq!(stats.passes, 2);
}

/// An upgrade that would exceed the budget by even one splat is skipped.
#[test]
fn test_upgrade_never_overshoots() {
  let mut inst = instance(&[(&[200, 50], 1, 1.0), (&[200, 50], 1, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 199, 10.0);

  assert_eq!(lods(&inst), vec![1, 1]);
  assert_eq!(stats.final_splats, 100);
  assert!(!stats.modified());
}

/// A far node that fits is upgraded even if the near one does not.
#[test]
fn test_upgrade_skips_to_smaller_step() {
  let mut inst = instance(&[(&[500, 50], 1, 1.0), (&[100, 50], 1, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 160, 10.0);

  assert_eq!(lods(&inst), vec![1, 0]);
  assert_eq!(stats.final_splats, 150);
}

/// Instance ranges are respected per instance.
#[test]
fn test_per_instance_ranges() {
  let mut pinned = instance(&[(&[200, 50, 10], 1, 9.0)], 1, 1);
  let mut free = instance(&[(&[200, 50, 10], 0, 1.0)], 0, 2);
  let mut balancer = BudgetBalancer::new();

  balancer.balance([&mut pinned, &mut free], 60, 10.0);

  assert_eq!(lods(&pinned), vec![1], "Range [1, 1] cannot move");
  assert_eq!(lods(&free), vec![2]);
}

/// Nodes with fewer LOD levels than range_max stop at their coarsest level.
#[test]
fn test_short_lod_list_caps_degrade() {
  let mut inst = instance(&[(&[100, 50], 0, 9.0), (&[100, 50, 25, 10], 0, 1.0)], 0, 3);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 0, 10.0);

  assert_eq!(lods(&inst), vec![1, 3]);
  assert_eq!(stats.final_splats, 60);
}

/// Instances held in a placement map are balanced together.
#[test]
fn test_balance_map_spans_instances() {
  let mut map = HashMap::new();
  map.insert("near", instance(&[(&[200, 50], 0, 1.0)], 0, 1));
  map.insert("far", instance(&[(&[200, 50], 0, 9.0)], 0, 1));
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance_map(&mut map, 250, 10.0);

  assert_eq!(stats.nodes_considered, 2);
  assert_eq!(lods(&map["near"]), vec![0]);
  assert_eq!(lods(&map["far"]), vec![1]);
}

/// With identical nodes, the nearer one never ends coarser than the farther.
#[test]
fn test_priority_ordering_three_nodes() {
  let mut inst = instance(
    &[
      (&[400, 200, 100], 0, 2.0),
      (&[400, 200, 100], 0, 30.0),
      (&[400, 200, 100], 0, 90.0),
    ],
    0,
    2,
  );
  let mut balancer = BudgetBalancer::new();

  // 1200 -> 800 needs two steps: the two farthest nodes give one LOD each
  balancer.balance([&mut inst], 800, 100.0);

  let result = lods(&inst);
  assert_eq!(result, vec![0, 1, 1]);
  assert!(result[0] <= result[1] && result[1] <= result[2]);
}

/// Reusing a balancer across calls with different scenes leaves no stale
/// bucket entries behind.
#[test]
fn test_buckets_cleared_between_calls() {
  let mut balancer = BudgetBalancer::new();
  let mut big = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 0, 9.0)], 0, 1);
  balancer.balance([&mut big], 100, 10.0);

  let mut small = instance(&[(&[200, 50], 0, 5.0)], 0, 1);
  let stats = balancer.balance([&mut small], 50, 10.0);

  assert_eq!(stats.nodes_considered, 1);
  assert_eq!(lods(&small), vec![1]);
}

// =========================================================================
// Bucketing
// =========================================================================

#[test]
fn test_bucket_square_root_mapping() {
  let balancer = BudgetBalancer::new();
  // sqrt(64) = 8, so scale = 64 / 8 = 8 per sqrt-unit
  assert_eq!(balancer.bucket_for_distance(0.0, 64.0), 0);
  assert_eq!(balancer.bucket_for_distance(1.0, 64.0), 8);
  assert_eq!(balancer.bucket_for_distance(4.0, 64.0), 16);
  assert_eq!(balancer.bucket_for_distance(16.0, 64.0), 32);
}

#[test]
fn test_bucket_clamps_to_last() {
  let balancer = BudgetBalancer::new();
  assert_eq!(balancer.bucket_for_distance(64.0, 64.0), 63);
  assert_eq!(balancer.bucket_for_distance(1000.0, 64.0), 63);
  assert_eq!(balancer.bucket_for_distance(f32::INFINITY, 64.0), 63);
  assert_eq!(balancer.bucket_for_distance(f32::NAN, 64.0), 63);
}

#[test]
fn test_bucket_negative_distance_is_nearest() {
  let balancer = BudgetBalancer::new();
  assert_eq!(balancer.bucket_for_distance(-5.0, 64.0), 0);
}

#[test]
fn test_bucket_without_max_distance_is_zero() {
  let balancer = BudgetBalancer::new();
  assert_eq!(balancer.bucket_for_distance(50.0, 0.0), 0);
  assert_eq!(balancer.bucket_for_distance(50.0, -1.0), 0);
  assert_eq!(balancer.bucket_for_distance(50.0, f32::NAN), 0);
}

/// Zero max distance still balances, just without distance priority.
#[test]
fn test_zero_max_distance_still_balances() {
  let mut inst = instance(&[(&[200, 50], 0, 1.0), (&[200, 50], 0, 9.0)], 0, 1);
  let mut balancer = BudgetBalancer::new();

  let stats = balancer.balance([&mut inst], 250, 0.0);

  // Single shared bucket: input order decides
  assert_eq!(stats.final_splats, 250);
  assert_eq!(lods(&inst), vec![1, 0]);
}

#[test]
fn test_custom_bucket_count() {
  let balancer = BudgetBalancer::with_config(BalancerConfig { num_buckets: 4 });
  assert_eq!(balancer.num_buckets(), 4);
  assert_eq!(balancer.bucket_for_distance(1.0, 16.0), 1);
  assert_eq!(balancer.bucket_for_distance(16.0, 16.0), 3);
}

// =========================================================================
// Randomized scenes
// =========================================================================

fn random_counts(rng: &mut StdRng, levels: usize) -> Vec<u32> {
  let mut count = rng.random_range(1..5000u32);
  let mut counts = Vec::with_capacity(levels);
  for _ in 0..levels {
    counts.push(count);
    count = rng.random_range(0..=count);
  }
  counts
}

fn random_instance(rng: &mut StdRng) -> OctreeInstance {
  let levels = rng.random_range(1..=5usize);
  let node_count = rng.random_range(1..=20usize);
  let nodes: Vec<OctreeNode> = (0..node_count)
    .map(|_| {
      let node_levels = rng.random_range(1..=levels);
      OctreeNode::from_counts(Aabb::new(Vec3::ZERO, Vec3::ONE), &random_counts(rng, node_levels))
    })
    .collect();
  let octree = Arc::new(Octree::new(nodes).unwrap());
  let lod_levels = octree.lod_levels() as i32;

  let range_min = rng.random_range(0..lod_levels);
  let range_max = rng.random_range(range_min..lod_levels);
  let mut inst = OctreeInstance::new(octree, range_min, range_max).unwrap();

  let coarsest: Vec<i32> = inst.nodes().iter().map(|n| inst.max_lod_for(n)).collect();
  for (info, max_lod) in inst.node_infos_mut().iter_mut().zip(coarsest) {
    let lod = if rng.random_bool(0.1) {
      NodeInfo::EXCLUDED
    } else {
      let hi = max_lod.max(range_min);
      rng.random_range(range_min..=hi).min(max_lod.max(0))
    };
    *info = NodeInfo::new(lod, rng.random_range(0.0..100.0));
  }
  inst
}

/// Properties that must hold for any scene:
/// ranges respected, exclusions untouched, stats consistent, and the
/// algorithm stopped for a legitimate reason.
#[test]
fn test_random_scenes_hold_invariants() {
  let mut rng = StdRng::seed_from_u64(0x5EED_5A1A);
  let mut balancer = BudgetBalancer::new();

  for _ in 0..300 {
    let count = rng.random_range(1..=4usize);
    let mut instances: Vec<OctreeInstance> = (0..count).map(|_| random_instance(&mut rng)).collect();
    let before: Vec<Vec<i32>> = instances.iter().map(lods).collect();
    let pre_total: u64 = instances.iter().map(|i| i.selected_splats()).sum();
    let budget = rng.random_range(0..=pre_total * 2 + 1);

    let stats = balancer.balance(instances.iter_mut(), budget, 100.0);
    let post_total: u64 = instances.iter().map(|i| i.selected_splats()).sum();

    assert_eq!(stats.total_optimal_splats, pre_total);
    assert_eq!(stats.final_splats, post_total);

    for (inst, old) in instances.iter().zip(&before) {
      for ((node, info), &old_lod) in inst.nodes().iter().zip(inst.node_infos()).zip(old) {
        if old_lod < 0 {
          assert_eq!(info.optimal_lod, old_lod, "Excluded node changed");
          continue;
        }
        // Nodes whose own levels end below range_min can sit under it
        if old_lod >= inst.range_min() {
          assert!(info.optimal_lod >= inst.range_min());
        }
        assert!(info.optimal_lod <= inst.range_max().max(old_lod));
        assert!(info.optimal_lod <= node.coarsest_lod());
      }
    }

    match stats.direction {
      BalanceDirection::Satisfied => assert_eq!(pre_total, budget),
      BalanceDirection::Degrade => {
        assert!(post_total <= pre_total);
        if post_total > budget {
          // Only allowed when nothing can degrade further
          for inst in &instances {
            for (node, info) in inst.nodes().iter().zip(inst.node_infos()) {
              if info.is_included() {
                assert!(info.optimal_lod >= inst.max_lod_for(node));
              }
            }
          }
        }
      }
      BalanceDirection::Upgrade => {
        assert!(post_total >= pre_total);
        assert!(post_total <= budget, "Upgrade overshot the budget");
        if post_total < budget {
          // No remaining single step may fit
          for inst in &instances {
            for (node, info) in inst.nodes().iter().zip(inst.node_infos()) {
              if info.optimal_lod > inst.range_min() {
                let lod = info.optimal_lod as usize;
                let added = (node.count_at(lod - 1) - node.count_at(lod)) as u64;
                assert!(post_total + added > budget);
              }
            }
          }
        }
      }
    }
  }
}
