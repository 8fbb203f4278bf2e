//! Splat budget benchmarks.
//!
//! Measures the per-frame cost of the LOD pipeline on synthetic scenes:
//! - **balance**: balancer alone, over budget (degrade) and under (upgrade)
//! - **select**: distance evaluation for every node of every instance
//! - **frame**: full manager update (select + balance + collect)
//!
//! Scenes are grids of octree nodes with 5 LODs, each level ~1/4 the
//! splats of the previous one, placed several times along +Z.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Affine3A, Vec3};
use gsplat_lod::{
  selection::evaluate_instance, Aabb, BudgetBalancer, Camera, LodSelectConfig, Octree,
  OctreeInstance, OctreeNode, SplatLodManager,
};

// =============================================================================
// Synthetic scenes
// =============================================================================

/// `side`³ grid of unit nodes.
fn grid_octree(side: u32) -> Arc<Octree> {
  let mut nodes = Vec::with_capacity((side * side * side) as usize);
  for x in 0..side {
    for y in 0..side {
      for z in 0..side {
        let min = Vec3::new(x as f32, y as f32, z as f32);
        // Vary density a little so buckets are not uniform
        let base = 4096 + ((x * 31 + y * 17 + z * 7) % 1024) * 4;
        let counts = [base, base / 4, base / 16, base / 64, base / 256];
        nodes.push(OctreeNode::from_counts(Aabb::new(min, min + Vec3::ONE), &counts));
      }
    }
  }
  Arc::new(Octree::new(nodes).expect("synthetic octree is valid"))
}

fn placed_instances(octree: &Arc<Octree>, count: usize, spacing: f32) -> Vec<OctreeInstance> {
  (0..count)
    .map(|i| {
      let mut inst = OctreeInstance::with_full_range(octree.clone()).expect("full range is valid");
      inst.set_transform(Affine3A::from_translation(Vec3::new(0.0, 0.0, i as f32 * spacing)));
      inst
    })
    .collect()
}

fn camera() -> Camera {
  Camera::new(Vec3::new(8.0, 8.0, -4.0), Vec3::Z)
}

/// Instances with node infos already filled by selection.
fn evaluated_scene(side: u32, count: usize) -> (Vec<OctreeInstance>, f32, u64) {
  let octree = grid_octree(side);
  let mut instances = placed_instances(&octree, count, side as f32 * 2.0);
  let config = LodSelectConfig::default();
  let max = instances
    .iter_mut()
    .map(|inst| evaluate_instance(inst, &camera(), &config))
    .fold(0.0, f32::max);
  let total: u64 = instances.iter().map(|i| i.selected_splats()).sum();
  (instances, max, total)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_balance(c: &mut Criterion) {
  let mut group = c.benchmark_group("balance");

  for &(side, count) in &[(8u32, 4usize), (16, 8)] {
    let (scene, max_distance, total) = evaluated_scene(side, count);
    let nodes = scene.iter().map(|i| i.nodes().len()).sum::<usize>();
    let mut balancer = BudgetBalancer::new();

    group.bench_with_input(BenchmarkId::new("degrade_half", nodes), &scene, |b, scene| {
      b.iter_batched(
        || scene.clone(),
        |mut instances| black_box(balancer.balance(instances.iter_mut(), total / 2, max_distance)),
        criterion::BatchSize::LargeInput,
      )
    });

    group.bench_with_input(BenchmarkId::new("upgrade_double", nodes), &scene, |b, scene| {
      b.iter_batched(
        || scene.clone(),
        |mut instances| black_box(balancer.balance(instances.iter_mut(), total * 2, max_distance)),
        criterion::BatchSize::LargeInput,
      )
    });
  }

  group.finish();
}

fn bench_select(c: &mut Criterion) {
  let mut group = c.benchmark_group("select");
  let octree = grid_octree(16);
  let mut instances = placed_instances(&octree, 8, 32.0);
  let config = LodSelectConfig::default();
  let camera = camera();

  group.bench_function("evaluate_8x4096", |b| {
    b.iter(|| {
      for inst in instances.iter_mut() {
        black_box(evaluate_instance(inst, &camera, &config));
      }
    })
  });

  group.finish();
}

fn bench_frame(c: &mut Criterion) {
  let mut group = c.benchmark_group("frame");
  let octree = grid_octree(16);
  let mut manager = SplatLodManager::with_budget(2_000_000);
  for inst in placed_instances(&octree, 8, 32.0) {
    manager.add_instance(inst);
  }
  let camera = camera();

  group.bench_function("update_8x4096", |b| b.iter(|| black_box(manager.update(&camera))));

  group.finish();
}

criterion_group!(balancing, bench_balance);
criterion_group!(pipeline, bench_select, bench_frame);

criterion_main!(balancing, pipeline);
