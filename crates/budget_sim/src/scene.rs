//! Builds gsplat_lod octrees, instances and cameras from scene configuration.

use anyhow::{Context, Result};
use glam::{Affine3A, Vec3};
use gsplat_lod::{Aabb, Camera, LodSelectConfig, Octree, OctreeInstance, OctreeNode};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CameraConfig, InstanceConfig, OctreeConfig, SceneConfig, SelectionConfig};

/// Splat counts per LOD: `base_count * ratio^lod`, floored.
pub fn lod_counts(base_count: u32, ratio: f32, levels: u32) -> Vec<u32> {
	let mut counts = Vec::with_capacity(levels as usize);
	let mut count = base_count as f64;
	for _ in 0..levels {
		counts.push(count as u32);
		count *= ratio as f64;
	}
	counts
}

/// Build a grid octree asset.
pub fn build_octree(config: &OctreeConfig) -> Result<Octree> {
	let counts = lod_counts(config.base_count, config.lod_ratio, config.lod_levels);
	let [gx, gy, gz] = config.grid;
	let size = config.node_size;

	let mut nodes = Vec::with_capacity((gx * gy * gz) as usize);
	for x in 0..gx {
		for y in 0..gy {
			for z in 0..gz {
				let min = Vec3::new(x as f32, y as f32, z as f32) * size;
				nodes.push(OctreeNode::from_counts(
					Aabb::new(min, min + Vec3::splat(size)),
					&counts,
				));
			}
		}
	}

	Octree::new(nodes).with_context(|| format!("Building octree '{}'", config.name))
}

/// Place one instance of an already built octree.
pub fn build_instance(config: &InstanceConfig, octree: Arc<Octree>) -> Result<OctreeInstance> {
	let mut instance = match config.range {
		Some([min, max]) => OctreeInstance::new(octree, min, max),
		None => OctreeInstance::with_full_range(octree),
	}
	.with_context(|| format!("Placing octree '{}'", config.octree))?;

	instance.set_transform(Affine3A::from_scale_rotation_translation(
		Vec3::splat(config.scale),
		glam::Quat::IDENTITY,
		Vec3::from(config.translation),
	));
	Ok(instance)
}

/// All instances of a scene, octrees shared between placements.
pub fn build_instances(config: &SceneConfig) -> Result<Vec<OctreeInstance>> {
	let mut octrees = HashMap::new();
	for octree in &config.octrees {
		octrees.insert(octree.name.as_str(), Arc::new(build_octree(octree)?));
	}

	config
		.instances
		.iter()
		.map(|instance| {
			let octree = octrees
				.get(instance.octree.as_str())
				.with_context(|| format!("Unknown octree '{}'", instance.octree))?;
			build_instance(instance, octree.clone())
		})
		.collect()
}

/// Selection config from scene settings.
pub fn selection(config: &SelectionConfig) -> LodSelectConfig {
	LodSelectConfig::with_distances(config.lod_distances.clone(), config.behind_penalty)
}

/// Camera for `frame` of `frames`, linearly interpolated along the path.
pub fn camera_at(config: &CameraConfig, frame: u32, frames: u32) -> Camera {
	let t = if frames > 1 {
		frame as f32 / (frames - 1) as f32
	} else {
		0.0
	};
	let position = Vec3::from(config.start).lerp(Vec3::from(config.end), t);
	Camera::new(position, Vec3::from(config.forward))
}
