//! Scene configuration parsing for the budget simulator.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Root scene configuration.
#[derive(Debug, Deserialize)]
pub struct SceneConfig {
	/// Global splat budget per frame (0 = unlimited).
	#[serde(default)]
	pub budget: u64,
	/// Number of frames to simulate along the camera path.
	#[serde(default = "default_frames")]
	pub frames: u32,
	/// LOD selection thresholds.
	#[serde(default)]
	pub selection: SelectionConfig,
	/// Balancer bucket count.
	#[serde(default = "default_buckets")]
	pub num_buckets: usize,
	/// Synthetic octree assets.
	pub octrees: Vec<OctreeConfig>,
	/// Placements of those assets.
	pub instances: Vec<InstanceConfig>,
	/// Camera path.
	pub camera: CameraConfig,
}

/// LOD selection settings.
#[derive(Debug, Deserialize)]
pub struct SelectionConfig {
	/// Ascending distances at which each coarser LOD starts.
	#[serde(default = "default_lod_distances")]
	pub lod_distances: Vec<f32>,
	/// Distance multiplier for nodes behind the camera.
	#[serde(default = "default_behind_penalty")]
	pub behind_penalty: f32,
}

impl Default for SelectionConfig {
	fn default() -> Self {
		Self {
			lod_distances: default_lod_distances(),
			behind_penalty: default_behind_penalty(),
		}
	}
}

/// Synthetic octree: a regular grid of equally sized nodes.
#[derive(Debug, Deserialize)]
pub struct OctreeConfig {
	/// Name referenced by instances.
	pub name: String,
	/// Nodes per axis [X, Y, Z].
	pub grid: [u32; 3],
	/// Edge length of one node in local units.
	#[serde(default = "default_node_size")]
	pub node_size: f32,
	/// Splats per node at LOD 0.
	pub base_count: u32,
	/// Splat ratio between consecutive LODs (0.0-1.0).
	#[serde(default = "default_lod_ratio")]
	pub lod_ratio: f32,
	/// Number of LOD levels per node.
	#[serde(default = "default_lod_levels")]
	pub lod_levels: u32,
}

/// One placement of a named octree.
#[derive(Debug, Deserialize)]
pub struct InstanceConfig {
	/// Octree name.
	pub octree: String,
	/// World translation.
	#[serde(default)]
	pub translation: [f32; 3],
	/// Uniform scale.
	#[serde(default = "default_scale")]
	pub scale: f32,
	/// Permitted LOD range [min, max] (defaults to every level).
	pub range: Option<[i32; 2]>,
}

/// Linear camera path from `start` to `end`.
#[derive(Debug, Deserialize)]
pub struct CameraConfig {
	/// Position on the first frame.
	pub start: [f32; 3],
	/// Position on the last frame.
	pub end: [f32; 3],
	/// View direction (defaults to +Z).
	#[serde(default = "default_forward")]
	pub forward: [f32; 3],
}

fn default_frames() -> u32 {
	60
}

fn default_buckets() -> usize {
	64
}

fn default_lod_distances() -> Vec<f32> {
	vec![5.0, 10.0, 20.0, 40.0, 80.0, 160.0, 320.0, 640.0]
}

fn default_behind_penalty() -> f32 {
	1.0
}

fn default_node_size() -> f32 {
	1.0
}

fn default_lod_ratio() -> f32 {
	0.25
}

fn default_lod_levels() -> u32 {
	4
}

fn default_scale() -> f32 {
	1.0
}

fn default_forward() -> [f32; 3] {
	[0.0, 0.0, 1.0]
}

impl SceneConfig {
	/// Load scene configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scene file: {}", path.display()))?;
		let config: SceneConfig =
			toml::from_str(&content).with_context(|| "Failed to parse scene TOML")?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.octrees.is_empty() {
			anyhow::bail!("Scene must define at least one octree");
		}
		if self.frames == 0 {
			anyhow::bail!("frames must be at least 1");
		}

		let mut names = HashSet::new();
		for octree in &self.octrees {
			if !names.insert(octree.name.as_str()) {
				anyhow::bail!("Duplicate octree name '{}'", octree.name);
			}
			if octree.grid.iter().any(|&n| n == 0) {
				anyhow::bail!("Octree '{}' grid must be non-zero on every axis", octree.name);
			}
			if octree.lod_levels == 0 {
				anyhow::bail!("Octree '{}' needs at least one LOD level", octree.name);
			}
			if !(0.0..=1.0).contains(&octree.lod_ratio) {
				anyhow::bail!(
					"Octree '{}' lod_ratio must be within 0.0-1.0, got {}",
					octree.name,
					octree.lod_ratio
				);
			}
			if octree.node_size <= 0.0 {
				anyhow::bail!("Octree '{}' node_size must be positive", octree.name);
			}
		}

		for (index, instance) in self.instances.iter().enumerate() {
			if !names.contains(instance.octree.as_str()) {
				anyhow::bail!(
					"Instance {} references unknown octree '{}'",
					index,
					instance.octree
				);
			}
			if instance.scale <= 0.0 {
				anyhow::bail!("Instance {} scale must be positive", index);
			}
		}

		Ok(())
	}
}
