//! Offline splat budget simulator.
//!
//! Loads a TOML scene of synthetic splat octrees, flies a camera along a
//! straight path and runs the gsplat_lod frame pipeline (selection + budget
//! balancing) once per frame, printing how the splat total tracks the budget.

mod config;
mod scene;

use anyhow::Result;
use clap::Parser;
use gsplat_lod::{BalancerConfig, FrameStats, ManagerConfig, SplatLodManager};
use std::path::PathBuf;

use config::SceneConfig;

/// Splat budget simulator for gsplat_lod scenes.
#[derive(Parser, Debug)]
#[command(name = "budget_sim")]
#[command(about = "Runs splat LOD budgeting over a synthetic scene")]
struct Args {
	/// Path to scene TOML file.
	#[arg(short, long)]
	scene: PathBuf,

	/// Override the number of simulated frames.
	#[arg(short, long)]
	frames: Option<u32>,

	/// Override the splat budget (0 = unlimited).
	#[arg(short, long)]
	budget: Option<u64>,

	/// Only print the summary.
	#[arg(short, long)]
	quiet: bool,
}

fn main() -> Result<()> {
	let args = Args::parse();

	println!("Loading scene from: {}", args.scene.display());
	let config = SceneConfig::load(&args.scene)?;

	let frames = args.frames.unwrap_or(config.frames).max(1);
	let budget = args.budget.unwrap_or(config.budget);

	let instances = scene::build_instances(&config)?;
	let node_count: usize = instances.iter().map(|i| i.nodes().len()).sum();
	println!(
		"Simulating {} instances ({} nodes) for {} frames, budget {}",
		instances.len(),
		node_count,
		frames,
		format_budget(budget)
	);

	let mut manager = SplatLodManager::new(ManagerConfig {
		splat_budget: budget,
	})
	.with_balancer_config(BalancerConfig {
		num_buckets: config.num_buckets,
	})
	.with_selection(scene::selection(&config.selection));
	for instance in instances {
		manager.add_instance(instance);
	}

	if !args.quiet {
		println!(
			"\n{:>5}  {:>12}  {:>9}  {:>7}  {:>10}  lods",
			"frame", "splats", "visible", "passes", "max dist"
		);
	}

	let mut over_budget_frames = 0u32;
	for frame in 0..frames {
		let camera = scene::camera_at(&config.camera, frame, frames);
		let stats = manager.update(&camera);

		if budget > 0 && stats.total_splats > budget {
			over_budget_frames += 1;
		}
		if !args.quiet {
			print_frame(frame, &stats);
		}
	}

	let metrics = manager.metrics();
	println!("\nSummary:");
	println!("  frames:            {}", metrics.total_frames);
	println!("  degraded frames:   {}", metrics.degraded_frames);
	println!("  upgraded frames:   {}", metrics.upgraded_frames);
	println!("  over budget:       {}", over_budget_frames);
	println!("  avg select time:   {:.1} us", metrics.avg_select_timing_us());
	println!("  avg balance time:  {:.1} us", metrics.avg_balance_timing_us());
	if let Some((min, max)) = metrics.splat_totals.min_max() {
		println!("  splats (min/max):  {} / {}", min, max);
	}
	if budget > 0 {
		println!(
			"  last utilization:  {:.1}%",
			metrics.budget_utilization() * 100.0
		);
	}

	Ok(())
}

fn print_frame(frame: u32, stats: &FrameStats) {
	let passes = stats
		.balance
		.map(|b| b.passes.to_string())
		.unwrap_or_else(|| "-".to_string());

	// Compact histogram: trailing empty LODs dropped
	let used = stats
		.nodes_per_lod
		.iter()
		.rposition(|&n| n > 0)
		.map_or(0, |last| last + 1);
	let lods = stats.nodes_per_lod[..used]
		.iter()
		.map(|n| n.to_string())
		.collect::<Vec<_>>()
		.join("/");

	println!(
		"{:>5}  {:>12}  {:>9}  {:>7}  {:>10.1}  {}",
		frame, stats.total_splats, stats.visible_nodes, passes, stats.global_max_distance, lods
	);
}

fn format_budget(budget: u64) -> String {
	if budget == 0 {
		"unlimited".to_string()
	} else {
		budget.to_string()
	}
}
