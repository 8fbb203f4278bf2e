//! SplatLodManager - per-frame LOD driver over all placed octree instances.
//!
//! Each `update` runs selection on every instance (in parallel), then one
//! global budget balance across all of them, then gathers frame statistics.
//! The selection written into each instance's node infos is what the
//! renderer draws this frame.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use web_time::Instant;

use crate::budget::{BalanceStats, BalancerConfig, BudgetBalancer};
use crate::metrics::{LodMetrics, MAX_TRACKED_LODS};
use crate::octree::OctreeInstance;
use crate::selection::{evaluate_instance, Camera, LodSelectConfig};

// =============================================================================
// PlacementId - unique identifier
// =============================================================================

/// Atomic counter for generating unique PlacementIds.
static PLACEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque placement identifier, the key of an instance in the manager.
///
/// Generated atomically - guaranteed unique within process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlacementId(u64);

impl PlacementId {
    /// Generate a new unique PlacementId.
    pub fn new() -> Self {
        Self(PLACEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for PlacementId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Configuration and per-frame output
// =============================================================================

/// Manager configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Global splat budget per frame. 0 = unlimited (balancing skipped).
    pub splat_budget: u64,
}

impl ManagerConfig {
    /// No budget: selection alone decides LODs.
    pub const UNLIMITED: Self = Self { splat_budget: 0 };
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

/// Statistics of one `update`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Nodes with a selected LOD.
    pub visible_nodes: usize,
    /// Splats drawn with the final selection.
    pub total_splats: u64,
    /// Node count per selected LOD (LODs past the last slot are folded in).
    pub nodes_per_lod: [u32; MAX_TRACKED_LODS],
    /// Splat count per selected LOD.
    pub splats_per_lod: [u64; MAX_TRACKED_LODS],
    /// Largest world distance among visible nodes.
    pub global_max_distance: f32,
    /// Balancer statistics, `None` when the budget is unlimited.
    pub balance: Option<BalanceStats>,
}

impl FrameStats {
    fn collect<'a>(instances: impl Iterator<Item = &'a OctreeInstance>) -> Self {
        let mut stats = Self::default();
        for inst in instances {
            for (node, info) in inst.nodes().iter().zip(inst.node_infos()) {
                if !info.is_included() {
                    continue;
                }
                let lod = info.optimal_lod as usize;
                let count = node.count_at(lod) as u64;
                let slot = lod.min(MAX_TRACKED_LODS - 1);
                stats.visible_nodes += 1;
                stats.total_splats += count;
                stats.nodes_per_lod[slot] += 1;
                stats.splats_per_lod[slot] += count;
            }
        }
        stats
    }
}

// =============================================================================
// SplatLodManager
// =============================================================================

/// Owner of all placed instances and the per-frame LOD pipeline.
pub struct SplatLodManager {
    instances: HashMap<PlacementId, OctreeInstance>,
    balancer: BudgetBalancer,
    selection: LodSelectConfig,
    config: ManagerConfig,
    metrics: LodMetrics,
}

impl SplatLodManager {
    /// Create a manager with default selection and balancer settings.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            instances: HashMap::new(),
            balancer: BudgetBalancer::new(),
            selection: LodSelectConfig::default(),
            config,
            metrics: LodMetrics::new(),
        }
    }

    /// Create a manager with the given splat budget.
    pub fn with_budget(splat_budget: u64) -> Self {
        Self::new(ManagerConfig { splat_budget })
    }

    /// Replace the balancer configuration.
    pub fn with_balancer_config(mut self, config: BalancerConfig) -> Self {
        self.balancer = BudgetBalancer::with_config(config);
        self
    }

    /// Replace the selection configuration.
    pub fn with_selection(mut self, selection: LodSelectConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Place an instance; returns its key.
    pub fn add_instance(&mut self, instance: OctreeInstance) -> PlacementId {
        let id = PlacementId::new();
        self.instances.insert(id, instance);
        id
    }

    /// Remove a placed instance.
    pub fn remove_instance(&mut self, id: PlacementId) -> Option<OctreeInstance> {
        self.instances.remove(&id)
    }

    /// Look up a placed instance.
    pub fn instance(&self, id: PlacementId) -> Option<&OctreeInstance> {
        self.instances.get(&id)
    }

    /// Look up a placed instance mutably (transform / range changes).
    pub fn instance_mut(&mut self, id: PlacementId) -> Option<&mut OctreeInstance> {
        self.instances.get_mut(&id)
    }

    /// Iterate over placed instances.
    pub fn instances(&self) -> impl Iterator<Item = (&PlacementId, &OctreeInstance)> {
        self.instances.iter()
    }

    /// Number of placed instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if no instances are placed.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Current splat budget (0 = unlimited).
    pub fn budget(&self) -> u64 {
        self.config.splat_budget
    }

    /// Change the splat budget; applies from the next `update`.
    pub fn set_budget(&mut self, splat_budget: u64) {
        self.config.splat_budget = splat_budget;
    }

    /// Selection configuration.
    pub fn selection(&self) -> &LodSelectConfig {
        &self.selection
    }

    /// Change the selection configuration.
    pub fn set_selection(&mut self, selection: LodSelectConfig) {
        self.selection = selection;
    }

    /// Collected metrics.
    pub fn metrics(&self) -> &LodMetrics {
        &self.metrics
    }

    /// Mutable metrics (reset, runtime inspection).
    pub fn metrics_mut(&mut self) -> &mut LodMetrics {
        &mut self.metrics
    }

    /// Run selection and budget balancing for the frame seen by `camera`.
    ///
    /// # Phases
    ///
    /// 1. **Select**: per-instance distances and desired LODs (parallel)
    /// 2. **Balance**: fit all instances to the global budget together
    /// 3. **Collect**: per-LOD node/splat totals
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "manager::update"))]
    pub fn update(&mut self, camera: &Camera) -> FrameStats {
        // Phase 1: Selection
        let global_max_distance = {
            #[cfg(feature = "tracing")]
            let _span = tracing::info_span!("select").entered();
            let start = Instant::now();
            let selection = &self.selection;
            let max = self
                .instances
                .par_iter_mut()
                .map(|(_, inst)| evaluate_instance(inst, camera, selection))
                .reduce(|| 0.0, f32::max);
            self.metrics
                .record_select_timing(start.elapsed().as_micros() as u64);
            max
        };

        // Phase 2: Balance
        let budget = self.config.splat_budget;
        let balance = if budget > 0 {
            #[cfg(feature = "tracing")]
            let _span = tracing::info_span!("balance").entered();
            let start = Instant::now();
            let stats = self
                .balancer
                .balance_map(&mut self.instances, budget, global_max_distance);
            self.metrics
                .record_balance_timing(start.elapsed().as_micros() as u64);
            Some(stats)
        } else {
            None
        };

        // Phase 3: Collect
        let mut frame = FrameStats::collect(self.instances.values());
        frame.global_max_distance = global_max_distance;
        frame.balance = balance;
        self.metrics.record_frame(&frame, budget);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            instances = self.instances.len(),
            visible = frame.visible_nodes,
            splats = frame.total_splats,
            budget,
            "splat lod frame"
        );

        frame
    }
}

impl Default for SplatLodManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
