//! Engine-agnostic metrics collection for splat LOD statistics.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use gsplat_lod::metrics::{LodMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // The manager records every frame; read it back for UI:
//! let metrics = manager.metrics();
//! println!("{:.1}% of budget", metrics.budget_utilization() * 100.0);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::manager::FrameStats;

/// Number of LOD slots tracked per frame; deeper LODs share the last slot.
pub const MAX_TRACKED_LODS: usize = 16;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Create a new rolling window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    /// Get the number of values in the window.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear all values.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Get the most recent value.
    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
    /// Compute the sum of all values.
    pub fn sum(&self) -> T {
        self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
    }
}

impl RollingWindow<u64> {
    /// Compute the average of all values.
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    /// Get min and max values.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = self.buffer.iter().min()?;
        let max = self.buffer.iter().max()?;
        Some((*min, *max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60fps
    }
}

/// Splat LOD statistics updated each frame.
#[derive(Debug, Clone)]
pub struct LodMetrics {
    // LOD distribution (last frame)
    /// Visible nodes at each LOD (index = LOD).
    pub nodes_per_lod: [u32; MAX_TRACKED_LODS],
    /// Splats drawn at each LOD.
    pub splats_per_lod: [u64; MAX_TRACKED_LODS],

    // Budget (last frame)
    /// Nodes with a selected LOD.
    pub visible_nodes: u32,
    /// Splats drawn.
    pub total_splats: u64,
    /// Budget in effect (0 = unlimited).
    pub budget: u64,

    // Timing
    /// Rolling window of selection times in microseconds.
    pub select_timings: RollingWindow<u64>,
    /// Rolling window of balance times in microseconds.
    pub balance_timings: RollingWindow<u64>,
    /// Rolling window of per-frame splat totals.
    pub splat_totals: RollingWindow<u64>,

    // Last frame snapshot (for UI)
    /// Last selection time in microseconds.
    pub last_select_us: u64,
    /// Last balance time in microseconds.
    pub last_balance_us: u64,

    // Cumulative
    /// Frames recorded this session.
    pub total_frames: u64,
    /// Frames where the balancer had to degrade.
    pub degraded_frames: u64,
    /// Frames where the balancer upgraded.
    pub upgraded_frames: u64,
}

impl Default for LodMetrics {
    fn default() -> Self {
        Self {
            nodes_per_lod: [0; MAX_TRACKED_LODS],
            splats_per_lod: [0; MAX_TRACKED_LODS],
            visible_nodes: 0,
            total_splats: 0,
            budget: 0,
            select_timings: RollingWindow::new(128),
            balance_timings: RollingWindow::new(128),
            splat_totals: RollingWindow::new(128),
            last_select_us: 0,
            last_balance_us: 0,
            total_frames: 0,
            degraded_frames: 0,
            upgraded_frames: 0,
        }
    }
}

impl LodMetrics {
    /// Create new metrics with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all per-frame and timing metrics.
    pub fn reset(&mut self) {
        self.nodes_per_lod.fill(0);
        self.splats_per_lod.fill(0);
        self.visible_nodes = 0;
        self.total_splats = 0;
        self.budget = 0;
        self.select_timings.clear();
        self.balance_timings.clear();
        self.splat_totals.clear();
        self.last_select_us = 0;
        self.last_balance_us = 0;
        // Frame counters are cumulative
    }

    /// Record a selection timing.
    pub fn record_select_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.select_timings.push(timing_us);
            self.last_select_us = timing_us;
        }
    }

    /// Record a balance timing.
    pub fn record_balance_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.balance_timings.push(timing_us);
            self.last_balance_us = timing_us;
        }
    }

    /// Record the outcome of a frame.
    pub fn record_frame(&mut self, frame: &FrameStats, budget: u64) {
        if !is_enabled() {
            return;
        }

        self.nodes_per_lod = frame.nodes_per_lod;
        self.splats_per_lod = frame.splats_per_lod;
        self.visible_nodes = frame.visible_nodes as u32;
        self.total_splats = frame.total_splats;
        self.budget = budget;
        self.splat_totals.push(frame.total_splats);

        self.total_frames += 1;
        if let Some(balance) = &frame.balance {
            if balance.degraded_steps > 0 {
                self.degraded_frames += 1;
            }
            if balance.upgraded_steps > 0 {
                self.upgraded_frames += 1;
            }
        }
    }

    /// Fraction of the budget used last frame (0 when unlimited).
    pub fn budget_utilization(&self) -> f64 {
        if self.budget == 0 {
            0.0
        } else {
            self.total_splats as f64 / self.budget as f64
        }
    }

    /// Average selected LOD of last frame's visible nodes.
    pub fn mean_lod(&self) -> f64 {
        let nodes: u32 = self.nodes_per_lod.iter().sum();
        if nodes == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .nodes_per_lod
            .iter()
            .enumerate()
            .map(|(lod, &n)| lod as u64 * n as u64)
            .sum();
        weighted as f64 / nodes as f64
    }

    /// Get average selection timing in microseconds.
    pub fn avg_select_timing_us(&self) -> f64 {
        self.select_timings.average()
    }

    /// Get average balance timing in microseconds.
    pub fn avg_balance_timing_us(&self) -> f64 {
        self.balance_timings.average()
    }
}
