//! Splat budget balancing.
//!
//! After selection picks a desired LOD per node, the total splat count can
//! land anywhere relative to the renderer's budget. [`BudgetBalancer`] pulls
//! it back onto the budget one LOD step at a time:
//!
//! 1. Over budget: **degrade** farthest nodes first ("load shedding")
//! 2. Under budget: **upgrade** nearest nodes first ("add detail"), never
//!    overshooting
//!
//! Nodes are grouped into distance buckets instead of sorted, so a frame's
//! cost is linear in node count.

pub mod balancer;
pub mod config;
pub mod stats;

// Re-exports
pub use balancer::BudgetBalancer;
pub use config::BalancerConfig;
pub use stats::{BalanceDirection, BalanceStats};
