//! gsplat_lod - Framework/engine independent LOD budgeting for gaussian splats
//!
//! This crate selects a level of detail for every node of every placed
//! gaussian-splat octree so that the total splat count stays within a global
//! budget, while nodes close to the camera keep as much detail as possible.
//!
//! # Features
//!
//! - **LOD Selection**: Per-node camera distance and desired LOD from
//!   distance thresholds, clamped to each instance's LOD range
//! - **Budget Balancing**: Bucketed greedy degrade/upgrade passes that pull
//!   the selected splat total onto the budget, farthest nodes shed first
//! - **Frame Manager**: Owns placed instances and runs selection + balancing
//!   once per frame
//!
//! # Example
//!
//! ```ignore
//! use gsplat_lod::{Camera, LodLevel, Octree, OctreeInstance, OctreeNode, SplatLodManager};
//!
//! let octree = Arc::new(Octree::new(nodes)?);
//! let mut manager = SplatLodManager::with_budget(2_000_000);
//! manager.add_instance(OctreeInstance::new(octree, 0, 3)?);
//!
//! // Once per frame
//! let stats = manager.update(&Camera::new(position, forward));
//! println!("{} splats selected", stats.total_splats);
//! ```

// Octree data model: LOD levels, nodes, shared octrees, placed instances
pub mod octree;
pub use octree::{Aabb, LodLevel, NodeInfo, Octree, OctreeError, OctreeInstance, OctreeNode};

// Splat budget balancer
pub mod budget;
pub use budget::{BalanceDirection, BalanceStats, BalancerConfig, BudgetBalancer};

// Distance evaluation and desired LOD selection
pub mod selection;
pub use selection::{Camera, LodSelectConfig};

// Per-frame driver over all placed instances
pub mod manager;
pub use manager::{FrameStats, ManagerConfig, PlacementId, SplatLodManager};

pub mod metrics;
