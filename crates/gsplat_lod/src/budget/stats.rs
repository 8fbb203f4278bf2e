//! Statistics from one balance call.

/// Which way the balancer had to move the splat total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BalanceDirection {
	/// Total already matched the budget (or nothing was included).
	#[default]
	Satisfied,
	/// Over budget: nodes were pushed to coarser LODs.
	Degrade,
	/// Under budget: nodes were pulled to finer LODs.
	Upgrade,
}

/// Statistics from [`BudgetBalancer::balance`](super::BudgetBalancer::balance).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceStats {
	/// Nodes with `optimal_lod >= 0` that were bucketed.
	pub nodes_considered: usize,
	/// Splat total of the incoming selection.
	pub total_optimal_splats: u64,
	/// Splat total after balancing.
	pub final_splats: u64,
	/// Direction of adjustment.
	pub direction: BalanceDirection,
	/// Single-LOD degrade steps applied.
	pub degraded_steps: usize,
	/// Single-LOD upgrade steps applied.
	pub upgraded_steps: usize,
	/// Full bucket passes run.
	pub passes: usize,
}

impl BalanceStats {
	/// Total LOD steps applied in either direction.
	#[inline]
	pub fn total_steps(&self) -> usize {
		self.degraded_steps + self.upgraded_steps
	}

	/// Whether the balancer changed any node.
	#[inline]
	pub fn modified(&self) -> bool {
		self.total_steps() > 0
	}

	/// Whether the final total respects `budget` in the balanced direction.
	///
	/// Degrading is satisfied at or under budget, upgrading at or over.
	pub fn budget_met(&self, budget: u64) -> bool {
		match self.direction {
			BalanceDirection::Satisfied => self.final_splats == budget,
			BalanceDirection::Degrade => self.final_splats <= budget,
			BalanceDirection::Upgrade => self.final_splats >= budget,
		}
	}
}
