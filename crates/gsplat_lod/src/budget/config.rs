//! Balancer configuration.

/// Configuration for [`BudgetBalancer`](super::BudgetBalancer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalancerConfig {
	/// Number of distance buckets. Bucket 0 holds the nearest nodes.
	/// More buckets = finer priority ordering, slightly more per-pass overhead.
	pub num_buckets: usize,
}

impl BalancerConfig {
	/// Default bucket count.
	pub const DEFAULT: Self = Self { num_buckets: 64 };

	/// Single bucket: no distance prioritization, nodes adjust in input order.
	pub const UNORDERED: Self = Self { num_buckets: 1 };

	/// Bucket count with a floor of one bucket.
	#[inline]
	pub fn bucket_count(&self) -> usize {
		self.num_buckets.max(1)
	}
}

impl Default for BalancerConfig {
	fn default() -> Self {
		Self::DEFAULT
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config() {
		let config = BalancerConfig::default();
		assert_eq!(config.num_buckets, 64);
		assert_eq!(config.bucket_count(), 64);
	}

	#[test]
	fn test_zero_buckets_floors_to_one() {
		let config = BalancerConfig { num_buckets: 0 };
		assert_eq!(config.bucket_count(), 1);
	}
}
