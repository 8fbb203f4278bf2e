//! LodLevel - splat count contributed by one detail level of a node.

/// One level of detail of an octree node.
///
/// Only the splat count matters for budgeting; the splat payload itself
/// lives with the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct LodLevel {
  /// Splats drawn when this level is selected.
  pub count: u32,
}

impl LodLevel {
  /// Create a level with the given splat count.
  #[inline]
  pub const fn new(count: u32) -> Self {
    Self { count }
  }
}

impl From<u32> for LodLevel {
  fn from(count: u32) -> Self {
    Self { count }
  }
}
