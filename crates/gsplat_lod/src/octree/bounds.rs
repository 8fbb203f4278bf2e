//! Axis-aligned bounding box for octree nodes.

use glam::{Affine3A, Vec3};

/// Single-precision axis-aligned bounding box.
///
/// Node bounds are stored in the octree's local space; instances transform
/// them into world space before measuring camera distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl Aabb {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: Vec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	/// Distance from a point to the closest point of the box.
	///
	/// Zero when the point is inside or on the boundary.
	#[inline]
	pub fn distance_to_point(&self, point: Vec3) -> f32 {
		let closest = point.clamp(self.min, self.max);
		point.distance(closest)
	}

	/// Bounds of this box after applying `transform`.
	///
	/// All 8 corners are transformed, so the result stays conservative under
	/// rotation.
	pub fn transformed(&self, transform: &Affine3A) -> Self {
		let mut min = Vec3::splat(f32::INFINITY);
		let mut max = Vec3::splat(f32::NEG_INFINITY);
		for corner in 0..8u8 {
			let local = Vec3::new(
				if corner & 1 == 0 { self.min.x } else { self.max.x },
				if corner & 2 == 0 { self.min.y } else { self.max.y },
				if corner & 4 == 0 { self.min.z } else { self.max.z },
			);
			let world = transform.transform_point3(local);
			min = min.min(world);
			max = max.max(world);
		}
		Self { min, max }
	}
}
