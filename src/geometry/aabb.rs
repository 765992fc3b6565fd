use crate::math::Vec3;

/// World-space axis-aligned bounds.
///
/// Box pairs are rejected on these before the separating axis test runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Grown by `margin` along every axis in both directions.
    #[inline]
    pub fn expanded(self, margin: f32) -> Self {
        let grow = Vec3::splat(margin);
        Self::new(self.min - grow, self.max + grow)
    }

    /// Overlap test. Boxes that only share a face still overlap.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_at(x: f32) -> Aabb {
        Aabb::from_center_half_extents(Vec3::new(x, 0.0, 0.0), Vec3::splat(0.5))
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = cube_at(0.0);
        let b = cube_at(0.6);
        let far = cube_at(2.5);

        assert!(a.intersects(b) && b.intersects(a));
        assert!(!a.intersects(far) && !far.intersects(a));
    }

    #[test]
    fn test_shared_face_overlaps() {
        assert!(cube_at(0.0).intersects(cube_at(1.0)));
    }

    #[test]
    fn test_separation_on_one_axis_is_enough() {
        let a = cube_at(0.0);
        let above = Aabb::from_center_half_extents(Vec3::new(0.0, 1.2, 0.0), Vec3::splat(0.5));
        assert!(!a.intersects(above));
    }

    #[test]
    fn test_expanded_keeps_center() {
        let a = cube_at(0.0);
        let gap = cube_at(1.05);
        assert!(!a.intersects(gap));

        let grown = a.expanded(0.1);
        assert!(grown.intersects(gap));
        assert_eq!(grown.center(), a.center());
        assert_eq!(grown.max, Vec3::splat(0.6));
    }
}
