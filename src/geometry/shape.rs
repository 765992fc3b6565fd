use crate::math::{Mat3, Mat34, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;

/// Factor applied to the squared half-extents in the solid box inertia tensor.
///
/// `I_xx = BLOCK_INERTIA_FACTOR * m * (hy^2 + hz^2)`; with half-extents this is the
/// usual `m * (w^2 + h^2) / 12` on full sizes.
pub const BLOCK_INERTIA_FACTOR: f32 = 1.0 / 3.0;

/// Collision geometry attached to a body.
///
/// Shapes are immutable once created and read by the collision routines every step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Box(BoxShape),
    Sphere(Sphere),
}

impl Shape {
    #[inline]
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box(BoxShape::new(half_extents))
    }

    /// Box from edge lengths rather than half-extents.
    #[inline]
    pub fn cuboid_from_size(size: Vec3) -> Self {
        Self::Box(BoxShape::from_size(size))
    }

    #[inline]
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(Sphere::new(radius))
    }

    /// Body-space inertia tensor of a solid shape with the given mass
    #[inline]
    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        match self {
            Shape::Box(b) => b.inertia_tensor(mass),
            Shape::Sphere(s) => s.inertia_tensor(mass),
        }
    }

    /// World-space bounds of this shape under `transform`
    #[inline]
    pub fn world_aabb(&self, transform: &Mat34) -> Aabb {
        match self {
            Shape::Box(b) => b.world_aabb(transform),
            Shape::Sphere(s) => s.world_aabb(transform),
        }
    }
}

/// Oriented box, sized by half-extents along its local axes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxShape {
    pub half_extents: Vec3,
}

impl BoxShape {
    #[inline]
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    #[inline]
    pub fn from_size(size: Vec3) -> Self {
        Self::new(size * 0.5)
    }

    /// Diagonal inertia tensor of a solid box of mass `mass`
    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        let h = self.half_extents;
        let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
        Mat3::from_diagonal(Vec3::new(y2 + z2, x2 + z2, x2 + y2) * (BLOCK_INERTIA_FACTOR * mass))
    }

    /// Half the length of the box when projected onto `axis` (a world direction).
    #[inline]
    pub fn project_onto_axis(&self, transform: &Mat34, axis: Vec3) -> f32 {
        let h = self.half_extents;
        h.x * axis.dot(transform.axis(0)).abs()
            + h.y * axis.dot(transform.axis(1)).abs()
            + h.z * axis.dot(transform.axis(2)).abs()
    }

    /// The eight corners of the box in world space
    pub fn world_vertices(&self, transform: &Mat34) -> [Vec3; 8] {
        let h = self.half_extents;
        let mut vertices = [Vec3::ZERO; 8];
        for (i, v) in vertices.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 4 == 0 { -h.z } else { h.z },
            );
            *v = transform.transform_point(local);
        }
        vertices
    }

    /// Bounds of the rotated box: each world half-width sums the absolute axis projections.
    #[inline]
    pub fn world_aabb(&self, transform: &Mat34) -> Aabb {
        let [a, b, c] = transform.rotation.cols;
        let reach = Mat3::from_cols(a.abs(), b.abs(), c.abs()) * self.half_extents;
        Aabb::from_center_half_extents(transform.translation, reach)
    }
}

/// Ball of `radius` about the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sphere {
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        let i = (2.0 / 5.0) * mass * self.radius * self.radius;
        Mat3::from_diagonal(Vec3::splat(i))
    }

    #[inline]
    pub fn world_aabb(&self, transform: &Mat34) -> Aabb {
        Aabb::from_center_half_extents(transform.translation, Vec3::splat(self.radius))
    }
}

/// An immovable half-space used as scenery (floors, walls).
///
/// Points `p` with `p.dot(normal) < offset` are inside the solid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Unit normal pointing out of the solid
    pub normal: Vec3,
    /// Distance of the surface from the origin along `normal`
    pub offset: f32,
}

impl Plane {
    /// Creates a plane, normalizing `normal`
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize(),
            offset,
        }
    }

    /// A horizontal ground plane at height `y`
    pub fn ground(y: f32) -> Self {
        Self::new(Vec3::Y, y)
    }

    /// Signed distance of `point` above the surface
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        point.dot(self.normal) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_box_inertia_diagonal() {
        // factor * mass = 1
        let i = BoxShape::new(Vec3::new(3.0, 1.0, 2.0)).inertia_tensor(3.0);
        assert_relative_eq!(i.get(0, 0), 5.0, epsilon = 1e-5);
        assert_relative_eq!(i.get(1, 1), 13.0, epsilon = 1e-5);
        assert_relative_eq!(i.get(2, 2), 10.0, epsilon = 1e-5);
        assert_eq!(i.get(2, 0), 0.0);
    }

    #[test]
    fn test_box_inertia_from_edge_lengths() {
        let mass = 6.0;
        let i = Shape::cuboid_from_size(Vec3::new(2.0, 4.0, 6.0)).inertia_tensor(mass);
        assert_relative_eq!(i.get(1, 1), mass * (4.0 + 36.0) / 12.0, epsilon = 1e-4);
    }

    #[test]
    fn test_solid_sphere_inertia() {
        let i = Shape::sphere(0.5).inertia_tensor(10.0);
        assert_relative_eq!(i.get(1, 1), 1.0, epsilon = 1e-6);
        assert_eq!(i.get(0, 0), i.get(2, 2));
    }

    #[test]
    fn test_projection_follows_rotation() {
        let b = BoxShape::new(Vec3::new(0.5, 1.5, 2.5));
        let t = Mat34::IDENTITY;
        assert_relative_eq!(b.project_onto_axis(&t, Vec3::Y), 1.5, epsilon = 1e-6);
        assert_relative_eq!(b.project_onto_axis(&t, -Vec3::Z), 2.5, epsilon = 1e-6);

        let turned = Mat34::from_position_orientation(
            Vec3::ZERO,
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2),
        );
        assert_relative_eq!(b.project_onto_axis(&turned, Vec3::X), 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_vertices_span_the_box() {
        let b = BoxShape::new(Vec3::new(0.5, 0.25, 1.0));
        let t = Mat34::from_position_orientation(Vec3::new(2.0, 1.0, 0.0), Quat::IDENTITY);
        let vertices = b.world_vertices(&t);
        let min = vertices.iter().copied().fold(Vec3::splat(f32::INFINITY), Vec3::min);
        let max = vertices.iter().copied().fold(Vec3::splat(f32::NEG_INFINITY), Vec3::max);
        assert_eq!(min, Vec3::new(1.5, 0.75, -1.0));
        assert_eq!(max, Vec3::new(2.5, 1.25, 1.0));
    }

    #[test]
    fn test_turned_box_bounds_grow() {
        let shape = Shape::cuboid(Vec3::splat(1.0));
        let t = Mat34::from_position_orientation(
            Vec3::ZERO,
            Quat::from_axis_angle(Vec3::Y, FRAC_PI_4),
        );
        let aabb = shape.world_aabb(&t);
        assert_relative_eq!(aabb.max.x, 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.max.z, 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_signed_distance() {
        let wall = Plane::new(Vec3::new(2.0, 0.0, 0.0), -1.0);
        assert_eq!(wall.normal, Vec3::X);
        assert_relative_eq!(wall.distance(Vec3::new(0.5, 7.0, 3.0)), 1.5);
        assert!(Plane::ground(1.0).distance(Vec3::ZERO) < 0.0);
    }
}
