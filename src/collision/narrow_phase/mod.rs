//! Narrow-phase contact generation.
//!
//! Every routine appends at most the contacts it finds to a [`CollisionData`]
//! pool and returns how many it wrote. A full pool is not an error: the
//! routine simply writes nothing more.

mod box_box;
mod primitives;

use crate::collision::contact::{BodyHandle, CollisionData};
use crate::dynamics::RigidBody;
use crate::geometry::{Plane, Shape};
use crate::math::{Mat34, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which candidate axes the box-box test examines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SeparatingAxes {
    /// Three face axes per box plus the nine edge-edge cross products
    #[default]
    Full,
    /// Only the local x and y face axes of each box.
    ///
    /// Enough for boxes that stay in the xy-plane and rotate about z. Boxes
    /// tilted out of that plane can be reported as touching when they are not.
    Planar,
}

/// A body paired with the shape it collides with
#[derive(Debug, Clone, Copy)]
pub struct Collider<'a, S = Shape> {
    pub handle: BodyHandle,
    pub body: &'a RigidBody,
    pub shape: &'a S,
}

impl<'a, S> Collider<'a, S> {
    pub fn new(handle: BodyHandle, body: &'a RigidBody, shape: &'a S) -> Self {
        Self { handle, body, shape }
    }

    #[inline]
    pub fn transform(&self) -> &Mat34 {
        self.body.transform()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    fn with_shape<'b, T>(&self, shape: &'b T) -> Collider<'b, T>
    where
        'a: 'b,
    {
        Collider::new(self.handle, self.body, shape)
    }
}

/// Generates contacts between pairs of bodies and against scenery planes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionDetector {
    pub axes: SeparatingAxes,
}

impl CollisionDetector {
    pub fn new(axes: SeparatingAxes) -> Self {
        Self { axes }
    }

    /// Dispatches on the pair of shapes and returns the number of contacts written.
    pub fn collide(&self, a: Collider<'_>, b: Collider<'_>, data: &mut CollisionData) -> usize {
        match (a.shape, b.shape) {
            (Shape::Box(box_a), Shape::Box(box_b)) => {
                self.box_box(a.with_shape(box_a), b.with_shape(box_b), data)
            }
            (Shape::Box(cuboid), Shape::Sphere(sphere)) => {
                self.box_sphere(a.with_shape(cuboid), b.with_shape(sphere), data)
            }
            (Shape::Sphere(sphere), Shape::Box(cuboid)) => {
                self.box_sphere(b.with_shape(cuboid), a.with_shape(sphere), data)
            }
            (Shape::Sphere(sa), Shape::Sphere(sb)) => {
                self.sphere_sphere(a.with_shape(sa), b.with_shape(sb), data)
            }
        }
    }

    /// Contacts between a body and a scenery plane
    pub fn collide_plane(&self, a: Collider<'_>, plane: &Plane, data: &mut CollisionData) -> usize {
        match a.shape {
            Shape::Box(cuboid) => self.box_plane(a.with_shape(cuboid), plane, data),
            Shape::Sphere(sphere) => self.sphere_plane(a.with_shape(sphere), plane, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ContactBodies;

    #[test]
    fn test_collide_dispatches_sphere_box() {
        let ball = Shape::sphere(0.5);
        let cuboid = Shape::cuboid(Vec3::splat(1.0));
        let a = RigidBody::new().with_position(Vec3::new(0.0, 1.25, 0.0));
        let b = RigidBody::new();

        let mut data = CollisionData::new(4);
        let n = CollisionDetector::default().collide(
            Collider::new(BodyHandle::new(0), &a, &ball),
            Collider::new(BodyHandle::new(1), &b, &cuboid),
            &mut data,
        );

        assert_eq!(n, 1);
        let c = &data.contacts()[0];
        // The sphere stays first so the normal points toward it
        assert_eq!(c.bodies(), ContactBodies::Two(BodyHandle::new(0), BodyHandle::new(1)));
        assert!(c.normal().y > 0.99);
    }

    #[test]
    fn test_collide_plane_dispatch() {
        let cuboid = Shape::cuboid(Vec3::splat(0.5));
        let ball = Shape::sphere(0.5);
        let body = RigidBody::new().with_position(Vec3::new(0.0, 0.4, 0.0));
        let plane = Plane::ground(0.0);

        let detector = CollisionDetector::default();
        let mut data = CollisionData::new(16);
        assert_eq!(
            detector.collide_plane(
                Collider::new(BodyHandle::new(0), &body, &cuboid),
                &plane,
                &mut data,
            ),
            4,
        );
        assert_eq!(
            detector.collide_plane(
                Collider::new(BodyHandle::new(1), &body, &ball),
                &plane,
                &mut data,
            ),
            1,
        );
    }

    #[test]
    fn test_default_axes_are_full() {
        assert_eq!(CollisionDetector::default().axes, SeparatingAxes::Full);
    }
}
