use crate::collision::contact::{CollisionData, ContactBodies};
use crate::geometry::{BoxShape, Plane, Sphere};
use crate::math::Vec3;

use super::{Collider, CollisionDetector};

impl CollisionDetector {
    /// Contact between two spheres; the normal points from `two` toward `one`.
    pub fn sphere_sphere(
        &self,
        one: Collider<'_, Sphere>,
        two: Collider<'_, Sphere>,
        data: &mut CollisionData,
    ) -> usize {
        if !data.has_more_contacts() {
            return 0;
        }

        let midline = one.position() - two.position();
        let distance = midline.length();
        let radii = one.shape.radius + two.shape.radius;
        let penetration = radii - distance;
        if penetration < -data.tolerance {
            return 0;
        }

        // Coincident centres have no preferred direction.
        let normal = if distance > 0.0 { midline / distance } else { Vec3::Y };
        let point = two.position() + normal * (two.shape.radius - penetration * 0.5);
        data.add(ContactBodies::Two(one.handle, two.handle), point, normal, penetration) as usize
    }

    /// Contact between a box and a sphere.
    ///
    /// The sphere is the first body of the contact, so the normal points from the
    /// box toward the sphere centre.
    pub fn box_sphere(
        &self,
        cuboid: Collider<'_, BoxShape>,
        sphere: Collider<'_, Sphere>,
        data: &mut CollisionData,
    ) -> usize {
        if !data.has_more_contacts() {
            return 0;
        }

        let radius = sphere.shape.radius;
        let half = cuboid.shape.half_extents;
        let centre = sphere.position();
        let local = cuboid.transform().transform_inverse_point(centre);

        let reach = radius + data.tolerance.max(0.0);
        if local.x.abs() - reach > half.x
            || local.y.abs() - reach > half.y
            || local.z.abs() - reach > half.z
        {
            return 0;
        }

        let closest = Vec3::new(
            local.x.clamp(-half.x, half.x),
            local.y.clamp(-half.y, half.y),
            local.z.clamp(-half.z, half.z),
        );
        let offset = local - closest;
        let dist_sq = offset.length_squared();
        let bodies = ContactBodies::Two(sphere.handle, cuboid.handle);

        if dist_sq > 0.0 {
            let dist = dist_sq.sqrt();
            let penetration = radius - dist;
            if penetration < -data.tolerance {
                return 0;
            }
            let point = cuboid.transform().transform_point(closest);
            let normal = cuboid.transform().transform_direction(offset / dist);
            return data.add(bodies, point, normal, penetration) as usize;
        }

        // Centre inside the box: push out through the nearest face.
        let mut min_depth = f32::MAX;
        let mut local_normal = Vec3::Y;
        for i in 0..3 {
            let depth_pos = half[i] - local[i];
            let depth_neg = half[i] + local[i];
            if depth_pos < min_depth {
                min_depth = depth_pos;
                local_normal = Vec3::ZERO;
                local_normal[i] = 1.0;
            }
            if depth_neg < min_depth {
                min_depth = depth_neg;
                local_normal = Vec3::ZERO;
                local_normal[i] = -1.0;
            }
        }

        let normal = cuboid.transform().transform_direction(local_normal);
        let point = centre + normal * min_depth;
        data.add(bodies, point, normal, min_depth + radius) as usize
    }

    /// One contact per box vertex below the plane surface.
    pub fn box_plane(
        &self,
        cuboid: Collider<'_, BoxShape>,
        plane: &Plane,
        data: &mut CollisionData,
    ) -> usize {
        if !data.has_more_contacts() {
            return 0;
        }

        let reach = cuboid.shape.project_onto_axis(cuboid.transform(), plane.normal);
        if plane.distance(cuboid.position()) - reach > data.tolerance {
            return 0;
        }

        let mut written = 0;
        for vertex in cuboid.shape.world_vertices(cuboid.transform()) {
            let penetration = -plane.distance(vertex);
            if penetration < -data.tolerance {
                continue;
            }
            // Midway between the vertex and its projection onto the surface.
            let point = vertex + plane.normal * (penetration * 0.5);
            if !data.add(ContactBodies::One(cuboid.handle), point, plane.normal, penetration) {
                break;
            }
            written += 1;
        }
        written
    }

    /// Contact between a sphere and a plane.
    pub fn sphere_plane(
        &self,
        sphere: Collider<'_, Sphere>,
        plane: &Plane,
        data: &mut CollisionData,
    ) -> usize {
        if !data.has_more_contacts() {
            return 0;
        }

        let distance = plane.distance(sphere.position());
        let penetration = sphere.shape.radius - distance;
        if penetration < -data.tolerance {
            return 0;
        }

        let point = sphere.position() - plane.normal * distance;
        data.add(ContactBodies::One(sphere.handle), point, plane.normal, penetration) as usize
    }
}
