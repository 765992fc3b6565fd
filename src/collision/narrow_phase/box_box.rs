//! Separating axis test between two oriented boxes.

use crate::collision::contact::{CollisionData, ContactBodies};
use crate::geometry::BoxShape;
use crate::math::Vec3;

use super::{Collider, CollisionDetector, SeparatingAxes};

/// Axes shorter than this (squared) come from near-parallel edges and are skipped.
const MIN_AXIS_LENGTH_SQUARED: f32 = 0.0001;

/// Below this the two edges are treated as parallel when finding their closest points.
const PARALLEL_EDGE_EPSILON: f32 = 0.0001;

/// Running minimum over the candidate axes
struct AxisSearch {
    tolerance: f32,
    best_overlap: f32,
    best_case: Option<usize>,
}

impl AxisSearch {
    fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            best_overlap: f32::MAX,
            best_case: None,
        }
    }

    /// Tests one axis. Returns false if it separates the boxes.
    fn try_axis(
        &mut self,
        one: &Collider<'_, BoxShape>,
        two: &Collider<'_, BoxShape>,
        axis: Vec3,
        to_centre: Vec3,
        case: usize,
    ) -> bool {
        let Some(axis) = axis.try_normalize(MIN_AXIS_LENGTH_SQUARED) else {
            return true;
        };

        let overlap = penetration_on_axis(one, two, axis, to_centre);
        if overlap < -self.tolerance {
            return false;
        }
        if overlap < self.best_overlap {
            self.best_overlap = overlap;
            self.best_case = Some(case);
        }
        true
    }
}

/// Overlap of the two boxes' projections on a unit `axis`; negative when separated.
fn penetration_on_axis(
    one: &Collider<'_, BoxShape>,
    two: &Collider<'_, BoxShape>,
    axis: Vec3,
    to_centre: Vec3,
) -> f32 {
    let one_project = one.shape.project_onto_axis(one.transform(), axis);
    let two_project = two.shape.project_onto_axis(two.transform(), axis);
    let distance = to_centre.dot(axis).abs();
    one_project + two_project - distance
}

impl CollisionDetector {
    /// Generates at most one contact between two oriented boxes.
    ///
    /// Returns the number of contacts written. The normal points from `two` toward
    /// `one` unless the deepest feature is a vertex of `one`, in which case the bodies
    /// are swapped in the contact.
    pub fn box_box(
        &self,
        one: Collider<'_, BoxShape>,
        two: Collider<'_, BoxShape>,
        data: &mut CollisionData,
    ) -> usize {
        if !data.has_more_contacts() {
            return 0;
        }

        let one_aabb = one.shape.world_aabb(one.transform()).expanded(data.tolerance.max(0.0));
        let two_aabb = two.shape.world_aabb(two.transform());
        if !one_aabb.intersects(two_aabb) {
            return 0;
        }

        let to_centre = two.position() - one.position();
        let mut search = AxisSearch::new(data.tolerance);

        let face_axes: &[usize] = match self.axes {
            SeparatingAxes::Full => &[0, 1, 2],
            SeparatingAxes::Planar => &[0, 1],
        };

        for &i in face_axes {
            if !search.try_axis(&one, &two, one.transform().axis(i), to_centre, i) {
                return 0;
            }
        }
        for &i in face_axes {
            if !search.try_axis(&one, &two, two.transform().axis(i), to_centre, i + 3) {
                return 0;
            }
        }

        // Edge pairs only matter once the face axes have failed to separate the boxes.
        let best_single_axis = search.best_case;
        if self.axes == SeparatingAxes::Full {
            for i in 0..3 {
                for j in 0..3 {
                    let axis = one.transform().axis(i).cross(two.transform().axis(j));
                    if !search.try_axis(&one, &two, axis, to_centre, 6 + i * 3 + j) {
                        return 0;
                    }
                }
            }
        }

        let Some(best) = search.best_case else {
            return 0;
        };
        let penetration = search.best_overlap;

        match best {
            0..=2 => fill_point_face(&one, &two, to_centre, best, penetration, data),
            3..=5 => fill_point_face(&two, &one, -to_centre, best - 3, penetration, data),
            _ => {
                let edge = best - 6;
                let one_axis_index = edge / 3;
                let two_axis_index = edge % 3;
                let use_one = best_single_axis.is_some_and(|case| case > 2);
                fill_edge_edge(
                    &one,
                    &two,
                    to_centre,
                    one_axis_index,
                    two_axis_index,
                    use_one,
                    penetration,
                    data,
                )
            }
        }
    }
}

/// Contact for a vertex of `two` resting in a face of `one`.
fn fill_point_face(
    one: &Collider<'_, BoxShape>,
    two: &Collider<'_, BoxShape>,
    to_centre: Vec3,
    axis_index: usize,
    penetration: f32,
    data: &mut CollisionData,
) -> usize {
    let mut normal = one.transform().axis(axis_index);
    if normal.dot(to_centre) > 0.0 {
        normal = -normal;
    }

    // Pick the vertex of two lying furthest along the normal, i.e. deepest in one.
    let mut vertex = two.shape.half_extents;
    for i in 0..3 {
        if two.transform().axis(i).dot(normal) < 0.0 {
            vertex[i] = -vertex[i];
        }
    }

    let point = two.transform().transform_point(vertex);
    data.add(ContactBodies::Two(one.handle, two.handle), point, normal, penetration) as usize
}

#[allow(clippy::too_many_arguments)]
fn fill_edge_edge(
    one: &Collider<'_, BoxShape>,
    two: &Collider<'_, BoxShape>,
    to_centre: Vec3,
    one_axis_index: usize,
    two_axis_index: usize,
    use_one: bool,
    penetration: f32,
    data: &mut CollisionData,
) -> usize {
    let one_axis = one.transform().axis(one_axis_index);
    let two_axis = two.transform().axis(two_axis_index);
    let mut axis = one_axis.cross(two_axis).normalize();
    if axis.dot(to_centre) > 0.0 {
        axis = -axis;
    }

    // Midpoints of the two edges closest to each other, in body space.
    let mut point_on_one_edge = one.shape.half_extents;
    let mut point_on_two_edge = two.shape.half_extents;
    for i in 0..3 {
        if i == one_axis_index {
            point_on_one_edge[i] = 0.0;
        } else if one.transform().axis(i).dot(axis) > 0.0 {
            point_on_one_edge[i] = -point_on_one_edge[i];
        }

        if i == two_axis_index {
            point_on_two_edge[i] = 0.0;
        } else if two.transform().axis(i).dot(axis) < 0.0 {
            point_on_two_edge[i] = -point_on_two_edge[i];
        }
    }

    let point_on_one_edge = one.transform().transform_point(point_on_one_edge);
    let point_on_two_edge = two.transform().transform_point(point_on_two_edge);

    let point = edge_contact_point(
        point_on_one_edge,
        one_axis,
        one.shape.half_extents[one_axis_index],
        point_on_two_edge,
        two_axis,
        two.shape.half_extents[two_axis_index],
        use_one,
    );

    data.add(ContactBodies::Two(one.handle, two.handle), point, axis, penetration) as usize
}

/// Midpoint of the closest approach of two edges.
///
/// Each edge is given by its midpoint, direction and half length. When the edges
/// are parallel, or the closest points fall outside either edge, the contact is a
/// vertex-face one in disguise and the midpoint of one edge is returned instead:
/// `one`'s when `use_one` is set.
fn edge_contact_point(
    p_one: Vec3,
    d_one: Vec3,
    one_size: f32,
    p_two: Vec3,
    d_two: Vec3,
    two_size: f32,
    use_one: bool,
) -> Vec3 {
    let fallback = if use_one { p_one } else { p_two };

    let sm_one = d_one.length_squared();
    let sm_two = d_two.length_squared();
    let dp_one_two = d_two.dot(d_one);

    let to_st = p_one - p_two;
    let dp_sta_one = d_one.dot(to_st);
    let dp_sta_two = d_two.dot(to_st);

    let denom = sm_one * sm_two - dp_one_two * dp_one_two;
    if denom.abs() < PARALLEL_EDGE_EPSILON {
        return fallback;
    }

    let mua = (dp_one_two * dp_sta_two - sm_two * dp_sta_one) / denom;
    let mub = (sm_one * dp_sta_two - dp_one_two * dp_sta_one) / denom;

    if mua.abs() > one_size || mub.abs() > two_size {
        return fallback;
    }

    let c_one = p_one + d_one * mua;
    let c_two = p_two + d_two * mub;
    (c_one + c_two) * 0.5
}
