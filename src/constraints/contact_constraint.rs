use crate::collision::{Contact, ContactBodies};
use crate::dynamics::RigidBody;
use crate::math::{Mat3, Vec3};

/// Closing speeds below this do not bounce
pub const VELOCITY_LIMIT: f32 = 0.25;

/// Cap on the rotational share of a position correction, as a fraction of the lever arm
pub const ANGULAR_LIMIT: f32 = 0.2;

/// Linear and angular change applied to one body of a contact
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyDelta {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Borrows the bodies of a contact mutably
pub(crate) fn bodies_mut(
    bodies: &mut [RigidBody],
    pair: ContactBodies,
) -> [Option<&mut RigidBody>; 2] {
    match pair {
        ContactBodies::One(a) => [Some(&mut bodies[a.index()]), None],
        ContactBodies::Two(a, b) => {
            let (first, second) = get_two_mut(bodies, a.index(), b.index());
            [Some(first), Some(second)]
        }
    }
}

fn get_two_mut(slice: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    assert!(a != b, "a contact cannot join body {a} to itself");
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

impl Contact {
    /// Fills in the derived data the resolver works with: the contact basis,
    /// the contact point relative to each body, the closing velocity and the
    /// desired change in normal velocity.
    ///
    /// # Panics
    ///
    /// Panics if a handle of this contact is out of range for `bodies`.
    pub fn calculate_internals(&mut self, bodies: &[RigidBody], dt: f32) {
        self.calculate_contact_basis();

        let first = &bodies[self.bodies.first().index()];
        let second = self.bodies.second().map(|h| &bodies[h.index()]);

        self.relative_contact_position[0] = self.contact_point - first.position;
        self.contact_velocity = self.calculate_local_velocity(0, first, dt);

        if let Some(second) = second {
            self.relative_contact_position[1] = self.contact_point - second.position;
            self.contact_velocity -= self.calculate_local_velocity(1, second, dt);
        } else {
            self.relative_contact_position[1] = Vec3::ZERO;
        }

        self.calculate_desired_delta_velocity(first, second, dt);
    }

    /// Builds an orthonormal basis whose first column is the contact normal.
    ///
    /// The first tangent is perpendicular to world Y when the normal leans
    /// toward X, and perpendicular to world X otherwise.
    pub fn calculate_contact_basis(&mut self) {
        let n = self.contact_normal;
        let (t0, t1);

        if n.x.abs() > n.y.abs() {
            let s = 1.0 / (n.z * n.z + n.x * n.x).sqrt();
            t0 = Vec3::new(n.z * s, 0.0, -n.x * s);
            t1 = Vec3::new(n.y * t0.x, n.z * t0.x - n.x * t0.z, -n.y * t0.x);
        } else {
            let s = 1.0 / (n.z * n.z + n.y * n.y).sqrt();
            t0 = Vec3::new(0.0, -n.z * s, n.y * s);
            t1 = Vec3::new(n.y * t0.z - n.z * t0.y, -n.x * t0.z, n.x * t0.y);
        }

        self.contact_to_world = if t0.is_finite() && t1.is_finite() {
            Mat3::from_cols(n, t0, t1)
        } else {
            Mat3::IDENTITY
        };
    }

    /// Velocity of the contact point on the body in `slot`, in contact coordinates.
    ///
    /// Includes the planar part of this frame's acceleration so that a body
    /// resting on a slope picks up the friction needed to hold it.
    pub fn calculate_local_velocity(&self, slot: usize, body: &RigidBody, dt: f32) -> Vec3 {
        let r = self.relative_contact_position[slot];
        let velocity = body.rotation.cross(r) + body.velocity;

        let mut contact_velocity = self.contact_to_world.transform_transpose(velocity);

        let mut acc_velocity =
            self.contact_to_world.transform_transpose(body.last_frame_acceleration * dt);
        acc_velocity.x = 0.0;
        contact_velocity += acc_velocity;

        contact_velocity
    }

    /// Normal velocity change that would leave the contact separating at the
    /// restituted speed.
    pub fn calculate_desired_delta_velocity(
        &mut self,
        first: &RigidBody,
        second: Option<&RigidBody>,
        dt: f32,
    ) {
        let mut velocity_from_acc = 0.0;

        if first.is_awake {
            velocity_from_acc += first.last_frame_acceleration.dot(self.contact_normal) * dt;
        }
        if let Some(second) = second.filter(|b| b.is_awake) {
            velocity_from_acc -= second.last_frame_acceleration.dot(self.contact_normal) * dt;
        }

        let closing = self.contact_velocity.x;
        let restitution = if closing.abs() < VELOCITY_LIMIT { 0.0 } else { self.restitution };

        self.desired_delta_velocity = -closing - restitution * (closing - velocity_from_acc);
    }

    /// Impulse in contact coordinates ignoring friction.
    pub fn calculate_frictionless_impulse(
        &self,
        inverse_inertia: [Mat3; 2],
        bodies: [Option<&RigidBody>; 2],
    ) -> Vec3 {
        let n = self.contact_normal;
        let mut delta_velocity = 0.0;

        for (slot, body) in bodies.iter().enumerate() {
            let Some(body) = body else { continue };
            let r = self.relative_contact_position[slot];
            let delta_vel_world = (inverse_inertia[slot] * r.cross(n)).cross(r);
            delta_velocity += delta_vel_world.dot(n) + body.inverse_mass;
        }

        if delta_velocity <= 0.0 || !delta_velocity.is_finite() {
            return Vec3::ZERO;
        }
        Vec3::new(self.desired_delta_velocity / delta_velocity, 0.0, 0.0)
    }

    /// Impulse in contact coordinates with Coulomb friction.
    ///
    /// Solves for the impulse that removes all tangential velocity. When that
    /// impulse leaves the friction cone it is scaled back onto the cone and the
    /// normal component recomputed.
    pub fn calculate_friction_impulse(
        &self,
        inverse_inertia: [Mat3; 2],
        bodies: [Option<&RigidBody>; 2],
    ) -> Vec3 {
        let mut inverse_mass = 0.0;
        let mut delta_vel_world = Mat3::ZERO;

        for (slot, body) in bodies.iter().enumerate() {
            let Some(body) = body else { continue };
            let impulse_to_torque = Mat3::skew(self.relative_contact_position[slot]);
            delta_vel_world += -(impulse_to_torque * inverse_inertia[slot] * impulse_to_torque);
            inverse_mass += body.inverse_mass;
        }

        let basis = self.contact_to_world;
        let mut delta_velocity = basis.transpose() * delta_vel_world * basis;
        delta_velocity.cols[0].x += inverse_mass;
        delta_velocity.cols[1].y += inverse_mass;
        delta_velocity.cols[2].z += inverse_mass;

        let Some(impulse_matrix) = delta_velocity.try_inverse() else {
            return Vec3::ZERO;
        };

        let vel_kill = Vec3::new(
            self.desired_delta_velocity,
            -self.contact_velocity.y,
            -self.contact_velocity.z,
        );
        let mut impulse = impulse_matrix * vel_kill;

        let planar = (impulse.y * impulse.y + impulse.z * impulse.z).sqrt();
        if planar > impulse.x * self.friction {
            impulse.y /= planar;
            impulse.z /= planar;

            let normal_response = delta_velocity.get(0, 0)
                + delta_velocity.get(0, 1) * self.friction * impulse.y
                + delta_velocity.get(0, 2) * self.friction * impulse.z;
            if normal_response <= 0.0 || !normal_response.is_finite() {
                return Vec3::ZERO;
            }

            impulse.x = self.desired_delta_velocity / normal_response;
            impulse.y *= self.friction * impulse.x;
            impulse.z *= self.friction * impulse.x;
        }

        if impulse.is_finite() {
            impulse
        } else {
            Vec3::ZERO
        }
    }

    /// Applies the impulse that resolves the closing velocity and returns the
    /// change made to each body.
    ///
    /// # Panics
    ///
    /// Panics if a handle of this contact is out of range for `bodies`.
    pub fn apply_velocity_change(&self, bodies: &mut [RigidBody]) -> [BodyDelta; 2] {
        let [first, second] = bodies_mut(bodies, self.bodies);
        let inverse_inertia = [
            first.as_ref().map_or(Mat3::ZERO, |b| b.contact_inverse_inertia()),
            second.as_ref().map_or(Mat3::ZERO, |b| b.contact_inverse_inertia()),
        ];

        let impulse_contact = {
            let view = [first.as_deref(), second.as_deref()];
            if self.friction == 0.0 {
                self.calculate_frictionless_impulse(inverse_inertia, view)
            } else {
                self.calculate_friction_impulse(inverse_inertia, view)
            }
        };
        let impulse = self.contact_to_world * impulse_contact;

        let mut changes = [BodyDelta::default(); 2];

        if let Some(body) = first {
            let r = self.relative_contact_position[0];
            changes[0] = BodyDelta {
                linear: impulse * body.inverse_mass,
                angular: inverse_inertia[0] * r.cross(impulse),
            };
            body.velocity += changes[0].linear;
            body.rotation += changes[0].angular;
        }

        if let Some(body) = second {
            let r = self.relative_contact_position[1];
            changes[1] = BodyDelta {
                linear: impulse * -body.inverse_mass,
                angular: inverse_inertia[1] * impulse.cross(r),
            };
            body.velocity += changes[1].linear;
            body.rotation += changes[1].angular;
        }

        changes
    }

    /// Moves the bodies apart by `penetration` along the normal, split between
    /// linear and angular motion in proportion to each body's inertia, and
    /// returns the change made to each body.
    ///
    /// # Panics
    ///
    /// Panics if a handle of this contact is out of range for `bodies`.
    pub fn apply_position_change(
        &self,
        bodies: &mut [RigidBody],
        penetration: f32,
    ) -> [BodyDelta; 2] {
        let n = self.contact_normal;
        let targets = bodies_mut(bodies, self.bodies);

        let mut inverse_inertia = [Mat3::ZERO; 2];
        let mut angular_inertia = [0.0f32; 2];
        let mut linear_inertia = [0.0f32; 2];
        let mut total_inertia = 0.0;

        for (slot, body) in targets.iter().enumerate() {
            let Some(body) = body else { continue };
            let r = self.relative_contact_position[slot];
            inverse_inertia[slot] = body.contact_inverse_inertia();
            let angular_inertia_world = (inverse_inertia[slot] * r.cross(n)).cross(r);
            angular_inertia[slot] = angular_inertia_world.dot(n);
            linear_inertia[slot] = body.inverse_mass;
            total_inertia += linear_inertia[slot] + angular_inertia[slot];
        }

        let mut changes = [BodyDelta::default(); 2];
        if total_inertia <= 0.0 || !total_inertia.is_finite() {
            return changes;
        }

        for (slot, body) in targets.into_iter().enumerate() {
            let Some(body) = body else { continue };
            if linear_inertia[slot] == 0.0 && angular_inertia[slot] == 0.0 {
                continue;
            }
            let sign = if slot == 0 { 1.0 } else { -1.0 };
            let r = self.relative_contact_position[slot];

            let mut angular_move = sign * penetration * (angular_inertia[slot] / total_inertia);
            let mut linear_move = sign * penetration * (linear_inertia[slot] / total_inertia);

            let projection = r + n * -r.dot(n);
            let max_magnitude = ANGULAR_LIMIT * projection.length();

            if angular_move.abs() > max_magnitude {
                let total_move = angular_move + linear_move;
                angular_move = max_magnitude.copysign(angular_move);
                linear_move = total_move - angular_move;
            }

            let angular = if angular_move == 0.0 || angular_inertia[slot] <= 0.0 {
                Vec3::ZERO
            } else {
                let target_direction = r.cross(n);
                inverse_inertia[slot] * target_direction * (angular_move / angular_inertia[slot])
            };
            let linear = n * linear_move;

            body.position += linear;
            body.orientation.add_scaled_vector(angular, 1.0);
            body.calculate_derived_data();

            changes[slot] = BodyDelta { linear, angular };
        }

        changes
    }

    /// Wakes the sleeping body when exactly one of the two is asleep.
    ///
    /// Contacts with scenery never wake anything.
    ///
    /// # Panics
    ///
    /// Panics if a handle of this contact is out of range for `bodies`.
    pub fn match_awake_state(&self, bodies: &mut [RigidBody]) {
        let ContactBodies::Two(a, b) = self.bodies else {
            return;
        };

        let (first, second) = get_two_mut(bodies, a.index(), b.index());
        if first.is_awake != second.is_awake {
            if first.is_awake {
                second.set_awake(true);
            } else {
                first.set_awake(true);
            }
        }
    }
}
