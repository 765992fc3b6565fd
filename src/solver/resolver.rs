use tracing::trace;

use crate::collision::{Contact, ContactBodies};
use crate::constraints::BodyDelta;
use crate::dynamics::RigidBody;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the contact resolver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolverConfig {
    /// Maximum number of velocity resolutions per step
    pub velocity_iterations: usize,
    /// Maximum number of penetration resolutions per step
    pub position_iterations: usize,
    /// Desired velocity changes below this are left alone
    pub velocity_epsilon: f32,
    /// Penetrations below this are left alone
    pub position_epsilon: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: 6,
            position_iterations: 3,
            velocity_epsilon: 0.01,
            position_epsilon: 0.01,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn with_iterations(mut self, velocity: usize, position: usize) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    #[must_use]
    pub fn with_epsilon(mut self, velocity: f32, position: f32) -> Self {
        self.velocity_epsilon = velocity;
        self.position_epsilon = position;
        self
    }
}

/// Resolves a batch of contacts in two phases.
///
/// Penetration is removed first, then closing velocities. Each phase
/// repeatedly picks the worst contact, fixes it alone, and updates every
/// other contact sharing a body with it, until nothing exceeds the epsilon or
/// the iteration budget runs out.
#[derive(Debug, Clone)]
pub struct ContactResolver {
    velocity_iterations: usize,
    position_iterations: usize,
    velocity_epsilon: f32,
    position_epsilon: f32,
    velocity_iterations_used: usize,
    position_iterations_used: usize,
}

impl Default for ContactResolver {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl ContactResolver {
    /// Creates a resolver running `iterations` of each phase with the default epsilons
    pub fn new(iterations: usize) -> Self {
        let defaults = ResolverConfig::default();
        Self::with_settings(
            iterations,
            iterations,
            defaults.velocity_epsilon,
            defaults.position_epsilon,
        )
    }

    pub fn with_settings(
        velocity_iterations: usize,
        position_iterations: usize,
        velocity_epsilon: f32,
        position_epsilon: f32,
    ) -> Self {
        Self {
            velocity_iterations,
            position_iterations,
            velocity_epsilon,
            position_epsilon,
            velocity_iterations_used: 0,
            position_iterations_used: 0,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_settings(
            config.velocity_iterations,
            config.position_iterations,
            config.velocity_epsilon,
            config.position_epsilon,
        )
    }

    pub fn set_iterations(&mut self, velocity_iterations: usize, position_iterations: usize) {
        self.velocity_iterations = velocity_iterations;
        self.position_iterations = position_iterations;
    }

    pub fn set_epsilon(&mut self, velocity_epsilon: f32, position_epsilon: f32) {
        self.velocity_epsilon = velocity_epsilon;
        self.position_epsilon = position_epsilon;
    }

    /// Returns false when the settings would make resolution meaningless
    pub fn is_valid(&self) -> bool {
        self.velocity_iterations > 0
            && self.position_iterations > 0
            && self.velocity_epsilon >= 0.0
            && self.position_epsilon >= 0.0
    }

    #[inline]
    pub fn velocity_iterations(&self) -> usize {
        self.velocity_iterations
    }

    #[inline]
    pub fn position_iterations(&self) -> usize {
        self.position_iterations
    }

    #[inline]
    pub fn velocity_epsilon(&self) -> f32 {
        self.velocity_epsilon
    }

    #[inline]
    pub fn position_epsilon(&self) -> f32 {
        self.position_epsilon
    }

    /// Velocity iterations spent by the last call to [`ContactResolver::resolve_contacts`]
    #[inline]
    pub fn velocity_iterations_used(&self) -> usize {
        self.velocity_iterations_used
    }

    /// Position iterations spent by the last call to [`ContactResolver::resolve_contacts`]
    #[inline]
    pub fn position_iterations_used(&self) -> usize {
        self.position_iterations_used
    }

    /// Resolves penetration and then velocity for `contacts`.
    ///
    /// Does nothing when there are no contacts or the settings are invalid.
    ///
    /// # Panics
    ///
    /// Panics if a contact refers to a body handle out of range for `bodies`.
    pub fn resolve_contacts(
        &mut self,
        contacts: &mut [Contact],
        bodies: &mut [RigidBody],
        dt: f32,
    ) {
        self.velocity_iterations_used = 0;
        self.position_iterations_used = 0;

        if contacts.is_empty() || !self.is_valid() {
            return;
        }

        self.prepare_contacts(contacts, bodies, dt);
        self.adjust_positions(contacts, bodies);
        self.adjust_velocities(contacts, bodies, dt);

        trace!(
            contacts = contacts.len(),
            position_iterations = self.position_iterations_used,
            velocity_iterations = self.velocity_iterations_used,
            "contacts resolved"
        );
    }

    /// Computes the derived data of every contact
    pub fn prepare_contacts(&self, contacts: &mut [Contact], bodies: &[RigidBody], dt: f32) {
        for contact in contacts.iter_mut() {
            contact.calculate_internals(bodies, dt);
        }
    }

    /// Removes penetration, deepest contact first
    pub fn adjust_positions(&mut self, contacts: &mut [Contact], bodies: &mut [RigidBody]) {
        self.position_iterations_used = 0;

        while self.position_iterations_used < self.position_iterations {
            let Some((worst, penetration)) =
                worst_contact(contacts, self.position_epsilon, |c| c.penetration)
            else {
                break;
            };

            contacts[worst].match_awake_state(bodies);
            let changes = contacts[worst].apply_position_change(bodies, penetration);
            let moved = contacts[worst].bodies;

            for contact in contacts.iter_mut() {
                for (slot, delta) in shared_bodies(contact.bodies, moved, &changes) {
                    let delta_position =
                        delta.linear + delta.angular.cross(contact.relative_contact_position[slot]);
                    let sign = if slot == 0 { -1.0 } else { 1.0 };
                    contact.penetration += delta_position.dot(contact.contact_normal) * sign;
                }
            }

            self.position_iterations_used += 1;
        }
    }

    /// Removes closing velocity, largest desired change first
    pub fn adjust_velocities(
        &mut self,
        contacts: &mut [Contact],
        bodies: &mut [RigidBody],
        dt: f32,
    ) {
        self.velocity_iterations_used = 0;

        while self.velocity_iterations_used < self.velocity_iterations {
            let Some((worst, _)) =
                worst_contact(contacts, self.velocity_epsilon, |c| c.desired_delta_velocity)
            else {
                break;
            };

            contacts[worst].match_awake_state(bodies);
            let changes = contacts[worst].apply_velocity_change(bodies);
            let moved = contacts[worst].bodies;

            for contact in contacts.iter_mut() {
                let mut touched = false;
                for (slot, delta) in shared_bodies(contact.bodies, moved, &changes) {
                    let delta_velocity =
                        delta.linear + delta.angular.cross(contact.relative_contact_position[slot]);
                    let sign = if slot == 0 { 1.0 } else { -1.0 };
                    contact.contact_velocity +=
                        contact.contact_to_world.transform_transpose(delta_velocity) * sign;
                    touched = true;
                }

                if touched {
                    let first = &bodies[contact.bodies.first().index()];
                    let second = contact.bodies.second().map(|h| &bodies[h.index()]);
                    contact.calculate_desired_delta_velocity(first, second, dt);
                }
            }

            self.velocity_iterations_used += 1;
        }
    }
}

/// Index and value of the contact with the largest `key`, if it exceeds `epsilon`
fn worst_contact(
    contacts: &[Contact],
    epsilon: f32,
    key: impl Fn(&Contact) -> f32,
) -> Option<(usize, f32)> {
    let mut max = epsilon;
    let mut worst = None;
    for (i, contact) in contacts.iter().enumerate() {
        let value = key(contact);
        if value > max {
            max = value;
            worst = Some(i);
        }
    }
    worst.map(|i| (i, max))
}

/// Pairs each slot of `bodies` that also appears in `moved` with the change
/// applied to that body
fn shared_bodies<'a>(
    bodies: ContactBodies,
    moved: ContactBodies,
    changes: &'a [BodyDelta; 2],
) -> impl Iterator<Item = (usize, &'a BodyDelta)> {
    (0..2).flat_map(move |slot| {
        let body = bodies.get(slot);
        (0..2).filter_map(move |d| match (body, moved.get(d)) {
            (Some(a), Some(b)) if a == b => Some((slot, &changes[d])),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BodyHandle;
    use crate::math::Vec3;
    use approx::assert_relative_eq;

    fn falling_box() -> RigidBody {
        RigidBody::new()
            .with_position(Vec3::new(0.0, 0.45, 0.0))
            .with_velocity(Vec3::new(0.0, -1.0, 0.0))
    }

    fn floor() -> RigidBody {
        RigidBody::new().with_position(Vec3::new(0.0, -0.5, 0.0)).with_infinite_mass()
    }

    fn stacked_contact(point_y: f32, penetration: f32) -> Contact {
        Contact::new(
            ContactBodies::Two(BodyHandle::new(0), BodyHandle::new(1)),
            Vec3::new(0.0, point_y, 0.0),
            Vec3::Y,
            penetration,
            0.9,
            0.0,
        )
    }

    #[test]
    fn test_default_settings() {
        let resolver = ContactResolver::default();
        assert_eq!(resolver.velocity_iterations(), 6);
        assert_eq!(resolver.position_iterations(), 3);
        assert_eq!(resolver.velocity_epsilon(), 0.01);
        assert!(resolver.is_valid());
    }

    #[test]
    fn test_validity() {
        let mut resolver = ContactResolver::new(4);
        assert!(resolver.is_valid());

        resolver.set_iterations(0, 4);
        assert!(!resolver.is_valid());

        resolver.set_iterations(4, 4);
        resolver.set_epsilon(0.01, -1.0);
        assert!(!resolver.is_valid());
    }

    #[test]
    fn test_invalid_resolver_is_a_noop() {
        let mut bodies = vec![falling_box(), floor()];
        let mut contacts = vec![stacked_contact(-0.05, 0.05)];

        let mut resolver = ContactResolver::new(0);
        resolver.resolve_contacts(&mut contacts, &mut bodies, 0.01);

        assert_eq!(bodies[0].position().y, 0.45);
        assert_eq!(bodies[0].velocity().y, -1.0);
        assert_eq!(resolver.velocity_iterations_used(), 0);
    }

    #[test]
    fn test_resolves_penetration_and_velocity() {
        let mut bodies = vec![falling_box(), floor()];
        let mut contacts = vec![stacked_contact(-0.05, 0.05)];

        let mut resolver = ContactResolver::new(10);
        resolver.resolve_contacts(&mut contacts, &mut bodies, 0.01);

        assert_relative_eq!(bodies[0].position().y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(bodies[0].velocity().y, 0.0, epsilon = 1e-4);
        assert!(contacts[0].penetration() < resolver.position_epsilon());
        assert_eq!(resolver.position_iterations_used(), 1);
        assert_eq!(resolver.velocity_iterations_used(), 1);
    }

    #[test]
    fn test_static_body_untouched() {
        let mut bodies = vec![falling_box(), floor()];
        let mut contacts = vec![stacked_contact(-0.05, 0.05)];
        let before = bodies[1].clone();

        ContactResolver::new(10).resolve_contacts(&mut contacts, &mut bodies, 0.01);

        assert_eq!(bodies[1].position(), before.position());
        assert_eq!(bodies[1].orientation(), before.orientation());
        assert_eq!(bodies[1].velocity(), before.velocity());
        assert_eq!(bodies[1].rotation(), before.rotation());
    }

    #[test]
    fn test_zero_inverse_mass_body_is_not_spun() {
        let mut anchor = RigidBody::new().with_position(Vec3::new(0.0, -0.5, 0.0));
        anchor.set_inverse_mass(0.0);
        let mut bodies = vec![falling_box().with_velocity(Vec3::new(0.8, -1.0, 0.3)), anchor];
        let before = bodies[1].clone();

        let mut contacts = vec![stacked_contact(-0.05, 0.05)];
        contacts[0].contact_point = Vec3::new(0.4, -0.05, -0.3);
        ContactResolver::new(10).resolve_contacts(&mut contacts, &mut bodies, 0.01);

        assert_eq!(bodies[1].position(), before.position());
        assert_eq!(bodies[1].orientation(), before.orientation());
        assert_eq!(bodies[1].rotation(), Vec3::ZERO);
        assert_eq!(bodies[1].velocity(), Vec3::ZERO);
        assert!(bodies[0].position().y > 0.45);
    }

    #[test]
    fn test_position_pass_refreshes_cached_transform() {
        let mut bodies = vec![falling_box(), floor()];
        let mut contacts = vec![stacked_contact(-0.05, 0.05)];

        let mut resolver = ContactResolver::new(10);
        resolver.prepare_contacts(&mut contacts, &bodies, 0.01);
        resolver.adjust_positions(&mut contacts, &mut bodies);

        assert!(bodies[0].is_awake());
        assert_eq!(bodies[0].transform().translation, bodies[0].position());
    }

    #[test]
    fn test_shared_body_updates_other_contacts() {
        // Two contacts under the same box; fixing one also lifts the other
        let mut bodies = vec![falling_box(), floor()];
        let mut contacts = vec![stacked_contact(-0.05, 0.05), stacked_contact(-0.05, 0.04)];

        let mut resolver = ContactResolver::new(10);
        resolver.prepare_contacts(&mut contacts, &bodies, 0.01);
        resolver.adjust_positions(&mut contacts, &mut bodies);

        assert_eq!(resolver.position_iterations_used(), 1);
        assert_relative_eq!(contacts[1].penetration(), -0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_no_work_below_epsilon() {
        let mut bodies = vec![RigidBody::new().with_position(Vec3::new(0.0, 0.5, 0.0)), floor()];
        let mut contacts = vec![stacked_contact(0.0, 0.001)];

        let mut resolver = ContactResolver::new(10);
        resolver.resolve_contacts(&mut contacts, &mut bodies, 0.01);

        assert_eq!(resolver.position_iterations_used(), 0);
        assert_eq!(resolver.velocity_iterations_used(), 0);
        assert_eq!(bodies[0].position().y, 0.5);
    }
}
