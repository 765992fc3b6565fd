use tracing::debug;

use crate::math::{Mat3, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A handle to a body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle(pub u32);

impl BodyHandle {
    /// Creates a new body handle
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index of this handle
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The bodies taking part in a contact.
///
/// Scenery (planes) is not a body, so a contact against it only names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContactBodies {
    /// A body touching immovable scenery
    One(BodyHandle),
    /// Two bodies; the contact normal points from the second toward the first
    Two(BodyHandle, BodyHandle),
}

impl ContactBodies {
    /// The first body, which moves along the normal to separate
    #[inline]
    pub fn first(self) -> BodyHandle {
        match self {
            ContactBodies::One(a) | ContactBodies::Two(a, _) => a,
        }
    }

    /// The second body, if any
    #[inline]
    pub fn second(self) -> Option<BodyHandle> {
        match self {
            ContactBodies::One(_) => None,
            ContactBodies::Two(_, b) => Some(b),
        }
    }

    /// The body in `slot` (0 or 1)
    #[inline]
    pub fn get(self, slot: usize) -> Option<BodyHandle> {
        match slot {
            0 => Some(self.first()),
            1 => self.second(),
            _ => None,
        }
    }
}

/// A single contact between a body and another body or the scenery.
///
/// The collision detector fills in the geometric part. The derived fields are
/// computed by [`Contact::calculate_internals`] once per resolution and then kept
/// up to date by the resolver as it moves bodies.
#[derive(Debug, Clone)]
pub struct Contact {
    pub(crate) bodies: ContactBodies,
    pub(crate) friction: f32,
    pub(crate) restitution: f32,
    /// World-space contact point
    pub(crate) contact_point: Vec3,
    /// World-space unit normal, pointing from the second body toward the first
    pub(crate) contact_normal: Vec3,
    /// Overlap depth; positive when the bodies interpenetrate
    pub(crate) penetration: f32,

    /// Columns are the normal and two tangents
    pub(crate) contact_to_world: Mat3,
    /// Closing velocity in contact coordinates
    pub(crate) contact_velocity: Vec3,
    /// Normal velocity change needed to resolve this contact
    pub(crate) desired_delta_velocity: f32,
    /// Contact point relative to each body's centre
    pub(crate) relative_contact_position: [Vec3; 2],
}

impl Contact {
    /// Creates a raw contact as produced by a collision routine
    pub fn new(
        bodies: ContactBodies,
        contact_point: Vec3,
        contact_normal: Vec3,
        penetration: f32,
        friction: f32,
        restitution: f32,
    ) -> Self {
        Self {
            bodies,
            friction,
            restitution,
            contact_point,
            contact_normal,
            penetration,
            contact_to_world: Mat3::IDENTITY,
            contact_velocity: Vec3::ZERO,
            desired_delta_velocity: 0.0,
            relative_contact_position: [Vec3::ZERO; 2],
        }
    }

    #[inline]
    pub fn bodies(&self) -> ContactBodies {
        self.bodies
    }

    #[inline]
    pub fn point(&self) -> Vec3 {
        self.contact_point
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.contact_normal
    }

    #[inline]
    pub fn penetration(&self) -> f32 {
        self.penetration
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    #[inline]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Contact basis computed by the last call to [`Contact::calculate_internals`]
    #[inline]
    pub fn contact_to_world(&self) -> Mat3 {
        self.contact_to_world
    }

    /// Closing velocity in contact coordinates
    #[inline]
    pub fn contact_velocity(&self) -> Vec3 {
        self.contact_velocity
    }

    #[inline]
    pub fn desired_delta_velocity(&self) -> f32 {
        self.desired_delta_velocity
    }
}

/// Contact generation settings applied to every step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactConfig {
    /// Maximum number of contacts kept per step
    pub max_contacts: usize,
    /// Friction coefficient given to every contact
    pub friction: f32,
    /// Restitution coefficient given to every contact
    pub restitution: f32,
    /// Separation still reported as contact
    pub tolerance: f32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            max_contacts: 1000,
            friction: 0.9,
            restitution: 0.1,
            tolerance: 0.0,
        }
    }
}

impl ContactConfig {
    #[must_use]
    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts;
        self
    }

    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    #[must_use]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// A fixed-capacity pool of contacts filled by the collision detector.
///
/// Contacts offered once the pool is full are dropped.
#[derive(Debug, Clone)]
pub struct CollisionData {
    contacts: Vec<Contact>,
    capacity: usize,
    dropped: usize,
    /// Friction given to new contacts
    pub friction: f32,
    /// Restitution given to new contacts
    pub restitution: f32,
    /// Separation still reported as contact
    pub tolerance: f32,
}

impl CollisionData {
    /// Creates an empty pool holding at most `capacity` contacts
    pub fn new(capacity: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
            friction: 0.0,
            restitution: 0.0,
            tolerance: 0.0,
        }
    }

    /// Creates an empty pool using the capacity and coefficients of `config`
    pub fn from_config(config: &ContactConfig) -> Self {
        let mut data = Self::new(config.max_contacts);
        data.apply_config(config);
        data
    }

    /// Copies the coefficients of `config` into the pool
    pub fn apply_config(&mut self, config: &ContactConfig) {
        self.friction = config.friction;
        self.restitution = config.restitution;
        self.tolerance = config.tolerance;
    }

    /// Empties the pool and re-arms it for `max_contacts` contacts
    pub fn reset(&mut self, max_contacts: usize) {
        self.contacts.clear();
        if max_contacts > self.contacts.capacity() {
            self.contacts.reserve(max_contacts);
        }
        self.capacity = max_contacts;
        self.dropped = 0;
    }

    /// Returns true while the pool has room for another contact
    #[inline]
    pub fn has_more_contacts(&self) -> bool {
        self.contacts.len() < self.capacity
    }

    /// Remaining room in the pool
    #[inline]
    pub fn contacts_left(&self) -> usize {
        self.capacity.saturating_sub(self.contacts.len())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts offered since the last reset that did not fit
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Adds a contact; returns false and drops it when the pool is full.
    pub fn add_contact(&mut self, contact: Contact) -> bool {
        if !self.has_more_contacts() {
            self.dropped += 1;
            debug!(
                capacity = self.capacity,
                dropped = self.dropped,
                "contact pool full, dropping contact"
            );
            return false;
        }
        self.contacts.push(contact);
        true
    }

    /// Adds a contact using the pool's friction and restitution
    pub fn add(
        &mut self,
        bodies: ContactBodies,
        point: Vec3,
        normal: Vec3,
        penetration: f32,
    ) -> bool {
        let contact = Contact::new(
            bodies,
            point,
            normal,
            penetration,
            self.friction,
            self.restitution,
        );
        self.add_contact(contact)
    }

    #[inline]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    #[inline]
    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact::new(
            ContactBodies::Two(BodyHandle::new(0), BodyHandle::new(1)),
            Vec3::ZERO,
            Vec3::Y,
            0.1,
            0.5,
            0.2,
        )
    }

    #[test]
    fn test_contact_bodies() {
        let one = ContactBodies::One(BodyHandle::new(3));
        assert_eq!(one.first(), BodyHandle::new(3));
        assert_eq!(one.second(), None);
        assert_eq!(one.get(1), None);

        let two = ContactBodies::Two(BodyHandle::new(1), BodyHandle::new(2));
        assert_eq!(two.get(0), Some(BodyHandle::new(1)));
        assert_eq!(two.get(1), Some(BodyHandle::new(2)));
        assert_eq!(two.get(2), None);
    }

    #[test]
    fn test_pool_capacity() {
        let mut data = CollisionData::new(2);
        assert!(data.add_contact(contact()));
        assert_eq!(data.contacts_left(), 1);
        assert!(data.add_contact(contact()));
        assert!(!data.has_more_contacts());

        assert!(!data.add_contact(contact()));
        assert_eq!(data.len(), 2);
        assert_eq!(data.dropped(), 1);
    }

    #[test]
    fn test_reset() {
        let mut data = CollisionData::new(1);
        data.add_contact(contact());
        data.add_contact(contact());

        data.reset(4);
        assert!(data.is_empty());
        assert_eq!(data.dropped(), 0);
        assert_eq!(data.contacts_left(), 4);
    }

    #[test]
    fn test_add_uses_pool_coefficients() {
        let mut data = CollisionData::from_config(&ContactConfig::default().with_friction(0.4));
        data.add(ContactBodies::One(BodyHandle::new(0)), Vec3::ZERO, Vec3::Y, 0.2);

        let c = &data.contacts()[0];
        assert_eq!(c.friction(), 0.4);
        assert_eq!(c.restitution(), 0.1);
        assert_eq!(c.penetration(), 0.2);
    }
}
