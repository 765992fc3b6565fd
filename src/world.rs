use tracing::{debug, trace, warn};

use crate::collision::{
    BodyHandle, Collider, CollisionData, CollisionDetector, Contact, ContactConfig, SeparatingAxes,
};
use crate::dynamics::{RigidBody, RigidBodyDesc, DEFAULT_SLEEP_EPSILON};
use crate::error::ConfigError;
use crate::geometry::{Plane, Shape};
use crate::math::{Mat34, Quat, Vec3};
use crate::solver::{ContactResolver, ResolverConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings a [`World`] is created with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Constant acceleration given to every body with finite mass
    pub gravity: Vec3,
    /// Motion below which bodies fall asleep
    pub sleep_epsilon: f32,
    /// Linear damping given to new bodies
    pub linear_damping: f32,
    /// Angular damping given to new bodies
    pub angular_damping: f32,
    pub resolver: ResolverConfig,
    pub contacts: ContactConfig,
    /// Axes tested between pairs of boxes
    pub separating_axes: SeparatingAxes,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
            linear_damping: 0.9,
            angular_damping: 0.9,
            resolver: ResolverConfig::default(),
            contacts: ContactConfig::default(),
            separating_axes: SeparatingAxes::Full,
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_sleep_epsilon(mut self, sleep_epsilon: f32) -> Self {
        self.sleep_epsilon = sleep_epsilon;
        self
    }

    #[must_use]
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_contacts(mut self, contacts: ContactConfig) -> Self {
        self.contacts = contacts;
        self
    }

    #[must_use]
    pub fn with_separating_axes(mut self, axes: SeparatingAxes) -> Self {
        self.separating_axes = axes;
        self
    }

    /// Checks that every value is usable, reporting the first one that is not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFiniteGravity);
        }
        if !(self.sleep_epsilon > 0.0 && self.sleep_epsilon.is_finite()) {
            return Err(ConfigError::InvalidSleepEpsilon(self.sleep_epsilon));
        }
        for (kind, value) in [("linear", self.linear_damping), ("angular", self.angular_damping)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidDamping { kind, value });
            }
        }

        let resolver = &self.resolver;
        if resolver.velocity_iterations == 0 {
            return Err(ConfigError::ZeroIterations { kind: "velocity" });
        }
        if resolver.position_iterations == 0 {
            return Err(ConfigError::ZeroIterations { kind: "position" });
        }
        for (kind, value) in [
            ("velocity", resolver.velocity_epsilon),
            ("position", resolver.position_epsilon),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeEpsilon { kind, value });
            }
        }

        let contacts = &self.contacts;
        if contacts.max_contacts == 0 {
            return Err(ConfigError::ZeroContactCapacity);
        }
        for (name, value) in [
            ("friction", contacts.friction),
            ("restitution", contacts.restitution),
            ("tolerance", contacts.tolerance),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidCoefficient { name, value });
            }
        }

        Ok(())
    }
}

/// The physics world: bodies, their shapes, static scenery and the contact
/// pipeline run by [`World::step`].
pub struct World {
    config: WorldConfig,
    bodies: Vec<RigidBody>,
    /// Shape of each body, indexed like `bodies`
    shapes: Vec<Shape>,
    planes: Vec<Plane>,
    detector: CollisionDetector,
    collision_data: CollisionData,
    resolver: ContactResolver,
    time: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Creates a world. Invalid settings are not rejected; see [`World::try_new`].
    pub fn new(config: WorldConfig) -> Self {
        Self {
            detector: CollisionDetector::new(config.separating_axes),
            collision_data: CollisionData::from_config(&config.contacts),
            resolver: ContactResolver::from_config(&config.resolver),
            config,
            bodies: Vec::new(),
            shapes: Vec::new(),
            planes: Vec::new(),
            time: 0.0,
        }
    }

    /// Creates a world after validating `config`
    pub fn try_new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Adds a unit-mass dynamic body at the origin
    pub fn create_body(&mut self, shape: Shape) -> BodyHandle {
        self.create_body_with(RigidBodyDesc::default(), shape)
    }

    /// Adds a body described by `desc`.
    ///
    /// The inertia tensor follows from the shape and mass. Dynamic bodies get the
    /// world's gravity as their constant acceleration.
    ///
    /// # Panics
    ///
    /// Panics if `desc.mass` is `Some` but not strictly positive.
    pub fn create_body_with(&mut self, desc: RigidBodyDesc, shape: Shape) -> BodyHandle {
        let mut body = RigidBody::new().with_sleep_epsilon(self.config.sleep_epsilon);
        body.set_damping(
            desc.linear_damping.unwrap_or(self.config.linear_damping),
            desc.angular_damping.unwrap_or(self.config.angular_damping),
        );

        match desc.mass {
            Some(mass) => {
                body.set_mass(mass);
                body.set_inertia_tensor(shape.inertia_tensor(mass));
                body.set_acceleration(self.config.gravity);
            }
            None => body.make_static(),
        }

        body.set_position(desc.position);
        body.set_orientation(desc.orientation);
        body.set_velocity(desc.velocity);
        body.set_rotation(desc.rotation);
        body.set_can_sleep(desc.can_sleep);
        body.calculate_derived_data();

        let handle = BodyHandle::new(self.bodies.len() as u32);
        self.bodies.push(body);
        self.shapes.push(shape);
        debug!(handle = handle.0, fixed = desc.mass.is_none(), "created body");

        handle
    }

    /// Adds an immovable half-space
    pub fn add_plane(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    /// Direct access to a body. Derived data is not refreshed until the next step.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    pub fn shape(&self, handle: BodyHandle) -> Option<&Shape> {
        self.shapes.get(handle.index())
    }

    /// Every body with its handle, in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (BodyHandle::new(i as u32), body))
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Position of `handle`, or zero for an unknown handle
    pub fn body_position(&self, handle: BodyHandle) -> Vec3 {
        self.body(handle).map_or(Vec3::ZERO, |b| b.position())
    }

    pub fn body_transform(&self, handle: BodyHandle) -> Mat34 {
        self.body(handle).map_or(Mat34::IDENTITY, |b| *b.transform())
    }

    /// Moves a body, refreshing its cached transform
    pub fn set_body_position(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_position(position);
        }
    }

    pub fn set_body_orientation(&mut self, handle: BodyHandle, orientation: Quat) {
        if let Some(body) = self.body_mut(handle) {
            body.set_orientation(orientation);
        }
    }

    pub fn set_body_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_velocity(velocity);
        }
    }

    /// Sets the mass of a body and rescales its inertia to match its shape
    pub fn set_body_mass(&mut self, handle: BodyHandle, mass: f32) {
        let Some(shape) = self.shapes.get(handle.index()).copied() else {
            return;
        };
        let gravity = self.config.gravity;
        if let Some(body) = self.body_mut(handle) {
            body.set_mass(mass);
            body.set_inertia_tensor(shape.inertia_tensor(mass));
            body.set_acceleration(gravity);
        }
    }

    pub fn set_body_damping(&mut self, handle: BodyHandle, linear: f32, angular: f32) {
        if let Some(body) = self.body_mut(handle) {
            body.set_damping(linear, angular);
        }
    }

    /// Overrides the constant acceleration set from gravity
    pub fn set_body_acceleration(&mut self, handle: BodyHandle, acceleration: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_acceleration(acceleration);
        }
    }

    /// Wakes or sleeps a body
    pub fn set_body_awake(&mut self, handle: BodyHandle, awake: bool) {
        if let Some(body) = self.body_mut(handle) {
            body.set_awake(awake);
        }
    }

    /// Sets a body's inertia to that of a solid box with the given half-extents
    pub fn set_body_block_inertia_tensor(
        &mut self,
        handle: BodyHandle,
        half_extents: Vec3,
        mass: f32,
    ) {
        if let Some(body) = self.body_mut(handle) {
            body.set_block_inertia_tensor(half_extents, mass);
        }
    }

    /// Sets the gravity, also applying it to every body with finite mass
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        for body in self.bodies.iter_mut().filter(|b| b.has_finite_mass()) {
            body.set_acceleration(gravity);
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Sets the sleep threshold of the world and every body in it
    pub fn set_sleep_epsilon(&mut self, sleep_epsilon: f32) {
        self.config.sleep_epsilon = sleep_epsilon;
        for body in &mut self.bodies {
            body.set_sleep_epsilon(sleep_epsilon);
        }
    }

    pub fn set_iterations(&mut self, velocity_iterations: usize, position_iterations: usize) {
        self.config.resolver.velocity_iterations = velocity_iterations;
        self.config.resolver.position_iterations = position_iterations;
        self.resolver.set_iterations(velocity_iterations, position_iterations);
    }

    pub fn set_epsilon(&mut self, velocity_epsilon: f32, position_epsilon: f32) {
        self.config.resolver.velocity_epsilon = velocity_epsilon;
        self.config.resolver.position_epsilon = position_epsilon;
        self.resolver.set_epsilon(velocity_epsilon, position_epsilon);
    }

    pub fn set_separating_axes(&mut self, axes: SeparatingAxes) {
        self.config.separating_axes = axes;
        self.detector = CollisionDetector::new(axes);
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// Contacts found and resolved by the last step
    pub fn contacts(&self) -> &[Contact] {
        self.collision_data.contacts()
    }

    pub fn contact_count(&self) -> usize {
        self.collision_data.len()
    }

    /// Contacts the last step found but had no room for
    pub fn dropped_contacts(&self) -> usize {
        self.collision_data.dropped()
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Bodies are integrated first, then contacts are generated between every
    /// pair of bodies and against the scenery, and finally resolved. A `dt` that
    /// is not positive and finite is ignored.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            warn!(dt, "ignoring step with invalid time delta");
            return;
        }

        self.collision_data.reset(self.config.contacts.max_contacts);
        self.collision_data.apply_config(&self.config.contacts);

        for body in &mut self.bodies {
            body.integrate(dt);
        }

        self.generate_contacts();

        self.resolver
            .resolve_contacts(self.collision_data.contacts_mut(), &mut self.bodies, dt);

        self.time += dt;

        trace!(
            dt,
            bodies = self.bodies.len(),
            contacts = self.collision_data.len(),
            dropped = self.collision_data.dropped(),
            "world stepped"
        );
    }

    /// Fills the contact pool for this step
    fn generate_contacts(&mut self) {
        let detector = self.detector;
        let data = &mut self.collision_data;

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                // Two immovable bodies can do nothing about their contact
                if !a.has_finite_mass() && !b.has_finite_mass() {
                    continue;
                }
                detector.collide(
                    Collider::new(BodyHandle::new(i as u32), a, &self.shapes[i]),
                    Collider::new(BodyHandle::new(j as u32), b, &self.shapes[j]),
                    data,
                );
            }
        }

        for plane in &self.planes {
            for (i, body) in self.bodies.iter().enumerate() {
                if !body.has_finite_mass() {
                    continue;
                }
                detector.collide_plane(
                    Collider::new(BodyHandle::new(i as u32), body, &self.shapes[i]),
                    plane,
                    data,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> Shape {
        Shape::cuboid(Vec3::splat(0.5))
    }

    #[test]
    fn test_world_creation() {
        let world = World::default();
        assert_eq!(world.num_bodies(), 0);
        assert_eq!(world.gravity(), Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(world.time(), 0.0);
    }

    #[test]
    fn test_create_body() {
        let mut world = World::default();

        let handle = world.create_body_with(
            RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 5.0, 0.0)).with_mass(2.0),
            unit_cube(),
        );

        assert_eq!(world.num_bodies(), 1);
        assert_eq!(world.body_position(handle), Vec3::new(0.0, 5.0, 0.0));

        let body = world.body(handle).unwrap();
        assert_relative_eq!(body.mass(), 2.0);
        assert_eq!(body.acceleration(), world.gravity());
        assert_eq!(body.linear_damping(), 0.9);
        // (1/3) * m * (hy^2 + hz^2) = (1/3) * 2 * 0.5
        assert_relative_eq!(body.inverse_inertia_tensor().get(0, 0), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_fixed_body_ignores_gravity() {
        let mut world = World::default();
        let handle = world.create_body_with(RigidBodyDesc::fixed(), unit_cube());

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        assert_eq!(world.body_position(handle), Vec3::ZERO);
        assert!(!world.body(handle).unwrap().has_finite_mass());
    }

    #[test]
    fn test_gravity_simulation() {
        let mut world = World::default();
        let handle = world.create_body_with(
            RigidBodyDesc::dynamic()
                .with_position(Vec3::new(0.0, 10.0, 0.0))
                .with_can_sleep(false),
            unit_cube(),
        );

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let pos = world.body_position(handle);
        assert!(pos.y < 10.0 && pos.y > 4.0);
        assert_relative_eq!(world.time(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut world = World::default();
        let handle = world.create_body_with(
            RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 1.0, 0.0)),
            unit_cube(),
        );

        world.step(0.0);
        world.step(-1.0);
        world.step(f32::NAN);
        world.step(f32::INFINITY);

        assert_eq!(world.time(), 0.0);
        assert_eq!(world.body_position(handle), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_set_gravity_updates_bodies() {
        let mut world = World::default();
        let dynamic = world.create_body(unit_cube());
        let fixed = world.create_body_with(RigidBodyDesc::fixed(), unit_cube());

        world.set_gravity(Vec3::new(0.0, -1.0, 0.0));

        assert_eq!(world.body(dynamic).unwrap().acceleration(), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(world.body(fixed).unwrap().acceleration(), Vec3::ZERO);
    }

    #[test]
    fn test_overlapping_boxes_generate_contact() {
        let mut world = World::new(WorldConfig::default().with_gravity(Vec3::ZERO));
        world.create_body(Shape::cuboid(Vec3::splat(1.0)));
        world.create_body_with(
            RigidBodyDesc::dynamic().with_position(Vec3::new(1.5, 0.0, 0.0)),
            Shape::cuboid(Vec3::splat(1.0)),
        );

        world.step(1.0 / 60.0);

        assert_eq!(world.contact_count(), 1);
        assert_relative_eq!(world.contacts()[0].normal().x.abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_contacts() {
        let mut world = World::default();
        world.add_plane(Plane::ground(0.0));
        world.create_body_with(
            RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 0.45, 0.0)),
            unit_cube(),
        );
        world.create_body_with(
            RigidBodyDesc::fixed().with_position(Vec3::new(3.0, 0.0, 0.0)),
            unit_cube(),
        );

        world.step(1.0 / 200.0);

        // Only the dynamic box touches the scenery; the fixed one is skipped
        assert_eq!(world.contact_count(), 4);
    }

    #[test]
    fn test_body_transform_matches_corrected_position() {
        let mut world = World::new(WorldConfig::default().with_gravity(Vec3::ZERO));
        world.add_plane(Plane::ground(0.0));
        let cube = world.create_body_with(
            RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 0.45, 0.0)),
            unit_cube(),
        );

        world.step(1.0 / 200.0);

        let position = world.body_position(cube);
        assert!(world.body(cube).unwrap().is_awake());
        assert!(position.y > 0.45);
        assert_eq!(world.body_transform(cube).translation, position);
    }

    #[test]
    fn test_iteration_settings_reach_resolver() {
        let mut world = World::default();
        world.set_iterations(12, 7);
        world.set_epsilon(0.02, 0.03);

        assert_eq!(world.resolver().velocity_iterations(), 12);
        assert_eq!(world.resolver().position_iterations(), 7);
        assert_eq!(world.resolver().position_epsilon(), 0.03);
        assert_eq!(world.config().resolver.velocity_epsilon, 0.02);
    }

    #[test]
    fn test_validate() {
        assert!(WorldConfig::default().validate().is_ok());

        let config = WorldConfig::default().with_resolver(
            ResolverConfig::default().with_iterations(0, 3),
        );
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations { kind: "velocity" }));

        let config = WorldConfig::default().with_contacts(
            ContactConfig::default().with_max_contacts(0),
        );
        assert_eq!(config.validate(), Err(ConfigError::ZeroContactCapacity));

        let config = WorldConfig::default().with_damping(1.5, 0.9);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDamping {
                kind: "linear",
                value: 1.5
            })
        );

        let config = WorldConfig::default().with_sleep_epsilon(0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidSleepEpsilon(0.0)));

        let config = WorldConfig::default().with_gravity(Vec3::new(0.0, f32::NAN, 0.0));
        assert_eq!(config.validate(), Err(ConfigError::NonFiniteGravity));

        let config = WorldConfig::default().with_contacts(
            ContactConfig::default().with_friction(-0.1),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCoefficient { name: "friction", .. })
        ));
    }

    #[test]
    fn test_try_new() {
        assert!(World::try_new(WorldConfig::default()).is_ok());

        let bad = WorldConfig::default().with_resolver(
            ResolverConfig::default().with_epsilon(-1.0, 0.01),
        );
        assert!(matches!(
            World::try_new(bad),
            Err(ConfigError::NegativeEpsilon { kind: "velocity", .. })
        ));
    }
}
