use crate::math::{Mat3, Mat34, Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default motion threshold below which a body is put to sleep
pub const DEFAULT_SLEEP_EPSILON: f32 = 0.3;

/// A rigid body in the physics simulation.
///
/// Position, orientation and the two velocities are the primary state. The world
/// transform and the world-space inverse inertia tensor are derived from them by
/// [`RigidBody::calculate_derived_data`], which every setter that changes the pose
/// calls for you.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBody {
    /// Inverse mass (0 for infinite mass / static)
    pub(crate) inverse_mass: f32,
    /// Body-space inverse inertia tensor
    pub(crate) inverse_inertia_tensor: Mat3,
    /// World-space inverse inertia tensor (derived)
    pub(crate) inverse_inertia_tensor_world: Mat3,

    pub(crate) position: Vec3,
    pub(crate) orientation: Quat,
    /// Linear velocity
    pub(crate) velocity: Vec3,
    /// Angular velocity in radians per second
    pub(crate) rotation: Vec3,

    /// Fraction of linear velocity kept after one second
    pub(crate) linear_damping: f32,
    /// Fraction of angular velocity kept after one second
    pub(crate) angular_damping: f32,

    pub(crate) force_accum: Vec3,
    pub(crate) torque_accum: Vec3,
    /// Constant acceleration, normally gravity
    pub(crate) acceleration: Vec3,
    /// Linear acceleration seen by the last integration
    pub(crate) last_frame_acceleration: Vec3,

    /// Cached world transform (derived)
    pub(crate) transform: Mat34,

    pub(crate) is_awake: bool,
    pub(crate) can_sleep: bool,
    /// Recency-weighted kinetic activity used for sleeping
    pub(crate) motion: f32,
    pub(crate) sleep_epsilon: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            inverse_mass: 1.0,
            inverse_inertia_tensor: Mat3::IDENTITY,
            inverse_inertia_tensor_world: Mat3::IDENTITY,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            linear_damping: 0.9,
            angular_damping: 0.9,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            last_frame_acceleration: Vec3::ZERO,
            transform: Mat34::IDENTITY,
            is_awake: true,
            can_sleep: true,
            motion: 0.0,
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
        };
        body.motion = 2.0 * body.sleep_epsilon;
        body.calculate_derived_data();
        body
    }
}

impl RigidBody {
    /// Creates an awake unit-mass body at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Sets the orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.set_orientation(orientation);
        self
    }

    /// Sets the mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.set_mass(mass);
        self
    }

    /// Makes the body immovable
    pub fn with_infinite_mass(mut self) -> Self {
        self.make_static();
        self
    }

    /// Sets the body-space inertia tensor
    pub fn with_inertia_tensor(mut self, tensor: Mat3) -> Self {
        self.set_inertia_tensor(tensor);
        self
    }

    /// Sets the linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the angular velocity
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.set_damping(linear, angular);
        self
    }

    /// Sets the constant acceleration
    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Sets the sleep threshold
    pub fn with_sleep_epsilon(mut self, sleep_epsilon: f32) -> Self {
        self.sleep_epsilon = sleep_epsilon;
        if self.is_awake {
            self.motion = 2.0 * sleep_epsilon;
        }
        self
    }

    /// Rebuilds the world transform and world inverse inertia tensor.
    ///
    /// Normalizes the orientation first. Calling this twice with no mutation in
    /// between gives identical results.
    pub fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = Mat34::from_position_orientation(self.position, self.orientation);

        let rot = self.transform.rotation;
        self.inverse_inertia_tensor_world = rot * self.inverse_inertia_tensor * rot.transpose();
    }

    /// Sets the mass.
    ///
    /// # Panics
    ///
    /// Panics if `mass` is not strictly positive and finite. Use
    /// [`RigidBody::make_static`] for immovable bodies.
    pub fn set_mass(&mut self, mass: f32) {
        assert!(
            mass > 0.0 && mass.is_finite(),
            "body mass must be positive and finite, got {mass}"
        );
        self.inverse_mass = 1.0 / mass;
    }

    /// Returns the mass, or infinity for static bodies
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Sets the inverse mass directly.
    ///
    /// Zero makes the body immovable by contacts and also clears its inverse
    /// inertia, so contacts cannot spin it either.
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        self.inverse_mass = inverse_mass;
        if inverse_mass == 0.0 {
            self.inverse_inertia_tensor = Mat3::ZERO;
            self.inverse_inertia_tensor_world = Mat3::ZERO;
        }
    }

    /// World inverse inertia as seen by contact response: zero for bodies
    /// without finite mass.
    #[inline]
    pub(crate) fn contact_inverse_inertia(&self) -> Mat3 {
        if self.has_finite_mass() {
            self.inverse_inertia_tensor_world
        } else {
            Mat3::ZERO
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Returns true if this body has finite mass
    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Gives the body infinite mass and inertia and clears its motion.
    pub fn make_static(&mut self) {
        self.inverse_mass = 0.0;
        self.inverse_inertia_tensor = Mat3::ZERO;
        self.inverse_inertia_tensor_world = Mat3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.rotation = Vec3::ZERO;
    }

    /// Sets the body-space inertia tensor.
    ///
    /// A singular tensor gives the body infinite rotational inertia.
    pub fn set_inertia_tensor(&mut self, tensor: Mat3) {
        self.inverse_inertia_tensor = tensor.try_inverse().unwrap_or(Mat3::ZERO);
        self.calculate_derived_data();
    }

    /// Sets the inertia tensor of a solid box with the given half-extents and mass
    pub fn set_block_inertia_tensor(&mut self, half_extents: Vec3, mass: f32) {
        let tensor = crate::geometry::BoxShape::new(half_extents).inertia_tensor(mass);
        self.set_inertia_tensor(tensor);
    }

    /// Sets the inertia tensor of a solid sphere with the given radius and mass
    pub fn set_sphere_inertia_tensor(&mut self, radius: f32, mass: f32) {
        let tensor = crate::geometry::Sphere::new(radius).inertia_tensor(mass);
        self.set_inertia_tensor(tensor);
    }

    /// Sets the body-space inverse inertia tensor directly
    pub fn set_inverse_inertia_tensor(&mut self, inverse: Mat3) {
        self.inverse_inertia_tensor = inverse;
        self.calculate_derived_data();
    }

    #[inline]
    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        self.inverse_inertia_tensor
    }

    #[inline]
    pub fn inverse_inertia_tensor_world(&self) -> Mat3 {
        self.inverse_inertia_tensor_world
    }

    /// World-space inertia tensor; None when the body cannot rotate
    pub fn inertia_tensor_world(&self) -> Option<Mat3> {
        self.inverse_inertia_tensor_world.try_inverse()
    }

    /// Sets linear and angular damping.
    ///
    /// Each is the fraction of velocity kept after one second: 1 means no damping.
    pub fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }

    #[inline]
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    #[inline]
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.calculate_derived_data();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets the orientation; the quaternion is normalized
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
        self.calculate_derived_data();
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Cached world transform, valid after [`RigidBody::calculate_derived_data`]
    #[inline]
    pub fn transform(&self) -> &Mat34 {
        &self.transform
    }

    /// Converts a body-space point to world space
    #[inline]
    pub fn point_in_world_space(&self, point: Vec3) -> Vec3 {
        self.transform.transform_point(point)
    }

    /// Converts a world-space point to body space
    #[inline]
    pub fn point_in_local_space(&self, point: Vec3) -> Vec3 {
        self.transform.transform_inverse_point(point)
    }

    /// Converts a body-space direction to world space
    #[inline]
    pub fn direction_in_world_space(&self, direction: Vec3) -> Vec3 {
        self.transform.transform_direction(direction)
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn add_velocity(&mut self, delta: Vec3) {
        self.velocity += delta;
    }

    /// Sets the angular velocity
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Angular velocity in radians per second
    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn add_rotation(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Sets the constant acceleration (usually gravity)
    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }

    #[inline]
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Linear acceleration applied during the most recent integration
    #[inline]
    pub fn last_frame_acceleration(&self) -> Vec3 {
        self.last_frame_acceleration
    }

    /// Adds a force through the centre of mass
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
        self.is_awake = true;
    }

    /// Adds a force at a world-space point, producing torque about the centre of mass
    pub fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        let arm = point - self.position;
        self.force_accum += force;
        self.torque_accum += arm.cross(force);
        self.is_awake = true;
    }

    /// Adds a world-space force at a body-space point
    pub fn add_force_at_body_point(&mut self, force: Vec3, point: Vec3) {
        let world_point = self.point_in_world_space(point);
        self.add_force_at_point(force, world_point);
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque_accum += torque;
        self.is_awake = true;
    }

    /// Clears accumulated forces and torques
    pub fn clear_accumulators(&mut self) {
        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;
    }

    #[inline]
    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    /// Wakes or sleeps the body.
    ///
    /// Waking primes the motion estimate so the body does not fall straight back
    /// asleep. Sleeping zeroes both velocities.
    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            self.is_awake = true;
            self.motion = 2.0 * self.sleep_epsilon;
        } else {
            self.is_awake = false;
            self.velocity = Vec3::ZERO;
            self.rotation = Vec3::ZERO;
        }
    }

    #[inline]
    pub fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    /// Allows or forbids sleeping. Forbidding it wakes a sleeping body.
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep;
        if !can_sleep && !self.is_awake {
            self.set_awake(true);
        }
    }

    /// Current motion estimate compared against the sleep threshold
    #[inline]
    pub fn motion(&self) -> f32 {
        self.motion
    }

    #[inline]
    pub fn sleep_epsilon(&self) -> f32 {
        self.sleep_epsilon
    }

    pub fn set_sleep_epsilon(&mut self, sleep_epsilon: f32) {
        self.sleep_epsilon = sleep_epsilon;
    }

    /// Velocity of a world-space point attached to the body
    #[inline]
    pub fn velocity_at_point(&self, point: Vec3) -> Vec3 {
        self.velocity + self.rotation.cross(point - self.position)
    }
}

/// Description used by [`World::create_body_with`](crate::World::create_body_with).
///
/// Any field left as `None` takes the world's default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyDesc {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub rotation: Vec3,
    /// Mass, or None for an immovable body
    pub mass: Option<f32>,
    pub linear_damping: Option<f32>,
    pub angular_damping: Option<f32>,
    pub can_sleep: bool,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            mass: Some(1.0),
            linear_damping: None,
            angular_damping: None,
            can_sleep: true,
        }
    }
}

impl RigidBodyDesc {
    /// A unit-mass dynamic body
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// An immovable body
    pub fn fixed() -> Self {
        Self {
            mass: None,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = Some(linear);
        self.angular_damping = Some(angular);
        self
    }

    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }
}
