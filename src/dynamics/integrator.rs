use tracing::debug;

use super::rigid_body::RigidBody;

impl RigidBody {
    /// Advances the body by `dt` seconds.
    ///
    /// Semi-implicit Euler: accumulated force, torque and the constant acceleration
    /// update the velocities, damping is applied as `damping^dt`, then the pose is
    /// advanced with the new velocities. Derived data is refreshed and the
    /// accumulators cleared. Sleeping bodies are left untouched.
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_awake {
            return;
        }

        self.last_frame_acceleration = self.acceleration;
        self.last_frame_acceleration
            .add_scaled(self.force_accum, self.inverse_mass);

        let angular_acceleration = self.inverse_inertia_tensor_world * self.torque_accum;

        self.velocity.add_scaled(self.last_frame_acceleration, dt);
        self.rotation.add_scaled(angular_acceleration, dt);

        self.velocity *= self.linear_damping.powf(dt);
        self.rotation *= self.angular_damping.powf(dt);

        self.position.add_scaled(self.velocity, dt);
        self.orientation.add_scaled_vector(self.rotation, dt);

        self.calculate_derived_data();
        self.clear_accumulators();

        if self.can_sleep {
            self.update_motion(dt);
        }
    }

    /// Blends the current kinetic activity into the motion estimate and puts the
    /// body to sleep once it drops under the threshold.
    fn update_motion(&mut self, dt: f32) {
        let current = self.velocity.length_squared() + self.rotation.length_squared();
        let bias = 0.5f32.powf(dt);
        self.motion = bias * self.motion + (1.0 - bias) * current;

        if self.motion < self.sleep_epsilon {
            debug!(motion = self.motion, "body fell asleep");
            self.set_awake(false);
        } else if self.motion > 10.0 * self.sleep_epsilon {
            self.motion = 10.0 * self.sleep_epsilon;
        }
    }
}
