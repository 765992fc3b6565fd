mod integrator;
mod rigid_body;

pub use rigid_body::{RigidBody, RigidBodyDesc, DEFAULT_SLEEP_EPSILON};
