//! # boxphy
//!
//! A small 3D rigid body physics core built around oriented boxes.
//!
//! ## Features
//!
//! - **Rigid Body Dynamics**: semi-implicit Euler integration with damping and sleeping
//! - **Collision Detection**: separating axis test between oriented boxes, plus
//!   spheres and static half-space scenery
//! - **Contact Resolution**: greedy, worst-first resolution of penetration and
//!   then velocity, with Coulomb friction and restitution
//! - **Fixed Contact Pool**: contacts beyond the configured capacity are dropped
//!
//! ## Quick Start
//!
//! ```rust
//! use boxphy::prelude::*;
//!
//! // Create a physics world
//! let mut world = World::default();
//! world.set_gravity(Vec3::new(0.0, -9.81, 0.0));
//!
//! // Static floor
//! world.add_plane(Plane::ground(0.0));
//!
//! // A box on a static pedestal
//! world.create_body_with(RigidBodyDesc::fixed(), Shape::cuboid(Vec3::splat(0.5)));
//! let cube = world.create_body_with(
//!     RigidBodyDesc::dynamic()
//!         .with_position(Vec3::new(0.0, 2.0, 0.0))
//!         .with_mass(1.0),
//!     Shape::cuboid(Vec3::splat(0.5)),
//! );
//!
//! // Simulation loop
//! let dt = 1.0 / 60.0;
//! for _ in 0..600 {
//!     world.step(dt);
//!     let pos = world.body_position(cube);
//!     println!("Box position: {:?}", pos);
//! }
//! ```

pub mod collision;
pub mod constraints;
pub mod dynamics;
pub mod error;
pub mod geometry;
pub mod math;
pub mod solver;
mod world;

pub use error::ConfigError;
pub use world::{World, WorldConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collision::{
        BodyHandle, Collider, CollisionData, CollisionDetector, Contact, ContactBodies,
        ContactConfig, SeparatingAxes,
    };
    pub use crate::dynamics::{RigidBody, RigidBodyDesc};
    pub use crate::error::ConfigError;
    pub use crate::geometry::{Aabb, BoxShape, Plane, Shape, Sphere};
    pub use crate::math::{Mat3, Mat34, Quat, Vec3};
    pub use crate::solver::{ContactResolver, ResolverConfig};
    pub use crate::world::{World, WorldConfig};
}
