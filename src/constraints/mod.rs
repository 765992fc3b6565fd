//! Per-contact response: the contact basis, closing velocity, impulses and
//! position corrections applied by the resolver.

mod contact_constraint;

pub(crate) use contact_constraint::bodies_mut;
pub use contact_constraint::{BodyDelta, ANGULAR_LIMIT, VELOCITY_LIMIT};
