pub mod contact;
pub mod narrow_phase;

pub use contact::{BodyHandle, CollisionData, Contact, ContactBodies, ContactConfig};
pub use narrow_phase::{Collider, CollisionDetector, SeparatingAxes};
