mod mat3;
mod mat34;
mod quat;
mod vec3;

pub use mat3::Mat3;
pub use mat34::Mat34;
pub use quat::Quat;
pub use vec3::Vec3;
