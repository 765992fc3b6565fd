use thiserror::Error;

/// Errors reported when validating a [`WorldConfig`](crate::WorldConfig).
///
/// Stepping the simulation never fails; these only surface from
/// [`WorldConfig::validate`](crate::WorldConfig::validate) and
/// [`World::try_new`](crate::World::try_new).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("resolver needs at least one {kind} iteration")]
    ZeroIterations { kind: &'static str },

    #[error("{kind} epsilon must be non-negative, got {value}")]
    NegativeEpsilon { kind: &'static str, value: f32 },

    #[error("sleep epsilon must be positive and finite, got {0}")]
    InvalidSleepEpsilon(f32),

    #[error("contact capacity must be at least 1")]
    ZeroContactCapacity,

    #[error("{kind} damping must lie in (0, 1], got {value}")]
    InvalidDamping { kind: &'static str, value: f32 },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidCoefficient { name: &'static str, value: f32 },

    #[error("gravity must be finite")]
    NonFiniteGravity,
}
