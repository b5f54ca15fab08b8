//! Error types for the particle subsystem.
//!
//! Every error is reported synchronously to the caller of the operation that
//! detected it. Nothing here is retried internally.

use std::fmt;

/// Invalid configuration, detected before anything is allocated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Particle capacity must be at least one.
    ZeroCapacity,
    /// Kill radius must be finite and non-negative.
    InvalidKillRadius(f32),
    /// Minimum velocity must be finite and non-negative.
    InvalidMinVelocity(f32),
    /// Maximum velocity must be finite and not below the minimum.
    InvalidMaxVelocity { min: f32, max: f32 },
    /// Emitter center must be finite.
    InvalidEmitterCenter([f32; 2]),
    /// The configuration exceeds what the adapter reports it can do.
    PlatformLimitExceeded {
        limit: &'static str,
        requested: u64,
        allowed: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "Particle capacity must be greater than zero"),
            ConfigError::InvalidKillRadius(r) => write!(f, "Kill radius must be non-negative, got {}", r),
            ConfigError::InvalidMinVelocity(v) => write!(f, "Minimum velocity must be non-negative, got {}", v),
            ConfigError::InvalidMaxVelocity { min, max } => {
                write!(f, "Maximum velocity {} must not be below minimum velocity {}", max, min)
            }
            ConfigError::InvalidEmitterCenter(c) => write!(f, "Emitter center must be finite, got {:?}", c),
            ConfigError::PlatformLimitExceeded {
                limit,
                requested,
                allowed,
            } => write!(f, "Platform limit {} exceeded: requested {}, adapter allows {}", limit, requested, allowed),
        }
    }
}

impl std::error::Error for ConfigError {}

/// An operation was called out of order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtocolViolation {
    /// The manager has not been initialized.
    NotInitialized,
    /// `init` was called on a manager that still owns its resources.
    AlreadyInitialized,
    /// The manager's resources were already released by `cleanup`.
    AlreadyReleased,
    /// `render` was called before any `update` since init.
    RenderBeforeUpdate,
    /// `update` was called again before the previous frame was rendered.
    UpdateBeforeRender,
    /// Delta time must be finite and non-negative.
    InvalidDeltaTime(f32),
    /// The shared buffer is still bound in another role.
    BindingConflict {
        bound: BindingRole,
        requested: BindingRole,
    },
}

/// The two roles the shared particle buffer can be bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingRole {
    Update,
    Render,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::NotInitialized => write!(f, "Particle manager is not initialized"),
            ProtocolViolation::AlreadyInitialized => write!(f, "Particle manager is already initialized; call cleanup first"),
            ProtocolViolation::AlreadyReleased => write!(f, "Particle manager resources were already released"),
            ProtocolViolation::RenderBeforeUpdate => write!(f, "Render called before the first update"),
            ProtocolViolation::UpdateBeforeRender => write!(f, "Update called again before the previous frame was rendered"),
            ProtocolViolation::InvalidDeltaTime(dt) => write!(f, "Delta time must be finite and non-negative, got {}", dt),
            ProtocolViolation::BindingConflict { bound, requested } => {
                write!(f, "Particle buffer is bound for {:?}, cannot bind for {:?}", bound, requested)
            }
        }
    }
}

impl std::error::Error for ProtocolViolation {}

/// Errors returned by `ParticleManager`.
#[derive(Debug)]
pub enum ParticleError {
    /// Invalid init parameters or adapter limits exceeded.
    Configuration(ConfigError),
    /// GPU memory or handle allocation failed.
    ResourceExhaustion(String),
    /// An operation was called out of order.
    ProtocolViolation(ProtocolViolation),
    /// A program handle does not fit the pipeline built around it.
    InvalidProgram(String),
    /// Failed to map a buffer for reading.
    BufferMapping(String),
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleError::Configuration(e) => write!(f, "Configuration error: {}", e),
            ParticleError::ResourceExhaustion(msg) => write!(f, "GPU resource allocation failed: {}", msg),
            ParticleError::ProtocolViolation(e) => write!(f, "Protocol violation: {}", e),
            ParticleError::InvalidProgram(msg) => write!(f, "Invalid shader program: {}", msg),
            ParticleError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for ParticleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParticleError::Configuration(e) => Some(e),
            ParticleError::ProtocolViolation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ParticleError {
    fn from(e: ConfigError) -> Self {
        ParticleError::Configuration(e)
    }
}

impl From<ProtocolViolation> for ParticleError {
    fn from(e: ProtocolViolation) -> Self {
        ParticleError::ProtocolViolation(e)
    }
}
