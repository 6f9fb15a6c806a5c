//! Error types
//!
//! Nothing in the collision core is fatal. Handler errors are caught at the
//! dispatcher boundary and logged; tuning errors surface at load time.

use thiserror::Error;

use crate::sim::{BodyId, EntityId, PowerUpKind};

/// Failure raised while a handler computes a collision response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    #[error("entity {0:?} is not alive in the scene")]
    MissingEntity(EntityId),

    #[error("body {0:?} is not present in the physics world")]
    MissingBody(BodyId),

    #[error("body {0:?} cannot change collision category")]
    CategoryChange(BodyId),

    #[error("cannot renormalize a zero-length velocity")]
    DegenerateVelocity,

    #[error("speed range {min}..{max} is empty or not finite")]
    InvalidSpeedRange { min: f32, max: f32 },

    #[error("no effect registered for power-up {0:?}")]
    UnknownPowerUp(PowerUpKind),

    #[error("collaborator failed: {0}")]
    Collaborator(String),
}

/// Invalid or unreadable tuning data
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value: {0}")]
    Invalid(String),
}
