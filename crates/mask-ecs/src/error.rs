//! ECS error types.
//!
//! Every variant is a programmer error at the call site. Nothing here is
//! transient or worth retrying.

use thiserror::Error;

use crate::entity::Entity;

/// ECS error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Handle is stale, out of range, or the sentinel.
    #[error("invalid entity: {0:?}")]
    InvalidEntity(Entity),

    /// Typed fetch of a component the entity does not own.
    #[error("entity {entity:?} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// More distinct component types than a mask can hold.
    #[error("component type limit of {limit} exceeded")]
    ComponentLimit { limit: usize },

    /// More entity slots than a pool can address.
    #[error("entity limit of {limit} exceeded")]
    EntityLimit { limit: usize },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
