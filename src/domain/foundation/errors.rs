//! Error types for the dispatch core.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error taxonomy for dispatch operations.
///
/// The first three variants are synchronous rejections surfaced to the
/// caller with a specific reason. Storage failures are infrastructure
/// errors; fan-out and recorder failures are deliberately NOT here — they
/// are logged side-channel outcomes and never fail the triggering action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Referenced incident, assignment or resource does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The requested status transition violates the state machine table.
    #[error("Invalid assignment transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The resource already holds an active assignment on another incident.
    #[error("Resource {resource_type} '{resource_id}' already has an active assignment")]
    ResourceAlreadyAssigned {
        resource_type: String,
        resource_id: String,
    },

    /// Value object or request validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Underlying durable store failed.
    #[error("Storage error: {0}")]
    Database(String),
}

impl DispatchError {
    /// Creates a not-found error for a named entity kind.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DispatchError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an invalid transition error from a rejected (source, destination) pair.
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        DispatchError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates an exclusivity violation error.
    pub fn already_assigned(resource_type: impl ToString, resource_id: impl ToString) -> Self {
        DispatchError::ResourceAlreadyAssigned {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
        }
    }

    /// Stable machine-readable code, used by the HTTP adapter.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::NotFound { .. } => "NOT_FOUND",
            DispatchError::InvalidTransition { .. } => "INVALID_TRANSITION",
            DispatchError::ResourceAlreadyAssigned { .. } => "RESOURCE_ALREADY_ASSIGNED",
            DispatchError::Validation(_) => "VALIDATION_FAILED",
            DispatchError::Database(_) => "DATABASE_ERROR",
        }
    }
}
