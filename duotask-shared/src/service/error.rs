/// Service-level error taxonomy
///
/// Every operation in [`crate::service`] returns a [`ServiceResult`]. Domain
/// denials (not-found, forbidden, validation, conflict) are typed outcomes;
/// anything the backend could not classify becomes [`ServiceError::Storage`]
/// and means the operation ended in an unknown state.

use serde::{Deserialize, Serialize};

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type for service operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Missing, malformed, expired or stale credential (never says which)
    #[error("Authentication required")]
    Unauthenticated,

    /// Unknown email or wrong password (never says which)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Task or group missing
    #[error("{0}")]
    ResourceNotFound(String),

    /// Authenticated but not the owner
    #[error("{0}")]
    Forbidden(String),

    /// Malformed input
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<FieldViolation>),

    /// Duplicate email, or a group transition that is not allowed
    #[error("{0}")]
    Conflict(String),

    /// Unknown invite code, or one whose owner has no group
    #[error("Invalid code")]
    InvalidCode,

    /// Action needs group membership first
    #[error("Create or join a group first")]
    GroupRequired,

    /// Backend fault; outcome unknown
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::ValidationFailed(vec![FieldViolation::new(field, message)])
    }

    pub fn task_not_found() -> Self {
        ServiceError::ResourceNotFound("Task not found".to_string())
    }

    pub fn group_not_found() -> Self {
        ServiceError::ResourceNotFound("Group not found".to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::ResourceNotFound("Resource not found".to_string()),
            StoreError::Conflict(what) => ServiceError::Conflict(format!("Conflict on {}", what)),
            StoreError::Storage(msg) => ServiceError::Storage(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotOwner => ServiceError::Forbidden("Not your task".to_string()),
            AuthzError::NotVisible => ServiceError::task_not_found(),
            AuthzError::GroupRequired => ServiceError::GroupRequired,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Storage(format!("Password operation failed: {}", err))
    }
}

/// Every token failure collapses to the same rejection
impl From<JwtError> for ServiceError {
    fn from(_: JwtError) -> Self {
        ServiceError::Unauthenticated
    }
}
