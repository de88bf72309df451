use thiserror::Error;

use crate::types::{AccountId, BookingStatus, ListingId};

/// Failures surfaced by the booking, listing and messaging operations.
///
/// Every variant belongs to exactly one of the transport-facing classes
/// returned by [`DomainError::kind`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("End date must be after start date")]
    InvalidRange,

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    #[error("Receiver not found: {0}")]
    InvalidReceiver(AccountId),

    #[error("Booking cannot move from {from} to {to}")]
    TransitionRejected { from: BookingStatus, to: BookingStatus },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to map a [`DomainError`] onto a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidRange => ErrorKind::Validation,
            DomainError::Unauthorized => ErrorKind::Unauthorized,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::NotFound(_)
            | DomainError::ListingNotFound(_)
            | DomainError::InvalidReceiver(_) => ErrorKind::NotFound,
            DomainError::TransitionRejected { .. } | DomainError::Conflict(_) => {
                ErrorKind::Conflict
            }
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }
}

/// Errors reported by a repository implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => DomainError::NotFound("Record not found".into()),
            RepositoryError::Conflict(msg) => DomainError::Conflict(msg),
            RepositoryError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_range_is_a_validation_failure() {
        assert_eq!(DomainError::InvalidRange.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_references_map_to_not_found() {
        assert_eq!(
            DomainError::ListingNotFound(ListingId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DomainError::InvalidReceiver(AccountId::new()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn backend_errors_become_internal() {
        let err: DomainError = RepositoryError::Backend("disk full".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
