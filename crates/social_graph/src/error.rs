//! Error types for the resolution core.

use crate::model::Role;
use social_runtime::{ResolverError, SelectionError};
use thiserror::Error;

/// Errors returned by entry points and field resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("user with id={id} does not exist")]
    UserNotFound { id: String },

    #[error("user with id={id} and role={role} does not exist")]
    AdminNotFound { id: String, role: Role },

    #[error("not enough users: offset {offset} exceeds {len} available")]
    OutOfRange { offset: usize, len: usize },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl ResolveError {
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound { .. } | Self::AdminNotFound { .. } => "NOT_FOUND",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::InvalidArgument { .. } => "BAD_USER_INPUT",
            Self::Selection(e) => e.code(),
        }
    }

    /// Returns true for the not-found family.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. } | Self::AdminNotFound { .. })
    }
}

impl From<ResolveError> for ResolverError {
    fn from(error: ResolveError) -> Self {
        ResolverError::coded(error.code(), error.to_string())
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while building the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("duplicate user id {0}")]
    DuplicateId(String),

    #[error("friends declared for unknown user {0}")]
    UnknownUser(String),

    #[error("user {user} lists unknown friend {friend}")]
    DanglingFriend { user: String, friend: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_input() {
        let err = ResolveError::UserNotFound {
            id: "0x09".to_string(),
        };
        assert_eq!(err.to_string(), "user with id=0x09 does not exist");
        assert!(err.is_not_found());

        let err = ResolveError::AdminNotFound {
            id: "0x02".to_string(),
            role: Role::Admin,
        };
        assert_eq!(
            err.to_string(),
            "user with id=0x02 and role=ADMIN does not exist"
        );

        let err = ResolveError::OutOfRange { offset: 5, len: 3 };
        assert_eq!(err.to_string(), "not enough users: offset 5 exceeds 3 available");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            ResolveError::OutOfRange { offset: 1, len: 0 }.code(),
            "OUT_OF_RANGE"
        );
        assert_eq!(
            ResolveError::from(SelectionError::Unavailable).code(),
            "SELECTION_UNAVAILABLE"
        );

        let resolver_error: ResolverError = ResolveError::UserNotFound {
            id: "0x09".to_string(),
        }
        .into();
        assert_eq!(resolver_error.code(), "NOT_FOUND");
        assert_eq!(resolver_error.to_string(), "user with id=0x09 does not exist");
    }
}
