//! Lock controller error types
//!
//! These are contract violations by the caller. Runtime scheduling
//! conditions are reported through lock results instead.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LockError {
    #[error("unknown resource: {name}")]
    UnknownResource { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("lock state poisoned during {operation}")]
    Poisoned { operation: String },
}

impl UserFacingError for LockError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownResource { .. } => {
                Some("Only resources returned by the controller can be locked or released.")
            }
            Self::Poisoned { .. } => {
                Some("A worker panicked inside the scheduler; restart the run.")
            }
            Self::InvalidArgument { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnknownResource { .. } => "lock.unknown_resource",
            Self::InvalidArgument { .. } => "lock.invalid_argument",
            Self::Poisoned { .. } => "lock.poisoned",
        };
        Some(code)
    }
}
