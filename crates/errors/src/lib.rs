#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for envroute
//!
//! Expected scheduling outcomes (no free resource, timeout, undefined
//! resource, ...) are *not* errors: they are reported as lock results by
//! the controller. The types here cover misconfiguration and contract
//! violations by callers.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod discovery;
pub mod lock;

pub use config::ConfigError;
pub use discovery::DiscoveryError;
pub use lock::LockError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

/// Minimal interface for rendering user-facing error information.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Config(err) => err.user_message(),
            Error::Discovery(err) => err.user_message(),
            Error::Lock(err) => err.user_message(),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_hint(),
            Error::Discovery(err) => err.user_hint(),
            Error::Lock(err) => err.user_hint(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Config(err) => err.is_retryable(),
            Error::Discovery(err) => err.is_retryable(),
            Error::Lock(err) => err.is_retryable(),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_code(),
            Error::Discovery(err) => err.user_code(),
            Error::Lock(err) => err.user_code(),
        }
    }
}
