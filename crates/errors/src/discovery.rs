//! Resource discovery error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("resource directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("no resources found in {path}")]
    NoResources { path: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid capacity for resource {resource}: {value}")]
    InvalidCapacity { resource: String, value: String },

    #[error("failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },
}

impl DiscoveryError {
    /// Convert an `io::Error` raised while reading `path`
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::DirectoryNotFound {
                path: path.display().to_string(),
            },
            _ => Self::ReadFailed {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl UserFacingError for DiscoveryError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DirectoryNotFound { .. } | Self::NoResources { .. } => Some(
                "Point resource.directory at a directory with one subdirectory per resource.",
            ),
            Self::InvalidCapacity { .. } => Some("Set capacity to a positive integer."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ReadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DirectoryNotFound { .. } => "discovery.directory_not_found",
            Self::NoResources { .. } => "discovery.no_resources",
            Self::ParseError { .. } => "discovery.parse_error",
            Self::InvalidCapacity { .. } => "discovery.invalid_capacity",
            Self::ReadFailed { .. } => "discovery.read_failed",
        };
        Some(code)
    }
}
