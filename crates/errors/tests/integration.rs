//! Integration tests for error types

#[cfg(test)]
mod tests {
    use envroute_errors::*;

    #[test]
    fn test_error_conversion() {
        let lock_err = LockError::UnknownResource {
            name: "staging".into(),
        };
        let err: Error = lock_err.into();
        assert!(matches!(err, Error::Lock(_)));
        assert_eq!(err.user_code(), Some("lock.unknown_resource"));
    }

    #[test]
    fn test_error_display() {
        let err = DiscoveryError::NoResources {
            path: "environments".into(),
        };
        assert_eq!(err.to_string(), "no resources found in environments");

        let err: Error = err.into();
        assert_eq!(
            err.to_string(),
            "discovery error: no resources found in environments"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DiscoveryError::from_io_with_path(&io_err, std::path::Path::new("/tmp/envs"));
        assert!(matches!(err, DiscoveryError::DirectoryNotFound { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = DiscoveryError::from_io_with_path(&io_err, std::path::Path::new("/tmp/envs"));
        assert!(matches!(err, DiscoveryError::ReadFailed { .. }));
    }

    #[test]
    fn test_user_facing_hints() {
        let err: Error = ConfigError::InvalidValue {
            field: "ENVROUTE_POLL_INTERVAL_MS".into(),
            value: "soon".into(),
        }
        .into();
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
        assert_eq!(err.user_code(), Some("config.invalid_value"));
    }
}
