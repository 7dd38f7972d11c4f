//! Integration tests for config

#[cfg(test)]
mod tests {
    use envroute_config::*;
    use envroute_types::RequiredResource;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "ENVROUTE_RESOURCE_DIR",
        "ENVROUTE_RESOURCE_DEFAULT",
        "ENVROUTE_RESOURCE_FORCED",
        "ENVROUTE_MAX_CONCURRENT",
        "ENVROUTE_LOCK_TIMEOUT_MS",
        "ENVROUTE_POLL_INTERVAL_MS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[resource]
directory = "fixtures/envs"
default = "qa"
max_concurrent_per_resource = 3

[lock]
timeout_ms = 700
poll_interval_ms = 100
        "#
        )
        .unwrap();

        let config = RouterConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.resource.directory.to_str(), Some("fixtures/envs"));
        assert_eq!(config.resource.default.as_deref(), Some("qa"));
        assert_eq!(config.resource.forced, None);
        assert_eq!(config.resource.max_concurrent_per_resource, 3);
        assert_eq!(
            config.lock.wait_options().timeout,
            Duration::from_millis(700)
        );
        assert_eq!(
            config.resource.resolve_required(None),
            RequiredResource::Named("qa".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_sections_use_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[lock]\ntimeout_ms = 5").unwrap();

        let config = RouterConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.lock.timeout_ms, 5);
        assert_eq!(config.lock.poll_interval_ms, 500);
        assert_eq!(config.resource.max_concurrent_per_resource, 1);
        assert_eq!(config.resource.directory.to_str(), Some("environments"));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_a_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[lock\ntimeout_ms = ").unwrap();

        let err = RouterConfig::load_from_file(temp_file.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            envroute_errors::Error::Config(envroute_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = RouterConfig::load_or_default(Some(std::path::Path::new(
            "/definitely/not/here.toml",
        )))
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            envroute_errors::Error::Config(envroute_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("ENVROUTE_RESOURCE_FORCED", "prod");
        std::env::set_var("ENVROUTE_MAX_CONCURRENT", "4");
        std::env::set_var("ENVROUTE_POLL_INTERVAL_MS", "250");

        let mut config = RouterConfig::default();
        config.merge_env().unwrap();

        assert_eq!(config.resource.forced.as_deref(), Some("prod"));
        assert_eq!(config.resource.max_concurrent_per_resource, 4);
        assert_eq!(config.lock.poll_interval_ms, 250);
        assert_eq!(config.lock.timeout_ms, 60_000);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("ENVROUTE_LOCK_TIMEOUT_MS", "soon");

        let mut config = RouterConfig::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = RouterConfig::default();
        assert!(config.validate().is_ok());

        config.lock.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.resource.max_concurrent_per_resource = 0;
        assert!(config.validate().is_err());
    }
}
