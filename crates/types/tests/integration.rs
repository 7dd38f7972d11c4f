//! Integration tests for types

#[cfg(test)]
mod tests {
    use envroute_types::*;
    use std::sync::Arc;

    #[test]
    fn test_entity_routing_description() {
        let entity = Entity::new("checkout", RequiredResource::parse("  Staging "))
            .with_priority(2)
            .exclusive();

        assert_eq!(entity.required(), &RequiredResource::Named("staging".to_string()));
        assert!(entity.required().matches("Staging-EU"));
        assert!(!entity.required().matches("qa"));
        assert_eq!(
            entity.to_string(),
            "checkout (resource: staging, priority: 2, exclusive)"
        );
    }

    #[test]
    fn test_wildcard_spellings() {
        for name in ["", "   ", "any", "ANY"] {
            assert!(RequiredResource::parse(name).is_any(), "{name:?}");
        }
        assert!(!RequiredResource::parse("anything").is_any());
    }

    #[test]
    fn test_lock_result_lifecycle() {
        let resource = Arc::new(Resource::new("qa", 2).unwrap());
        let entity = Entity::new(7_u32, RequiredResource::Any);

        let result = LockResult::locked(Arc::clone(&resource), entity, false);
        assert_eq!(result.status(), LockStatus::SuccessLocked);
        assert!(!result.status().is_transient());

        let (granted, entity) = result.into_grant().unwrap();
        assert_eq!(granted.name(), "qa");
        assert_eq!(*entity.payload(), 7);

        let waiting = LockResult::<u32>::status_only(LockStatus::NoEntityForAvailableEnvs);
        assert!(waiting.status().is_transient());
        assert!(waiting.into_grant().is_err());
    }

    #[test]
    fn test_default_wait_options() {
        let wait = WaitOptions::default();
        assert_eq!(wait.timeout.as_millis(), 60_000);
        assert_eq!(wait.poll_interval.as_millis(), 500);
    }
}
