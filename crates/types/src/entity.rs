//! Units of work waiting for a resource

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved spelling of the wildcard resource name
pub const ANY_RESOURCE: &str = "any";

/// Scheduling priority; lower values are served first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    /// Precedence used when no priority was given
    pub const LOWEST: Priority = Priority(i32::MAX);

    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The resource an entity asks for
///
/// A named requirement is a lower-cased prefix: any resource whose name
/// starts with it satisfies the entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredResource {
    /// Any resource will do
    Any,
    /// Resources whose lower-cased name starts with this prefix
    Named(String),
}

impl RequiredResource {
    /// Parse a requirement; blank input and `any` (any case) mean the wildcard
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.is_empty() || name == ANY_RESOURCE {
            Self::Any
        } else {
            Self::Named(name)
        }
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Whether a resource with `resource_name` satisfies this requirement
    #[must_use]
    pub fn matches(&self, resource_name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Named(prefix) => resource_name.to_lowercase().starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for RequiredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(ANY_RESOURCE),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A unit of work that needs exactly one resource before it may run
///
/// Entities are configured with the builder methods before they are
/// queued and are not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity<T> {
    payload: T,
    required: RequiredResource,
    priority: Priority,
    exclusive: bool,
}

impl<T> Entity<T> {
    /// Create an entity with the lowest priority and a shared lock
    pub fn new(payload: T, required: RequiredResource) -> Self {
        Self {
            payload,
            required,
            priority: Priority::LOWEST,
            exclusive: false,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Require a hard lock: the whole capacity of the resource
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    #[must_use]
    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn required(&self) -> &RequiredResource {
        &self.required
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl<T: fmt::Display> fmt::Display for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (resource: {}, priority: {}",
            self.payload, self.required, self.priority
        )?;
        if self.exclusive {
            f.write_str(", exclusive")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_recognises_wildcard() {
        assert_eq!(RequiredResource::parse("ANY"), RequiredResource::Any);
        assert_eq!(RequiredResource::parse(""), RequiredResource::Any);
        assert_eq!(
            RequiredResource::parse(" Staging "),
            RequiredResource::Named("staging".to_string())
        );
    }

    #[test]
    fn named_requirement_is_a_prefix() {
        let required = RequiredResource::parse("stag");
        assert!(required.matches("Staging-1"));
        assert!(required.matches("stage"));
        assert!(!RequiredResource::parse("stage").matches("Staging-1"));
        assert!(!required.matches("prod"));
        assert!(RequiredResource::Any.matches("prod"));
    }

    #[test]
    fn entity_defaults() {
        let entity = Entity::new("login", RequiredResource::Any);
        assert_eq!(entity.priority(), Priority::LOWEST);
        assert!(!entity.is_exclusive());

        let entity = entity.with_priority(3).exclusive();
        assert_eq!(entity.priority().value(), 3);
        assert!(entity.is_exclusive());
        assert_eq!(
            entity.to_string(),
            "login (resource: any, priority: 3, exclusive)"
        );
    }

    proptest! {
        #[test]
        fn every_name_matches_its_own_requirement(name in "[a-zA-Z][a-zA-Z0-9_-]{0,12}") {
            let required = RequiredResource::parse(&name);
            prop_assert!(required.matches(&name));
        }
    }
}
