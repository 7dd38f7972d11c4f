//! Resource ("environment") definition

use envroute_errors::LockError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// A named, capacity-bounded shared resource
///
/// Identity is the case-insensitive name. The capacity is fixed at
/// construction; slot accounting lives in the registry, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    name: String,
    capacity: NonZeroUsize,
    /// Directory the resource was discovered from, if any
    path: Option<PathBuf>,
    /// Flattened configuration properties
    properties: BTreeMap<String, String>,
}

impl Resource {
    /// Create a resource with the given name and capacity
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the capacity is zero.
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, LockError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LockError::InvalidArgument {
                message: "resource name must not be empty".to_string(),
            });
        }
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| LockError::InvalidArgument {
            message: format!("capacity of resource {name} must be positive"),
        })?;

        Ok(Self {
            name,
            capacity,
            path: None,
            properties: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Name as discovered (original case)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased name used for lookups and prefix matching
    #[must_use]
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Look up a single property
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
