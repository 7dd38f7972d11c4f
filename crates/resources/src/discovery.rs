//! Resource discovery from a directory tree
//!
//! Layout:
//!
//! ```text
//! environments/
//!   common.toml        # shared by every resource
//!   qa/                # resource "qa"
//!     settings.toml    # overrides shared values
//!   staging/           # resource "staging"
//! ```
//!
//! Every first-level subdirectory is one resource. TOML tables are
//! flattened into dotted property keys. A `capacity` property overrides
//! the default capacity for that resource.

use envroute_errors::{DiscoveryError, Error};
use envroute_types::Resource;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Property that overrides the uniform per-resource capacity
pub const CAPACITY_PROPERTY: &str = "capacity";

/// Discover resources below `dir`
///
/// # Errors
///
/// Returns an error if the directory is missing or unreadable, contains no
/// resource subdirectories, holds malformed TOML, or declares a capacity
/// that is not a positive integer.
pub async fn discover(dir: &Path, default_capacity: usize) -> Result<Vec<Resource>, Error> {
    tracing::debug!(dir = %dir.display(), "Discovering resources");

    let (shared_files, mut resource_dirs) = scan(dir).await?;
    if resource_dirs.is_empty() {
        return Err(DiscoveryError::NoResources {
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut shared = BTreeMap::new();
    for file in &shared_files {
        shared.extend(read_properties(file).await?);
    }

    resource_dirs.sort();
    let mut resources = Vec::with_capacity(resource_dirs.len());
    for resource_dir in resource_dirs {
        let name = resource_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut properties = shared.clone();
        let (files, _) = scan(&resource_dir).await?;
        for file in &files {
            properties.extend(read_properties(file).await?);
        }

        let capacity = match properties.get(CAPACITY_PROPERTY) {
            Some(value) => parse_capacity(&name, value)?,
            None => default_capacity,
        };

        tracing::debug!(resource = %name, capacity, "Resource found");
        resources.push(
            Resource::new(name, capacity)?
                .with_path(resource_dir)
                .with_properties(properties),
        );
    }

    Ok(resources)
}

/// TOML files and subdirectories directly inside `dir`, files sorted
async fn scan(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), DiscoveryError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DiscoveryError::from_io_with_path(&e, dir))?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DiscoveryError::from_io_with_path(&e, dir))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| DiscoveryError::from_io_with_path(&e, &path))?;

        if file_type.is_dir() {
            dirs.push(path);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }

    files.sort();
    Ok((files, dirs))
}

async fn read_properties(path: &Path) -> Result<BTreeMap<String, String>, DiscoveryError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| DiscoveryError::from_io_with_path(&e, path))?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| DiscoveryError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut properties = BTreeMap::new();
    flatten("", &table, &mut properties);
    Ok(properties)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten(&key, nested, out),
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

fn parse_capacity(resource: &str, value: &str) -> Result<usize, DiscoveryError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|capacity| *capacity > 0)
        .ok_or_else(|| DiscoveryError::InvalidCapacity {
            resource: resource.to_string(),
            value: value.to_string(),
        })
}
