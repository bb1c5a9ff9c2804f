//! Shared types for package manifest parsing.
//!
//! This module defines the manifest structure used for project metadata
//! and for the declared-range fallback of version resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents the structure of a package.json file.
///
/// Mirrors the npm package.json specification, capturing the fields needed
/// for usage analysis and version resolution. Unknown fields are ignored.
///
/// # Example
///
/// ```
/// use usagescope::parser::types::PackageJson;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PackageJson {
    /// The name of the package.
    pub name: Option<String>,

    /// The version of the package (semver format).
    pub version: Option<String>,

    /// A brief description of the package.
    pub description: Option<String>,

    /// Production dependencies required at runtime.
    pub dependencies: Option<BTreeMap<String, String>>,

    /// Development-only dependencies (testing, building, etc.).
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<BTreeMap<String, String>>,

    /// Peer dependencies that the host package must provide.
    #[serde(rename = "peerDependencies")]
    pub peer_dependencies: Option<BTreeMap<String, String>>,

    /// Optional dependencies that enhance functionality if available.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<BTreeMap<String, String>>,
}

impl PackageJson {
    /// Returns true if the package has any dependencies defined.
    pub fn has_dependencies(&self) -> bool {
        self.dependencies.as_ref().is_some_and(|d| !d.is_empty())
            || self
                .dev_dependencies
                .as_ref()
                .is_some_and(|d| !d.is_empty())
            || self
                .peer_dependencies
                .as_ref()
                .is_some_and(|d| !d.is_empty())
            || self
                .optional_dependencies
                .as_ref()
                .is_some_and(|d| !d.is_empty())
    }

    /// Merges declared dependency ranges into a single specifier → range map.
    ///
    /// Sources are layered as devDependencies, then optionalDependencies,
    /// then dependencies; a later source wins on key collision. This is the
    /// lookup table for the declared-range stage of version resolution.
    pub fn merged_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();

        for source in [
            &self.dev_dependencies,
            &self.optional_dependencies,
            &self.dependencies,
        ] {
            if let Some(ranges) = source {
                for (name, range) in ranges {
                    merged.insert(name.clone(), range.clone());
                }
            }
        }

        merged
    }
}
