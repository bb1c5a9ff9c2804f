//! Parser for npm package.json files.
//!
//! This module reads and parses package manifests for project metadata
//! and for the authoritative stage of version resolution.

use std::fs;
use std::path::Path;

use super::types::PackageJson;

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json file from a file path.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use usagescope::parser::package_json::parse_file;
///
/// let pkg = parse_file(Path::new("package.json")).unwrap();
/// println!("Package: {:?}", pkg.name);
/// ```
pub fn parse_file(path: &Path) -> ParseResult<PackageJson> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a package.json from a string.
///
/// # Example
///
/// ```
/// use usagescope::parser::package_json::parse_str;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg = parse_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
pub fn parse_str(content: &str) -> ParseResult<PackageJson> {
    let pkg: PackageJson = serde_json::from_str(content)?;
    Ok(pkg)
}
