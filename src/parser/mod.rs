//! Parser module for usagescope.
//!
//! This module provides parsers for package manifest files. Only the npm
//! package.json format is supported; manifests feed project metadata and
//! the declared-range fallback of version resolution.

pub mod package_json;
pub mod types;

// Re-export commonly used types for convenience
pub use package_json::{parse_file, parse_str, ParseError, ParseResult};
pub use types::PackageJson;
