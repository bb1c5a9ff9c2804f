//! Project discovery and the aggregation driver.
//!
//! [`scan`] is the top-level entry point: discover projects under a root,
//! extract usage items from every file, resolve versions, and notify
//! plugins, returning the complete ordered output or the first fatal
//! error.

pub mod driver;
pub mod scanner;

pub use driver::{scan, Analyzer, ScanError, ScanOptions};
pub use scanner::{
    FsScanner, Project, Scanner, DEFAULT_EXCLUDED_FOLDERS, DEFAULT_SOURCE_EXTENSIONS,
};
