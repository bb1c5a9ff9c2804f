//! Item model and normalization factory.
//!
//! The item is the unit of output of a scan: one detected usage of an
//! imported symbol, normalized with its source location and resolved
//! module version.

pub mod factory;
pub mod types;

pub use factory::{create_item, locate, relative_path};
pub use types::{AttrValue, Item, ItemArgs, ItemKind, ItemMetadata, Location, RawUsage};
