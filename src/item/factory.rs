//! Factory that finalizes raw usage events into [`Item`] records.
//!
//! Centralizes the offset → line/column math, scan-root-relative path
//! normalization, and field defaulting so parse engines only deal in byte
//! offsets and raw values.

use std::path::Path;

use chrono::Utc;

use super::types::{Item, ItemMetadata, Location, RawUsage};

/// Builds a finalized [`Item`] from a raw usage event.
///
/// * `source` - full text of the file the event was found in
/// * `file` - path of that file
/// * `root` - scan root the location should be expressed relative to
/// * `project` - name of the enclosing project
pub fn create_item(
    raw: RawUsage,
    source: &str,
    file: &Path,
    root: &Path,
    project: &str,
) -> Item {
    let (line, column) = locate(source, raw.offset);
    let has_spread = raw.args.as_ref().is_some_and(|a| a.is_spread);

    Item {
        name: raw.name,
        module: raw.module,
        version: String::new(),
        kind: raw.kind,
        args: raw.args,
        location: Location {
            file: relative_path(root, file),
            line,
            column,
            module: project.to_string(),
        },
        metadata: ItemMetadata {
            has_spread_operator: has_spread,
        },
        created_at: Utc::now().to_rfc3339(),
    }
}

/// Maps a byte offset to a (1-based line, 0-based column) pair.
///
/// The column counts bytes since the last newline before the offset, so
/// offset 0 is line 1 column 0 and the byte immediately after the Nth
/// newline is line N+1 column 0. Offsets past the end of the text clamp
/// to the end.
pub fn locate(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];

    let line = before.bytes().filter(|b| *b == b'\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => offset - newline - 1,
        None => offset,
    };

    (line, column)
}

/// Expresses `file` relative to `root`, `/`-separated on every platform.
///
/// Falls back to the file path as given when it is not under the root.
pub fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
