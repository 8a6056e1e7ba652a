//! Slash-separated paths for DTO patch documents.
//!
//! Patch operations address DTO properties with JSON-Pointer style paths
//! (`/12/channels/-`). Components are escaped the RFC 6901 way (`~0`, `~1`).
//! Two kinds of components get special treatment by the patch engine:
//!
//! - the end-marker `-`, meaning "append at the end of the collection";
//! - all-digit components, which address collection elements **by id**
//!   rather than by position.
//!
//! # Example
//!
//! ```
//! use folders_pointer::{format_json_pointer, parse_json_pointer, Segment};
//!
//! let path = parse_json_pointer("/12/channels/-");
//! assert_eq!(path, vec!["12", "channels", "-"]);
//! assert_eq!(Segment::parse(&path[0]), Segment::Id(12));
//! assert_eq!(Segment::parse(&path[2]), Segment::End);
//! assert_eq!(format_json_pointer(&path), "/12/channels/-");
//! ```

pub mod types;
pub use types::{Path, PathStep, Segment};

pub mod validate;
pub use validate::{validate_json_pointer, validate_path, PointerLimits, ValidationError};

/// Path token meaning "append at the end of the collection".
pub const END_MARKER: &str = "-";

/// Separator between path components.
pub const SEPARATOR: char = '/';

/// Unescapes a path component (`~1` → `/`, `~0` → `~`).
///
/// ```
/// use folders_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 first, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a path component (`~` → `~0`, `/` → `~1`).
///
/// ```
/// use folders_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parses a pointer string into its unescaped components.
///
/// The empty string is the root and yields no components.
///
/// ```
/// use folders_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/foo/bar"), vec!["foo", "bar"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    let body = pointer.strip_prefix(SEPARATOR).unwrap_or(pointer);
    body.split(SEPARATOR).map(unescape_component).collect()
}

/// Normalizes a client supplied path: guarantees a leading separator and
/// drops trailing separators. `""` and `"/"` both normalize to the root `""`.
///
/// ```
/// use folders_pointer::normalize;
///
/// assert_eq!(normalize("1/name/"), "/1/name");
/// assert_eq!(normalize("/"), "");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(pointer: &str) -> String {
    let trimmed = pointer.trim().trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with(SEPARATOR) {
        trimmed.to_string()
    } else {
        let mut absolute = String::with_capacity(trimmed.len() + 1);
        absolute.push(SEPARATOR);
        absolute.push_str(trimmed);
        absolute
    }
}

/// Normalizes then parses a pointer.
pub fn parse_normalized(pointer: &str) -> Path {
    parse_json_pointer(&normalize(pointer))
}

/// Formats components back into a pointer string. The root formats as `""`.
///
/// ```
/// use folders_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["a/b".to_string(), "-".to_string()]), "/a~1b/-");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push(SEPARATOR);
        out.push_str(&escape_component(component));
    }
    out
}

/// True for the append token `-`.
pub fn is_end_marker(step: &str) -> bool {
    step == END_MARKER
}

/// True for a non-empty, all-digit component.
///
/// Unlike array indices, ids may carry leading zeros; `"007"` addresses id 7.
pub fn is_id(step: &str) -> bool {
    !step.is_empty() && step.bytes().all(|b| b.is_ascii_digit())
}

/// True when the component addresses a collection element: an id or the
/// end-marker.
pub fn is_element_step(step: &str) -> bool {
    is_id(step) || is_end_marker(step)
}

/// Splits a leading element component off a path.
///
/// Documents against an entity collection start with the element id (or the
/// end-marker); the remainder is relative to the element type.
///
/// ```
/// use folders_pointer::{parse_json_pointer, split_element_prefix};
///
/// let path = parse_json_pointer("/7/name");
/// let (prefix, rest) = split_element_prefix(&path);
/// assert_eq!(prefix, Some("7"));
/// assert_eq!(rest, ["name".to_string()]);
/// ```
pub fn split_element_prefix(path: &[String]) -> (Option<&str>, &[String]) {
    match path.split_first() {
        Some((first, rest)) if is_element_step(first) => (Some(first.as_str()), rest),
        _ => (None, path),
    }
}

/// True if `child` lies strictly below `parent`.
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}
