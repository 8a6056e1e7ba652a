//! Element addressing inside loaded collections.

use folders_pointer::Segment;
use serde_json::Value;

/// Where an element component points inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// An element whose key matches.
    Index(usize),
    /// The end of the collection; legal for adds only.
    Append,
    OutOfBounds,
}

impl Position {
    /// Resolves `step` against `items` keyed by `key`.
    ///
    /// Ids match element keys, not positions. For adds, the end-marker and
    /// an unmatched id equal to the collection length both mean append.
    pub fn resolve(items: &[Value], key: &str, step: &str, for_add: bool) -> Position {
        match Segment::parse(step) {
            Segment::Id(id) => {
                if let Some(index) = items
                    .iter()
                    .position(|item| item.get(key).and_then(Value::as_i64) == Some(id))
                {
                    return Position::Index(index);
                }
                if for_add && usize::try_from(id).is_ok_and(|id| id == items.len()) {
                    Position::Append
                } else {
                    Position::OutOfBounds
                }
            }
            Segment::End if for_add => Position::Append,
            Segment::End | Segment::Key(_) => Position::OutOfBounds,
        }
    }
}
