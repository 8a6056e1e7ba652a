//! Path types.

use std::fmt;

/// One path component, unescaped.
pub type PathStep = String;

/// A parsed path.
pub type Path = Vec<PathStep>;

/// Classification of a single path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A property name.
    Key(&'a str),
    /// An element id.
    Id(i64),
    /// The append token.
    End,
}

impl<'a> Segment<'a> {
    /// Classifies a component. Digit runs that overflow `i64` stay keys.
    pub fn parse(step: &'a str) -> Self {
        if crate::is_end_marker(step) {
            return Segment::End;
        }
        if crate::is_id(step) {
            if let Ok(id) = step.parse() {
                return Segment::Id(id);
            }
        }
        Segment::Key(step)
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Id(id) => write!(f, "{id}"),
            Segment::End => f.write_str(crate::END_MARKER),
        }
    }
}
