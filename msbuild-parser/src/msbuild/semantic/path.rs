//! Element paths
//!
//! A path is a list of segments. Absolute paths start with the root segment (an empty
//! name) and render with a leading `/`; attribute segments are `@name`, text segments
//! `#text` and `#whitespace`.

use serde::{Serialize, Serializer};
use std::fmt;

const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XsPath {
    segments: Vec<String>,
}

impl XsPath {
    pub fn root() -> Self {
        Self {
            segments: vec![String::new()],
        }
    }

    /// Parse `/A/B` (absolute) or `A/B` (relative). Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        if path.starts_with(SEPARATOR) {
            segments.push(String::new());
        }
        segments.extend(
            path.split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_absolute(&self) -> bool {
        self.segments.first().is_some_and(|segment| segment.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.segments.len() == 1 && self.is_absolute()
    }

    /// The last segment.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    pub fn parent(&self) -> Option<XsPath> {
        match self.segments.len() {
            0 | 1 => None,
            length => Some(Self {
                segments: self.segments[..length - 1].to_vec(),
            }),
        }
    }

    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn starts_with(&self, base: &XsPath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Does this path end with `suffix`? An absolute suffix has to match from the root.
    pub fn ends_with(&self, suffix: &XsPath) -> bool {
        if suffix.is_absolute() {
            return self.starts_with(suffix) && self.segments.len() == suffix.segments.len();
        }
        self.segments.ends_with(&suffix.segments)
    }

    /// Is this path directly below `parent`? Every relative path is a child of the root.
    pub fn is_child_of(&self, parent: &XsPath) -> bool {
        if !self.is_absolute() && parent.is_root() {
            return true;
        }
        self.parent()
            .is_some_and(|own_parent| own_parent.ends_with(parent))
    }

    pub fn is_parent_of(&self, child: &XsPath) -> bool {
        child.is_child_of(self)
    }
}

impl fmt::Display for XsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{SEPARATOR}");
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl Serialize for XsPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
