#![forbid(unsafe_code)]

use std::fmt;

/// A dot-separated path identifying a class type in the registry.
///
/// Built incrementally by appending one segment at a time; a plain value
/// with no ownership ties to the registry it is looked up in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![root.into()],
        }
    }

    pub fn from_dotted(dotted: &str) -> Option<Self> {
        if dotted.is_empty() || dotted.split('.').any(str::is_empty) {
            return None;
        }
        Some(Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        })
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The final segment (the bare class name).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_appends_one_segment() {
        let q = QualifiedName::new("__sable__").child("nets").child("Linear");
        assert_eq!(q.to_string(), "__sable__.nets.Linear");
        assert_eq!(q.name(), "Linear");
    }

    #[test]
    fn from_dotted_round_trips() {
        let q = QualifiedName::from_dotted("a.b.c").unwrap();
        assert_eq!(q.segments(), ["a", "b", "c"]);
        assert!(QualifiedName::from_dotted("").is_none());
        assert!(QualifiedName::from_dotted("a..b").is_none());
    }
}
