//! Field paths into a schema or a record.
//!
//! The textual form is `pdn[0].pcc_rule[*].flow`: field names joined by dots,
//! array steps in brackets (`*` addresses every element).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object field name.
    Key(String),
    /// Concrete array element.
    Index(usize),
    /// Any array element.
    Wildcard,
}

/// Ordered sequence of steps from the schema root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with a field step appended.
    pub fn key(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.to_string()));
        Self(segments)
    }

    /// Returns a new path with an element step appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns a new path with a wildcard element step appended.
    pub fn wildcard(&self) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Wildcard);
        Self(segments)
    }

    /// RFC 6901 JSON Pointer for this path. Wildcards render as `*`.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.0 {
            pointer.push('/');
            match segment {
                PathSegment::Key(name) => {
                    pointer.push_str(&name.replace('~', "~0").replace('/', "~1"))
                }
                PathSegment::Index(i) => pointer.push_str(&i.to_string()),
                PathSegment::Wildcard => pointer.push('*'),
            }
        }
        pointer
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(name) if i == 0 => f.write_str(name)?,
                PathSegment::Key(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Wildcard => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::root());
        }

        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(format!("empty field name in path \"{}\"", s));
            }
            segments.push(PathSegment::Key(name.to_string()));

            while !rest.is_empty() {
                let Some(close) = rest.find(']') else {
                    return Err(format!("unclosed '[' in path \"{}\"", s));
                };
                if !rest.starts_with('[') {
                    return Err(format!("unexpected \"{}\" in path \"{}\"", rest, s));
                }
                let step = &rest[1..close];
                if step == "*" {
                    segments.push(PathSegment::Wildcard);
                } else {
                    let index = step
                        .parse::<usize>()
                        .map_err(|_| format!("invalid index \"{}\" in path \"{}\"", step, s))?;
                    segments.push(PathSegment::Index(index));
                }
                rest = &rest[close + 1..];
            }
        }

        Ok(Self(segments))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_path() {
        let path = FieldPath::root()
            .key("pdn")
            .index(0)
            .key("pcc_rule")
            .wildcard()
            .key("flow");
        assert_eq!(path.to_string(), "pdn[0].pcc_rule[*].flow");
    }

    #[test]
    fn parse_matches_display() {
        let path: FieldPath = "pdn[2].pcc_rule[*].flow[0].description".parse().unwrap();
        assert_eq!(path.to_string(), "pdn[2].pcc_rule[*].flow[0].description");
        assert_eq!(path.segments().len(), 7);
        assert_eq!(path.segments()[1], PathSegment::Index(2));
        assert_eq!(path.segments()[3], PathSegment::Wildcard);
    }

    #[test]
    fn parse_empty_is_root() {
        let path: FieldPath = "".parse().unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("pdn[".parse::<FieldPath>().is_err());
        assert!("pdn[x]".parse::<FieldPath>().is_err());
        assert!("pdn..qos".parse::<FieldPath>().is_err());
        assert!("pdn[0]x".parse::<FieldPath>().is_err());
    }

    #[test]
    fn pointer_escapes_keys() {
        let path = FieldPath::root().key("a/b").index(3).key("c~d");
        assert_eq!(path.to_pointer(), "/a~1b/3/c~0d");
        assert_eq!(FieldPath::root().to_pointer(), "");
    }
}
