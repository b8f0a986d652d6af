//! Qualified paths: `a::b::C`, `::std::Vec`, `super::super::x`, `Self::new`.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

/// One segment of a [`QualifiedPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum PathPart {
    /// A plain identifier.
    Named(SmolStr),
    /// `self`: the current module in prefix position, the receiver otherwise.
    SelfValue,
    /// `super`: the parent module.
    Super,
    /// `Self`: the enclosing type.
    SelfType,
    /// A placeholder that matches any segment.
    Hole,
}

impl PathPart {
    /// Build a part from source text, recognizing the reserved words.
    pub fn from_text(text: &str) -> Self {
        match text {
            "self" => PathPart::SelfValue,
            "super" => PathPart::Super,
            "Self" => PathPart::SelfType,
            "_" => PathPart::Hole,
            name => PathPart::Named(SmolStr::new(name)),
        }
    }

    /// The name this part binds under in a scope.
    pub fn name(&self) -> &str {
        match self {
            PathPart::Named(name) => name,
            PathPart::SelfValue => "self",
            PathPart::Super => "super",
            PathPart::SelfType => "Self",
            PathPart::Hole => "_",
        }
    }

    /// The identifier of a [`PathPart::Named`] part.
    pub fn name_if_named(&self) -> Option<&str> {
        match self {
            PathPart::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the two parts are equal, treating a hole on either side as a match.
    pub fn matches(&self, other: &PathPart) -> bool {
        matches!(self, PathPart::Hole) || matches!(other, PathPart::Hole) || self == other
    }
}

impl fmt::Display for PathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable path: an optional qualifier, a terminal part and a
/// fully-qualified flag.
///
/// A fully-qualified path (`::foo`) resolves from the crate root and never
/// carries a qualifier; in `::a::b` the flag sits on the innermost `::a`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct QualifiedPath {
    qualifier: Option<Arc<QualifiedPath>>,
    part: PathPart,
    fully_qualified: bool,
}

impl QualifiedPath {
    /// A single-segment path.
    pub fn ident(part: PathPart) -> Self {
        Self { qualifier: None, part, fully_qualified: false }
    }

    /// A single-segment path anchored at the crate root (`::part`).
    pub fn crate_relative(part: PathPart) -> Self {
        Self { qualifier: None, part, fully_qualified: true }
    }

    /// `qualifier::part`.
    pub fn join(qualifier: QualifiedPath, part: PathPart) -> Self {
        Self { qualifier: Some(Arc::new(qualifier)), part, fully_qualified: false }
    }

    /// Parse `a::b::c` or `::a::b`. Returns `None` for empty segments or
    /// segments that are not identifiers.
    pub fn parse(text: &str) -> Option<Self> {
        let (fully_qualified, rest) = match text.strip_prefix("::") {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut path: Option<QualifiedPath> = None;
        for segment in rest.split("::") {
            if !is_valid_segment(segment) {
                return None;
            }
            let part = PathPart::from_text(segment);
            path = Some(match path {
                None if fully_qualified => Self::crate_relative(part),
                None => Self::ident(part),
                Some(qualifier) => Self::join(qualifier, part),
            });
        }
        path
    }

    pub fn qualifier(&self) -> Option<&QualifiedPath> {
        self.qualifier.as_deref()
    }

    pub fn part(&self) -> &PathPart {
        &self.part
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.fully_qualified
    }

    /// Segments from the innermost qualifier to the terminal part.
    pub fn segments(&self) -> Vec<&PathPart> {
        let mut parts = Vec::new();
        let mut current = Some(self);
        while let Some(path) = current {
            parts.push(&path.part);
            current = path.qualifier();
        }
        parts.reverse();
        parts
    }

    /// Whether the path is fully qualified at its root.
    pub fn is_rooted(&self) -> bool {
        let mut current = self;
        while let Some(qualifier) = current.qualifier() {
            current = qualifier;
        }
        current.fully_qualified
    }

    /// Whether any segment is a hole.
    pub fn has_hole(&self) -> bool {
        self.segments().iter().any(|part| matches!(part, PathPart::Hole))
    }

    /// Hole-aware suffix match.
    ///
    /// Segments are compared from the terminal part backwards until either
    /// path runs out; a hole on either side matches any segment. `Foo`
    /// therefore matches `a::b::Foo`, and `_` matches every path.
    pub fn matches(&self, other: &QualifiedPath) -> bool {
        let mut lhs = Some(self);
        let mut rhs = Some(other);
        while let (Some(l), Some(r)) = (lhs, rhs) {
            if !l.part.matches(&r.part) {
                return false;
            }
            lhs = l.qualifier();
            rhs = r.qualifier();
        }
        true
    }
}

fn is_valid_segment(segment: &str) -> bool {
    if segment == "_" {
        return true;
    }
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier() {
            Some(qualifier) => write!(f, "{qualifier}::")?,
            None if self.fully_qualified => f.write_str("::")?,
            None => {}
        }
        write!(f, "{}", self.part)
    }
}

impl fmt::Debug for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedPath({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = QualifiedPath::parse("a::b::C").unwrap();
        assert_eq!(path.to_string(), "a::b::C");
        assert_eq!(path.part(), &PathPart::Named("C".into()));
        assert!(!path.is_rooted());

        let rooted = QualifiedPath::parse("::std::vec").unwrap();
        assert_eq!(rooted.to_string(), "::std::vec");
        assert!(rooted.is_rooted());
        assert!(!rooted.is_fully_qualified());
        assert!(rooted.qualifier().unwrap().is_fully_qualified());
    }

    #[test]
    fn test_parse_reserved_parts() {
        let path = QualifiedPath::parse("super::super::x").unwrap();
        let segments = path.segments();
        assert_eq!(segments, vec![&PathPart::Super, &PathPart::Super, &PathPart::Named("x".into())]);

        let self_ty = QualifiedPath::parse("Self::new").unwrap();
        assert_eq!(self_ty.qualifier().unwrap().part(), &PathPart::SelfType);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(QualifiedPath::parse("").is_none());
        assert!(QualifiedPath::parse("a::").is_none());
        assert!(QualifiedPath::parse("a::1b").is_none());
        assert!(QualifiedPath::parse("a b").is_none());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(QualifiedPath::parse("a::b").unwrap(), QualifiedPath::parse("a::b").unwrap());
        assert_ne!(QualifiedPath::parse("a::b").unwrap(), QualifiedPath::parse("::a::b").unwrap());
    }

    #[test]
    fn test_hole_matching() {
        let concrete = QualifiedPath::parse("a::b::Foo").unwrap();
        let hole = QualifiedPath::ident(PathPart::Hole);
        let qualified_hole = QualifiedPath::parse("_::Foo").unwrap();

        assert!(hole.matches(&concrete));
        assert!(concrete.matches(&hole));
        assert!(qualified_hole.matches(&concrete));
        assert!(QualifiedPath::parse("Foo").unwrap().matches(&concrete));
        assert!(!QualifiedPath::parse("Bar").unwrap().matches(&concrete));
        assert!(!QualifiedPath::parse("c::Foo").unwrap().matches(&concrete));
        assert!(qualified_hole.has_hole());
    }
}
