/// Replacement group of a scene object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub &'static str);

impl Tag {
    /// Lights and base geometry: created once, removed only at teardown.
    pub const PERSISTENT: Tag = Tag("persistent");
    /// Everything derived from the current route.
    pub const ROUTE: Tag = Tag("route");
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
