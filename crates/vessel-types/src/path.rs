//! Paths into a value tree.
//!
//! A path is the ordered sequence of object keys and array indices leading
//! from the root to a node. The empty path names the root itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl Seg {
    /// Returns the key if this is a key segment.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    /// Returns the index if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => f.write_str(k),
            Seg::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A location in a value tree.
///
/// ```
/// use vessel_types::Path;
///
/// let path = Path::root().key("nodes").key("a1").index(0);
/// assert_eq!(path.to_dotted(), "nodes.a1.0");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder style).
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder style).
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Append a segment in place.
    pub fn push(&mut self, seg: impl Into<Seg>) {
        self.0.push(seg.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<Seg> {
        self.0.pop()
    }

    /// A copy of this path extended by one segment.
    pub fn child(&self, seg: impl Into<Seg>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(seg.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Seg> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// Path of the containing node, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Every proper prefix, shortest first, starting with the root.
    pub fn prefixes(&self) -> impl Iterator<Item = &[Seg]> + '_ {
        (0..self.0.len()).map(move |n| &self.0[..n])
    }

    /// Returns `true` if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Dotted form used as a subscription key. The root renders as `""`.
    pub fn to_dotted(&self) -> String {
        dotted(&self.0)
    }
}

/// Dotted form of a segment slice.
pub fn dotted(segments: &[Seg]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&seg.to_string());
    }
    out
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segments: Vec<Seg>) -> Self {
        Self(segments)
    }
}

impl From<&[Seg]> for Path {
    fn from(segments: &[Seg]) -> Self {
        Self(segments.to_vec())
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
