/// TagSet: string labels attached to a scene node.
///
/// Tags drive coarse node selection (renderer filters, global light and
/// shadow lookups). The set is ordered so iteration and printing are
/// deterministic. Every operation is total: nothing here can fail.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Ordered set of string tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    tags: BTreeSet<String>,
}

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact membership test
    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True iff the two sets share at least one tag
    ///
    /// An empty set on either side never matches.
    pub fn has_any(&self, other: &TagSet) -> bool {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.tags.iter().any(|tag| large.tags.contains(tag))
    }

    /// True iff every tag of `other` is in `self`
    ///
    /// Vacuously true when `other` is empty.
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.tags.is_subset(&self.tags)
    }

    /// Insert a tag, returning whether it was new
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Remove a tag, returning whether it was present
    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Tags in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }
}

// ===== CONVERSIONS =====

impl From<&str> for TagSet {
    fn from(tag: &str) -> Self {
        let mut set = TagSet::new();
        set.insert(tag);
        set
    }
}

impl From<&[&str]> for TagSet {
    fn from(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for TagSet {
    fn from(tags: [&str; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.tags.extend(iter.into_iter().map(Into::into));
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, tag) in self.tags.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag)?;
        }
        write!(f, "}}")
    }
}

// ===== SET ALGEBRA =====

impl AddAssign<&TagSet> for TagSet {
    fn add_assign(&mut self, rhs: &TagSet) {
        self.tags.extend(rhs.tags.iter().cloned());
    }
}

impl AddAssign<TagSet> for TagSet {
    fn add_assign(&mut self, rhs: TagSet) {
        self.tags.extend(rhs.tags);
    }
}

impl AddAssign<&str> for TagSet {
    fn add_assign(&mut self, rhs: &str) {
        self.insert(rhs);
    }
}

impl SubAssign<&TagSet> for TagSet {
    fn sub_assign(&mut self, rhs: &TagSet) {
        self.tags.retain(|tag| !rhs.tags.contains(tag));
    }
}

impl SubAssign<TagSet> for TagSet {
    fn sub_assign(&mut self, rhs: TagSet) {
        *self -= &rhs;
    }
}

impl SubAssign<&str> for TagSet {
    fn sub_assign(&mut self, rhs: &str) {
        self.remove(rhs);
    }
}

impl Add<&TagSet> for &TagSet {
    type Output = TagSet;

    fn add(self, rhs: &TagSet) -> TagSet {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Add<TagSet> for TagSet {
    type Output = TagSet;

    fn add(mut self, rhs: TagSet) -> TagSet {
        self += rhs;
        self
    }
}

impl Add<&str> for TagSet {
    type Output = TagSet;

    fn add(mut self, rhs: &str) -> TagSet {
        self += rhs;
        self
    }
}

impl Sub<&TagSet> for &TagSet {
    type Output = TagSet;

    fn sub(self, rhs: &TagSet) -> TagSet {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

impl Sub<TagSet> for TagSet {
    type Output = TagSet;

    fn sub(mut self, rhs: TagSet) -> TagSet {
        self -= &rhs;
        self
    }
}

impl Sub<&str> for TagSet {
    type Output = TagSet;

    fn sub(mut self, rhs: &str) -> TagSet {
        self -= rhs;
        self
    }
}

#[cfg(test)]
#[path = "tag_set_tests.rs"]
mod tests;
