//! Immutable set of stable identifiers.

use std::collections::BTreeSet;

/// An immutable, ordered set of instance IDs (or any stable identifiers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet(BTreeSet<String>);

impl NodeSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// IDs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for NodeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupes_and_sorts() {
        let set = NodeSet::new(["b:1", "a:1", "b:1"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a:1", "b:1"]);
        assert!(set.contains("a:1"));
        assert!(!set.contains("c:1"));
    }

    #[test]
    fn test_empty() {
        let set: NodeSet = Vec::<String>::new().into_iter().collect();
        assert!(set.is_empty());
    }
}
