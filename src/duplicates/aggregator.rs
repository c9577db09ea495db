//! Aggregation of hashed files into duplicate groups.
//!
//! [`Aggregator`] itself is a plain ordered map; concurrent lanes reach it
//! only through [`ScanState`](super::ScanState), whose single lock covers the
//! whole lookup-or-create plus append for each file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::groups::{ContentKey, DuplicateGroup};

/// Map from content key to the paths that produced it.
#[derive(Debug, Default)]
pub struct Aggregator {
    entries: BTreeMap<ContentKey, Vec<PathBuf>>,
}

impl Aggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` under `key`, creating the entry if needed.
    pub fn insert(&mut self, key: ContentKey, path: PathBuf) {
        self.entries.entry(key).or_default().push(path);
    }

    /// Append several paths under one key.
    pub fn extend(&mut self, key: ContentKey, paths: impl IntoIterator<Item = PathBuf>) {
        self.entries.entry(key).or_default().extend(paths);
    }

    /// Number of distinct keys seen, including singletons.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of paths recorded across all keys.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Consume the map, yielding groups of 2+ paths in ascending key order.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        log::debug!(
            "Aggregated {} files under {} content keys",
            self.path_count(),
            self.key_count()
        );
        self.entries
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(key, paths)| DuplicateGroup::new(key, paths))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_are_dropped() {
        let mut agg = Aggregator::new();
        agg.insert(ContentKey::new(10, vec![1]), PathBuf::from("/a"));
        agg.insert(ContentKey::new(10, vec![2]), PathBuf::from("/b"));

        assert_eq!(agg.key_count(), 2);
        assert_eq!(agg.path_count(), 2);
        assert!(agg.into_groups().is_empty());
    }

    #[test]
    fn test_groups_ordered_by_key_with_arrival_order_inside() {
        let mut agg = Aggregator::new();
        agg.insert(ContentKey::new(20, vec![1]), PathBuf::from("/z"));
        agg.insert(ContentKey::new(10, vec![9]), PathBuf::from("/b"));
        agg.insert(ContentKey::new(20, vec![1]), PathBuf::from("/y"));
        agg.insert(ContentKey::new(10, vec![9]), PathBuf::from("/a"));
        agg.extend(ContentKey::empty(), vec![PathBuf::from("/e1"), PathBuf::from("/e2")]);

        let groups = agg.into_groups();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key, ContentKey::empty());
        assert_eq!(groups[1].key.size, 10);
        assert_eq!(groups[1].paths, vec![PathBuf::from("/b"), PathBuf::from("/a")]);
        assert_eq!(groups[2].paths, vec![PathBuf::from("/z"), PathBuf::from("/y")]);
    }
}
