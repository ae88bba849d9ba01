//! Ordered mapping from normalized entry path to descriptor
//!
//! Packages may list the same path more than once. The later record replaces
//! the earlier descriptor while the path keeps its first position in
//! iteration order. Payload offsets are unaffected: every record, including a
//! replaced one, still occupies its bytes in the data section.

use crate::archive::format::EntryDescriptor;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: HashMap<String, EntryDescriptor>,
    entry_list: Vec<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            entry_list: Vec::with_capacity(capacity),
        }
    }

    /// Insert an entry, returning the descriptor it replaced
    pub fn insert(&mut self, entry: EntryDescriptor) -> Option<EntryDescriptor> {
        let path = entry.path.clone();
        let previous = self.entries.insert(path.clone(), entry);
        if previous.is_none() {
            self.entry_list.push(path);
        }
        previous
    }

    pub fn get(&self, path: &str) -> Option<&EntryDescriptor> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.entry_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_list.is_empty()
    }

    /// Paths in first-seen order
    pub fn paths(&self) -> &[String] {
        &self.entry_list
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntryDescriptor)> + '_ {
        self.entry_list
            .iter()
            .filter_map(|path| self.entries.get(path).map(|entry| (path.as_str(), entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_first_seen_order() {
        let mut manifest = Manifest::new();
        manifest.insert(EntryDescriptor::new("b.txt".into(), 1, 1, 0));
        manifest.insert(EntryDescriptor::new("a.txt".into(), 1, 1, 1));
        manifest.insert(EntryDescriptor::new("c/d.txt".into(), 1, 1, 2));

        assert_eq!(manifest.paths(), &["b.txt", "a.txt", "c/d.txt"]);
        let starts: Vec<u64> = manifest.iter().map(|(_, e)| e.start).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_path_last_write_wins() {
        let mut manifest = Manifest::with_capacity(3);
        assert!(manifest.insert(EntryDescriptor::new("x.txt".into(), 4, 4, 0)).is_none());
        manifest.insert(EntryDescriptor::new("y.txt".into(), 2, 2, 4));
        let replaced = manifest.insert(EntryDescriptor::new("x.txt".into(), 8, 5, 6));

        assert_eq!(replaced.map(|e| e.start), Some(0));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.paths(), &["x.txt", "y.txt"]);

        let kept = manifest.get("x.txt").unwrap();
        assert_eq!(kept.start, 6);
        assert_eq!(kept.stored_len, 5);
        assert!(kept.is_compressed);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::new();
        assert!(manifest.is_empty());
        assert!(!manifest.contains("anything"));
        assert_eq!(manifest.iter().count(), 0);
    }
}
