//! Project-wide name tables.
//!
//! The global mangled table keeps property-style names consistent across every
//! file of a build. The history table carries the previous build's choices so
//! that unchanged code keeps its names.

use crate::cache::NameCache;
use std::collections::{BTreeMap, HashSet};

/// Original name → mangled name, shared by every file of one build.
#[derive(Debug, Clone, Default)]
pub struct GlobalMangledTable {
    names: BTreeMap<String, String>,
    values: HashSet<String>,
}

impl GlobalMangledTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    #[must_use]
    pub fn contains_value(&self, mangled: &str) -> bool {
        self.values.contains(mangled)
    }

    /// Commit `original → mangled`. An existing entry for `original` wins.
    pub fn insert(&mut self, original: &str, mangled: &str) {
        if self.names.contains_key(original) {
            return;
        }
        self.names.insert(original.to_string(), mangled.to_string());
        self.values.insert(mangled.to_string());
    }

    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.names.clone()
    }
}

/// Names chosen by the previous build. Read-only while mangling.
#[derive(Debug, Clone, Default)]
pub struct HistoryTable {
    files: BTreeMap<String, BTreeMap<String, String>>,
    previous_global: BTreeMap<String, String>,
    occupied: HashSet<String>,
}

impl HistoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a persisted name cache.
    #[must_use]
    pub fn from_cache(cache: &NameCache) -> Self {
        let files = cache
            .files
            .iter()
            .map(|(path, file)| (path.clone(), file.identifier_cache.clone()))
            .collect();
        let previous_global = cache.global_table.clone();
        let occupied = previous_global.values().cloned().collect();
        Self {
            files,
            previous_global,
            occupied,
        }
    }

    /// Previous `key → name` entries of one file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&BTreeMap<String, String>> {
        self.files.get(path)
    }

    #[must_use]
    pub fn previous_global(&self, original: &str) -> Option<&str> {
        self.previous_global.get(original).map(String::as_str)
    }

    /// Whether the previous build's global table used `name` as a value.
    #[must_use]
    pub fn is_occupied(&self, name: &str) -> bool {
        self.occupied.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileNameCache;

    #[test]
    fn test_global_table_first_commit_wins() {
        let mut table = GlobalMangledTable::new();
        table.insert("foo", "a");
        table.insert("foo", "b");
        assert_eq!(table.get("foo"), Some("a"));
        assert!(table.contains_value("a"));
        assert!(!table.contains_value("b"));
        assert_eq!(table.to_map().len(), 1);
    }

    #[test]
    fn test_history_from_cache() {
        let mut cache = NameCache::default();
        let mut file = FileNameCache::default();
        file.identifier_cache.insert("#foo".into(), "a".into());
        cache.files.insert("src/a.ts".into(), file);
        cache.global_table.insert("foo".into(), "a".into());
        cache.global_table.insert("run".into(), "c".into());

        let history = HistoryTable::from_cache(&cache);
        assert_eq!(
            history.file("src/a.ts").and_then(|f| f.get("#foo")).map(String::as_str),
            Some("a")
        );
        assert_eq!(history.previous_global("run"), Some("c"));
        assert!(history.is_occupied("c"));
        assert!(!history.is_occupied("b"));
        assert!(history.file("src/b.ts").is_none());
    }
}
