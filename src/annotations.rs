//! The annotation store
//!
//! Keywords publish annotations into a per-schema scope keyed by
//! keyword name. Applicators consolidate the scopes of their valid
//! subschemas into the parent scope, and the `unevaluated*` keywords
//! query the consolidated state. Duplicate keys merge by union.

use hashlink::LinkedHashMap;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// How far an array-applicator annotation covers the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCoverage {
    /// Indices `0..n` are evaluated
    UpTo(usize),
    /// Every index is evaluated
    All,
}

/// A single annotation value
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// Property names evaluated by an object applicator
    Properties(HashSet<String>),
    /// Item coverage of an array applicator
    Items(ItemCoverage),
    /// Indices matched by `contains`
    Indices(BTreeSet<usize>),
    /// Verbatim annotation (metadata and unknown keywords)
    Json(Value),
}

/// Evaluated-item coverage consolidated across keywords
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    prefix: usize,
    all: bool,
    indices: BTreeSet<usize>,
}

impl ItemSet {
    pub fn covers(&self, index: usize) -> bool {
        self.all || index < self.prefix || self.indices.contains(&index)
    }
}

/// Keyword-name keyed annotation scope
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    entries: LinkedHashMap<String, AnnotationValue>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            entries: LinkedHashMap::new(),
        }
    }

    /// Insert an annotation, merging with an existing entry by union
    pub fn insert(&mut self, keyword: &str, value: AnnotationValue) {
        match self.entries.get_mut(keyword) {
            Some(existing) => merge_values(existing, value),
            None => {
                self.entries.insert(keyword.to_string(), value);
            }
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&AnnotationValue> {
        self.entries.get(keyword)
    }

    /// Consolidate another scope (a valid subschema's) into this one
    pub fn merge_from(&mut self, other: AnnotationStore) {
        for (keyword, value) in other.entries {
            self.insert(&keyword, value);
        }
    }

    /// Property names evaluated by any applicator in this scope
    pub fn evaluated_properties(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        for value in self.entries.values() {
            if let AnnotationValue::Properties(set) = value {
                names.extend(set.iter().cloned());
            }
        }
        names
    }

    /// Property names evaluated by one specific keyword
    pub fn properties_of(&self, keyword: &str) -> Option<&HashSet<String>> {
        match self.entries.get(keyword) {
            Some(AnnotationValue::Properties(set)) => Some(set),
            _ => None,
        }
    }

    /// Item coverage consolidated across the array applicators,
    /// including indices matched by `contains`
    pub fn evaluated_items(&self) -> ItemSet {
        let mut set = ItemSet::default();
        for value in self.entries.values() {
            match value {
                AnnotationValue::Items(ItemCoverage::All) => set.all = true,
                AnnotationValue::Items(ItemCoverage::UpTo(n)) => {
                    set.prefix = set.prefix.max(*n);
                }
                AnnotationValue::Indices(indices) => {
                    set.indices.extend(indices.iter().copied());
                }
                AnnotationValue::Json(_) | AnnotationValue::Properties(_) => {}
            }
        }
        set
    }

    /// Number of indices matched by `contains`, if `contains` ran
    pub fn contains_count(&self) -> Option<usize> {
        match self.entries.get("contains") {
            Some(AnnotationValue::Indices(indices)) => Some(indices.len()),
            _ => None,
        }
    }
}

fn merge_values(existing: &mut AnnotationValue, incoming: AnnotationValue) {
    match (existing, incoming) {
        (AnnotationValue::Properties(a), AnnotationValue::Properties(b)) => {
            a.extend(b);
        }
        (AnnotationValue::Indices(a), AnnotationValue::Indices(b)) => {
            a.extend(b);
        }
        (AnnotationValue::Items(a), AnnotationValue::Items(b)) => {
            *a = match (*a, b) {
                (ItemCoverage::All, _) | (_, ItemCoverage::All) => ItemCoverage::All,
                (ItemCoverage::UpTo(x), ItemCoverage::UpTo(y)) => ItemCoverage::UpTo(x.max(y)),
            };
        }
        (existing, incoming) => *existing = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_properties_union_on_duplicate_key() {
        let mut store = AnnotationStore::new();
        store.insert("properties", AnnotationValue::Properties(names(&["a"])));
        store.insert("properties", AnnotationValue::Properties(names(&["b"])));
        assert_eq!(store.evaluated_properties(), names(&["a", "b"]));
    }

    #[test]
    fn test_consolidation_merges_scopes() {
        let mut parent = AnnotationStore::new();
        parent.insert("properties", AnnotationValue::Properties(names(&["a"])));

        let mut child = AnnotationStore::new();
        child.insert("properties", AnnotationValue::Properties(names(&["b"])));
        child.insert("items", AnnotationValue::Items(ItemCoverage::All));

        parent.merge_from(child);
        assert_eq!(parent.evaluated_properties(), names(&["a", "b"]));
        assert!(parent.evaluated_items().covers(17));
    }

    #[test]
    fn test_item_coverage_merge() {
        let mut store = AnnotationStore::new();
        store.insert("prefixItems", AnnotationValue::Items(ItemCoverage::UpTo(2)));
        store.insert("prefixItems", AnnotationValue::Items(ItemCoverage::UpTo(3)));
        let set = store.evaluated_items();
        assert!(set.covers(2));
        assert!(!set.covers(3));

        store.insert("items", AnnotationValue::Items(ItemCoverage::All));
        assert!(store.evaluated_items().covers(1000));
    }

    #[test]
    fn test_contains_indices_tracked_separately() {
        let mut store = AnnotationStore::new();
        store.insert(
            "contains",
            AnnotationValue::Indices([1usize, 3].into_iter().collect()),
        );
        assert_eq!(store.contains_count(), Some(2));
        let set = store.evaluated_items();
        assert!(set.covers(1));
        assert!(!set.covers(0));
    }

    #[test]
    fn test_json_annotations_pass_through() {
        let mut store = AnnotationStore::new();
        store.insert("title", AnnotationValue::Json(json!("A title")));
        assert_eq!(
            store.get("title"),
            Some(&AnnotationValue::Json(json!("A title")))
        );
        // Metadata annotations never contribute to evaluated sets
        assert!(store.evaluated_properties().is_empty());
    }
}
