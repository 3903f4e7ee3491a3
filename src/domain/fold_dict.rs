//! Case-insensitive string map.
//!
//! Keys are case-folded for identity: `"Denmark"` and `"denmark"` address
//! the same entry. Each entry still remembers the spelling it was last
//! inserted under, and enumeration yields that original-case key.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FoldDict<V> {
    entries: HashMap<String, (String, V)>,
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl<V> FoldDict<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&fold(key)).map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(&fold(key)).map(|(_, value)| value)
    }

    /// Returns the stored original-case spelling of `key`.
    #[must_use]
    pub fn original_key(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(original, _)| original.as_str())
    }

    /// Inserts a value, replacing the stored spelling with `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        self.entries
            .insert(fold(&key), (key, value))
            .map(|(_, previous)| previous)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(&fold(key)).map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(original, _)| original.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .values()
            .map(|(original, value)| (original.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V> Default for FoldDict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FoldDict<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut dict = FoldDict::new();
        dict.insert("Denmark", 1);

        assert_eq!(dict.get("denmark"), Some(&1));
        assert_eq!(dict.get("DENMARK"), Some(&1));
        assert!(dict.contains_key("dEnMaRk"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_insert_replaces_value_and_spelling() {
        let mut dict = FoldDict::new();
        dict.insert("Denmark", 1);
        let previous = dict.insert("DENMARK", 2);

        assert_eq!(previous, Some(1));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["DENMARK"]);
        assert_eq!(dict.original_key("denmark"), Some("DENMARK"));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut dict: FoldDict<u32> = [("Foo", 1), ("Bar", 2)].into_iter().collect();

        assert_eq!(dict.remove("FOO"), Some(1));
        assert!(!dict.contains_key("foo"));
        assert_eq!(dict.len(), 1);

        dict.clear();
        assert!(dict.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut dict = FoldDict::new();
        dict.insert("Verona", vec![1]);
        if let Some(ids) = dict.get_mut("verona") {
            ids.push(2);
        }
        assert_eq!(dict.get("VERONA"), Some(&vec![1, 2]));
    }
}
