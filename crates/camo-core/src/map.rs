//! Key-ordered mapping used for every nested level of the progress tree.
//!
//! On the wire a mapping is a tagged node,
//! `{ "__kind": "map", "entries": [[key, value], ...] }`, so it never
//! collapses into a plain record (like a weapon) when decoded.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Marker written into the `__kind` field of every mapping node.
pub const MAP_KIND: &str = "map";

/// Marker used by older save blobs (`{ "dataType": "Map", "value": [...] }`).
pub const LEGACY_MAP_KIND: &str = "Map";

/// String-keyed map that preserves insertion order.
///
/// Lookups are linear; catalogs hold a handful of games, modes and
/// categories per level, so a `Vec` beats hashing here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value under `key`, appending `make()` first if absent.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        let i = match self.position(key) {
            Some(i) => i,
            None => {
                self.entries.push((key.to_string(), make()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("OrderedMap", 2)?;
        node.serialize_field("__kind", MAP_KIND)?;
        node.serialize_field("entries", &self.entries)?;
        node.end()
    }
}

#[derive(Deserialize)]
struct TaggedMap<V> {
    #[serde(rename = "__kind", alias = "dataType")]
    kind: String,
    #[serde(alias = "value")]
    entries: Vec<(String, V)>,
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tagged = TaggedMap::<V>::deserialize(deserializer)?;
        if tagged.kind != MAP_KIND && tagged.kind != LEGACY_MAP_KIND {
            return Err(de::Error::custom(format!(
                "expected a mapping node, found kind `{}`",
                tagged.kind
            )));
        }
        let mut map = OrderedMap::with_capacity(tagged.entries.len());
        for (key, value) in tagged.entries {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate mapping key `{key}`")));
            }
            map.entries.push((key, value));
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position_on_replace() {
        let mut m = OrderedMap::new();
        m.insert("b", 1);
        m.insert("a", 2);
        assert_eq!(m.insert("b", 3), Some(1));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(m.get("b"), Some(&3));
    }

    #[test]
    fn get_or_insert_appends_once() {
        let mut m: OrderedMap<Vec<u8>> = OrderedMap::new();
        m.get_or_insert_with("x", Vec::new).push(1);
        m.get_or_insert_with("x", || vec![9]).push(2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("x"), Some(&vec![1, 2]));
    }

    #[test]
    fn serializes_as_tagged_node() {
        let m: OrderedMap<bool> = [("gold", true), ("diamond", false)].into_iter().collect();
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "__kind": "map", "entries": [["gold", true], ["diamond", false]] })
        );
    }

    #[test]
    fn accepts_legacy_marker() {
        let text = r#"{ "dataType": "Map", "value": [["z", 1], ["a", 2]] }"#;
        let m: OrderedMap<u32> = serde_json::from_str(text).unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn rejects_plain_object() {
        let err = serde_json::from_str::<OrderedMap<bool>>(r#"{ "gold": true }"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_unknown_kind_and_duplicates() {
        let wrong = r#"{ "__kind": "set", "entries": [] }"#;
        assert!(serde_json::from_str::<OrderedMap<bool>>(wrong).is_err());
        let dup = r#"{ "__kind": "map", "entries": [["a", true], ["a", false]] }"#;
        assert!(serde_json::from_str::<OrderedMap<bool>>(dup).is_err());
    }
}
