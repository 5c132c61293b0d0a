//! Shared Map
//!
//! String-keyed collection of [`Value`]s behind shared storage. Keys are
//! unique and kept in order, which makes iteration and the debug string
//! deterministic.

use crate::convert::FromValue;
use crate::error::ValueError;
use crate::value::{write_quoted, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

/// String-keyed, shared collection of values
#[derive(Clone, Default)]
pub struct Map {
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `key`
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Remove the entry for `key`, reporting whether it existed
    pub fn erase(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read_recursive().contains_key(key)
    }

    pub fn find(&self, key: &str) -> Option<Value> {
        self.entries.read_recursive().get(key).cloned()
    }

    /// Typed extraction of the entry for `key`
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, ValueError> {
        let value = self.find(key).ok_or_else(|| ValueError::InvalidKey {
            key: key.to_string(),
        })?;
        T::from_value(&value).ok_or_else(|| ValueError::InvalidKeyCast {
            key: key.to_string(),
            from: value.type_name(),
            to: T::TYPE.name(),
        })
    }

    pub fn size(&self) -> usize {
        self.entries.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read_recursive().is_empty()
    }

    /// Snapshot of the current keys in order
    pub fn keys(&self) -> Vec<String> {
        self.entries.read_recursive().keys().cloned().collect()
    }

    /// Restartable read-only iteration over the live map in key order
    pub fn iter(&self) -> MapIter {
        MapIter {
            map: self.clone(),
            last_key: None,
        }
    }

    /// Independent copy of the map and everything nested in it
    pub fn deep_copy(&self) -> Map {
        let entries = self.entries.read_recursive();
        let copied = entries
            .iter()
            .map(|(key, value)| (key.clone(), value.deep_copy()))
            .collect();
        Map {
            entries: Arc::new(RwLock::new(copied)),
        }
    }

    /// Whether both handles point at the same storage
    pub fn ptr_eq(&self, other: &Map) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

/// Iterator over a live [`Map`]
///
/// Resumes after the last key it produced, so entries inserted ahead of the
/// cursor are observed.
pub struct MapIter {
    map: Map,
    last_key: Option<String>,
}

impl Iterator for MapIter {
    type Item = (String, Value);

    fn next(&mut self) -> Option<(String, Value)> {
        let entries = self.map.entries.read_recursive();
        let next = match &self.last_key {
            None => entries.iter().next(),
            Some(key) => entries
                .range::<str, _>((Bound::Excluded(key.as_str()), Bound::Unbounded))
                .next(),
        };
        let (key, value) = next.map(|(k, v)| (k.clone(), v.clone()))?;
        self.last_key = Some(key.clone());
        Some((key, value))
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (String, Value);
    type IntoIter = MapIter;

    fn into_iter(self) -> MapIter {
        self.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Map {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let lhs = self.entries.read_recursive();
        let rhs = other.entries.read_recursive();
        *lhs == *rhs
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.read_recursive().iter()).finish()
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.read_recursive().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, key)?;
            f.write_str(":")?;
            fmt::Display::fmt(value, f)?;
        }
        f.write_str("}")
    }
}

/// Build a [`Map`] from `key => value` pairs
#[macro_export]
macro_rules! map {
    () => {
        $crate::Map::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let map = $crate::Map::new();
        $(map.set($key, $crate::Value::from($value));)+
        map
    }};
}
