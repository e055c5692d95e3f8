//! Typed in-memory caches for decoded remote payloads.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// The kinds of remote entities the store caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Pokemon,
    Species,
    Chain,
    TypeRelations,
    SpeciesNameIndex,
    Evolution,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Pokemon => "pokemon",
            EntityKind::Species => "species",
            EntityKind::Chain => "chain",
            EntityKind::TypeRelations => "type-relations",
            EntityKind::SpeciesNameIndex => "species-name-index",
            EntityKind::Evolution => "evolution",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier -> last successfully decoded result, for one entity kind.
///
/// Unbounded and process-lifetime: the identifier space is a fixed species
/// catalogue and the process is short-lived, so there is no eviction.
/// Invariant: only successful decodes are inserted. A failed fetch leaves
/// the map untouched, so a later retry can succeed without eviction logic.
#[derive(Debug)]
pub struct ResultCache<K, V> {
    kind: EntityKind,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> ResultCache<K, V> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache: ResultCache<u32, String> = ResultCache::new(EntityKind::Pokemon);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&25), None);

        cache.insert(25, "pikachu".to_string());
        assert_eq!(cache.get(&25).map(String::as_str), Some("pikachu"));
        assert!(cache.contains(&25));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut cache: ResultCache<u32, u32> = ResultCache::new(EntityKind::Species);
        cache.insert(1, 10);
        cache.insert(1, 20);
        assert_eq!(cache.get(&1), Some(&20));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entity_kind_labels() {
        assert_eq!(EntityKind::Pokemon.as_str(), "pokemon");
        assert_eq!(EntityKind::TypeRelations.to_string(), "type-relations");
        assert_eq!(EntityKind::SpeciesNameIndex.as_str(), "species-name-index");
    }
}
