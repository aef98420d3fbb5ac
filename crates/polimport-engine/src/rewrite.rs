//! Translation maps and reference rewriting.
//!
//! Each pipeline pass produces a [`TranslationMap`] from source names to the
//! identifiers those objects ended up with on the server (a name for most
//! kinds, a uid for services). Downstream references — group members, rule
//! fields, NAT endpoints — are rewritten through the maps in priority order;
//! a name found in no map passes through unchanged, on the assumption it
//! already names a valid server object outside this migration.

use polimport_model::ObjectRef;
use std::collections::HashMap;

/// Source-name → resolved-server-identifier table.
#[derive(Debug, Clone, Default)]
pub struct TranslationMap {
    entries: HashMap<String, String>,
}

impl TranslationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, resolved: impl Into<String>) {
        self.entries.insert(source.into(), resolved.into());
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Absorb another map's entries (later passes feeding the merged
    /// network/service maps).
    pub fn absorb(&mut self, other: &TranslationMap) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve one name through the maps in priority order; first hit wins,
/// otherwise the name passes through unchanged.
#[must_use]
pub fn resolve_or_passthrough(name: &str, maps: &[&TranslationMap]) -> String {
    for map in maps {
        if let Some(resolved) = map.get(name) {
            return resolved.to_string();
        }
    }
    name.to_string()
}

/// Rewrite a member-name list through the maps.
#[must_use]
pub fn rewrite_names(names: &[String], maps: &[&TranslationMap]) -> Vec<String> {
    names
        .iter()
        .map(|n| resolve_or_passthrough(n, maps))
        .collect()
}

/// Rewrite a rule-field reference list through the maps.
#[must_use]
pub fn rewrite_refs(refs: &[ObjectRef], maps: &[&TranslationMap]) -> Vec<String> {
    refs.iter()
        .map(|r| resolve_or_passthrough(&r.name, maps))
        .collect()
}
