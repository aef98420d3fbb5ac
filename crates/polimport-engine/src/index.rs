//! Identity indexing of server-side objects.
//!
//! Before a pass that can merge against pre-existing objects (ranges,
//! services), the engine enumerates the server's objects of that kind and
//! indexes them by a kind-specific identity key — address pair for ranges,
//! port / ICMP type / protocol number for services. Objects are layered by
//! visibility scope and flattened with a configurable scope priority, so a
//! source object whose identity already exists resolves to the canonical
//! server name without issuing a creation.

use polimport_api::{ApiResult, MgmtClient, ServerObject};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::rewrite::TranslationMap;

/// Visibility scope of a server object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
    Unscoped,
}

impl Scope {
    #[must_use]
    pub fn of(object: &ServerObject) -> Self {
        if object.is_global() {
            Self::Global
        } else if object.is_local() {
            Self::Local
        } else {
            Self::Unscoped
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    /// A later same-layer entry may override this one (legacy services
    /// recorded without an explicit protocol).
    replaceable: bool,
}

/// Per-kind identity lookup, layered by scope.
///
/// Within a layer the first-seen object for a key wins; the only exception
/// is an entry inserted as `replaceable`, which a more specific later entry
/// may override. The flat lookup used for matching is produced by
/// [`ScopedIndex::merged`].
#[derive(Debug)]
pub struct ScopedIndex<V> {
    global: HashMap<String, Entry<V>>,
    local: HashMap<String, Entry<V>>,
    unscoped: HashMap<String, Entry<V>>,
}

impl<V: Clone> Default for ScopedIndex<V> {
    fn default() -> Self {
        Self {
            global: HashMap::new(),
            local: HashMap::new(),
            unscoped: HashMap::new(),
        }
    }
}

impl<V: Clone> ScopedIndex<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under first-seen-wins discipline.
    pub fn insert(&mut self, scope: Scope, key: String, value: V, replaceable: bool) {
        let layer = match scope {
            Scope::Global => &mut self.global,
            Scope::Local => &mut self.local,
            Scope::Unscoped => &mut self.unscoped,
        };
        match layer.get(&key) {
            Some(existing) if !existing.replaceable => {}
            _ => {
                layer.insert(key, Entry { value, replaceable });
            }
        }
    }

    /// Flatten the layers into one lookup. With `global_first` the global
    /// layer overrides the local one; otherwise local wins. Unscoped
    /// entries only survive where no scoped layer has the key.
    #[must_use]
    pub fn merged(&self, global_first: bool) -> HashMap<String, V> {
        let mut flat: HashMap<String, V> = self
            .unscoped
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect();
        let (lower, upper) = if global_first {
            (&self.local, &self.global)
        } else {
            (&self.global, &self.local)
        };
        for (k, e) in lower {
            flat.insert(k.clone(), e.value.clone());
        }
        for (k, e) in upper {
            flat.insert(k.clone(), e.value.clone());
        }
        flat
    }
}

/// A service entry resolves to both its canonical name (for reporting) and
/// its stable uid (what rules reference).
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub name: String,
    pub uid: String,
}

/// Identity key of an address range: first and last address.
#[must_use]
pub fn range_key(first: &str, last: &str) -> String {
    format!("{first}_{last}")
}

/// Identity key of a range object as stored on the server.
#[must_use]
pub fn server_range_key(object: &ServerObject) -> Option<String> {
    let first = object
        .field_str("ipv4-address-first")
        .or_else(|| object.field_str("ipv6-address-first"))?;
    let last = object
        .field_str("ipv4-address-last")
        .or_else(|| object.field_str("ipv6-address-last"))?;
    Some(range_key(&first, &last))
}

/// Identity key of a service object as stored on the server: port for
/// TCP/UDP/SCTP, type (and optional code) for ICMP, raw protocol number
/// for "other" services.
#[must_use]
pub fn server_service_key(object: &ServerObject) -> Option<String> {
    if let Some(port) = object.field_str("port") {
        return Some(port);
    }
    if let Some(icmp_type) = object.field_str("icmp-type") {
        let mut key = icmp_type;
        if let Some(code) = object.field_str("icmp-code") {
            if code != "null" {
                key.push('_');
                key.push_str(&code);
            }
        }
        return Some(key);
    }
    object.field_str("ip-protocol")
}

/// Identity key of an ICMP source service.
#[must_use]
pub fn icmp_key(icmp_type: &str, icmp_code: Option<&str>) -> String {
    match icmp_code.filter(|c| *c != "null") {
        Some(code) => format!("{icmp_type}_{code}"),
        None => icmp_type.to_string(),
    }
}

/// Whether a server service entry may be overridden by a later, more
/// specific entry: it carries a port but no explicit protocol.
fn is_replaceable_service(object: &ServerObject) -> bool {
    object.field("port").is_some()
        && object
            .field("protocol")
            .map_or(true, |p| p.is_null() || p.as_str() == Some("null"))
}

/// Enumerate the server's address ranges into a scoped identity index.
///
/// A failed read leaves the index empty: every source range then falls
/// through to plain creation.
pub async fn build_range_index(client: &MgmtClient) -> ScopedIndex<String> {
    let mut index = ScopedIndex::new();
    match client.show_all("show-address-ranges").await {
        Ok(objects) => {
            debug!(count = objects.len(), "indexed server address ranges");
            for object in &objects {
                if let Some(key) = server_range_key(object) {
                    index.insert(Scope::of(object), key, object.name.clone(), false);
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to read server address ranges, continuing without index");
        }
    }
    index
}

/// Enumerate one service family into a scoped identity index, plus the
/// name → uid seed map: a rule referencing a pre-existing server service by
/// name must resolve to that service's uid even when nothing collided.
pub async fn build_service_index(
    client: &MgmtClient,
    proto: &str,
) -> (ScopedIndex<ServiceEntry>, TranslationMap) {
    let mut index = ScopedIndex::new();
    let mut seed = TranslationMap::new();

    let command = format!("show-services-{proto}");
    let objects: ApiResult<Vec<ServerObject>> = client.show_all(&command).await;
    match objects {
        Ok(objects) => {
            debug!(proto, count = objects.len(), "indexed server services");
            for object in &objects {
                let uid = object.uid.clone().unwrap_or_else(|| object.name.clone());
                seed.insert(object.name.clone(), uid.clone());
                if let Some(key) = server_service_key(object) {
                    index.insert(
                        Scope::of(object),
                        key,
                        ServiceEntry {
                            name: object.name.clone(),
                            uid,
                        },
                        is_replaceable_service(object),
                    );
                }
            }
        }
        Err(e) => {
            warn!(proto, error = %e, "failed to read server services, continuing without index");
        }
    }
    (index, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: serde_json::Value) -> ServerObject {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn first_seen_wins_within_a_layer() {
        let mut index = ScopedIndex::new();
        index.insert(Scope::Local, "443".into(), "first".to_string(), false);
        index.insert(Scope::Local, "443".into(), "second".to_string(), false);
        assert_eq!(index.merged(false).get("443"), Some(&"first".to_string()));
    }

    #[test]
    fn replaceable_entry_is_overridden_by_later_entry() {
        let mut index = ScopedIndex::new();
        index.insert(Scope::Local, "443".into(), "legacy".to_string(), true);
        index.insert(Scope::Local, "443".into(), "specific".to_string(), false);
        assert_eq!(
            index.merged(false).get("443"),
            Some(&"specific".to_string())
        );
    }

    #[test]
    fn scope_priority_controls_merge() {
        let mut index = ScopedIndex::new();
        index.insert(Scope::Global, "k".into(), "global".to_string(), false);
        index.insert(Scope::Local, "k".into(), "local".to_string(), false);
        index.insert(Scope::Unscoped, "k".into(), "unscoped".to_string(), false);

        assert_eq!(index.merged(false).get("k"), Some(&"local".to_string()));
        assert_eq!(index.merged(true).get("k"), Some(&"global".to_string()));
    }

    #[test]
    fn unscoped_survives_only_without_scoped_entry() {
        let mut index = ScopedIndex::new();
        index.insert(Scope::Unscoped, "only".into(), "u".to_string(), false);
        assert_eq!(index.merged(false).get("only"), Some(&"u".to_string()));
    }

    #[test]
    fn service_keys_by_kind() {
        let tcp = object(json!({ "name": "https", "port": 443 }));
        assert_eq!(server_service_key(&tcp).as_deref(), Some("443"));

        let icmp = object(json!({ "name": "ping", "icmp-type": 8, "icmp-code": 0 }));
        assert_eq!(server_service_key(&icmp).as_deref(), Some("8_0"));

        let icmp_untyped = object(json!({ "name": "echo", "icmp-type": 8 }));
        assert_eq!(server_service_key(&icmp_untyped).as_deref(), Some("8"));

        let other = object(json!({ "name": "gre", "ip-protocol": 47 }));
        assert_eq!(server_service_key(&other).as_deref(), Some("47"));

        let nameless = object(json!({ "name": "odd" }));
        assert_eq!(server_service_key(&nameless), None);
    }

    #[test]
    fn icmp_key_skips_null_code() {
        assert_eq!(icmp_key("8", None), "8");
        assert_eq!(icmp_key("8", Some("null")), "8");
        assert_eq!(icmp_key("3", Some("1")), "3_1");
    }

    #[test]
    fn legacy_service_without_protocol_is_replaceable() {
        let legacy = object(json!({ "name": "old", "port": 80, "protocol": null }));
        assert!(is_replaceable_service(&legacy));

        let specific = object(json!({ "name": "new", "port": 80, "protocol": "HTTP" }));
        assert!(!is_replaceable_service(&specific));
    }

    #[test]
    fn range_keys_concatenate_addresses() {
        assert_eq!(range_key("10.0.0.1", "10.0.0.9"), "10.0.0.1_10.0.0.9");
        let server = object(json!({
            "name": "r1",
            "ipv4-address-first": "10.0.0.1",
            "ipv4-address-last": "10.0.0.9"
        }));
        assert_eq!(
            server_range_key(&server).as_deref(),
            Some("10.0.0.1_10.0.0.9")
        );
    }
}
