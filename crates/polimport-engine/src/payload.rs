//! API payload construction.
//!
//! Field-by-field mapping of model records to the JSON bodies the `add-*`
//! commands take. Builders take the resolved reference lists from the
//! pipeline where a record's own references have already been rewritten;
//! they never read the translation maps themselves.

use polimport_model::{
    AccessRule, Domain, Host, IcmpService, NatRule, Network, OtherService, PortService, Range,
    SimpleGateway, SubLayer, Time, Zone,
};
use serde_json::{json, Value};

pub fn domain(d: &Domain) -> Value {
    json!({
        "name": d.name,
        "is-sub-domain": d.is_sub_domain,
        "comments": d.comments,
        "tags": d.tags,
    })
}

pub fn host(h: &Host) -> Value {
    json!({
        "name": h.name,
        "ip-address": h.ip_address,
        "comments": h.comments,
        "tags": h.tags,
    })
}

pub fn network(n: &Network) -> Value {
    json!({
        "name": n.name,
        "subnet4": n.subnet,
        "subnet-mask": n.netmask,
        "comments": n.comments,
        "tags": n.tags,
    })
}

/// Range payloads always suppress warnings: the identity check happened
/// against the pre-built range index, not the server's response.
pub fn range(r: &Range) -> Value {
    json!({
        "name": r.name,
        "ip-address-first": r.range_from,
        "ip-address-last": r.range_to,
        "comments": r.comments,
        "tags": r.tags,
        "ignore-warnings": true,
    })
}

/// Group payload with an already-rewritten member list. Shared by
/// `add-group` and `add-service-group`.
pub fn group(name: &str, members: &[String], comments: &str, tags: &[String]) -> Value {
    json!({
        "name": name,
        "members": members,
        "comments": comments,
        "tags": tags,
    })
}

pub fn group_with_exclusion(
    name: &str,
    include: &str,
    except: &str,
    comments: &str,
    tags: &[String],
) -> Value {
    json!({
        "name": name,
        "include": include,
        "except": except,
        "comments": comments,
        "tags": tags,
    })
}

pub fn simple_gateway(g: &SimpleGateway) -> Value {
    json!({
        "name": g.name,
        "ip-address": g.ip_address,
        "comments": g.comments,
        "tags": g.tags,
    })
}

pub fn security_zone(z: &Zone) -> Value {
    json!({
        "name": z.name,
        "comments": z.comments,
        "tags": z.tags,
    })
}

/// TCP/UDP/SCTP service. Warnings are suppressed: port reuse was already
/// resolved against the service index.
pub fn port_service(s: &PortService) -> Value {
    json!({
        "name": s.name,
        "comments": s.comments,
        "tags": s.tags,
        "ignore-warnings": true,
        "port": s.port,
        "source-port": s.source_port,
        "session-timeout": s.session_timeout,
    })
}

pub fn icmp_service(s: &IcmpService) -> Value {
    let mut payload = json!({
        "name": s.name,
        "comments": s.comments,
        "tags": s.tags,
        "ignore-warnings": true,
        "icmp-type": s.icmp_type,
    });
    if let Some(code) = s.icmp_code.as_deref().filter(|c| *c != "null") {
        payload["icmp-code"] = Value::String(code.to_string());
    }
    payload
}

pub fn other_service(s: &OtherService) -> Value {
    json!({
        "name": s.name,
        "comments": s.comments,
        "tags": s.tags,
        "ignore-warnings": true,
        "ip-protocol": s.ip_protocol,
        "match-for-any": true,
    })
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn time(t: &Time) -> Value {
    let weekdays: Vec<&str> = t
        .recurrence_weekdays
        .iter()
        .filter_map(|d| WEEKDAYS.get(*d as usize).copied())
        .collect();
    let pattern = match t.recurrence_pattern {
        Some(1) => Value::String("Daily".into()),
        Some(2) => Value::String("Weekly".into()),
        Some(3) => Value::String("Monthly".into()),
        _ => Value::Null,
    };

    json!({
        "name": t.name,
        "comments": t.comments,
        "start-now": t.start_now,
        "start": {
            "date": t.start_date,
            "time": t.start_time,
        },
        "end-never": t.end_never,
        "end": {
            "date": t.end_date,
            "time": t.end_time,
        },
        "hours-ranges": [
            hours_range(1, t.hours_ranges_enabled_1, &t.hours_ranges_from_1, &t.hours_ranges_to_1),
            hours_range(2, t.hours_ranges_enabled_2, &t.hours_ranges_from_2, &t.hours_ranges_to_2),
            hours_range(3, t.hours_ranges_enabled_3, &t.hours_ranges_from_3, &t.hours_ranges_to_3),
        ],
        "recurrence": {
            "pattern": pattern,
            "weekdays": weekdays,
        },
        "tags": t.tags,
    })
}

fn hours_range(index: u8, enabled: bool, from: &Option<String>, to: &Option<String>) -> Value {
    json!({
        "enabled": enabled,
        "from": from.as_deref().unwrap_or("00:00"),
        "to": to.as_deref().unwrap_or("00:00"),
        "index": index,
    })
}

pub fn package(name: &str, tags: &[String]) -> Value {
    json!({
        "name": name,
        "threat-prevention": false,
        "tags": tags,
    })
}

pub fn access_layer(layer: &SubLayer, name: &str) -> Value {
    json!({
        "name": name,
        "add-default-rule": false,
        "applications-and-url-filtering": layer.applications_and_url_filtering,
        "comments": layer.comments,
        "tags": layer.tags,
    })
}

/// Resolved rule-field references, rewritten by the pipeline.
pub struct RuleRefs {
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
    pub services: Vec<String>,
    pub times: Vec<String>,
}

pub fn access_rule(
    rule: &AccessRule,
    layer: &str,
    refs: &RuleRefs,
    inline_layer: Option<&str>,
) -> Value {
    let action = match rule.action {
        0 => "accept",
        1 => "drop",
        2 => "reject",
        _ => "apply layer",
    };
    let mut payload = json!({
        "layer": layer,
        "position": "top",
        "name": rule.name,
        "action": action,
        "destination": refs.destinations,
        "destination-negate": rule.destination_negated,
        "enabled": rule.enabled,
        "service": refs.services,
        "source": refs.sources,
        "source-negate": rule.source_negated,
        "time": refs.times,
        "track": { "type": if rule.track == 0 { "None" } else { "Log" } },
        "comments": rule.comments,
    });
    if let Some(inline) = inline_layer {
        payload["inline-layer"] = Value::String(inline.to_string());
    }
    if !rule.conversion_comments.trim().is_empty() {
        payload["custom-fields"] = json!({ "field-1": rule.conversion_comments });
    }
    payload
}

/// Resolved NAT endpoints; absent endpoints are empty strings on the wire.
#[derive(Default)]
pub struct NatEndpoints {
    pub original_source: String,
    pub original_destination: String,
    pub original_service: String,
    pub translated_source: String,
    pub translated_destination: String,
    pub translated_service: String,
}

pub fn nat_rule(rule: &NatRule, package: &str, endpoints: &NatEndpoints) -> Value {
    json!({
        "package": package,
        "position": "bottom",
        "comments": rule.comments,
        "enabled": rule.enabled,
        "method": if rule.method == 0 { "static" } else { "hide" },
        "original-source": endpoints.original_source,
        "original-destination": endpoints.original_destination,
        "original-service": endpoints.original_service,
        "translated-source": endpoints.translated_source,
        "translated-destination": endpoints.translated_destination,
        "translated-service": endpoints.translated_service,
    })
}
