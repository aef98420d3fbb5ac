//! Typed records of the interchange bundle.
//!
//! Field names mirror the interchange file (PascalCase), and the kind tag
//! keeps the `CheckPoint_*` values the conversion front-end writes. Records
//! are immutable once parsed: the import engine never rewrites a `Name` or a
//! member list in place — resolved names live in side tables.

use serde::Deserialize;

/// One kind-tagged record of the interchange bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "TypeName")]
pub enum SourceObject {
    #[serde(rename = "CheckPoint_Domain")]
    Domain(Domain),
    #[serde(rename = "CheckPoint_Host")]
    Host(Host),
    #[serde(rename = "CheckPoint_Network")]
    Network(Network),
    #[serde(rename = "CheckPoint_Range")]
    Range(Range),
    #[serde(rename = "CheckPoint_NetworkGroup")]
    NetworkGroup(NetworkGroup),
    #[serde(rename = "CheckPoint_GroupWithExclusion")]
    GroupWithExclusion(GroupWithExclusion),
    #[serde(rename = "CheckPoint_SimpleGateway")]
    SimpleGateway(SimpleGateway),
    #[serde(rename = "CheckPoint_Zone")]
    Zone(Zone),
    #[serde(rename = "CheckPoint_TcpService")]
    TcpService(PortService),
    #[serde(rename = "CheckPoint_UdpService")]
    UdpService(PortService),
    #[serde(rename = "CheckPoint_SctpService")]
    SctpService(PortService),
    #[serde(rename = "CheckPoint_IcmpService")]
    IcmpService(IcmpService),
    #[serde(rename = "CheckPoint_OtherService")]
    OtherService(OtherService),
    #[serde(rename = "CheckPoint_ServiceGroup")]
    ServiceGroup(ServiceGroup),
    #[serde(rename = "CheckPoint_TimeGroup")]
    TimeGroup(TimeGroup),
    #[serde(rename = "CheckPoint_Time")]
    Time(Time),
    #[serde(rename = "CheckPoint_Package")]
    Package(Package),
    #[serde(rename = "CheckPoint_NAT_Rule")]
    NatRule(NatRule),
}

/// A DNS domain object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub is_sub_domain: bool,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A host: a single IPv4/IPv6 address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Host {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A network: subnet plus netmask.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Network {
    pub name: String,
    pub subnet: String,
    pub netmask: String,
    #[serde(default)]
    pub mask_length: Option<u8>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An address range: first and last address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Range {
    pub name: String,
    pub range_from: String,
    pub range_to: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A plain network group referencing other network objects by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A group defined as `include` minus `except`. By construction both
/// references point at other groups, never at leaf objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupWithExclusion {
    pub name: String,
    pub include: String,
    pub except: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A gateway object with a single management address.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleGateway {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A security zone. Zone names are length-capped on the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A TCP, UDP or SCTP service, identified by its destination port.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortService {
    pub name: String,
    pub port: String,
    #[serde(default)]
    pub source_port: Option<String>,
    #[serde(default)]
    pub session_timeout: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An ICMP service, identified by type and optional code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IcmpService {
    pub name: String,
    #[serde(rename = "Type")]
    pub icmp_type: String,
    #[serde(rename = "Code", default)]
    pub icmp_code: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A service identified by a raw IP protocol number.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OtherService {
    pub name: String,
    pub ip_protocol: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A service group referencing other services by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A group of time objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A time object: activation window, up to three daily hour ranges and a
/// recurrence pattern (1 daily, 2 weekly, 3 monthly; weekdays 0..=6 from
/// Sunday).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Time {
    pub name: String,
    #[serde(default)]
    pub start_now: bool,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_never: bool,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(rename = "HoursRangesEnabled_1", default)]
    pub hours_ranges_enabled_1: bool,
    #[serde(rename = "HoursRangesFrom_1", default)]
    pub hours_ranges_from_1: Option<String>,
    #[serde(rename = "HoursRangesTo_1", default)]
    pub hours_ranges_to_1: Option<String>,
    #[serde(rename = "HoursRangesEnabled_2", default)]
    pub hours_ranges_enabled_2: bool,
    #[serde(rename = "HoursRangesFrom_2", default)]
    pub hours_ranges_from_2: Option<String>,
    #[serde(rename = "HoursRangesTo_2", default)]
    pub hours_ranges_to_2: Option<String>,
    #[serde(rename = "HoursRangesEnabled_3", default)]
    pub hours_ranges_enabled_3: bool,
    #[serde(rename = "HoursRangesFrom_3", default)]
    pub hours_ranges_from_3: Option<String>,
    #[serde(rename = "HoursRangesTo_3", default)]
    pub hours_ranges_to_3: Option<String>,
    #[serde(default)]
    pub recurrence_pattern: Option<i64>,
    #[serde(default)]
    pub recurrence_weekdays: Vec<u8>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named reference inside a rule field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectRef {
    pub name: String,
}

/// One access rule inside a layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessRule {
    #[serde(default)]
    pub name: Option<String>,
    pub layer: String,
    /// 0 accept, 1 drop, 2 reject, 3 apply sub-layer.
    pub action: u8,
    #[serde(default)]
    pub source: Vec<ObjectRef>,
    #[serde(default)]
    pub source_negated: bool,
    #[serde(default)]
    pub destination: Vec<ObjectRef>,
    #[serde(default)]
    pub destination_negated: bool,
    #[serde(default)]
    pub service: Vec<ObjectRef>,
    #[serde(default)]
    pub time: Vec<ObjectRef>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0 no tracking, anything else logs.
    #[serde(default)]
    pub track: u8,
    #[serde(default)]
    pub sub_policy_name: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub conversion_comments: String,
}

/// An inline sub-policy: a named layer plus its rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubLayer {
    pub name: String,
    #[serde(default)]
    pub applications_and_url_filtering: bool,
    #[serde(default)]
    pub rules: Vec<AccessRule>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The top-level layer of a package.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentLayer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<AccessRule>,
}

/// The access-control package: parent layer, sub-policies and their rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub sub_policies: Vec<SubLayer>,
    #[serde(default)]
    pub parent_layer: Option<ParentLayer>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One NAT rule. Endpoint fields are optional; absent endpoints translate
/// to empty strings on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatRule {
    pub package: String,
    /// 0 static, anything else hide.
    #[serde(default)]
    pub method: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub source: Option<ObjectRef>,
    #[serde(default)]
    pub destination: Option<ObjectRef>,
    #[serde(default)]
    pub service: Option<ObjectRef>,
    #[serde(default)]
    pub translated_source: Option<ObjectRef>,
    #[serde(default)]
    pub translated_destination: Option<ObjectRef>,
    #[serde(default)]
    pub translated_service: Option<ObjectRef>,
    #[serde(default)]
    pub comments: String,
}

fn default_true() -> bool {
    true
}
