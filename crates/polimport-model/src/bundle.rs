//! Bundle parsing: the interchange file is a flat JSON array of tagged
//! records, bucketed here by kind for ordered processing.

use serde_json::Value;
use thiserror::Error;

use crate::objects::{
    Domain, GroupWithExclusion, Host, IcmpService, NatRule, Network, NetworkGroup, OtherService,
    Package, PortService, Range, ServiceGroup, SimpleGateway, SourceObject, Time, TimeGroup, Zone,
};

/// Errors raised while loading the interchange bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The file is not a JSON array.
    #[error("bundle is not a JSON array")]
    NotAnArray,

    /// The file is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Network groups come in two shapes that are processed in one pass.
#[derive(Debug, Clone)]
pub enum GroupEntry {
    Plain(NetworkGroup),
    WithExclusion(GroupWithExclusion),
}

/// Every importable object of one interchange file, bucketed by kind.
///
/// Bucket order matches the import dependency order: leaf network objects
/// before groups, services before service groups, everything before the
/// package and its rules.
#[derive(Debug, Default)]
pub struct PolicyBundle {
    pub domains: Vec<Domain>,
    pub hosts: Vec<Host>,
    pub networks: Vec<Network>,
    pub ranges: Vec<Range>,
    pub network_groups: Vec<GroupEntry>,
    pub gateways: Vec<SimpleGateway>,
    pub zones: Vec<Zone>,
    pub tcp_services: Vec<PortService>,
    pub udp_services: Vec<PortService>,
    pub sctp_services: Vec<PortService>,
    pub icmp_services: Vec<IcmpService>,
    pub other_services: Vec<OtherService>,
    pub service_groups: Vec<ServiceGroup>,
    pub time_groups: Vec<TimeGroup>,
    pub times: Vec<Time>,
    pub package: Option<Package>,
    pub nat_rules: Vec<NatRule>,
}

impl PolicyBundle {
    /// Parse the interchange file content.
    ///
    /// Entries that are null, untagged, or carry a kind this tool does not
    /// import are skipped — the conversion front-end may emit kinds beyond
    /// the importable set.
    pub fn from_json_str(content: &str) -> Result<Self, BundleError> {
        let values: Value = serde_json::from_str(content)?;
        let Value::Array(entries) = values else {
            return Err(BundleError::NotAnArray);
        };

        let mut bundle = Self::default();
        for entry in entries {
            if !entry.is_object() || entry.get("TypeName").is_none() {
                continue;
            }
            let Ok(object) = serde_json::from_value::<SourceObject>(entry) else {
                continue;
            };
            bundle.push(object);
        }
        Ok(bundle)
    }

    fn push(&mut self, object: SourceObject) {
        match object {
            SourceObject::Domain(o) => self.domains.push(o),
            SourceObject::Host(o) => self.hosts.push(o),
            SourceObject::Network(o) => self.networks.push(o),
            SourceObject::Range(o) => self.ranges.push(o),
            SourceObject::NetworkGroup(o) => self.network_groups.push(GroupEntry::Plain(o)),
            SourceObject::GroupWithExclusion(o) => {
                self.network_groups.push(GroupEntry::WithExclusion(o));
            }
            SourceObject::SimpleGateway(o) => self.gateways.push(o),
            SourceObject::Zone(o) => self.zones.push(o),
            SourceObject::TcpService(o) => self.tcp_services.push(o),
            SourceObject::UdpService(o) => self.udp_services.push(o),
            SourceObject::SctpService(o) => self.sctp_services.push(o),
            SourceObject::IcmpService(o) => self.icmp_services.push(o),
            SourceObject::OtherService(o) => self.other_services.push(o),
            SourceObject::ServiceGroup(o) => self.service_groups.push(o),
            SourceObject::TimeGroup(o) => self.time_groups.push(o),
            SourceObject::Time(o) => self.times.push(o),
            SourceObject::Package(o) => self.package = Some(o),
            SourceObject::NatRule(o) => self.nat_rules.push(o),
        }
    }

    /// Total number of importable objects (package counted once).
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
            + self.hosts.len()
            + self.networks.len()
            + self.ranges.len()
            + self.network_groups.len()
            + self.gateways.len()
            + self.zones.len()
            + self.tcp_services.len()
            + self.udp_services.len()
            + self.sctp_services.len()
            + self.icmp_services.len()
            + self.other_services.len()
            + self.service_groups.len()
            + self.time_groups.len()
            + self.times.len()
            + usize::from(self.package.is_some())
            + self.nat_rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
