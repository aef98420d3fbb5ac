//! The import pipeline.
//!
//! Passes run in fixed dependency order: leaf network objects, network
//! groups, gateways and zones, the five service families, service groups,
//! time groups and times, then the package with its layers and rules, and
//! finally NAT rules. Each pass feeds a [`TranslationMap`] consumed by
//! later passes; the merged network and service maps drive rule rewriting.
//!
//! Per-object rejections never abort a run — they become report lines.
//! Only transport-level failures propagate.

use polimport_api::{ApiError, MgmtClient, ServerObject};
use polimport_model::{AccessRule, GroupEntry, NatRule, Package, PolicyBundle, TimeGroup};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::index::{
    build_range_index, build_service_index, icmp_key, range_key, server_range_key,
    server_service_key, ServiceEntry,
};
use crate::payload;
use crate::publish::PublishBatcher;
use crate::report::MigrationReport;
use crate::resolve::{create_with_identity_merge, create_with_rename, Outcome, RenamePolicy};
use crate::rewrite::{resolve_or_passthrough, rewrite_names, rewrite_refs, TranslationMap};

/// Server-side length cap on security zone names.
const ZONE_NAME_LIMIT: usize = 32;

/// Member count above which a group is created empty and populated with
/// incremental member additions, so one bad member cannot sink the group.
const GROUP_INLINE_LIMIT: usize = 50;

/// Run-wide tuning knobs.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Creations between threshold publishes.
    pub threshold: u32,
    /// Prefer global server objects over local ones when merging.
    pub global_first: bool,
    /// Rename candidates to try before giving an object up.
    pub max_rename_attempts: u32,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            threshold: 100,
            global_first: false,
            max_rename_attempts: 100,
        }
    }
}

/// One import run over a parsed bundle.
pub struct Migration {
    options: MigrationOptions,
    rename: RenamePolicy,
    report: MigrationReport,
    batcher: PublishBatcher,
}

impl Migration {
    #[must_use]
    pub fn new(options: MigrationOptions) -> Self {
        let rename = RenamePolicy::with_max_attempts(options.max_rename_attempts);
        let batcher = PublishBatcher::new(options.threshold);
        Self {
            options,
            rename,
            report: MigrationReport::new(),
            batcher,
        }
    }

    /// Drive every pass in dependency order and return the decision report.
    pub async fn run(
        mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<MigrationReport> {
        let mut network_map = TranslationMap::new();
        network_map.absorb(&self.domains(client, bundle).await?);
        network_map.absorb(&self.hosts(client, bundle).await?);
        network_map.absorb(&self.networks(client, bundle).await?);
        network_map.absorb(&self.ranges(client, bundle).await?);
        let groups = self.network_groups(client, bundle, &network_map).await?;
        network_map.absorb(&groups);
        network_map.absorb(&self.gateways(client, bundle).await?);
        network_map.absorb(&self.zones(client, bundle).await?);

        let mut service_map = TranslationMap::new();
        service_map.absorb(&self.port_services(client, &bundle.tcp_services, "tcp").await?);
        service_map.absorb(&self.port_services(client, &bundle.udp_services, "udp").await?);
        service_map.absorb(&self.port_services(client, &bundle.sctp_services, "sctp").await?);
        service_map.absorb(&self.icmp_services(client, bundle).await?);
        service_map.absorb(&self.other_services(client, bundle).await?);
        let service_groups = self.service_groups(client, bundle, &service_map).await?;
        service_map.absorb(&service_groups);

        let time_group_map = self.time_groups(client, bundle).await?;
        let time_map = self.times(client, bundle).await?;

        let package_layers = self
            .package(
                client,
                bundle,
                &network_map,
                &service_map,
                &time_group_map,
                &time_map,
            )
            .await?;
        self.nat_rules(client, bundle, package_layers.as_ref(), &network_map, &service_map)
            .await?;

        Ok(self.report)
    }

    // ── Leaf network objects ──────────────────────────────────────────

    async fn domains(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.domains.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.domains.len(), "processing domains");
        for domain in &bundle.domains {
            match self
                .add_object(client, "add-dns-domain", &payload::domain(domain))
                .await?
            {
                Some((name, _)) => {
                    map.insert(&domain.name, &name);
                    self.report.added(&domain.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&domain.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn hosts(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.hosts.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.hosts.len(), "processing hosts");
        for host in &bundle.hosts {
            let outcome = self
                .merge_object(
                    client,
                    "add-host",
                    "host",
                    &host.ip_address,
                    None,
                    &payload::host(host),
                )
                .await?;
            self.record_merge_outcome(client, &mut map, &host.name, outcome)
                .await;
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn networks(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.networks.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.networks.len(), "processing networks");
        for network in &bundle.networks {
            let outcome = self
                .merge_object(
                    client,
                    "add-network",
                    "network",
                    &network.subnet,
                    Some((&network.subnet, &network.netmask)),
                    &payload::network(network),
                )
                .await?;
            self.record_merge_outcome(client, &mut map, &network.name, outcome)
                .await;
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn ranges(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.ranges.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.ranges.len(), "processing ranges");
        let index = build_range_index(client).await;
        let mut merged = index.merged(self.options.global_first);

        for range in &bundle.ranges {
            let key = range_key(&range.range_from, &range.range_to);
            if let Some(existing) = merged.get(&key) {
                map.insert(&range.name, existing);
                self.report.reused(existing, &range.name);
                continue;
            }
            match self
                .add_object(client, "add-address-range", &payload::range(range))
                .await?
            {
                Some((name, body)) => {
                    // Index the creation so a later in-file duplicate merges
                    // instead of colliding.
                    if let Some(key) = parse_server_object(&body).and_then(|o| server_range_key(&o))
                    {
                        merged.insert(key, name.clone());
                    }
                    map.insert(&range.name, &name);
                    self.report.added(&range.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&range.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    // ── Groups, gateways, zones ───────────────────────────────────────

    async fn network_groups(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
        network_map: &TranslationMap,
    ) -> EngineResult<TranslationMap> {
        let mut group_map = TranslationMap::new();
        if bundle.network_groups.is_empty() {
            return Ok(group_map);
        }
        info!(count = bundle.network_groups.len(), "processing network groups");
        for entry in &bundle.network_groups {
            match entry {
                GroupEntry::Plain(group) => {
                    let members = rewrite_names(&group.members, &[network_map, &group_map]);
                    let added = self
                        .add_group_with_members(
                            client,
                            "add-group",
                            "set-group",
                            &group.name,
                            &members,
                            &group.comments,
                            &group.tags,
                        )
                        .await?;
                    match added {
                        Some(name) => {
                            group_map.insert(&group.name, &name);
                            self.report.added(&group.name, &name);
                            self.batcher.record(client).await;
                        }
                        None => self.report.not_added(&group.name),
                    }
                }
                GroupEntry::WithExclusion(group) => {
                    // Include/except point at other groups by construction.
                    let include = resolve_or_passthrough(&group.include, &[&group_map]);
                    let except = resolve_or_passthrough(&group.except, &[&group_map]);
                    let body = payload::group_with_exclusion(
                        &group.name,
                        &include,
                        &except,
                        &group.comments,
                        &group.tags,
                    );
                    match self
                        .add_object(client, "add-group-with-exclusion", &body)
                        .await?
                    {
                        Some((name, _)) => {
                            group_map.insert(&group.name, &name);
                            self.report.added(&group.name, &name);
                            self.batcher.record(client).await;
                        }
                        None => self.report.not_added(&group.name),
                    }
                }
            }
        }
        self.batcher.flush(client).await;
        Ok(group_map)
    }

    async fn gateways(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.gateways.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.gateways.len(), "processing simple gateways");
        for gateway in &bundle.gateways {
            match self
                .add_object(client, "add-simple-gateway", &payload::simple_gateway(gateway))
                .await?
            {
                Some((name, _)) => {
                    map.insert(&gateway.name, &name);
                    self.report.added(&gateway.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&gateway.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn zones(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.zones.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.zones.len(), "processing zones");
        let policy = self.rename.clone().with_name_limit(ZONE_NAME_LIMIT);
        for zone in &bundle.zones {
            match self
                .add_object_with_policy(client, "add-security-zone", &payload::security_zone(zone), &policy)
                .await?
            {
                Some((name, _)) => {
                    map.insert(&zone.name, &name);
                    self.report.added(&zone.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&zone.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    // ── Services ──────────────────────────────────────────────────────

    async fn port_services(
        &mut self,
        client: &MgmtClient,
        services: &[polimport_model::PortService],
        proto: &str,
    ) -> EngineResult<TranslationMap> {
        let items: Vec<ServiceItem> = services
            .iter()
            .map(|s| ServiceItem {
                name: s.name.clone(),
                key: s.port.clone(),
                payload: payload::port_service(s),
            })
            .collect();
        self.service_pass(client, proto, &items).await
    }

    async fn icmp_services(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let items: Vec<ServiceItem> = bundle
            .icmp_services
            .iter()
            .map(|s| ServiceItem {
                name: s.name.clone(),
                key: icmp_key(&s.icmp_type, s.icmp_code.as_deref()),
                payload: payload::icmp_service(s),
            })
            .collect();
        self.service_pass(client, "icmp", &items).await
    }

    async fn other_services(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let items: Vec<ServiceItem> = bundle
            .other_services
            .iter()
            .map(|s| ServiceItem {
                name: s.name.clone(),
                key: s.ip_protocol.clone(),
                payload: payload::other_service(s),
            })
            .collect();
        self.service_pass(client, "other", &items).await
    }

    /// One service family: read the server's services into an identity
    /// index, merge against it, create the rest. The returned map is
    /// uid-valued and pre-seeded with every pre-existing server service so
    /// rule references to them resolve to uids too.
    async fn service_pass(
        &mut self,
        client: &MgmtClient,
        proto: &str,
        items: &[ServiceItem],
    ) -> EngineResult<TranslationMap> {
        info!(proto, count = items.len(), "processing services");
        let (index, mut map) = build_service_index(client, proto).await;
        if items.is_empty() {
            return Ok(map);
        }
        let mut merged = index.merged(self.options.global_first);
        let command = format!("add-service-{proto}");

        for item in items {
            if let Some(existing) = merged.get(&item.key) {
                map.insert(&item.name, &existing.uid);
                self.report.reused(&existing.name, &item.name);
                continue;
            }
            match self
                .add_object(client, &command, &item.payload)
                .await?
            {
                Some((name, body)) => {
                    let uid = body
                        .get("uid")
                        .and_then(Value::as_str)
                        .unwrap_or(&name)
                        .to_string();
                    if let Some(key) =
                        parse_server_object(&body).and_then(|o| server_service_key(&o))
                    {
                        merged.insert(
                            key,
                            ServiceEntry {
                                name: name.clone(),
                                uid: uid.clone(),
                            },
                        );
                    }
                    map.insert(&item.name, uid);
                    self.report.added(&item.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&item.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn service_groups(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
        service_map: &TranslationMap,
    ) -> EngineResult<TranslationMap> {
        let mut group_map = TranslationMap::new();
        if bundle.service_groups.is_empty() {
            return Ok(group_map);
        }
        info!(count = bundle.service_groups.len(), "processing service groups");
        for group in &bundle.service_groups {
            let members = rewrite_names(&group.members, &[service_map, &group_map]);
            let added = self
                .add_group_with_members(
                    client,
                    "add-service-group",
                    "set-service-group",
                    &group.name,
                    &members,
                    &group.comments,
                    &group.tags,
                )
                .await?;
            match added {
                Some(name) => {
                    // Service groups are referenced by name, not uid.
                    group_map.insert(&group.name, &name);
                    self.report.added(&group.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&group.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(group_map)
    }

    // ── Time objects ──────────────────────────────────────────────────

    async fn time_groups(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.time_groups.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.time_groups.len(), "processing time groups");
        for group in &bundle.time_groups {
            let body = time_group_payload(group);
            match self
                .add_object(client, "add-time-group", &body)
                .await?
            {
                Some((name, _)) => {
                    map.insert(&group.name, &name);
                    self.report.added(&group.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&group.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    async fn times(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
    ) -> EngineResult<TranslationMap> {
        let mut map = TranslationMap::new();
        if bundle.times.is_empty() {
            return Ok(map);
        }
        info!(count = bundle.times.len(), "processing times");
        for time in &bundle.times {
            match self
                .add_object(client, "add-time", &payload::time(time))
                .await?
            {
                Some((name, _)) => {
                    map.insert(&time.name, &name);
                    self.report.added(&time.name, &name);
                    self.batcher.record(client).await;
                }
                None => self.report.not_added(&time.name),
            }
        }
        self.batcher.flush(client).await;
        Ok(map)
    }

    // ── Package, layers, rules ────────────────────────────────────────

    /// Import the package with its layers and rules. Returns the layer-name
    /// map when the package was created; `None` short-circuits NAT rules.
    async fn package(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
        network_map: &TranslationMap,
        service_map: &TranslationMap,
        time_group_map: &TranslationMap,
        time_map: &TranslationMap,
    ) -> EngineResult<Option<TranslationMap>> {
        let Some(package) = &bundle.package else {
            return Ok(None);
        };
        info!(package = %package.name, "processing package");

        // The whole layer hierarchy is suffixed up front so every rule and
        // NAT reference resolves through one map.
        let layer_names = suffixed_layer_names(package, &layer_suffix());
        let package_name = resolve_or_passthrough(&package.name, &[&layer_names]);

        let created = self
            .add_once(client, "add-package", &payload::package(&package_name, &package.tags))
            .await?;
        if created.is_none() {
            self.report.line(format!("{package_name} package is not added"));
            return Ok(None);
        }
        self.report.line(format!("{package_name} package is added"));
        self.batcher.flush(client).await;

        for sub_layer in &package.sub_policies {
            let layer_name = resolve_or_passthrough(&sub_layer.name, &[&layer_names]);
            let created = self
                .add_once(
                    client,
                    "add-access-layer",
                    &payload::access_layer(sub_layer, &layer_name),
                )
                .await?;
            if created.is_none() {
                self.report.line(format!("{layer_name} layer is not added"));
                continue;
            }
            self.report.line(format!("{layer_name} layer is added"));
            self.batcher.flush(client).await;
            self.access_rules(
                client,
                &sub_layer.rules,
                false,
                &layer_names,
                network_map,
                service_map,
                time_group_map,
                time_map,
            )
            .await?;
        }

        if let Some(parent) = &package.parent_layer {
            self.access_rules(
                client,
                &parent.rules,
                true,
                &layer_names,
                network_map,
                service_map,
                time_group_map,
                time_map,
            )
            .await?;
        }
        Ok(Some(layer_names))
    }

    /// Add a layer's rules. Rules go in reverse bundle order at position
    /// "top", so the server ends up with the bundle's order. The parent
    /// layer's trailing clean-up rule is skipped — the server supplies its
    /// own.
    #[allow(clippy::too_many_arguments)]
    async fn access_rules(
        &mut self,
        client: &MgmtClient,
        rules: &[AccessRule],
        skip_cleanup_rule: bool,
        layer_names: &TranslationMap,
        network_map: &TranslationMap,
        service_map: &TranslationMap,
        time_group_map: &TranslationMap,
        time_map: &TranslationMap,
    ) -> EngineResult<()> {
        let end = if skip_cleanup_rule {
            rules.len().saturating_sub(1)
        } else {
            rules.len()
        };
        for rule in rules[..end].iter().rev() {
            let layer = resolve_or_passthrough(&rule.layer, &[layer_names]);
            let refs = payload::RuleRefs {
                sources: rewrite_refs(&rule.source, &[network_map]),
                destinations: rewrite_refs(&rule.destination, &[network_map]),
                services: rewrite_refs(&rule.service, &[service_map]),
                times: rewrite_refs(&rule.time, &[time_group_map, time_map]),
            };
            let inline_layer = if rule.action == 3 {
                rule.sub_policy_name
                    .as_deref()
                    .map(|n| resolve_or_passthrough(n, &[layer_names]))
            } else {
                None
            };
            let body = payload::access_rule(rule, &layer, &refs, inline_layer.as_deref());

            match self.add_once(client, "add-access-rule", &body).await? {
                Some(_) => {
                    self.report.line("access rule is added");
                    self.batcher.record(client).await;
                }
                None => self.report.line("access rule is not added"),
            }
        }
        self.batcher.flush(client).await;
        Ok(())
    }

    // ── NAT rules ─────────────────────────────────────────────────────

    async fn nat_rules(
        &mut self,
        client: &MgmtClient,
        bundle: &PolicyBundle,
        layer_names: Option<&TranslationMap>,
        network_map: &TranslationMap,
        service_map: &TranslationMap,
    ) -> EngineResult<()> {
        if bundle.nat_rules.is_empty() {
            return Ok(());
        }
        info!(count = bundle.nat_rules.len(), "processing nat rules");
        let Some(layer_names) = layer_names else {
            self.report
                .line("nat rules can not been added because package was not added");
            for _ in &bundle.nat_rules {
                self.report.line("nat rule is not added");
            }
            return Ok(());
        };

        for rule in &bundle.nat_rules {
            let endpoints = nat_endpoints(rule, network_map, service_map);
            let package = resolve_or_passthrough(&rule.package, &[layer_names]);
            let body = payload::nat_rule(rule, &package, &endpoints);
            match self.add_once(client, "add-nat-rule", &body).await? {
                Some(_) => {
                    self.report.line("nat rule is added");
                    self.batcher.record(client).await;
                }
                None => self.report.line("nat rule is not added"),
            }
        }
        self.batcher.flush(client).await;
        Ok(())
    }

    // ── Shared helpers ────────────────────────────────────────────────

    /// Create with the run's default rename policy.
    async fn add_object(
        &mut self,
        client: &MgmtClient,
        command: &str,
        body: &Value,
    ) -> EngineResult<Option<(String, Value)>> {
        let policy = self.rename.clone();
        self.add_object_with_policy(client, command, body, &policy)
            .await
    }

    /// Create with rename retries, folding exhaustion into a skip.
    async fn add_object_with_policy(
        &mut self,
        client: &MgmtClient,
        command: &str,
        body: &Value,
        policy: &RenamePolicy,
    ) -> EngineResult<Option<(String, Value)>> {
        match create_with_rename(client, command, body, policy).await {
            Ok(Outcome::Created { name, body, .. }) => Ok(Some((name, body))),
            Ok(_) => Ok(None),
            Err(EngineError::RenameExhausted { name, attempts }) => {
                warn!(object = %name, attempts, "rename attempts exhausted");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Single creation attempt, no renaming. Server rejections are logged
    /// and folded into `None`; transport failures propagate.
    async fn add_once(
        &mut self,
        client: &MgmtClient,
        command: &str,
        body: &Value,
    ) -> EngineResult<Option<Value>> {
        match client.call(command, body).await {
            Ok(response) => Ok(Some(response)),
            Err(ApiError::Call(failure)) => {
                for line in failure.lines() {
                    warn!(%command, detail = %line, "object rejected");
                }
                Ok(None)
            }
            Err(e) => Err(EngineError::Api(e)),
        }
    }

    async fn merge_object(
        &mut self,
        client: &MgmtClient,
        command: &str,
        object_type: &str,
        identity_filter: &str,
        expect_subnet: Option<(&str, &str)>,
        body: &Value,
    ) -> EngineResult<Outcome> {
        let policy = self.rename.clone();
        match create_with_identity_merge(
            client,
            command,
            object_type,
            identity_filter,
            expect_subnet,
            body,
            &policy,
            self.options.global_first,
        )
        .await
        {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::RenameExhausted { name, attempts }) => {
                warn!(object = %name, attempts, "rename attempts exhausted");
                Ok(Outcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    async fn record_merge_outcome(
        &mut self,
        client: &MgmtClient,
        map: &mut TranslationMap,
        source: &str,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Created { name, .. } => {
                map.insert(source, &name);
                self.report.added(source, &name);
                self.batcher.record(client).await;
            }
            Outcome::Merged { name, .. } => {
                map.insert(source, &name);
                self.report.reused(&name, source);
                self.batcher.record(client).await;
            }
            Outcome::Skipped => self.report.not_added(source),
        }
    }

    /// Create a group, inlining small member lists. Large groups are
    /// created empty and filled one member at a time; a rejected member
    /// costs only itself.
    #[allow(clippy::too_many_arguments)]
    async fn add_group_with_members(
        &mut self,
        client: &MgmtClient,
        add_command: &str,
        set_command: &str,
        name: &str,
        members: &[String],
        comments: &str,
        tags: &[String],
    ) -> EngineResult<Option<String>> {
        if members.len() <= GROUP_INLINE_LIMIT {
            let body = payload::group(name, members, comments, tags);
            return Ok(self
                .add_object(client, add_command, &body)
                .await?
                .map(|(name, _)| name));
        }

        let empty = payload::group(name, &[], comments, tags);
        let Some((final_name, _)) = self
            .add_object(client, add_command, &empty)
            .await?
        else {
            return Ok(None);
        };
        for member in members {
            let add_member = serde_json::json!({
                "name": final_name,
                "members": { "add": member },
            });
            if self.add_once(client, set_command, &add_member).await?.is_none() {
                warn!(group = %final_name, %member, "group member rejected");
            }
        }
        Ok(Some(final_name))
    }
}

struct ServiceItem {
    name: String,
    key: String,
    payload: Value,
}

fn parse_server_object(body: &Value) -> Option<ServerObject> {
    serde_json::from_value(body.clone()).ok()
}

/// Short random suffix isolating this run's layer names from whatever the
/// server already holds.
fn layer_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Map every layer-hierarchy name to its suffixed form: the package, each
/// sub-policy, and the package's implicit "<name> Network" parent layer.
fn suffixed_layer_names(package: &Package, suffix: &str) -> TranslationMap {
    let mut map = TranslationMap::new();
    map.insert(&package.name, format!("{}_{suffix}", package.name));
    map.insert(
        format!("{} Network", package.name),
        format!("{}_{suffix} Network", package.name),
    );
    for sub_layer in &package.sub_policies {
        map.insert(&sub_layer.name, format!("{}_{suffix}", sub_layer.name));
    }
    map
}

fn time_group_payload(group: &TimeGroup) -> Value {
    payload::group(&group.name, &group.members, &group.comments, &group.tags)
}

fn nat_endpoints(
    rule: &NatRule,
    network_map: &TranslationMap,
    service_map: &TranslationMap,
) -> payload::NatEndpoints {
    let network = |r: &Option<polimport_model::ObjectRef>| {
        r.as_ref()
            .map(|r| resolve_or_passthrough(&r.name, &[network_map]))
            .unwrap_or_default()
    };
    let service = |r: &Option<polimport_model::ObjectRef>| {
        r.as_ref()
            .map(|r| resolve_or_passthrough(&r.name, &[service_map]))
            .unwrap_or_default()
    };
    payload::NatEndpoints {
        original_source: network(&rule.source),
        original_destination: network(&rule.destination),
        original_service: service(&rule.service),
        translated_source: network(&rule.translated_source),
        translated_destination: network(&rule.translated_destination),
        translated_service: service(&rule.translated_service),
    }
}
