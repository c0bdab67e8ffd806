// ── Object manager ──
//
// Typed façade over the connector: one method per (entity, operation).
// Each method builds the entity in creation or identity shape, dispatches
// it, and hands back the populated entity. Create methods re-read the
// object so callers always see the appliance's view of it.
//
// Composite workflows live in `crate::workflow` as further inherent
// methods on the same type.

use ipam_api::entity::{
    Action, Block, Cidr, CnameRecord, Configuration, DeploymentRole, DhcpRange, Entity,
    ExternalHostRecord, GenericRecord, HostRecord, IpAddress, IpVersion, Network, NetworkSpec,
    Server, ServerRole, SrvRecord, TxtRecord, View, Zone,
};
use ipam_api::properties::{self, PARENT_KEYS};
use ipam_api::{Connector, Error as ApiError};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::model::MacAddress;

/// Translate a wire error, naming the resource on not-found and the
/// operation otherwise.
pub(crate) fn wire_error(
    err: ApiError,
    operation: &'static str,
    resource: &'static str,
    key: &str,
) -> CoreError {
    if err.is_not_found() {
        CoreError::NotFound {
            resource: resource.to_owned(),
            identifier: key.to_owned(),
        }
    } else {
        CoreError::from(err).during(operation, key)
    }
}

/// Property string as sent on every update: parent pointers removed.
fn update_properties(props: &str) -> String {
    properties::remove_immutable(props, &PARENT_KEYS)
}

/// Typed entry point for every remote operation.
pub struct ObjectManager {
    connector: Connector,
}

impl ObjectManager {
    /// Log in and wrap the resulting connector.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let connector =
            Connector::connect(config.host.clone(), &config.credentials, &config.transport())
                .await?;
        Ok(Self { connector })
    }

    /// Release the session token. Best effort.
    pub async fn logout(&self) {
        self.connector.logout().await;
    }

    // ── Generic plumbing ─────────────────────────────────────────────

    async fn create<E: Entity + Sync>(
        &self,
        entity: &E,
        resource: &'static str,
        key: &str,
    ) -> Result<String, CoreError> {
        debug!(resource, key, "create");
        self.connector
            .create_object(entity)
            .await
            .map_err(|e| wire_error(e, "create", resource, key))
    }

    async fn fetch<T, E>(&self, entity: &E, resource: &'static str, key: &str) -> Result<T, CoreError>
    where
        T: DeserializeOwned,
        E: Entity + Sync,
    {
        self.connector
            .get_object(entity)
            .await
            .map_err(|e| wire_error(e, "get", resource, key))
    }

    async fn patch<T, E>(&self, entity: &E, resource: &'static str, key: &str) -> Result<T, CoreError>
    where
        T: DeserializeOwned,
        E: Entity + Sync,
    {
        debug!(resource, key, "update");
        self.connector
            .update_object(entity)
            .await
            .map_err(|e| wire_error(e, "update", resource, key))
    }

    async fn remove<E: Entity + Sync>(
        &self,
        entity: &E,
        resource: &'static str,
        key: &str,
    ) -> Result<(), CoreError> {
        debug!(resource, key, "delete");
        self.connector
            .delete_object(entity)
            .await
            .map(drop)
            .map_err(|e| wire_error(e, "delete", resource, key))
    }

    // ── Configuration ────────────────────────────────────────────────

    pub async fn create_configuration(
        &self,
        name: &str,
        props: &str,
    ) -> Result<Configuration, CoreError> {
        self.create(&Configuration::new(name, props), "configuration", name)
            .await?;
        self.get_configuration(name).await
    }

    pub async fn get_configuration(&self, name: &str) -> Result<Configuration, CoreError> {
        self.fetch(&Configuration::existing(name), "configuration", name)
            .await
    }

    pub async fn update_configuration(
        &self,
        name: &str,
        props: &str,
    ) -> Result<Configuration, CoreError> {
        let mut target = Configuration::existing(name);
        target.properties = update_properties(props);
        self.patch(&target, "configuration", name).await
    }

    pub async fn delete_configuration(&self, name: &str) -> Result<(), CoreError> {
        self.remove(&Configuration::existing(name), "configuration", name)
            .await
    }

    // ── View ─────────────────────────────────────────────────────────

    pub async fn create_view(&self, cfg: &str, name: &str, props: &str) -> Result<View, CoreError> {
        self.create(&View::new(cfg, name, props), "view", name).await?;
        self.get_view(cfg, name).await
    }

    pub async fn get_view(&self, cfg: &str, name: &str) -> Result<View, CoreError> {
        let mut view: View = self.fetch(&View::existing(cfg, name), "view", name).await?;
        view.configuration = cfg.to_owned();
        Ok(view)
    }

    /// Views cannot be updated through the remote API.
    pub fn update_view(&self, _cfg: &str, name: &str) -> Result<View, CoreError> {
        Err(CoreError::Unsupported {
            operation: format!("update of view {name}"),
        })
    }

    pub async fn delete_view(&self, cfg: &str, name: &str) -> Result<(), CoreError> {
        self.remove(&View::existing(cfg, name), "view", name).await
    }

    // ── Zone ─────────────────────────────────────────────────────────

    /// Create a zone. Server roles are applied separately through
    /// [`reconcile_server_roles`](Self::reconcile_server_roles).
    pub async fn create_zone(
        &self,
        cfg: &str,
        view: &str,
        fqdn: &str,
        deployable: bool,
        props: &str,
    ) -> Result<Zone, CoreError> {
        let mut zone = Zone::new(cfg, view, fqdn, deployable);
        zone.properties = props.to_owned();
        self.create(&zone, "zone", fqdn).await?;
        self.get_zone(cfg, view, fqdn).await
    }

    pub async fn get_zone(&self, cfg: &str, view: &str, fqdn: &str) -> Result<Zone, CoreError> {
        let mut zone: Zone = self
            .fetch(&Zone::existing(cfg, view, fqdn), "zone", fqdn)
            .await?;
        zone.configuration = cfg.to_owned();
        zone.view = view.to_owned();
        if zone.absolute_name.is_empty() {
            zone.absolute_name = fqdn.to_owned();
        }
        Ok(zone)
    }

    pub async fn update_zone(
        &self,
        cfg: &str,
        view: &str,
        fqdn: &str,
        deployable: bool,
        props: &str,
    ) -> Result<Zone, CoreError> {
        let mut target = Zone::existing(cfg, view, fqdn);
        target.deployable = deployable;
        target.properties = update_properties(props);
        self.patch::<Zone, _>(&target, "zone", fqdn).await?;
        self.get_zone(cfg, view, fqdn).await
    }

    pub async fn delete_zone(&self, cfg: &str, view: &str, fqdn: &str) -> Result<(), CoreError> {
        self.remove(&Zone::existing(cfg, view, fqdn), "zone", fqdn)
            .await
    }

    /// Push the zone to its servers (or queue it, in batch mode).
    pub async fn deploy_zone(
        &self,
        cfg: &str,
        view: &str,
        fqdn: &str,
        batch_mode: bool,
    ) -> Result<String, CoreError> {
        info!(zone = fqdn, batch_mode, "deploying zone");
        self.connector
            .deploy_object(&Zone::existing(cfg, view, fqdn), batch_mode)
            .await
            .map_err(|e| wire_error(e, "deploy", "zone", fqdn))
    }

    // ── Deployment roles & servers ───────────────────────────────────

    pub async fn list_deployment_roles(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
    ) -> Result<Vec<DeploymentRole>, CoreError> {
        self.connector
            .list_objects(&DeploymentRole::listing(cfg, view, zone))
            .await
            .map_err(|e| wire_error(e, "list deployment roles of", "zone", zone))
    }

    pub async fn create_deployment_role(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        server: &str,
        role: ServerRole,
    ) -> Result<(), CoreError> {
        let entity = DeploymentRole::new(cfg, view, zone, server, role);
        self.create(&entity, "deployment role", server).await.map(drop)
    }

    pub async fn update_deployment_role(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        server: &str,
        role: ServerRole,
    ) -> Result<(), CoreError> {
        let mut target = DeploymentRole::existing(cfg, view, zone, server);
        target.role = role.wire_name().to_owned();
        self.patch::<DeploymentRole, _>(&target, "deployment role", server)
            .await
            .map(drop)
    }

    pub async fn delete_deployment_role(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        server: &str,
    ) -> Result<(), CoreError> {
        let entity = DeploymentRole::existing(cfg, view, zone, server);
        self.remove(&entity, "deployment role", server).await
    }

    pub async fn get_server(&self, cfg: &str, fqdn: &str) -> Result<Server, CoreError> {
        self.fetch(&Server::existing(cfg, fqdn), "server", fqdn).await
    }

    // ── Block ────────────────────────────────────────────────────────

    /// Create a block, nested under `parent` when given.
    pub async fn create_block(
        &self,
        cfg: &str,
        cidr: &str,
        parent: Option<&str>,
        name: &str,
        props: &str,
    ) -> Result<Block, CoreError> {
        let block = Cidr::parse(cidr)?;
        let parent = parent.map(Cidr::parse).transpose()?;
        if let Some(p) = &parent {
            if p.version != block.version {
                return Err(CoreError::validation(
                    "parent_block",
                    format!("{block} and {p} are different families"),
                ));
            }
        }
        let entity = Block::new(cfg, &block, parent.as_ref(), name, props);
        self.create(&entity, "block", cidr).await?;
        self.get_block(cfg, cidr).await
    }

    pub async fn get_block(&self, cfg: &str, cidr: &str) -> Result<Block, CoreError> {
        let block = Cidr::parse(cidr)?;
        let mut found: Block = self
            .fetch(&Block::existing(cfg, &block), "block", cidr)
            .await?;
        found.configuration = cfg.to_owned();
        found.ip_version = block.version;
        if found.address.is_empty() {
            found.address.clone_from(&block.address);
            found.cidr = Some(block.prefix);
        }
        Ok(found)
    }

    pub async fn update_block(
        &self,
        cfg: &str,
        cidr: &str,
        name: &str,
        props: &str,
    ) -> Result<Block, CoreError> {
        let block = Cidr::parse(cidr)?;
        let mut target = Block::existing(cfg, &block);
        target.name = name.to_owned();
        target.properties = update_properties(props);
        if block.version == IpVersion::V6 {
            target.properties = properties::set("prefix", &block.to_string(), &target.properties);
        }
        self.patch::<Block, _>(&target, "block", cidr).await?;
        self.get_block(cfg, cidr).await
    }

    pub async fn delete_block(&self, cfg: &str, cidr: &str) -> Result<(), CoreError> {
        let block = Cidr::parse(cidr)?;
        self.remove(&Block::existing(cfg, &block), "block", cidr).await
    }

    // ── Network ──────────────────────────────────────────────────────

    pub async fn create_network(&self, spec: &NetworkSpec) -> Result<Network, CoreError> {
        let entity = Network::new(spec)?;
        self.create(&entity, "network", &spec.cidr).await?;
        self.get_network(&spec.configuration, &spec.cidr).await
    }

    /// Ask the parent block for its next free network of `spec.size` bits.
    pub async fn create_next_network(&self, spec: &NetworkSpec) -> Result<Network, CoreError> {
        let entity = Network::next_available(spec)?;
        let reply = self.create(&entity, "network", &spec.parent_block).await?;
        let allocated: Network = serde_json::from_str(&reply).map_err(|e| CoreError::Decode {
            message: format!("next network reply: {e}"),
            body: reply.clone(),
        })?;
        let cidr = allocated.cidr_notation();
        if cidr.is_empty() {
            return Err(CoreError::Decode {
                message: "next network reply carried no CIDR".into(),
                body: reply,
            });
        }
        info!(block = %spec.parent_block, network = %cidr, "allocated next network");
        self.get_network(&spec.configuration, &cidr).await
    }

    pub async fn get_network(&self, cfg: &str, cidr: &str) -> Result<Network, CoreError> {
        let net = Cidr::parse(cidr)?;
        let mut found: Network = self
            .fetch(&Network::existing(cfg, &net), "network", cidr)
            .await?;
        found.configuration = cfg.to_owned();
        found.ip_version = net.version;
        if found.cidr.is_empty() {
            found.cidr = net.to_string();
        }
        found.gateway = found.gateway();
        Ok(found)
    }

    /// Resolve a network by the caller-supplied allocated-id tag.
    pub async fn get_network_by_allocated_id(
        &self,
        cfg: &str,
        block: &str,
        allocated_id: &str,
    ) -> Result<Network, CoreError> {
        let parent = Cidr::parse(block)?;
        let mut found: Network = self
            .fetch(
                &Network::by_allocated_id(cfg, &parent, allocated_id),
                "network",
                allocated_id,
            )
            .await?;
        found.configuration = cfg.to_owned();
        found.parent_block = parent.to_string();
        found.allocated_id = allocated_id.to_owned();
        found.gateway = found.gateway();
        Ok(found)
    }

    pub async fn update_network(
        &self,
        cfg: &str,
        cidr: &str,
        name: &str,
        gateway: &str,
        props: &str,
    ) -> Result<Network, CoreError> {
        let net = Cidr::parse(cidr)?;
        let mut target = Network::existing(cfg, &net);
        target.name = name.to_owned();
        target.properties = update_properties(props);
        if !gateway.is_empty() {
            target.properties = properties::set("gateway", gateway, &target.properties);
        }
        self.patch::<Network, _>(&target, "network", cidr).await?;
        self.get_network(cfg, cidr).await
    }

    pub async fn delete_network(&self, cfg: &str, cidr: &str) -> Result<(), CoreError> {
        let net = Cidr::parse(cidr)?;
        self.remove(&Network::existing(cfg, &net), "network", cidr)
            .await
    }

    // ── DHCP range ───────────────────────────────────────────────────

    pub async fn create_dhcp_range(
        &self,
        cfg: &str,
        network: &str,
        (start, end): (&str, &str),
        template: &str,
        props: &str,
    ) -> Result<DhcpRange, CoreError> {
        let net = Cidr::parse(network)?;
        let mut range = DhcpRange::new(cfg, &net, start, end);
        range.template = template.to_owned();
        range.properties = props.to_owned();
        let key = format!("{start}-{end}");
        self.create(&range, "DHCP range", &key).await?;
        self.get_dhcp_range(cfg, network, start, end).await
    }

    pub async fn get_dhcp_range(
        &self,
        cfg: &str,
        network: &str,
        start: &str,
        end: &str,
    ) -> Result<DhcpRange, CoreError> {
        let net = Cidr::parse(network)?;
        let key = format!("{start}-{end}");
        let mut found: DhcpRange = self
            .fetch(&DhcpRange::existing(cfg, &net, start, end), "DHCP range", &key)
            .await?;
        found.configuration = cfg.to_owned();
        found.network = net.to_string();
        found.ip_version = net.version;
        Ok(found)
    }

    /// Update a range's template and properties, then re-read the range.
    pub async fn update_dhcp_range(
        &self,
        cfg: &str,
        network: &str,
        (start, end): (&str, &str),
        template: &str,
        props: &str,
    ) -> Result<DhcpRange, CoreError> {
        let net = Cidr::parse(network)?;
        let mut target = DhcpRange::existing(cfg, &net, start, end);
        target.template = template.to_owned();
        target.properties = update_properties(props);
        let key = format!("{start}-{end}");
        self.patch::<DhcpRange, _>(&target, "DHCP range", &key).await?;
        self.get_dhcp_range(cfg, network, start, end).await
    }

    pub async fn delete_dhcp_range(
        &self,
        cfg: &str,
        network: &str,
        start: &str,
        end: &str,
    ) -> Result<(), CoreError> {
        let net = Cidr::parse(network)?;
        let key = format!("{start}-{end}");
        self.remove(&DhcpRange::existing(cfg, &net, start, end), "DHCP range", &key)
            .await
    }

    // ── IP address ───────────────────────────────────────────────────

    pub async fn get_ip_address(&self, cfg: &str, address: &str) -> Result<IpAddress, CoreError> {
        let version = address_version(address)?;
        let mut found: IpAddress = self
            .fetch(&IpAddress::existing(cfg, version, address), "IP address", address)
            .await?;
        found.configuration = cfg.to_owned();
        found.ip_version = version;
        if found.address.is_empty() {
            found.address = address.to_owned();
        }
        Ok(found)
    }

    /// Claim an address inside `network`: the next free one when
    /// `claim.address` is empty, otherwise that exact address. Returns the
    /// allocated address as reported by the appliance.
    pub async fn allocate_ip(
        &self,
        cfg: &str,
        network: &str,
        claim: &IpAddress,
    ) -> Result<String, CoreError> {
        let net = Cidr::parse(network)?;
        let mut entity = if claim.address.is_empty() {
            IpAddress::next_available(cfg, &net)
        } else {
            let requested = address_version(&claim.address)?;
            if requested != net.version {
                return Err(CoreError::validation(
                    "ip_address",
                    format!("{} is not a {} address", claim.address, net.version),
                ));
            }
            IpAddress::assign(cfg, &net, &claim.address)
        };
        entity.name.clone_from(&claim.name);
        entity.action = claim.action;
        entity.template.clone_from(&claim.template);
        entity.properties.clone_from(&claim.properties);

        let reply = self.create(&entity, "IP address", network).await?;
        let allocated = if reply.trim().is_empty() {
            IpAddress::default()
        } else {
            serde_json::from_str::<IpAddress>(&reply).map_err(|e| CoreError::Decode {
                message: format!("allocation reply: {e}"),
                body: reply.clone(),
            })?
        };
        let address = match allocated.current_address() {
            a if !a.is_empty() => a,
            _ if !claim.address.is_empty() => claim.address.clone(),
            _ => {
                return Err(CoreError::Decode {
                    message: "allocation reply carried no address".into(),
                    body: reply,
                });
            }
        };
        info!(network, address = %address, "allocated IP address");
        Ok(address)
    }

    /// Update an address in place. Payload fields (name, MAC, action,
    /// template, properties) are taken from `change`.
    pub async fn update_ip_address(
        &self,
        cfg: &str,
        address: &str,
        change: &IpAddress,
    ) -> Result<IpAddress, CoreError> {
        let version = address_version(address)?;
        let mut target = IpAddress::existing(cfg, version, address);
        target.name.clone_from(&change.name);
        target.mac_address.clone_from(&change.mac_address);
        target.action = change.action;
        target.template.clone_from(&change.template);
        target.properties = update_properties(&change.properties);
        self.patch(&target, "IP address", address).await
    }

    /// Set the MAC of an allocated address.
    pub async fn set_mac_address(
        &self,
        cfg: &str,
        address: &str,
        mac: &MacAddress,
        action: Action,
    ) -> Result<(), CoreError> {
        let mut change = IpAddress::default();
        change.mac_address = mac.to_string();
        change.action = Some(action);
        self.update_ip_address(cfg, address, &change).await.map(drop)
    }

    pub async fn delete_ip_address(&self, cfg: &str, address: &str) -> Result<(), CoreError> {
        let version = address_version(address)?;
        self.remove(&IpAddress::existing(cfg, version, address), "IP address", address)
            .await
    }

    // ── Host record ──────────────────────────────────────────────────

    /// Create a host record. `reverseRecord` is re-cased to `true`/`false`
    /// before the write.
    pub async fn create_host_record(&self, record: &HostRecord) -> Result<HostRecord, CoreError> {
        let fqdn = record.fqdn();
        let mut entity = record.clone();
        entity.properties = properties::canonicalize_reverse_record(&record.properties)?;
        self.create(&entity, "host record", &fqdn).await?;
        self.get_host_record(&record.configuration, &record.view, &record.zone, &fqdn)
            .await
    }

    pub async fn get_host_record(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        fqdn: &str,
    ) -> Result<HostRecord, CoreError> {
        let target = HostRecord::existing(cfg, view, zone, fqdn);
        let mut found: HostRecord = self.fetch(&target, "host record", fqdn).await?;
        found.configuration = cfg.to_owned();
        found.view = view.to_owned();
        found.zone = target.zone;
        if found.absolute_name.is_empty() {
            found.absolute_name = fqdn.to_owned();
        }
        Ok(found)
    }

    pub async fn update_host_record(&self, record: &HostRecord) -> Result<HostRecord, CoreError> {
        let fqdn = record.fqdn();
        let mut target = record.at_identity();
        let canonical = properties::canonicalize_reverse_record(&record.properties)?;
        target.properties = update_properties(&canonical);
        self.patch(&target, "host record", &fqdn).await
    }

    pub async fn delete_host_record(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        fqdn: &str,
    ) -> Result<(), CoreError> {
        self.remove(&HostRecord::existing(cfg, view, zone, fqdn), "host record", fqdn)
            .await
    }

    pub async fn deploy_host_record(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        fqdn: &str,
        batch_mode: bool,
    ) -> Result<String, CoreError> {
        info!(record = fqdn, batch_mode, "deploying host record");
        self.connector
            .deploy_object(&HostRecord::existing(cfg, view, zone, fqdn), batch_mode)
            .await
            .map_err(|e| wire_error(e, "deploy", "host record", fqdn))
    }
}

// ── Other resource records ───────────────────────────────────────────

macro_rules! record_ops {
    ($ty:ident, $resource:literal, $create:ident, $get:ident, $update:ident, $delete:ident) => {
        impl ObjectManager {
            pub async fn $create(&self, record: &$ty) -> Result<$ty, CoreError> {
                let fqdn = record.fqdn();
                self.create(record, $resource, &fqdn).await?;
                self.$get(&record.configuration, &record.view, &record.zone, &fqdn)
                    .await
            }

            pub async fn $get(
                &self,
                cfg: &str,
                view: &str,
                zone: &str,
                fqdn: &str,
            ) -> Result<$ty, CoreError> {
                let target = $ty::existing(cfg, view, zone, fqdn);
                let mut found: $ty = self.fetch(&target, $resource, fqdn).await?;
                found.configuration = cfg.to_owned();
                found.view = view.to_owned();
                found.zone = target.zone;
                if found.absolute_name.is_empty() {
                    found.absolute_name = fqdn.to_owned();
                }
                Ok(found)
            }

            pub async fn $update(&self, record: &$ty) -> Result<$ty, CoreError> {
                let fqdn = record.fqdn();
                let mut target = record.at_identity();
                target.properties = update_properties(&record.properties);
                self.patch(&target, $resource, &fqdn).await
            }

            pub async fn $delete(
                &self,
                cfg: &str,
                view: &str,
                zone: &str,
                fqdn: &str,
            ) -> Result<(), CoreError> {
                self.remove(&$ty::existing(cfg, view, zone, fqdn), $resource, fqdn)
                    .await
            }
        }
    };
}

record_ops!(
    CnameRecord,
    "CNAME record",
    create_cname_record,
    get_cname_record,
    update_cname_record,
    delete_cname_record
);
record_ops!(
    TxtRecord,
    "TXT record",
    create_txt_record,
    get_txt_record,
    update_txt_record,
    delete_txt_record
);
record_ops!(
    SrvRecord,
    "SRV record",
    create_srv_record,
    get_srv_record,
    update_srv_record,
    delete_srv_record
);
record_ops!(
    GenericRecord,
    "generic record",
    create_generic_record,
    get_generic_record,
    update_generic_record,
    delete_generic_record
);
record_ops!(
    ExternalHostRecord,
    "external host record",
    create_external_host_record,
    get_external_host_record,
    update_external_host_record,
    delete_external_host_record
);

/// Address family of a bare address string.
pub(crate) fn address_version(address: &str) -> Result<IpVersion, CoreError> {
    address
        .trim()
        .parse::<std::net::IpAddr>()
        .map(|ip| IpVersion::of(&ip))
        .map_err(|_| CoreError::validation("ip_address", format!("'{address}' is not an IP address")))
}
