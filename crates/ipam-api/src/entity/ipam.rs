// IPAM entities: configurations, blocks, networks, addresses, DHCP ranges.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::path::{self, Cidr, IpVersion};
use super::{Identified, Locator, is_zero};
use crate::error::Error;
use crate::properties;

/// Property carrying the caller-supplied network tag.
pub const ALLOCATED_ID: &str = "allocatedId";

// ── Action / State ──────────────────────────────────────────────────

/// Write-side allocation mode of an IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    MakeStatic,
    MakeReserved,
    MakeDhcpReserved,
}

/// Read-side status reported by the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Static,
    Reserved,
    DhcpReserved,
}

impl From<State> for Action {
    fn from(state: State) -> Self {
        match state {
            State::Static => Self::MakeStatic,
            State::Reserved => Self::MakeReserved,
            State::DhcpReserved => Self::MakeDhcpReserved,
        }
    }
}

impl Action {
    /// Parse a caller value, accepting both the action spelling and the
    /// state spelling the appliance echoes back.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if let Ok(action) = raw.parse::<Self>() {
            return Ok(action);
        }
        raw.to_ascii_uppercase()
            .parse::<State>()
            .map(Self::from)
            .map_err(|_| Error::validation("action", format!("unknown IP action '{raw}'")))
    }
}

// ── Configuration ───────────────────────────────────────────────────

/// Top-level scope; names are unique per appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    pub properties: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl Configuration {
    pub fn new(name: impl Into<String>, properties: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: properties.into(),
            locator: Locator::collection("", "configurations"),
            ..Self::default()
        }
    }

    pub fn existing(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            locator: Locator::identity(path::configuration_scope(name)),
            ..Self::default()
        }
    }
}

impl Identified for Configuration {
    fn identifier(&self) -> String {
        self.name.clone()
    }
}

// ── Block ───────────────────────────────────────────────────────────

/// IPv4 or IPv6 address block, optionally nested under a parent block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<u8>,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub parent_block: String,
    #[serde(skip)]
    pub ip_version: IpVersion,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl Block {
    /// Creation shape. The container is the parent block when given,
    /// otherwise the configuration.
    ///
    /// IPv6 blocks also carry their identity under the `prefix` property.
    pub fn new(
        configuration: &str,
        block: &Cidr,
        parent: Option<&Cidr>,
        name: impl Into<String>,
        props: &str,
    ) -> Self {
        let container = parent.map_or_else(
            || path::configuration_scope(configuration),
            |p| path::block_path(configuration, p),
        );
        let properties = match block.version {
            IpVersion::V4 => props.to_owned(),
            IpVersion::V6 => properties::set("prefix", &block.to_string(), props),
        };
        Self {
            name: name.into(),
            address: block.address.clone(),
            cidr: Some(block.prefix),
            properties,
            configuration: configuration.to_owned(),
            parent_block: parent.map(ToString::to_string).unwrap_or_default(),
            ip_version: block.version,
            locator: Locator::collection(container, block.version.blocks()),
            ..Self::default()
        }
    }

    pub fn existing(configuration: &str, block: &Cidr) -> Self {
        Self {
            address: block.address.clone(),
            cidr: Some(block.prefix),
            configuration: configuration.to_owned(),
            ip_version: block.version,
            locator: Locator::identity(path::block_path(configuration, block)),
            ..Self::default()
        }
    }

    /// `address/cidr`, from the typed fields or the `CIDR`/`prefix` property.
    pub fn cidr_notation(&self) -> String {
        if let (false, Some(prefix)) = (self.address.is_empty(), self.cidr) {
            return format!("{}/{prefix}", self.address);
        }
        let cidr = properties::get("CIDR", &self.properties);
        if cidr.is_empty() {
            properties::get("prefix", &self.properties)
        } else {
            cidr
        }
    }
}

impl Identified for Block {
    fn identifier(&self) -> String {
        self.cidr_notation()
    }
}

// ── Network ─────────────────────────────────────────────────────────

/// Caller-side description of a network.
///
/// Filled either directly or from loosely-typed input via [`bind`](Self::bind).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSpec {
    pub configuration: String,
    pub parent_block: String,
    pub cidr: String,
    pub name: String,
    pub gateway: String,
    pub template: String,
    pub allocated_id: String,
    pub properties: String,
    /// Prefix length requested from `get_next_network`.
    pub size: Option<u32>,
    pub ip_version: Option<IpVersion>,
}

/// Result of [`NetworkSpec::bind`]: the filled `NetworkSpec` plus the input keys that
/// did not map to any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBinding {
    pub spec: NetworkSpec,
    pub unknown: Vec<String>,
}

impl NetworkSpec {
    /// Copy the recognised subset of `fields` into a spec.
    ///
    /// Unknown keys are collected, not rejected. Type mismatches on known
    /// keys are validation errors. Null values leave the field unset.
    pub fn bind(fields: &Map<String, Value>) -> Result<NetworkBinding, Error> {
        fn text(key: &str, value: &Value) -> Result<String, Error> {
            match value {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(Error::validation(key, "expected a string")),
            }
        }

        let mut spec = Self::default();
        let mut unknown = Vec::new();
        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "configuration" => spec.configuration = text(key, value)?,
                "parent_block" => spec.parent_block = text(key, value)?,
                "cidr" => spec.cidr = text(key, value)?,
                "name" => spec.name = text(key, value)?,
                "gateway" => spec.gateway = text(key, value)?,
                "template" => spec.template = text(key, value)?,
                "allocated_id" => spec.allocated_id = text(key, value)?,
                "properties" => spec.properties = text(key, value)?,
                "size" => {
                    let size = value
                        .as_u64()
                        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| Error::validation("size", "expected a prefix length"))?;
                    spec.size = Some(size);
                }
                "ip_version" => spec.ip_version = Some(IpVersion::parse(&text(key, value)?)?),
                _ => unknown.push(key.clone()),
            }
        }
        Ok(NetworkBinding { spec, unknown })
    }

    /// Property string with gateway and allocated id merged in.
    fn merged_properties(&self) -> String {
        let mut props = self.properties.clone();
        if !self.gateway.is_empty() {
            props = properties::set("gateway", &self.gateway, &props);
        }
        if !self.allocated_id.is_empty() {
            props = properties::set(ALLOCATED_ID, &self.allocated_id, &props);
        }
        props
    }

    fn check_version(&self, actual: IpVersion) -> Result<(), Error> {
        match self.ip_version {
            Some(declared) if declared != actual => Err(Error::validation(
                "ip_version",
                format!("declared {declared} but addresses are {actual}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Leaf IP container inside a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    pub properties: String,
    #[serde(skip)]
    pub gateway: String,
    #[serde(skip)]
    pub allocated_id: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub parent_block: String,
    #[serde(skip)]
    pub ip_version: IpVersion,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl Network {
    /// Creation shape for an explicit CIDR under its parent block.
    pub fn new(spec: &NetworkSpec) -> Result<Self, Error> {
        let block = Cidr::parse(&spec.parent_block)?;
        let cidr = Cidr::parse(&spec.cidr)?;
        spec.check_version(cidr.version)?;
        if block.version != cidr.version {
            return Err(Error::validation(
                "cidr",
                format!("{cidr} and parent block {block} are different families"),
            ));
        }
        Ok(Self {
            name: spec.name.clone(),
            cidr: cidr.to_string(),
            template: spec.template.clone(),
            properties: spec.merged_properties(),
            gateway: spec.gateway.clone(),
            allocated_id: spec.allocated_id.clone(),
            configuration: spec.configuration.clone(),
            parent_block: block.to_string(),
            ip_version: cidr.version,
            locator: Locator::collection(
                path::block_path(&spec.configuration, &block),
                cidr.version.networks(),
            ),
            ..Self::default()
        })
    }

    /// Creation shape asking the block for its next free network of
    /// `spec.size` bits.
    pub fn next_available(spec: &NetworkSpec) -> Result<Self, Error> {
        let block = Cidr::parse(&spec.parent_block)?;
        spec.check_version(block.version)?;
        let size = spec
            .size
            .ok_or_else(|| Error::validation("size", "required for next-available network"))?;
        if size > u32::from(block.version.max_prefix()) || size < u32::from(block.prefix) {
            return Err(Error::validation(
                "size",
                format!("/{size} does not fit inside {block}"),
            ));
        }
        Ok(Self {
            name: spec.name.clone(),
            template: spec.template.clone(),
            size: Some(size),
            properties: spec.merged_properties(),
            gateway: spec.gateway.clone(),
            allocated_id: spec.allocated_id.clone(),
            configuration: spec.configuration.clone(),
            parent_block: block.to_string(),
            ip_version: block.version,
            locator: Locator::collection(
                path::block_path(&spec.configuration, &block),
                "get_next_network",
            ),
            ..Self::default()
        })
    }

    pub fn existing(configuration: &str, cidr: &Cidr) -> Self {
        Self {
            cidr: cidr.to_string(),
            configuration: configuration.to_owned(),
            ip_version: cidr.version,
            locator: Locator::identity(path::network_path(configuration, cidr)),
            ..Self::default()
        }
    }

    /// Identity shape resolving a network by its allocated-id tag.
    pub fn by_allocated_id(configuration: &str, block: &Cidr, allocated_id: &str) -> Self {
        Self {
            allocated_id: allocated_id.to_owned(),
            configuration: configuration.to_owned(),
            parent_block: block.to_string(),
            ip_version: block.version,
            locator: Locator::identity(format!(
                "{}/get_network_by_allocated_id/{allocated_id}",
                path::block_path(configuration, block)
            )),
            ..Self::default()
        }
    }

    /// CIDR from the typed field or the `CIDR`/`prefix` property.
    pub fn cidr_notation(&self) -> String {
        if !self.cidr.is_empty() {
            return self.cidr.clone();
        }
        let cidr = properties::get("CIDR", &self.properties);
        if cidr.is_empty() {
            properties::get("prefix", &self.properties)
        } else {
            cidr
        }
    }

    pub fn gateway(&self) -> String {
        if self.gateway.is_empty() {
            properties::get("gateway", &self.properties)
        } else {
            self.gateway.clone()
        }
    }
}

impl Identified for Network {
    fn identifier(&self) -> String {
        self.cidr_notation()
    }
}

// ── IP address ──────────────────────────────────────────────────────

/// Leaf address inside a network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAddress {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub network: String,
    #[serde(skip)]
    pub ip_version: IpVersion,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl IpAddress {
    /// Creation shape requesting the next free address of `network`.
    pub fn next_available(configuration: &str, network: &Cidr) -> Self {
        Self {
            configuration: configuration.to_owned(),
            network: network.to_string(),
            ip_version: network.version,
            locator: Locator::collection(path::network_path(configuration, network), "get_next_ip"),
            ..Self::default()
        }
    }

    /// Creation shape claiming an explicit address inside `network`.
    pub fn assign(configuration: &str, network: &Cidr, address: &str) -> Self {
        Self {
            address: address.to_owned(),
            configuration: configuration.to_owned(),
            network: network.to_string(),
            ip_version: network.version,
            locator: Locator::collection(
                path::network_path(configuration, network),
                network.version.addresses(),
            ),
            ..Self::default()
        }
    }

    pub fn existing(configuration: &str, version: IpVersion, address: &str) -> Self {
        Self {
            address: address.to_owned(),
            configuration: configuration.to_owned(),
            ip_version: version,
            locator: Locator::identity(path::address_path(configuration, version, address)),
            ..Self::default()
        }
    }

    /// Address from the typed field or the `address` property.
    pub fn current_address(&self) -> String {
        if self.address.is_empty() {
            properties::get("address", &self.properties)
        } else {
            self.address.clone()
        }
    }

    pub fn current_mac(&self) -> String {
        if self.mac_address.is_empty() {
            properties::get("macAddress", &self.properties)
        } else {
            self.mac_address.clone()
        }
    }

    /// Reported state, if the appliance sent one we know.
    pub fn state(&self) -> Option<State> {
        properties::get("state", &self.properties).parse().ok()
    }
}

impl Identified for IpAddress {
    fn identifier(&self) -> String {
        self.current_address()
    }
}

// ── DHCP range ──────────────────────────────────────────────────────

/// `(network, start, end)` DHCP range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcpRange {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub end: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub network: String,
    #[serde(skip)]
    pub ip_version: IpVersion,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl DhcpRange {
    pub fn new(configuration: &str, network: &Cidr, start: &str, end: &str) -> Self {
        Self {
            start: start.to_owned(),
            end: end.to_owned(),
            configuration: configuration.to_owned(),
            network: network.to_string(),
            ip_version: network.version,
            locator: Locator::collection(path::network_path(configuration, network), "dhcp_ranges"),
            ..Self::default()
        }
    }

    pub fn existing(configuration: &str, network: &Cidr, start: &str, end: &str) -> Self {
        Self {
            start: start.to_owned(),
            end: end.to_owned(),
            configuration: configuration.to_owned(),
            network: network.to_string(),
            ip_version: network.version,
            locator: Locator::identity(path::dhcp_range_path(configuration, network, start, end)),
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> (String, String) {
        let pick = |field: &str, key: &str| {
            if field.is_empty() {
                properties::get(key, &self.properties)
            } else {
                field.to_owned()
            }
        };
        (pick(&self.start, "start"), pick(&self.end, "end"))
    }
}

impl Identified for DhcpRange {
    fn identifier(&self) -> String {
        let (start, end) = self.bounds();
        format!("{start}-{end}")
    }
}
