// REST sub-path builders
//
// Pure functions from entity coordinates to the sub-path that follows
// `/api/v{version}`. Nothing here touches the network.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Error;

/// Address family of a block, network, address, or DHCP range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum IpVersion {
    #[default]
    #[strum(serialize = "ipv4", serialize = "4", serialize = "v4")]
    #[serde(rename = "ipv4", alias = "4")]
    V4,
    #[strum(serialize = "ipv6", serialize = "6", serialize = "v6")]
    #[serde(rename = "ipv6", alias = "6")]
    V6,
}

impl IpVersion {
    /// Parse a caller-supplied version string (`4`, `ipv6`, ...).
    pub fn parse(raw: &str) -> Result<Self, Error> {
        raw.trim()
            .parse()
            .map_err(|_| Error::validation("ip_version", format!("unknown IP version '{raw}'")))
    }

    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub fn max_prefix(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    pub fn blocks(self) -> &'static str {
        match self {
            Self::V4 => "ipv4_blocks",
            Self::V6 => "ipv6_blocks",
        }
    }

    pub fn networks(self) -> &'static str {
        match self {
            Self::V4 => "ipv4_networks",
            Self::V6 => "ipv6_networks",
        }
    }

    pub fn addresses(self) -> &'static str {
        match self {
            Self::V4 => "ipv4_addresses",
            Self::V6 => "ipv6_addresses",
        }
    }
}

/// A validated `address/prefix` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cidr {
    pub address: String,
    pub prefix: u8,
    pub version: IpVersion,
}

impl Cidr {
    /// Parse `address/prefix`, rejecting non-numeric or out-of-range
    /// prefixes and unparseable addresses.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let (address, prefix) = raw
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::validation("cidr", format!("'{raw}' is not in address/prefix form")))?;
        Self::from_parts(address, prefix)
    }

    pub fn from_parts(address: &str, prefix: &str) -> Result<Self, Error> {
        let ip: IpAddr = address
            .trim()
            .parse()
            .map_err(|_| Error::validation("address", format!("'{address}' is not an IP address")))?;
        let version = IpVersion::of(&ip);
        let prefix: u8 = prefix
            .trim()
            .parse()
            .map_err(|_| Error::validation("cidr", format!("prefix '{prefix}' is not numeric")))?;
        if prefix > version.max_prefix() {
            return Err(Error::validation(
                "cidr",
                format!("prefix /{prefix} exceeds /{} for {version}", version.max_prefix()),
            ));
        }
        Ok(Self {
            address: address.trim().to_owned(),
            prefix,
            version,
        })
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

// ── Scopes ──────────────────────────────────────────────────────────

/// `/configurations/{cfg}`, or empty when `cfg` is empty.
pub fn configuration_scope(cfg: &str) -> String {
    if cfg.is_empty() {
        String::new()
    } else {
        format!("/configurations/{cfg}")
    }
}

/// Configuration scope plus `/views/{view}` when both are non-empty.
pub fn view_scope(cfg: &str, view: &str) -> String {
    let mut path = configuration_scope(cfg);
    if !cfg.is_empty() && !view.is_empty() {
        path.push_str("/views/");
        path.push_str(view);
    }
    path
}

/// View scope plus `/zones/{zone}` when the zone is non-empty.
pub fn zone_scope(cfg: &str, view: &str, zone: &str) -> String {
    let mut path = view_scope(cfg, view);
    if !zone.is_empty() {
        path.push_str("/zones/");
        path.push_str(zone);
    }
    path
}

// ── IPAM paths ──────────────────────────────────────────────────────

pub fn block_path(cfg: &str, block: &Cidr) -> String {
    format!("{}/{}/{block}", configuration_scope(cfg), block.version.blocks())
}

pub fn network_path(cfg: &str, network: &Cidr) -> String {
    format!("{}/{}/{network}", configuration_scope(cfg), network.version.networks())
}

pub fn address_path(cfg: &str, version: IpVersion, address: &str) -> String {
    format!("{}/{}/{address}", configuration_scope(cfg), version.addresses())
}

/// Identity path of a DHCP range.
///
/// IPv6 ranges use the `/dhcp_range/start/{s}/end/{e}` layout, which the
/// request builder sends without a trailing slash.
pub fn dhcp_range_path(cfg: &str, network: &Cidr, start: &str, end: &str) -> String {
    let net = network_path(cfg, network);
    match network.version {
        IpVersion::V4 => format!("{net}/dhcp_ranges/{start}/{end}"),
        IpVersion::V6 => format!("{net}/dhcp_range/start/{start}/end/{end}"),
    }
}

pub fn server_path(cfg: &str, fqdn: &str) -> String {
    format!("{}/servers/{fqdn}", configuration_scope(cfg))
}

// ── DNS names ───────────────────────────────────────────────────────

/// Fully qualified name of `name` inside `zone`.
///
/// The zone is appended unless the name already ends with it (plain
/// suffix match) or ends with `.`. A trailing dot marks the name as
/// absolute and is dropped from the result: identity paths on the
/// appliance never carry it.
pub fn absolute_name(name: &str, zone: &str) -> String {
    if zone.is_empty() {
        return name.to_owned();
    }
    if let Some(explicit) = name.strip_suffix('.') {
        return explicit.to_owned();
    }
    if name.ends_with(zone) {
        return name.to_owned();
    }
    format!("{name}.{zone}")
}

/// Zone implied by a fully qualified name: everything after the first `.`.
pub fn zone_of(fqdn: &str) -> &str {
    fqdn.split_once('.').map_or("", |(_, zone)| zone)
}

/// Leftmost DNS label.
pub fn leftmost_label(fqdn: &str) -> &str {
    fqdn.split_once('.').map_or(fqdn, |(label, _)| label)
}
