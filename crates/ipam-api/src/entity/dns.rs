// DNS entities: views, zones, resource records, deployment roles, servers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::path;
use super::{INHERIT_TTL, Identified, Locator, inherit_ttl, is_zero};
use crate::error::Error;
use crate::properties;

/// Coordinates shared by every resource record.
struct RecordScope {
    zone: String,
    container: String,
}

impl RecordScope {
    /// Derive the zone from the absolute name when none is given.
    fn new(cfg: &str, view: &str, zone: &str, absolute_name: &str) -> Self {
        let zone = if zone.is_empty() {
            path::zone_of(absolute_name).to_owned()
        } else {
            zone.to_owned()
        };
        let container = path::zone_scope(cfg, view, &zone);
        Self { zone, container }
    }

    fn create(&self, collection: &str) -> Locator {
        Locator::collection(self.container.clone(), collection)
    }

    fn identity(&self, collection: &str, absolute_name: &str) -> Locator {
        Locator::identity(format!("{}/{collection}/{absolute_name}", self.container))
    }
}

// ── View ────────────────────────────────────────────────────────────

/// DNS view within a configuration. The remote API cannot update views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct View {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl View {
    pub fn new(configuration: &str, name: &str, properties: &str) -> Self {
        Self {
            name: name.to_owned(),
            properties: properties.to_owned(),
            configuration: configuration.to_owned(),
            locator: Locator::collection(path::configuration_scope(configuration), "views"),
            ..Self::default()
        }
    }

    pub fn existing(configuration: &str, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            configuration: configuration.to_owned(),
            locator: Locator::identity(path::view_scope(configuration, name)),
            ..Self::default()
        }
    }
}

impl Identified for View {
    fn identifier(&self) -> String {
        self.name.clone()
    }
}

// ── Server roles ────────────────────────────────────────────────────

/// Caller-facing deployment role name.
///
/// The appliance spells some of these differently on the wire; see
/// [`wire_name`](Self::wire_name) and [`from_wire`](Self::from_wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerRole {
    Forwarder,
    Primary,
    PrimaryHidden,
    Secondary,
    SecondaryStealth,
    #[strum(serialize = "NONE")]
    #[serde(rename = "NONE")]
    NoRole,
    Recursion,
    Stub,
}

impl ServerRole {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Forwarder => "FORWARDER",
            Self::Primary => "MASTER",
            Self::PrimaryHidden => "MASTER_HIDDEN",
            Self::Secondary => "SLAVE",
            Self::SecondaryStealth => "SLAVE_STEALTH",
            Self::NoRole => "NONE",
            Self::Recursion => "RECURSION",
            Self::Stub => "STUB",
        }
    }

    pub fn from_wire(wire: &str) -> Option<Self> {
        let role = match wire.trim().to_ascii_uppercase().as_str() {
            "FORWARDER" => Self::Forwarder,
            "MASTER" => Self::Primary,
            "MASTER_HIDDEN" => Self::PrimaryHidden,
            "SLAVE" => Self::Secondary,
            "SLAVE_STEALTH" => Self::SecondaryStealth,
            "NONE" => Self::NoRole,
            "RECURSION" => Self::Recursion,
            "STUB" => Self::Stub,
            _ => return None,
        };
        Some(role)
    }

    /// Roles the appliance must never transiently lose.
    pub fn is_primary(self) -> bool {
        matches!(self, Self::Primary | Self::PrimaryHidden)
    }
}

/// One `(role, server FQDN)` pair of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: ServerRole,
    pub server_fqdn: String,
}

impl FromStr for RoleAssignment {
    type Err = Error;

    /// Parse the caller form `"ROLE, server.fqdn"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (role, fqdn) = raw.split_once(',').ok_or_else(|| {
            Error::validation("server_roles", format!("'{raw}' is not in 'ROLE, server_fqdn' form"))
        })?;
        let fqdn = fqdn.trim();
        if fqdn.is_empty() || fqdn.contains(',') {
            return Err(Error::validation(
                "server_roles",
                format!("'{raw}' is not in 'ROLE, server_fqdn' form"),
            ));
        }
        let role = role
            .trim()
            .parse::<ServerRole>()
            .map_err(|_| Error::validation("server_roles", format!("unknown role '{}'", role.trim())))?;
        Ok(Self {
            role,
            server_fqdn: fqdn.to_owned(),
        })
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.role, self.server_fqdn)
    }
}

// ── Zone ────────────────────────────────────────────────────────────

/// DNS zone, identified by its absolute name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    pub deployable: bool,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    /// Desired roles; reconciled through deployment-role calls.
    #[serde(skip)]
    pub server_roles: Vec<RoleAssignment>,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl Zone {
    pub fn new(configuration: &str, view: &str, absolute_name: &str, deployable: bool) -> Self {
        Self {
            name: path::leftmost_label(absolute_name).to_owned(),
            absolute_name: absolute_name.to_owned(),
            deployable,
            configuration: configuration.to_owned(),
            view: view.to_owned(),
            locator: Locator::collection(path::view_scope(configuration, view), "zones"),
            ..Self::default()
        }
    }

    pub fn existing(configuration: &str, view: &str, absolute_name: &str) -> Self {
        Self {
            absolute_name: absolute_name.to_owned(),
            configuration: configuration.to_owned(),
            view: view.to_owned(),
            locator: Locator::identity(path::zone_scope(configuration, view, absolute_name)),
            ..Self::default()
        }
    }

    pub fn fqdn(&self) -> String {
        if self.absolute_name.is_empty() {
            properties::get("absoluteName", &self.properties)
        } else {
            self.absolute_name.clone()
        }
    }
}

impl Identified for Zone {
    fn identifier(&self) -> String {
        self.fqdn()
    }
}

// ── Resource records ────────────────────────────────────────────────

macro_rules! record_common {
    ($ty:ident, $collection:literal) => {
        impl $ty {
            pub const COLLECTION: &'static str = $collection;

            /// Absolute name from the typed field or the `absoluteName` property.
            pub fn fqdn(&self) -> String {
                if self.absolute_name.is_empty() {
                    properties::get("absoluteName", &self.properties)
                } else {
                    self.absolute_name.clone()
                }
            }

            /// TTL from the `ttl` property, falling back to the typed field.
            /// Unparseable values yield the inherit sentinel.
            pub fn effective_ttl(&self) -> i64 {
                let raw = properties::get("ttl", &self.properties);
                if raw.is_empty() {
                    self.ttl
                } else {
                    raw.parse().unwrap_or(INHERIT_TTL)
                }
            }

            fn scoped(cfg: &str, view: &str, zone: &str, absolute_name: &str, identity: bool) -> Self {
                let scope = RecordScope::new(cfg, view, zone, absolute_name);
                let locator = if identity {
                    scope.identity(Self::COLLECTION, absolute_name)
                } else {
                    scope.create(Self::COLLECTION)
                };
                Self {
                    absolute_name: absolute_name.to_owned(),
                    ttl: INHERIT_TTL,
                    configuration: cfg.to_owned(),
                    view: view.to_owned(),
                    zone: scope.zone,
                    locator,
                    ..Self::default()
                }
            }

            /// Creation shape; the zone is derived from the name when empty.
            pub fn new(cfg: &str, view: &str, zone: &str, absolute_name: &str) -> Self {
                Self::scoped(cfg, view, zone, absolute_name, false)
            }

            pub fn existing(cfg: &str, view: &str, zone: &str, absolute_name: &str) -> Self {
                Self::scoped(cfg, view, zone, absolute_name, true)
            }

            /// Same payload, addressed at the record itself.
            pub fn at_identity(&self) -> Self {
                let fqdn = self.fqdn();
                let scope = RecordScope::new(&self.configuration, &self.view, &self.zone, &fqdn);
                Self {
                    absolute_name: fqdn.clone(),
                    zone: scope.zone.clone(),
                    locator: scope.identity(Self::COLLECTION, &fqdn),
                    ..self.clone()
                }
            }
        }

        impl Identified for $ty {
            fn identifier(&self) -> String {
                self.fqdn()
            }
        }
    };
}

/// Host (A/AAAA) record. A PTR is this record with `reverseRecord=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    /// Comma-joined address list.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addresses: String,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(HostRecord, "host_records");

impl HostRecord {
    pub fn address_list(&self) -> Vec<String> {
        let raw = if self.addresses.is_empty() {
            properties::get("addresses", &self.properties)
        } else {
            self.addresses.clone()
        };
        raw.split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn reverse_record(&self) -> bool {
        properties::get(properties::REVERSE_RECORD, &self.properties) == "true"
    }
}

/// CNAME record pointing at `linked_record`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CnameRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub linked_record: String,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(CnameRecord, "cname_records");

/// TXT record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(TxtRecord, "text_records");

/// SRV record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SrvRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub linked_record: String,
    pub priority: u16,
    pub port: u16,
    pub weight: u16,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(SrvRecord, "srv_records");

/// Generic record of an arbitrary `record_type` with raw `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub record_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(GenericRecord, "generic_records");

/// Host outside any managed zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalHostRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub absolute_name: String,
    /// Comma-joined address list.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addresses: String,
    #[serde(default = "inherit_ttl")]
    pub ttl: i64,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

record_common!(ExternalHostRecord, "external_host_records");

// ── Deployment roles & servers ──────────────────────────────────────

const DNS_ROLE_TYPE: &str = "DNS";
const DEPLOYMENT_ROLES: &str = "deployment_roles";

/// Association of a DNS server to a zone (or view) with a wire role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentRole {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_fqdn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role_type: String,
    /// Wire spelling (`MASTER`, `SLAVE`, ...).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secondary_fqdn: String,
    pub properties: String,
    #[serde(skip)]
    pub configuration: String,
    #[serde(skip)]
    pub view: String,
    #[serde(skip)]
    pub zone: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl DeploymentRole {
    fn scoped(cfg: &str, view: &str, zone: &str, locator: Locator) -> Self {
        Self {
            role_type: DNS_ROLE_TYPE.to_owned(),
            configuration: cfg.to_owned(),
            view: view.to_owned(),
            zone: zone.to_owned(),
            locator,
            ..Self::default()
        }
    }

    pub fn new(cfg: &str, view: &str, zone: &str, server_fqdn: &str, role: ServerRole) -> Self {
        let locator = Locator::collection(path::zone_scope(cfg, view, zone), DEPLOYMENT_ROLES);
        Self {
            server_fqdn: server_fqdn.to_owned(),
            role: role.wire_name().to_owned(),
            ..Self::scoped(cfg, view, zone, locator)
        }
    }

    pub fn existing(cfg: &str, view: &str, zone: &str, server_fqdn: &str) -> Self {
        let locator = Locator::identity(format!(
            "{}/{DEPLOYMENT_ROLES}/{server_fqdn}",
            path::zone_scope(cfg, view, zone)
        ));
        Self {
            server_fqdn: server_fqdn.to_owned(),
            ..Self::scoped(cfg, view, zone, locator)
        }
    }

    /// Collection address used to list every role of a zone.
    pub fn listing(cfg: &str, view: &str, zone: &str) -> Self {
        let locator = Locator::identity(format!(
            "{}/{DEPLOYMENT_ROLES}",
            path::zone_scope(cfg, view, zone)
        ));
        Self::scoped(cfg, view, zone, locator)
    }

    /// Caller-facing role, mapped back from the wire spelling.
    pub fn server_role(&self) -> Result<ServerRole, Error> {
        let wire = if self.role.is_empty() {
            properties::get("role", &self.properties)
        } else {
            self.role.clone()
        };
        ServerRole::from_wire(&wire)
            .ok_or_else(|| Error::validation("role", format!("unknown wire role '{wire}'")))
    }

    pub fn fqdn(&self) -> String {
        if self.server_fqdn.is_empty() {
            properties::get("serverFqdn", &self.properties)
        } else {
            self.server_fqdn.clone()
        }
    }
}

/// DNS server known to the configuration. Read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    #[serde(skip_serializing_if = "is_zero")]
    pub id: i64,
    pub name: String,
    pub properties: String,
    #[serde(skip)]
    pub(super) locator: Locator,
}

impl Server {
    pub fn existing(configuration: &str, fqdn: &str) -> Self {
        Self {
            name: fqdn.to_owned(),
            locator: Locator::identity(path::server_path(configuration, fqdn)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn role_bijection_round_trips() {
        let all = [
            ServerRole::Forwarder,
            ServerRole::Primary,
            ServerRole::PrimaryHidden,
            ServerRole::Secondary,
            ServerRole::SecondaryStealth,
            ServerRole::NoRole,
            ServerRole::Recursion,
            ServerRole::Stub,
        ];
        for role in all {
            assert_eq!(ServerRole::from_wire(role.wire_name()), Some(role));
        }
        assert_eq!(ServerRole::Primary.wire_name(), "MASTER");
        assert_eq!(ServerRole::SecondaryStealth.wire_name(), "SLAVE_STEALTH");
        assert_eq!("none".parse::<ServerRole>().unwrap(), ServerRole::NoRole);
        assert_eq!(ServerRole::NoRole.to_string(), "NONE");
        assert!(ServerRole::from_wire("PRIMARY").is_none());
    }

    #[test]
    fn role_assignment_parsing() {
        let a: RoleAssignment = "PRIMARY, ns1.example.com".parse().unwrap();
        assert_eq!(a.role, ServerRole::Primary);
        assert_eq!(a.server_fqdn, "ns1.example.com");
        assert!("PRIMARY".parse::<RoleAssignment>().is_err());
        assert!("BOSS, ns1.example.com".parse::<RoleAssignment>().is_err());
        assert!("PRIMARY, ".parse::<RoleAssignment>().is_err());
    }

    #[test]
    fn record_paths() {
        let create = HostRecord::new("cfg", "internal", "example.com", "host.example.com");
        assert_eq!(create.object_type(), "host_records");
        assert_eq!(create.sub_path(), "/configurations/cfg/views/internal/zones/example.com");

        let existing = CnameRecord::existing("cfg", "internal", "", "www.example.com");
        assert_eq!(existing.object_type(), "");
        assert_eq!(
            existing.sub_path(),
            "/configurations/cfg/views/internal/zones/example.com/cname_records/www.example.com"
        );
        assert_eq!(existing.zone, "example.com");
    }

    #[test]
    fn at_identity_keeps_payload() {
        let mut txt = TxtRecord::new("cfg", "internal", "", "note.example.com");
        txt.text = "hello".into();
        let target = txt.at_identity();
        assert_eq!(target.text, "hello");
        assert_eq!(target.object_type(), "");
        assert_eq!(
            target.sub_path(),
            "/configurations/cfg/views/internal/zones/example.com/text_records/note.example.com"
        );
    }

    #[test]
    fn record_body_omits_transport_fields() {
        let mut host = HostRecord::new("cfg", "internal", "example.com", "a.example.com");
        host.addresses = "1.1.0.5".into();
        let body = serde_json::to_value(&host).unwrap();
        assert_eq!(
            body,
            json!({
                "absolute_name": "a.example.com",
                "addresses": "1.1.0.5",
                "ttl": -1,
                "properties": ""
            })
        );
    }

    #[test]
    fn host_reply_accessors() {
        let host: HostRecord = serde_json::from_value(json!({
            "id": 9,
            "name": "host",
            "type": "HostRecord",
            "properties": "absoluteName=host.example.com|addresses=1.1.0.5,1.1.0.6|ttl=abc|reverseRecord=true|"
        }))
        .unwrap();
        assert_eq!(host.fqdn(), "host.example.com");
        assert_eq!(host.address_list(), vec!["1.1.0.5", "1.1.0.6"]);
        assert_eq!(host.effective_ttl(), INHERIT_TTL);
        assert!(host.reverse_record());
    }

    #[test]
    fn deployment_role_shapes() {
        let role = DeploymentRole::new("cfg", "internal", "example.com", "ns1.example.com", ServerRole::Secondary);
        assert_eq!(role.object_type(), "deployment_roles");
        assert_eq!(role.role, "SLAVE");
        assert_eq!(role.server_role().unwrap(), ServerRole::Secondary);

        let listing = DeploymentRole::listing("cfg", "internal", "example.com");
        assert_eq!(
            listing.sub_path(),
            "/configurations/cfg/views/internal/zones/example.com/deployment_roles"
        );
    }
}
