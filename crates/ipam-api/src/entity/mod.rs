// Entity model
//
// Every managed object is a serde struct whose JSON form is the request
// body, plus a transport-only `Locator` (never serialized) carrying the
// REST object-type tag and sub-path. Each entity has two shapes:
//
// - creation: object type = collection name, sub-path = container
// - identity: empty object type, sub-path addresses the object itself

pub mod dns;
pub mod ipam;
pub mod path;

use serde::{Deserialize, Serialize};

pub use dns::{
    CnameRecord, DeploymentRole, ExternalHostRecord, GenericRecord, HostRecord, RoleAssignment,
    Server, ServerRole, SrvRecord, TxtRecord, View, Zone,
};
pub use ipam::{
    ALLOCATED_ID, Action, Block, Configuration, DhcpRange, IpAddress, Network, NetworkBinding,
    NetworkSpec, State,
};
pub use path::{Cidr, IpVersion};

/// REST coordinates of an entity. Never part of the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub object_type: String,
    pub sub_path: String,
}

impl Locator {
    /// Creation shape: POST `{container}/{collection}/`.
    pub fn collection(container: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            object_type: collection.into(),
            sub_path: container.into(),
        }
    }

    /// Identity shape: the sub-path addresses the object itself.
    pub fn identity(sub_path: impl Into<String>) -> Self {
        Self {
            object_type: String::new(),
            sub_path: sub_path.into(),
        }
    }
}

/// Anything the request builder can turn into an HTTP request.
pub trait Entity: Serialize {
    fn locator(&self) -> &Locator;

    fn object_type(&self) -> &str {
        &self.locator().object_type
    }

    fn sub_path(&self) -> &str {
        &self.locator().sub_path
    }
}

/// Canonical identifier string surfaced to callers.
///
/// `address/cidr` for blocks, `cidr` for networks, FQDN for records,
/// `start-end` for DHCP ranges.
pub trait Identified {
    fn identifier(&self) -> String;
}

macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Entity for $ty {
                fn locator(&self) -> &Locator {
                    &self.locator
                }
            }
        )+
    };
}

impl_entity!(
    Configuration,
    Block,
    Network,
    IpAddress,
    DhcpRange,
    View,
    Zone,
    HostRecord,
    CnameRecord,
    TxtRecord,
    SrvRecord,
    GenericRecord,
    ExternalHostRecord,
    DeploymentRole,
    Server,
    DeployCommand,
);

/// Selective deployment of one object.
///
/// `POST {identity sub-path}/deploy/` with `{"batch_mode": bool}`. In batch
/// mode the appliance queues the change for the next scheduled deployment
/// instead of pushing it immediately.
#[derive(Debug, Clone, Serialize)]
pub struct DeployCommand {
    pub batch_mode: bool,
    #[serde(skip)]
    locator: Locator,
}

impl DeployCommand {
    pub fn for_entity(target: &impl Entity, batch_mode: bool) -> Self {
        Self {
            batch_mode,
            locator: Locator::collection(target.sub_path(), "deploy"),
        }
    }
}

/// Generic reply shape: `{id, name, type, properties}`.
///
/// Every object the appliance returns fits this envelope; typed entities
/// decode from it with their own fields defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiObject {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub properties: String,
}

pub(crate) fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Appliance sentinel for "inherit the TTL from the zone".
pub const INHERIT_TTL: i64 = -1;

pub(crate) fn inherit_ttl() -> i64 {
    INHERIT_TTL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_command_targets_identity_path() {
        let zone = Zone::existing("cfg", "internal", "example.com");
        let cmd = DeployCommand::for_entity(&zone, true);
        assert_eq!(cmd.object_type(), "deploy");
        assert_eq!(cmd.sub_path(), "/configurations/cfg/views/internal/zones/example.com");
        assert_eq!(
            serde_json::to_value(&cmd).ok(),
            Some(serde_json::json!({"batch_mode": true}))
        );
    }
}
