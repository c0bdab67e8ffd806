//! Typed object manager and reconciliation workflows over `ipam-api`.
//!
//! - **[`ObjectManager`]**: One authenticated session plus typed
//!   create/get/update/delete for every managed object: configurations,
//!   views, zones and their deployment roles, blocks, networks, DHCP
//!   ranges, addresses, and DNS records. Reads restore the caller-side
//!   context (configuration, view, zone) the appliance omits.
//!
//! - **Workflows** ([`workflow`]): Multi-step operations that either
//!   complete or undo what they applied: IP allocation with host-record
//!   publication, PTR toggling, and zone server-role reconciliation. Every
//!   step honours a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! - **[`CoreError`]**: Workflow-facing error taxonomy; multi-step
//!   failures carry a [`RollbackOutcome`].

pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::{CoreError, RollbackOutcome};
pub use manager::ObjectManager;
pub use model::MacAddress;
pub use workflow::{
    AllocatedResource, IpAllocation, Observed, PropertyBag, RoleEffect, RoleStep, Snapshot,
    observe, plan_role_changes,
};

// Entity types callers build requests from.
pub use ipam_api::entity::{
    Action, Block, Cidr, CnameRecord, Configuration, DeploymentRole, DhcpRange,
    ExternalHostRecord, GenericRecord, HostRecord, IpAddress, IpVersion, Network, NetworkSpec,
    RoleAssignment, Server, ServerRole, SrvRecord, State, TxtRecord, View, Zone,
};
pub use ipam_api::entity::path::{absolute_name, zone_of};
pub use ipam_api::{Credentials, HostConfig, Scheme};
