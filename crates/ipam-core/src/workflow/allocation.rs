// IP allocation
//
// Allocate (or adopt) an address inside a network, optionally set its MAC,
// and publish a host record for it when a zone is in play. Release and
// in-place update of an allocation live here too.

use ipam_api::entity::path;
use ipam_api::entity::{Action, HostRecord, INHERIT_TTL, IpAddress};
use ipam_api::properties::{self, PARENT_KEYS};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::step;
use crate::error::{CoreError, RollbackOutcome};
use crate::manager::ObjectManager;
use crate::model::MacAddress;

/// Properties the appliance owns on an address; never written back.
const IMMUTABLE_IP_KEYS: [&str; 3] = ["address", "state", "macAddress"];

/// Caller input for an allocation.
#[derive(Debug, Clone, Default)]
pub struct IpAllocation {
    pub configuration: String,
    pub view: String,
    /// May be empty; then derived from `name` when it is qualified.
    pub zone: String,
    pub name: String,
    /// Network CIDR the address lives in.
    pub network: String,
    /// Explicit address; the next free one is allocated when `None`.
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub properties: String,
    /// Defaults to `MAKE_STATIC` on allocation; inherited from the current
    /// state on update.
    pub action: Option<Action>,
    pub template: String,
}

impl IpAllocation {
    /// FQDN and zone used for the host record.
    ///
    /// With a zone, the name is qualified with it; without one, the zone
    /// is whatever follows the first label of the name.
    pub fn fqdn_and_zone(&self) -> (String, String) {
        if self.zone.is_empty() {
            let zone = path::zone_of(&self.name).to_owned();
            (self.name.clone(), zone)
        } else {
            (path::absolute_name(&self.name, &self.zone), self.zone.clone())
        }
    }

    fn mac(&self) -> Result<Option<MacAddress>, CoreError> {
        self.mac_address
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(MacAddress::new)
            .transpose()
    }

    fn explicit_ip(&self) -> Option<&str> {
        self.ip_address.as_deref().filter(|ip| !ip.is_empty())
    }
}

/// Reservations are named after the leftmost label of the FQDN.
fn ip_name(action: Action, fqdn: &str, name: &str) -> String {
    if action == Action::MakeReserved {
        path::leftmost_label(fqdn).to_owned()
    } else {
        name.to_owned()
    }
}

/// Canonical state of an allocation after a workflow ran.
#[derive(Debug, Clone, Serialize)]
pub struct AllocatedResource {
    /// FQDN when a host record was published, the address otherwise.
    pub identifier: String,
    pub fqdn: String,
    pub zone: String,
    pub address: IpAddress,
    pub host_record: Option<HostRecord>,
}

impl ObjectManager {
    /// Allocate an address and publish it.
    ///
    /// An explicit address that already exists is adopted and updated in
    /// place instead. Once the address has been claimed, a failing later
    /// step releases it again and the error reports that rollback.
    pub async fn allocate_ip_resource(
        &self,
        req: &IpAllocation,
        cancel: &CancellationToken,
    ) -> Result<AllocatedResource, CoreError> {
        let (fqdn, zone) = req.fqdn_and_zone();
        let mac = req.mac()?;

        if let Some(ip) = req.explicit_ip() {
            match step(cancel, "look up IP address", self.get_ip_address(&req.configuration, ip)).await {
                Ok(_) => {
                    info!(address = ip, "address already allocated, updating in place");
                    return self.update_allocated_resource(req, cancel).await;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        let action = req.action.unwrap_or_default();
        let mut props = req.properties.clone();
        if action == Action::MakeStatic {
            props = format!("{props}|excludeDHCPRange=true");
        }
        let mut claim = IpAddress::default();
        claim.name = ip_name(action, &fqdn, &req.name);
        claim.address = req.explicit_ip().unwrap_or_default().to_owned();
        claim.action = Some(action);
        claim.template.clone_from(&req.template);
        claim.properties = props;
        let address = step(
            cancel,
            "allocate IP address",
            self.allocate_ip(&req.configuration, &req.network, &claim),
        )
        .await?;

        if let Err(source) = self
            .publish_allocation(req, (&fqdn, &zone), &address, action, mac.as_ref(), cancel)
            .await
        {
            let rollback = self.release_claimed(&req.configuration, &address).await;
            return Err(CoreError::Workflow {
                operation: format!("allocate {address} in {}", req.network),
                source: Box::new(source),
                rollback,
            });
        }

        step(
            cancel,
            "read IP allocation",
            self.get_ip_allocation(&req.configuration, &req.view, (&fqdn, &zone), &address),
        )
        .await
    }

    /// Steps after the claim: MAC, then host record.
    async fn publish_allocation(
        &self,
        req: &IpAllocation,
        (fqdn, zone): (&str, &str),
        address: &str,
        action: Action,
        mac: Option<&MacAddress>,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        if let Some(mac) = mac {
            step(
                cancel,
                "set MAC address",
                self.set_mac_address(&req.configuration, address, mac, action),
            )
            .await?;
        }
        if !zone.is_empty() && action != Action::MakeReserved {
            let mut host = HostRecord::new(&req.configuration, &req.view, zone, fqdn);
            host.addresses = address.to_owned();
            host.ttl = INHERIT_TTL;
            step(cancel, "create host record", self.create_host_record(&host)).await?;
        }
        Ok(())
    }

    /// Undo a claim. Runs even after cancellation.
    async fn release_claimed(&self, cfg: &str, address: &str) -> RollbackOutcome {
        match self.delete_ip_address(cfg, address).await {
            Ok(()) => {
                warn!(address, "released address after failed allocation");
                RollbackOutcome::Applied
            }
            Err(e) => RollbackOutcome::Failed(Box::new(e)),
        }
    }

    /// Read the address and, when a zone is given, its host record.
    pub async fn get_ip_allocation(
        &self,
        cfg: &str,
        view: &str,
        (fqdn, zone): (&str, &str),
        address: &str,
    ) -> Result<AllocatedResource, CoreError> {
        let ip = self.get_ip_address(cfg, address).await?;
        let host_record = if zone.is_empty() {
            None
        } else {
            match self.get_host_record(cfg, view, zone, fqdn).await {
                Ok(record) => Some(record),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            }
        };
        let identifier = if host_record.is_some() {
            fqdn.to_owned()
        } else {
            ip.current_address()
        };
        Ok(AllocatedResource {
            identifier,
            fqdn: fqdn.to_owned(),
            zone: zone.to_owned(),
            address: ip,
            host_record,
        })
    }

    /// Re-point an existing allocation at the caller's desired state.
    ///
    /// With a zone, the host record keeps its TTL and gains the address;
    /// the address itself is left without properties. Without a zone, the
    /// appliance-owned keys are stripped before writing.
    pub async fn update_allocated_resource(
        &self,
        req: &IpAllocation,
        cancel: &CancellationToken,
    ) -> Result<AllocatedResource, CoreError> {
        let (fqdn, zone) = req.fqdn_and_zone();
        let address = req
            .explicit_ip()
            .ok_or_else(|| CoreError::validation("ip_address", "required to update an allocation"))?
            .to_owned();
        let mac = req.mac()?;
        let cfg = req.configuration.as_str();

        let current = step(cancel, "read IP address", self.get_ip_address(cfg, &address)).await?;
        let action = req
            .action
            .or_else(|| current.state().map(Action::from))
            .unwrap_or_default();

        if !zone.is_empty() && action != Action::MakeReserved {
            self.merge_host_address(req, (&fqdn, &zone), &address, cancel)
                .await?;
        }

        let props = if zone.is_empty() {
            let mut merged = current.properties.clone();
            for (key, value) in properties::parse(&req.properties) {
                merged = properties::set(&key, &value, &merged);
            }
            let mut immutable: Vec<&str> = IMMUTABLE_IP_KEYS.to_vec();
            immutable.extend(PARENT_KEYS);
            properties::remove_immutable(&merged, &immutable)
        } else {
            String::new()
        };
        let mut change = IpAddress::default();
        change.name = ip_name(action, &fqdn, &req.name);
        change.mac_address = mac.map_or_else(|| current.current_mac(), |m| m.to_string());
        change.action = Some(action);
        change.template.clone_from(&req.template);
        change.properties = props;
        step(cancel, "update IP address", self.update_ip_address(cfg, &address, &change)).await?;

        step(
            cancel,
            "read IP allocation",
            self.get_ip_allocation(cfg, &req.view, (&fqdn, &zone), &address),
        )
        .await
    }

    /// Append `address` to the host record, creating the record if it is
    /// missing.
    async fn merge_host_address(
        &self,
        req: &IpAllocation,
        (fqdn, zone): (&str, &str),
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let cfg = req.configuration.as_str();
        let existing = step(
            cancel,
            "read host record",
            self.get_host_record(cfg, &req.view, zone, fqdn),
        )
        .await;
        match existing {
            Ok(mut host) => {
                let mut addresses = host.address_list();
                if !addresses.iter().any(|a| a == address) {
                    addresses.push(address.to_owned());
                }
                host.ttl = host.effective_ttl();
                host.addresses = addresses.join(",");
                // Keep the property copy in step with the field.
                if !properties::get("addresses", &host.properties).is_empty() {
                    host.properties =
                        properties::set("addresses", &host.addresses, &host.properties);
                }
                step(cancel, "update host record", self.update_host_record(&host)).await?;
            }
            Err(e) if e.is_not_found() => {
                let mut host = HostRecord::new(cfg, &req.view, zone, fqdn);
                host.addresses = address.to_owned();
                host.ttl = INHERIT_TTL;
                step(cancel, "create host record", self.create_host_record(&host)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Tear down an allocation: the host record when a zone is in play,
    /// the address otherwise. Already-missing objects are logged and
    /// skipped.
    pub async fn release_ip_resource(
        &self,
        req: &IpAllocation,
        address: &str,
    ) -> Result<(), CoreError> {
        let (fqdn, zone) = req.fqdn_and_zone();
        let result = if zone.is_empty() {
            self.delete_ip_address(&req.configuration, address).await
        } else {
            self.delete_host_record(&req.configuration, &req.view, &zone, &fqdn)
                .await
        };
        match result {
            Err(e) if e.is_not_found() => {
                warn!(error = %e, "nothing to release");
                Ok(())
            }
            other => other,
        }
    }
}
