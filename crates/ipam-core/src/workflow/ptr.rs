// PTR toggling
//
// A PTR is not its own object: it is the `reverseRecord` flag of the host
// record with the same FQDN. Setting or clearing it is a host-record
// update; clearing never deletes the host record.

use ipam_api::entity::HostRecord;
use ipam_api::properties::{self, PARENT_KEYS, REVERSE_RECORD};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::step;
use crate::error::CoreError;
use crate::manager::ObjectManager;

/// Host properties with `reverseRecord` replaced by `flag` and the parent
/// pointers dropped.
fn with_reverse_flag(props: &str, flag: &str) -> String {
    let without = properties::remove(REVERSE_RECORD, props);
    let appended = format!("{without}{REVERSE_RECORD}={flag}|");
    properties::remove_immutable(&appended, &PARENT_KEYS)
}

impl ObjectManager {
    /// Set the PTR flag of `fqdn`'s host record.
    ///
    /// `reverse_record` accepts `yes`/`true`/`1` and `no`/`false`/`0`/empty
    /// in any case. The host record must already exist. Returns the record
    /// as the appliance now holds it; no write happens when it already
    /// carries the flag.
    pub async fn set_ptr(
        &self,
        cfg: &str,
        view: &str,
        fqdn: &str,
        reverse_record: &str,
        cancel: &CancellationToken,
    ) -> Result<HostRecord, CoreError> {
        let flag = properties::normalize_flag(reverse_record)?;
        let zone = ipam_api::entity::path::zone_of(fqdn);

        let host = step(
            cancel,
            "read host record",
            self.get_host_record(cfg, view, zone, fqdn),
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                CoreError::validation(
                    "absolute_name",
                    format!("PTR for {fqdn} requires an existing host record"),
                )
            } else {
                e
            }
        })?;

        let desired = with_reverse_flag(&host.properties, flag);
        if properties::suppresses(&host.properties, &desired) {
            debug!(fqdn, flag, "PTR flag already in place");
            return Ok(host);
        }

        let mut change = host.clone();
        change.properties = desired;
        change.ttl = host.effective_ttl();
        step(cancel, "update host record", self.update_host_record(&change)).await?;
        info!(fqdn, flag, "PTR flag updated");

        step(
            cancel,
            "read host record",
            self.get_host_record(cfg, view, zone, fqdn),
        )
        .await
    }

    /// Turn the PTR off. The host record stays.
    pub async fn clear_ptr(
        &self,
        cfg: &str,
        view: &str,
        fqdn: &str,
        cancel: &CancellationToken,
    ) -> Result<HostRecord, CoreError> {
        self.set_ptr(cfg, view, fqdn, "false", cancel).await
    }
}
