//! IP allocation command handlers.

use ipam_core::{AllocatedResource, IpAddress, IpAllocation, ObjectManager};

use crate::cli::{AllocationSpec, GlobalOpts, IpArgs, IpCommand};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

fn address_detail(ip: &IpAddress) -> String {
    output::detail_lines(&[
        ("ID", ip.id.to_string()),
        ("Address", ip.current_address()),
        ("Name", ip.name.clone()),
        ("MAC", ip.current_mac()),
        ("State", ip.state().map(|s| s.to_string()).unwrap_or_default()),
        ("Properties", ip.properties.clone()),
    ])
}

fn allocation_detail(a: &AllocatedResource) -> String {
    let host = a.host_record.as_ref();
    output::detail_lines(&[
        ("Identifier", a.identifier.clone()),
        ("Address", a.address.current_address()),
        ("MAC", a.address.current_mac()),
        ("FQDN", host.map(|h| h.fqdn()).unwrap_or_default()),
        ("Zone", a.zone.clone()),
        (
            "TTL",
            host.map(|h| h.effective_ttl().to_string()).unwrap_or_default(),
        ),
    ])
}

fn print_allocation(a: &AllocatedResource, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, a, allocation_detail, |a| {
        a.identifier.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Workflow input from flags; a view is needed once a zone is in play.
fn allocation(spec: AllocationSpec, scope: &Scope) -> Result<IpAllocation, CliError> {
    let mut req = IpAllocation {
        configuration: scope.configuration()?.to_owned(),
        view: String::new(),
        zone: spec.zone,
        name: spec.name,
        network: spec.network,
        ip_address: spec.ip,
        mac_address: spec.mac,
        properties: spec.properties,
        action: util::parse_action(spec.action.as_deref())?,
        template: spec.template,
    };
    if !req.fqdn_and_zone().1.is_empty() {
        scope.view()?.clone_into(&mut req.view);
    }
    Ok(req)
}

pub async fn handle(
    manager: &ObjectManager,
    args: IpArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        IpCommand::Allocate(spec) => {
            let req = allocation(spec, scope)?;
            let cancel = util::cancel_on_interrupt();
            let allocated = manager.allocate_ip_resource(&req, &cancel).await?;
            print_allocation(&allocated, global)
        }

        IpCommand::Get { address } => {
            let ip = manager
                .get_ip_address(scope.configuration()?, &address)
                .await?;
            let out = output::render_single(&global.output, &ip, address_detail, |ip| {
                ip.current_address()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        IpCommand::Update(spec) => {
            let req = allocation(spec, scope)?;
            let cancel = util::cancel_on_interrupt();
            let updated = manager.update_allocated_resource(&req, &cancel).await?;
            print_allocation(&updated, global)
        }

        IpCommand::Release {
            address,
            name,
            zone,
        } => {
            let req = allocation(
                AllocationSpec {
                    name,
                    network: String::new(),
                    zone,
                    ip: Some(address.clone()),
                    mac: None,
                    action: None,
                    properties: String::new(),
                    template: String::new(),
                },
                scope,
            )?;
            if !util::confirm(&format!("Release {address}?"), global.yes)? {
                return Ok(());
            }
            manager.release_ip_resource(&req, &address).await?;
            output::status(&format!("{address} released"), global.quiet);
            Ok(())
        }
    }
}
