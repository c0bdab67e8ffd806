//! Network and DHCP range command handlers.

use std::path::Path;

use ipam_core::{CoreError, DhcpRange, Network, NetworkSpec, ObjectManager};
use tracing::warn;

use crate::cli::{GlobalOpts, NetworkArgs, NetworkCommand, RangeArgs, RangeCommand};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

fn network_detail(n: &Network) -> String {
    output::detail_lines(&[
        ("ID", n.id.to_string()),
        ("Network", n.cidr_notation()),
        ("Name", n.name.clone()),
        ("Gateway", n.gateway()),
        ("Allocated ID", n.allocated_id.clone()),
        ("Template", n.template.clone()),
        ("Block", n.parent_block.clone()),
        ("Properties", n.properties.clone()),
    ])
}

fn range_detail(r: &DhcpRange) -> String {
    let (start, end) = r.bounds();
    output::detail_lines(&[
        ("ID", r.id.to_string()),
        ("Network", r.network.clone()),
        ("Start", start),
        ("End", end),
        ("Template", r.template.clone()),
        ("Properties", r.properties.clone()),
    ])
}

fn print_network(n: &Network, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, n, network_detail, Network::cidr_notation)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_range(r: &DhcpRange, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, r, range_detail, |r| {
        let (start, end) = r.bounds();
        format!("{start}-{end}")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Network fields from a JSON object; unknown keys are reported and skipped.
fn spec_from_file(path: &Path, cfg: &str) -> Result<NetworkSpec, CliError> {
    let value = util::read_json_file(path)?;
    let fields = value.as_object().ok_or_else(|| CliError::Validation {
        field: "from-file".into(),
        reason: "expected a JSON object".into(),
    })?;
    let binding = NetworkSpec::bind(fields).map_err(CoreError::from)?;
    for key in &binding.unknown {
        warn!(key = %key, "ignoring unknown network field");
    }
    let mut spec = binding.spec;
    if spec.configuration.is_empty() {
        cfg.clone_into(&mut spec.configuration);
    }
    Ok(spec)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    manager: &ObjectManager,
    args: NetworkArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = scope.configuration()?;
    match args.command {
        NetworkCommand::Create {
            cidr,
            block,
            name,
            gateway,
            template,
            allocated_id,
            properties,
            from_file,
        } => {
            let spec = match from_file {
                Some(path) => spec_from_file(&path, cfg)?,
                None => NetworkSpec {
                    configuration: cfg.to_owned(),
                    parent_block: block.unwrap_or_default(),
                    cidr: cidr.unwrap_or_default(),
                    name,
                    gateway,
                    template,
                    allocated_id,
                    properties,
                    ..NetworkSpec::default()
                },
            };
            print_network(&manager.create_network(&spec).await?, global)
        }

        NetworkCommand::Next {
            block,
            size,
            name,
            gateway,
            allocated_id,
            properties,
        } => {
            let spec = NetworkSpec {
                configuration: cfg.to_owned(),
                parent_block: block,
                name,
                gateway,
                allocated_id,
                properties,
                size: Some(size),
                ..NetworkSpec::default()
            };
            print_network(&manager.create_next_network(&spec).await?, global)
        }

        NetworkCommand::Get {
            cidr,
            block,
            allocated_id,
        } => {
            let network = match (cidr, block, allocated_id) {
                (_, Some(block), Some(id)) => {
                    manager.get_network_by_allocated_id(cfg, &block, &id).await?
                }
                (Some(cidr), _, _) => manager.get_network(cfg, &cidr).await?,
                _ => {
                    return Err(CliError::Validation {
                        field: "network".into(),
                        reason: "give a CIDR or --block with --allocated-id".into(),
                    });
                }
            };
            print_network(&network, global)
        }

        NetworkCommand::Update {
            cidr,
            name,
            gateway,
            properties,
        } => print_network(
            &manager
                .update_network(cfg, &cidr, &name, &gateway, &properties)
                .await?,
            global,
        ),

        NetworkCommand::Delete { cidr } => {
            if !util::confirm(&format!("Delete network {cidr}?"), global.yes)? {
                return Ok(());
            }
            manager.delete_network(cfg, &cidr).await?;
            output::status(&format!("network {cidr} deleted"), global.quiet);
            Ok(())
        }
    }
}

pub async fn handle_range(
    manager: &ObjectManager,
    args: RangeArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = scope.configuration()?;
    match args.command {
        RangeCommand::Create {
            bounds,
            template,
            properties,
        } => {
            let range = manager
                .create_dhcp_range(
                    cfg,
                    &bounds.network,
                    (bounds.start.as_str(), bounds.end.as_str()),
                    &template,
                    &properties,
                )
                .await?;
            print_range(&range, global)
        }

        RangeCommand::Get { bounds } => {
            let range = manager
                .get_dhcp_range(cfg, &bounds.network, &bounds.start, &bounds.end)
                .await?;
            print_range(&range, global)
        }

        RangeCommand::Update {
            bounds,
            template,
            properties,
        } => {
            let range = manager
                .update_dhcp_range(
                    cfg,
                    &bounds.network,
                    (bounds.start.as_str(), bounds.end.as_str()),
                    &template,
                    &properties,
                )
                .await?;
            print_range(&range, global)
        }

        RangeCommand::Delete { bounds } => {
            let key = format!("{}-{}", bounds.start, bounds.end);
            if !util::confirm(&format!("Delete DHCP range {key}?"), global.yes)? {
                return Ok(());
            }
            manager
                .delete_dhcp_range(cfg, &bounds.network, &bounds.start, &bounds.end)
                .await?;
            output::status(&format!("DHCP range {key} deleted"), global.quiet);
            Ok(())
        }
    }
}
