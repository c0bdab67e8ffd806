//! Zone command handlers, including server-role reconciliation.

use ipam_core::{DeploymentRole, ObjectManager, RoleEffect, Zone};
use tabled::Tabled;

use crate::cli::{GlobalOpts, ZoneArgs, ZoneCommand, ZoneSpec};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Type")]
    role_type: String,
}

impl From<&DeploymentRole> for RoleRow {
    fn from(r: &DeploymentRole) -> Self {
        Self {
            server: r.fqdn(),
            role: r.role.clone(),
            role_type: r.role_type.clone(),
        }
    }
}

fn detail(z: &Zone) -> String {
    output::detail_lines(&[
        ("ID", z.id.to_string()),
        ("Zone", z.fqdn()),
        ("View", z.view.clone()),
        ("Deployable", z.deployable.to_string()),
        ("Properties", z.properties.clone()),
    ])
}

fn print_zone(z: &Zone, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, z, detail, Zone::fqdn)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn describe(effect: &RoleEffect) -> String {
    match effect {
        RoleEffect::Created { server, role } => format!("{server}: {role} added"),
        RoleEffect::Deleted { server, role } => format!("{server}: {role} removed"),
        RoleEffect::Updated { server, previous } => format!("{server}: role changed from {previous}"),
    }
}

async fn apply_roles(
    manager: &ObjectManager,
    (cfg, view): (&str, &str),
    spec: &ZoneSpec,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cancel = util::cancel_on_interrupt();
    let effects = manager
        .reconcile_server_roles(cfg, view, &spec.fqdn, &spec.server_roles, &cancel)
        .await?;
    for effect in &effects {
        output::status(&describe(effect), global.quiet);
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    manager: &ObjectManager,
    args: ZoneArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        ZoneCommand::Create(spec) => {
            let zone = manager
                .create_zone(cfg, view, &spec.fqdn, spec.deployable, &spec.properties)
                .await?;
            if !spec.server_roles.is_empty() {
                apply_roles(manager, (cfg, view), &spec, global).await?;
            }
            print_zone(&zone, global)
        }

        ZoneCommand::Get { fqdn } => print_zone(&manager.get_zone(cfg, view, &fqdn).await?, global),

        // Roles are only reconciled when given; no --server-role leaves them alone.
        ZoneCommand::Update(spec) => {
            let zone = manager
                .update_zone(cfg, view, &spec.fqdn, spec.deployable, &spec.properties)
                .await?;
            if !spec.server_roles.is_empty() {
                apply_roles(manager, (cfg, view), &spec, global).await?;
            }
            print_zone(&zone, global)
        }

        ZoneCommand::Delete { fqdn } => {
            if !util::confirm(&format!("Delete zone {fqdn} and all its records?"), global.yes)? {
                return Ok(());
            }
            manager.delete_zone(cfg, view, &fqdn).await?;
            output::status(&format!("zone {fqdn} deleted"), global.quiet);
            Ok(())
        }

        ZoneCommand::Deploy { fqdn, batch } => {
            let reply = manager.deploy_zone(cfg, view, &fqdn, batch).await?;
            output::status(&format!("zone {fqdn} deployment requested"), global.quiet);
            output::print_output(&reply, global.quiet);
            Ok(())
        }

        ZoneCommand::Roles { fqdn } => {
            let roles = manager.list_deployment_roles(cfg, view, &fqdn).await?;
            let out = output::render_list(&global.output, &roles, |r| RoleRow::from(r), |r| {
                format!("{}, {}", r.role, r.fqdn())
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
