//! Configuration and view command handlers.

use ipam_core::{Configuration, ObjectManager, View};

use crate::cli::{ConfigurationArgs, ConfigurationCommand, GlobalOpts, ViewArgs, ViewCommand};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

fn configuration_detail(c: &Configuration) -> String {
    output::detail_lines(&[
        ("ID", c.id.to_string()),
        ("Name", c.name.clone()),
        ("Properties", c.properties.clone()),
    ])
}

fn view_detail(v: &View) -> String {
    output::detail_lines(&[
        ("ID", v.id.to_string()),
        ("Name", v.name.clone()),
        ("Configuration", v.configuration.clone()),
        ("Properties", v.properties.clone()),
    ])
}

fn print_configuration(c: &Configuration, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, c, configuration_detail, |c| c.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_view(v: &View, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, v, view_detail, |v| v.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    manager: &ObjectManager,
    args: ConfigurationArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConfigurationCommand::Create { name, properties } => {
            let created = manager.create_configuration(&name, &properties).await?;
            print_configuration(&created, global)
        }

        ConfigurationCommand::Get { name } => {
            print_configuration(&manager.get_configuration(&name).await?, global)
        }

        ConfigurationCommand::Update { name, properties } => {
            let updated = manager.update_configuration(&name, &properties).await?;
            print_configuration(&updated, global)
        }

        ConfigurationCommand::Delete { name } => {
            if !util::confirm(&format!("Delete configuration {name}?"), global.yes)? {
                return Ok(());
            }
            manager.delete_configuration(&name).await?;
            output::status(&format!("configuration {name} deleted"), global.quiet);
            Ok(())
        }
    }
}

pub async fn handle_view(
    manager: &ObjectManager,
    args: ViewArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = scope.configuration()?;
    match args.command {
        ViewCommand::Create { name, properties } => {
            print_view(&manager.create_view(cfg, &name, &properties).await?, global)
        }

        ViewCommand::Get { name } => print_view(&manager.get_view(cfg, &name).await?, global),

        ViewCommand::Update { name } => print_view(&manager.update_view(cfg, &name)?, global),

        ViewCommand::Delete { name } => {
            if !util::confirm(&format!("Delete view {name}?"), global.yes)? {
                return Ok(());
            }
            manager.delete_view(cfg, &name).await?;
            output::status(&format!("view {name} deleted"), global.quiet);
            Ok(())
        }
    }
}
