//! Address block command handlers.

use ipam_core::{Block, ObjectManager};

use crate::cli::{BlockArgs, BlockCommand, GlobalOpts};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(b: &Block) -> String {
    output::detail_lines(&[
        ("ID", b.id.to_string()),
        ("Block", b.cidr_notation()),
        ("Name", b.name.clone()),
        ("Version", b.ip_version.to_string()),
        ("Parent", b.parent_block.clone()),
        ("Configuration", b.configuration.clone()),
        ("Properties", b.properties.clone()),
    ])
}

fn print_block(b: &Block, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, b, detail, Block::cidr_notation)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    manager: &ObjectManager,
    args: BlockArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cfg = scope.configuration()?;
    match args.command {
        BlockCommand::Create {
            cidr,
            parent,
            name,
            properties,
        } => {
            let block = manager
                .create_block(cfg, &cidr, parent.as_deref(), &name, &properties)
                .await?;
            print_block(&block, global)
        }

        BlockCommand::Get { cidr } => print_block(&manager.get_block(cfg, &cidr).await?, global),

        BlockCommand::Update {
            cidr,
            name,
            properties,
        } => print_block(
            &manager.update_block(cfg, &cidr, &name, &properties).await?,
            global,
        ),

        BlockCommand::Delete { cidr } => {
            if !util::confirm(&format!("Delete block {cidr}?"), global.yes)? {
                return Ok(());
            }
            manager.delete_block(cfg, &cidr).await?;
            output::status(&format!("block {cidr} deleted"), global.quiet);
            Ok(())
        }
    }
}
