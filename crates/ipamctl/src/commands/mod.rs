//! Command dispatch: bridges CLI args -> object manager -> output formatting.

pub mod addresses;
pub mod blocks;
pub mod config_cmd;
pub mod configurations;
pub mod networks;
pub mod records;
pub mod util;
pub mod zones;

use ipam_core::ObjectManager;

use crate::cli::{Command, GlobalOpts};
use crate::config::Scope;
use crate::error::CliError;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    manager: &ObjectManager,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Configuration(args) => configurations::handle(manager, args, global).await,
        Command::View(args) => configurations::handle_view(manager, args, scope, global).await,
        Command::Zone(args) => zones::handle(manager, args, scope, global).await,
        Command::Block(args) => blocks::handle(manager, args, scope, global).await,
        Command::Network(args) => networks::handle(manager, args, scope, global).await,
        Command::Range(args) => networks::handle_range(manager, args, scope, global).await,
        Command::Ip(args) => addresses::handle(manager, args, scope, global).await,
        Command::Host(args) => records::handle_host(manager, args, scope, global).await,
        Command::Cname(args) => records::handle_cname(manager, args, scope, global).await,
        Command::Txt(args) => records::handle_txt(manager, args, scope, global).await,
        Command::Srv(args) => records::handle_srv(manager, args, scope, global).await,
        Command::Generic(args) => records::handle_generic(manager, args, scope, global).await,
        Command::ExternalHost(args) => {
            records::handle_external_host(manager, args, scope, global).await
        }
        Command::Ptr(args) => records::handle_ptr(manager, args, scope, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
