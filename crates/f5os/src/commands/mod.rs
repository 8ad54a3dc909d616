//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod backup;
pub mod config_cmd;
pub mod image;
pub mod license;
pub mod platform;
pub mod tenant;
pub mod transfers;
pub mod util;
pub mod vlan;

use f5os_api::F5osClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, client: &F5osClient, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Platform => platform::handle(client, global),
        Command::Vlan(args) => vlan::handle(client, args, global).await,
        Command::Tenant(args) => tenant::handle(client, args, global).await,
        Command::Image(args) => image::handle(client, args, global).await,
        Command::Backup(args) => backup::handle(client, args, global).await,
        Command::Transfers => transfers::handle(client, global).await,
        Command::License(args) => license::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
