//! Configuration backup command handlers.

use f5os_api::resources::backup::backup_path;
use f5os_api::{F5osClient, PollConfig};

use crate::cli::{BackupArgs, BackupCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(client: &F5osClient, args: BackupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BackupCommand::Create { name } => {
            client.create_backup(&name).await?;
            output::status(&format!("Backup written to {}", backup_path(&name)), global.quiet);
            Ok(())
        }

        BackupCommand::Export { name, remote, wait } => {
            let remote = util::remote_file(remote);
            let config = util::poll_config(&wait, PollConfig::TRANSFER_INTERVAL);
            output::status(
                &format!("Exporting {} to {}:{}...", backup_path(&name), remote.host, remote.path),
                global.quiet,
            );
            client
                .export_backup(&name, &remote, config, &client.child_token())
                .await?;
            output::status("Export completed", global.quiet);
            Ok(())
        }

        BackupCommand::Delete { name } => {
            client.delete_backup(&name).await?;
            output::status(&format!("Backup {name} deleted"), global.quiet);
            Ok(())
        }
    }
}
