// Configuration backup endpoints
//
// A backup is written to `configs/<name>` on the device, then optionally
// shipped off-box with a file-transfer export.

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::F5osClient;
use crate::error::Error;
use crate::poll::PollConfig;
use crate::resources::file_transfer::RemoteFile;

const CONFIG_BACKUP_PATH: &str = "/openconfig-system:system/f5-database:database/f5-database:config-backup";

/// Local directory config backups are written to.
pub const BACKUP_DIR: &str = "configs";

pub fn backup_path(name: &str) -> String {
    format!("{BACKUP_DIR}/{name}")
}

impl F5osClient {
    /// Write the running configuration to `configs/<name>`.
    ///
    /// `POST .../f5-database:config-backup`
    pub async fn create_backup(&self, name: &str) -> Result<(), Error> {
        info!(name, "creating config backup");
        let body = json!({ "f5-database:name": name });
        self.post_json(CONFIG_BACKUP_PATH, &body).await?;
        Ok(())
    }

    /// Export a backup to a remote server and wait for the transfer.
    pub async fn export_backup(
        &self,
        name: &str,
        remote: &RemoteFile,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let key = self.export_file(&backup_path(name), remote).await?;
        self.wait_transfer(&key, config, cancel).await
    }

    /// Remove a backup file from the device.
    pub async fn delete_backup(&self, name: &str) -> Result<(), Error> {
        info!(name, "deleting config backup");
        self.delete_file(&backup_path(name)).await
    }
}
