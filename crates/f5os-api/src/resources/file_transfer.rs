// File transfer endpoints
//
// Imports and exports run in the background on the device. The RPCs
// return an `operation-id` on newer firmware; older firmware returns
// only a result string, in which case the operation is tracked by its
// local file path in the transfer-operations list.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::F5osClient;
use crate::error::Error;
use crate::poll::{PollConfig, PollStatus, classify_transfer};

const FILE_PATH: &str = "/f5-utils-file-transfer:file";

/// One row of the device's transfer-operations list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransferOperation {
    #[serde(default)]
    pub local_file_path: Option<String>,
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default)]
    pub remote_file_path: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub operation_id: Option<String>,
}

/// How a background transfer is found in the operations list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferKey {
    OperationId(String),
    LocalPath(String),
}

impl TransferKey {
    pub fn matches(&self, op: &TransferOperation) -> bool {
        match self {
            Self::OperationId(id) => op.operation_id.as_deref() == Some(id.as_str()),
            Self::LocalPath(path) => op
                .local_file_path
                .as_deref()
                .is_some_and(|p| p.trim_start_matches('/') == path.trim_start_matches('/')),
        }
    }
}

impl fmt::Display for TransferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationId(id) => write!(f, "operation {id}"),
            Self::LocalPath(path) => write!(f, "file {path}"),
        }
    }
}

/// Remote end of a transfer.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub host: String,
    pub path: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub port: Option<u16>,
    pub protocol: String,
    pub insecure: bool,
}

impl RemoteFile {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            username: None,
            password: None,
            port: None,
            protocol: "https".into(),
            insecure: false,
        }
    }

    /// File name component of the remote path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    fn fields(&self, prefix: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(format!("{prefix}remote-host"), json!(self.host));
        map.insert(format!("{prefix}remote-file"), json!(self.path));
        if let Some(ref user) = self.username {
            map.insert(format!("{prefix}username"), json!(user));
        }
        if let Some(ref pass) = self.password {
            map.insert(format!("{prefix}password"), json!(pass.expose_secret()));
        }
        if let Some(port) = self.port {
            map.insert(format!("{prefix}remote-port"), json!(port));
        }
        if self.insecure {
            map.insert(format!("{prefix}insecure"), json!(""));
        }
        map
    }
}

// ── Response shapes ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct TransferOperationsResponse {
    #[serde(rename = "f5-utils-file-transfer:transfer-operations", default)]
    operations: Option<TransferOperationList>,
}

#[derive(Deserialize)]
struct TransferOperationList {
    #[serde(rename = "transfer-operation", default)]
    operation: Vec<TransferOperation>,
}

#[derive(Deserialize)]
pub(crate) struct RpcOutput {
    #[serde(rename = "f5-utils-file-transfer:output", alias = "output", default)]
    pub(crate) output: Option<RpcResult>,
}

#[derive(Deserialize)]
pub(crate) struct RpcResult {
    #[serde(rename = "operation-id", default)]
    pub(crate) operation_id: Option<String>,
}

/// Pick the key to track a started transfer by.
pub(crate) fn transfer_key(output: Option<RpcOutput>, local_path: &str) -> TransferKey {
    output
        .and_then(|o| o.output)
        .and_then(|r| r.operation_id)
        .filter(|id| !id.is_empty())
        .map_or_else(
            || TransferKey::LocalPath(local_path.to_owned()),
            TransferKey::OperationId,
        )
}

/// Status of the operation matching `key`, if listed yet.
pub(crate) fn transfer_probe(ops: &[TransferOperation], key: &TransferKey) -> PollStatus<()> {
    match ops.iter().rev().find(|op| key.matches(op)) {
        Some(op) => classify_transfer(op.status.as_deref().unwrap_or_default()),
        None => PollStatus::Pending(format!("{key} not listed yet")),
    }
}

impl F5osClient {
    /// List background transfer operations.
    ///
    /// `GET /f5-utils-file-transfer:file/transfer-operations`
    pub async fn list_transfers(&self) -> Result<Vec<TransferOperation>, Error> {
        debug!("listing transfer operations");
        let resp: Option<TransferOperationsResponse> = self
            .get_json(&format!("{FILE_PATH}/transfer-operations"))
            .await?;
        Ok(resp
            .and_then(|r| r.operations)
            .map(|l| l.operation)
            .unwrap_or_default())
    }

    /// Status of one transfer, or `None` if the device does not list it.
    pub async fn transfer_status(&self, key: &TransferKey) -> Result<Option<TransferOperation>, Error> {
        let ops = self.list_transfers().await?;
        Ok(ops.into_iter().rev().find(|op| key.matches(op)))
    }

    /// Start importing a remote file into `local_dir` on the device.
    ///
    /// `POST /f5-utils-file-transfer:file/import`
    pub async fn import_file(&self, remote: &RemoteFile, local_dir: &str) -> Result<TransferKey, Error> {
        let local_path = format!("{}/{}", local_dir.trim_end_matches('/'), remote.file_name());
        info!(host = %remote.host, file = %remote.path, local = %local_path, "starting import");

        let mut input = remote.fields("");
        input.insert("local-file".into(), json!(local_dir));
        let body = json!({ "input": [input] });

        let output: Option<RpcOutput> = self
            .post_json(&format!("{FILE_PATH}/import"), &body)
            .await?
            .json()?;
        Ok(transfer_key(output, &local_path))
    }

    /// Start exporting a local file to a remote host.
    ///
    /// `POST /f5-utils-file-transfer:file/export`
    pub async fn export_file(&self, local_file: &str, remote: &RemoteFile) -> Result<TransferKey, Error> {
        info!(local = local_file, host = %remote.host, file = %remote.path, "starting export");
        let prefix = "f5-utils-file-transfer:";
        let mut body = remote.fields(prefix);
        body.insert(format!("{prefix}local-file"), json!(local_file));
        body.insert(format!("{prefix}protocol"), json!(remote.protocol));

        let output: Option<RpcOutput> = self
            .post_json(&format!("{FILE_PATH}/export"), &body)
            .await?
            .json()?;
        Ok(transfer_key(output, local_file))
    }

    /// Delete a file from the device's local file system.
    ///
    /// `POST /f5-utils-file-transfer:file/delete`
    pub async fn delete_file(&self, local_file: &str) -> Result<(), Error> {
        debug!(local_file, "deleting local file");
        let body = json!({ "f5-utils-file-transfer:file-name": local_file });
        self.post_json(&format!("{FILE_PATH}/delete"), &body).await?;
        Ok(())
    }

    /// Poll the transfer list until `key` completes or fails.
    pub async fn wait_transfer(
        &self,
        key: &TransferKey,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let operation = format!("transfer of {key}");
        self.poll_until(&operation, config, cancel, || async {
            let ops = self.list_transfers().await?;
            Ok(transfer_probe(&ops, key))
        })
        .await
    }
}
