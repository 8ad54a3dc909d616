//! File-transfer listing.

use tabled::Tabled;

use f5os_api::{F5osClient, TransferOperation};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TransferRow {
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Local file")]
    local: String,
    #[tabled(rename = "Remote")]
    remote: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&TransferOperation> for TransferRow {
    fn from(op: &TransferOperation) -> Self {
        let remote = match (op.remote_host.as_deref(), op.remote_file_path.as_deref()) {
            (Some(host), Some(path)) => format!("{host}:{path}"),
            (Some(host), None) => host.to_owned(),
            (None, path) => path.unwrap_or_default().to_owned(),
        };
        Self {
            operation: op.operation.clone().unwrap_or_default(),
            local: op.local_file_path.clone().unwrap_or_default(),
            remote,
            status: op.status.clone().unwrap_or_default(),
            id: op.operation_id.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(client: &F5osClient, global: &GlobalOpts) -> Result<(), CliError> {
    let ops = client.list_transfers().await?;
    let out = output::render_list(
        &global.output,
        &ops,
        |op| TransferRow::from(op),
        |op| {
            op.operation_id
                .clone()
                .or_else(|| op.local_file_path.clone())
                .unwrap_or_default()
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
