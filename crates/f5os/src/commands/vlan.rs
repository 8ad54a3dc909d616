//! VLAN command handlers.

use tabled::Tabled;

use f5os_api::F5osClient;
use f5os_api::resources::vlans::Vlan;

use crate::cli::{GlobalOpts, VlanArgs, VlanCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VlanRow {
    #[tabled(rename = "VLAN")]
    id: u16,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&Vlan> for VlanRow {
    fn from(v: &Vlan) -> Self {
        Self {
            id: v.vlan_id,
            name: v.name.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(client: &F5osClient, args: VlanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        VlanCommand::Get { id: None } => {
            let vlans = client.list_vlans().await?;
            let out = output::render_list(&global.output, &vlans, |v| VlanRow::from(v), |v| {
                v.vlan_id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VlanCommand::Get { id: Some(id) } => {
            let vlan = client.get_vlan(id).await?.ok_or_else(|| CliError::NotFound {
                resource_type: "VLAN".into(),
                identifier: id.to_string(),
            })?;
            let out = output::render_single(
                &global.output,
                &vlan,
                |v| {
                    output::detail(&[
                        ("VLAN", v.vlan_id.to_string()),
                        ("Name", output::opt(v.name.as_deref())),
                    ])
                },
                |v| v.vlan_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VlanCommand::Set { id, name } => {
            client.upsert_vlan(id, name.as_deref()).await?;
            output::status(&format!("VLAN {id} configured"), global.quiet);
            Ok(())
        }

        VlanCommand::Delete { id } => {
            client.delete_vlan(id).await?;
            output::status(&format!("VLAN {id} deleted"), global.quiet);
            Ok(())
        }
    }
}
