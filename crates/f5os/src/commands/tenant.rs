//! Tenant command handlers.

use f5os_api::{F5osClient, PollConfig, RunningState, Tenant, TenantSpec};

use crate::cli::{GlobalOpts, RunningStateArg, TenantArgs, TenantCommand, TenantDeployArgs};
use crate::error::CliError;
use crate::output;

use super::util;

impl From<RunningStateArg> for RunningState {
    fn from(arg: RunningStateArg) -> Self {
        match arg {
            RunningStateArg::Configured => Self::Configured,
            RunningStateArg::Provisioned => Self::Provisioned,
            RunningStateArg::Deployed => Self::Deployed,
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn detail(t: &Tenant) -> String {
    output::detail(&[
        ("Name", t.name.clone()),
        ("Image", output::opt(t.image.as_deref())),
        ("Nodes", join(&t.nodes)),
        ("Mgmt IP", output::opt(t.mgmt_ip.as_deref())),
        ("VLANs", join(&t.vlans)),
        ("vCPU/node", output::opt(t.vcpu_cores_per_node)),
        ("Memory", output::opt(t.memory)),
        ("Running state", output::opt(t.running_state.as_deref())),
        ("Status", output::opt(t.status.as_deref())),
        ("Diagnostics", output::opt(t.diagnostics.as_deref())),
    ])
}

fn tenant_spec(args: &TenantDeployArgs) -> TenantSpec {
    TenantSpec {
        name: args.name.clone(),
        image: args.image.clone(),
        nodes: args.nodes.clone(),
        mgmt_ip: args.mgmt_ip.clone(),
        gateway: args.gateway.clone(),
        prefix_length: args.prefix_length,
        vlans: args.vlans.clone(),
        vcpu_cores_per_node: args.vcpu,
        memory: args.memory,
        cryptos: !args.no_cryptos,
        running_state: args.running_state.into(),
        storage_size: args.storage,
    }
}

fn print_tenant(tenant: &Tenant, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, tenant, detail, |t| t.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(client: &F5osClient, args: TenantArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TenantCommand::Get { name } => {
            let tenant = client.get_tenant(&name).await?.ok_or_else(|| CliError::NotFound {
                resource_type: "Tenant".into(),
                identifier: name.clone(),
            })?;
            print_tenant(&tenant, global)
        }

        TenantCommand::Deploy(deploy) => {
            let spec = tenant_spec(&deploy);
            let config = util::poll_config(&deploy.wait, PollConfig::DEPLOY_INTERVAL);
            output::status(
                &format!("Deploying tenant {} ({} MiB)...", spec.name, spec.memory_mib()),
                global.quiet,
            );
            let tenant = client
                .deploy_tenant(&spec, config, &client.child_token())
                .await?;
            print_tenant(&tenant, global)
        }

        TenantCommand::Delete { name } => {
            client.delete_tenant(&name).await?;
            output::status(&format!("Tenant {name} deleted"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::WaitArgs;

    #[test]
    fn deploy_args_map_onto_spec() {
        let args = TenantDeployArgs {
            name: "t1".into(),
            image: "BIGIP.bundle".into(),
            nodes: vec![1, 2],
            mgmt_ip: "10.0.0.5".into(),
            gateway: "10.0.0.1".into(),
            prefix_length: 24,
            vlans: vec![444],
            vcpu: 4,
            memory: None,
            storage: Some(82),
            running_state: RunningStateArg::Provisioned,
            no_cryptos: true,
            wait: WaitArgs {
                wait_timeout: 60,
                poll_interval: None,
            },
        };
        let spec = tenant_spec(&args);
        assert!(!spec.cryptos);
        assert_eq!(spec.running_state, RunningState::Provisioned);
        assert_eq!(spec.memory_mib(), 4 * 3584 + 512);
        assert_eq!(spec.storage_size, Some(82));
    }
}
