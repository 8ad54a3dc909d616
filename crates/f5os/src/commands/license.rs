//! License command handlers.

use f5os_api::F5osClient;
use f5os_api::resources::licensing::License;

use crate::cli::{GlobalOpts, LicenseArgs, LicenseCommand};
use crate::error::CliError;
use crate::output;

fn detail(l: &License) -> String {
    let mut out = output::detail(&[
        ("Registration key", output::opt(l.registration_key.as_deref())),
        ("Add-on keys", l.add_on_keys.join(",")),
    ]);
    if let Some(ref text) = l.license {
        out.push_str("\n\n");
        out.push_str(text);
    }
    out
}

pub async fn handle(client: &F5osClient, args: LicenseArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LicenseCommand::Show => {
            let license = client.get_license().await?.ok_or_else(|| CliError::NotFound {
                resource_type: "License".into(),
                identifier: "installed".into(),
            })?;
            let out = output::render_single(&global.output, &license, detail, |l| {
                l.registration_key.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::Install {
            registration_key,
            add_on_keys,
        } => {
            client.install_license(&registration_key, &add_on_keys).await?;
            output::status("License installed", global.quiet);
            Ok(())
        }

        LicenseCommand::Eula {
            registration_key,
            add_on_keys,
        } => {
            let eula = client
                .get_eula(&registration_key, &add_on_keys)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "EULA".into(),
                    identifier: registration_key.clone(),
                })?;
            output::print_output(&eula, global.quiet);
            Ok(())
        }
    }
}
