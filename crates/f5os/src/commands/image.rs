//! Tenant image command handlers.

use f5os_api::resources::images::TenantImage;
use f5os_api::{F5osClient, PollConfig};

use crate::cli::{GlobalOpts, ImageArgs, ImageCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(img: &TenantImage) -> String {
    output::detail(&[
        ("Name", img.name.clone()),
        ("Status", output::opt(img.status.as_deref())),
        ("Type", output::opt(img.image_type.as_deref())),
        ("In use", output::opt(img.in_use)),
    ])
}

fn print_image(image: &TenantImage, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, image, detail, |i| i.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(client: &F5osClient, args: ImageArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ImageCommand::Import { remote, wait } => {
            let remote = util::remote_file(remote);
            let config = util::poll_config(&wait, PollConfig::TRANSFER_INTERVAL);
            output::status(
                &format!("Importing {} from {}...", remote.file_name(), remote.host),
                global.quiet,
            );
            let name = remote.file_name().to_owned();
            match client
                .import_tenant_image_and_wait(&remote, config, &client.child_token())
                .await?
            {
                Some(image) => print_image(&image, global),
                None => {
                    output::status(&format!("Transfer of {name} completed"), global.quiet);
                    Ok(())
                }
            }
        }

        ImageCommand::Status { name } => {
            let image = client.get_tenant_image(&name).await?.ok_or_else(|| CliError::NotFound {
                resource_type: "Image".into(),
                identifier: name.clone(),
            })?;
            print_image(&image, global)
        }

        ImageCommand::Remove { name } => {
            client.remove_tenant_image(&name).await?;
            output::status(&format!("Image {name} removed"), global.quiet);
            Ok(())
        }
    }
}
