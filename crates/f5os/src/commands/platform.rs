//! Platform command handler.

use f5os_api::{F5osClient, PlatformInfo};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(info: &PlatformInfo) -> String {
    output::detail(&[
        ("Platform", info.platform_type()),
        ("Kind", info.kind.to_string()),
        ("Version", output::opt(info.version.as_deref())),
    ])
}

/// Print what was detected at connect time; no further request is made.
pub fn handle(client: &F5osClient, global: &GlobalOpts) -> Result<(), CliError> {
    let info = client.platform();
    let out = output::render_single(&global.output, info, detail, PlatformInfo::platform_type)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
