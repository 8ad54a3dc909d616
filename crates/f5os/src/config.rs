//! CLI configuration: thin wrapper around `f5os_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --username, --password, etc.) on top of the shared profile logic.

use std::time::Duration;

use secrecy::SecretString;

use f5os_api::{ClientConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use f5os_config::{Config, Profile, config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
///
/// With no matching profile, `--host` alone is enough as long as
/// credentials come from flags or the environment.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.host.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);

    let mut client = f5os_config::profile_to_client_config(&profile, &profile_name, &cfg.defaults)?;
    if let Some(ref password) = global.password {
        client.password = SecretString::from(password.clone());
    }
    if global.insecure {
        client.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.transport.timeout = Duration::from_secs(secs);
    }
    Ok(client)
}

/// Flag values win over the profile.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    // Satisfies the credential chain; the flag value is applied afterwards.
    if global.password.is_some() && profile.password.is_none() {
        profile.password.clone_from(&global.password);
    }
}
