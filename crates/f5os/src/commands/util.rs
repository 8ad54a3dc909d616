//! Shared helpers for command handlers.

use std::time::Duration;

use secrecy::SecretString;

use f5os_api::{PollConfig, RemoteFile};

use crate::cli::{RemoteArgs, WaitArgs};

/// Poll settings from `--wait-timeout` / `--poll-interval`, with the
/// operation's own interval as the fallback.
pub fn poll_config(wait: &WaitArgs, default_interval: Duration) -> PollConfig {
    let interval = wait
        .poll_interval
        .map_or(default_interval, Duration::from_secs);
    PollConfig::new(interval, Duration::from_secs(wait.wait_timeout))
}

pub fn remote_file(args: RemoteArgs) -> RemoteFile {
    RemoteFile {
        host: args.remote_host,
        path: args.remote_path,
        username: args.remote_user,
        password: args.remote_password.map(SecretString::from),
        port: args.remote_port,
        protocol: args.protocol,
        insecure: args.remote_insecure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_flag_overrides_default() {
        let wait = WaitArgs {
            wait_timeout: 60,
            poll_interval: None,
        };
        let config = poll_config(&wait, PollConfig::TRANSFER_INTERVAL);
        assert_eq!(config.interval, PollConfig::TRANSFER_INTERVAL);
        assert_eq!(config.timeout, Duration::from_secs(60));

        let wait = WaitArgs {
            wait_timeout: 60,
            poll_interval: Some(1),
        };
        assert_eq!(poll_config(&wait, PollConfig::DEPLOY_INTERVAL).interval, Duration::from_secs(1));
    }
}
