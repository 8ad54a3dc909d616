//! CLI error types with miette diagnostics.
//!
//! Maps `f5os_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use f5os_api::Error as ApiError;
use f5os_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const DEVICE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the device")]
    #[diagnostic(
        code(f5os::connection_failed),
        help(
            "Check that the management address is reachable and the RESTCONF\n\
             port is open (8888 by default, or 443 for the web API)."
        )
    )]
    ConnectionFailed {
        #[source]
        source: ApiError,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(f5os::tls_error),
        help(
            "F5OS ships with a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or set ca_cert in your profile."
        )
    )]
    Tls { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(f5os::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Store a password with: f5os config set-password --profile {profile} --password ..."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(f5os::no_credentials),
        help("Set it in the profile, pass --{what}, or export F5OS_{env}.")
    )]
    NoCredentials {
        profile: String,
        what: String,
        env: String,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(f5os::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Device rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(f5os::device_error))]
    Device { status: u16, message: String },

    #[error("{operation} failed: {status}")]
    #[diagnostic(code(f5os::operation_failed))]
    OperationFailed { operation: String, status: String },

    #[error("Unexpected response from the device: {message}")]
    #[diagnostic(
        code(f5os::decode),
        help("The device firmware may return a shape this client does not know. Rerun with -vv for details.")
    )]
    Decode { message: String },

    // ── Timeout / cancellation ───────────────────────────────────────
    #[error("{operation} did not finish within {seconds}s (last status: {last_status})")]
    #[diagnostic(
        code(f5os::timeout),
        help("Increase --wait-timeout or check the operation on the device.")
    )]
    Timeout {
        operation: String,
        seconds: u64,
        last_status: String,
    },

    #[error("Request timed out after {attempts} attempt(s)")]
    #[diagnostic(
        code(f5os::request_timeout),
        help("Increase --timeout or check device responsiveness.")
    )]
    RequestTimeout { attempts: u32 },

    #[error("{operation} cancelled")]
    #[diagnostic(code(f5os::cancelled))]
    Cancelled { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(f5os::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(f5os::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(f5os::no_config),
        help(
            "Pass --host (or F5OS_HOST), or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(f5os::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(f5os::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Device { .. } | Self::OperationFailed { .. } | Self::Decode { .. } => exit_code::DEVICE,
            Self::Timeout { .. } | Self::RequestTimeout { .. } => exit_code::TIMEOUT,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ApiError → CliError mapping ──────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { message, .. } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            ApiError::ChallengePage { status, .. } => CliError::AuthFailed {
                profile: "current".into(),
                message: format!("login answered with an HTML page (HTTP {status})"),
            },
            ApiError::Tls(message) => CliError::Tls { message },
            ApiError::InvalidHost { host, reason } => CliError::Validation {
                field: "host".into(),
                reason: format!("{host}: {reason}"),
            },
            ApiError::InvalidUrl(e) => CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            ApiError::Device { status, message, .. } => CliError::Device { status, message },
            ApiError::Decode { message, .. } => CliError::Decode { message },
            ApiError::TimedOut {
                operation,
                elapsed,
                last_status,
            } => CliError::Timeout {
                operation,
                seconds: elapsed.as_secs(),
                last_status,
            },
            ApiError::Timeout { attempts, .. } => CliError::RequestTimeout { attempts },
            ApiError::PollFailure { operation, status } => {
                CliError::OperationFailed { operation, status }
            }
            ApiError::Cancelled { operation } => CliError::Cancelled { operation },
            source @ ApiError::Transport(_) => CliError::ConnectionFailed { source },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoUsername { profile } => CliError::NoCredentials {
                profile,
                what: "username".into(),
                env: "USERNAME".into(),
            },
            ConfigError::NoPassword { profile } => CliError::NoCredentials {
                profile,
                what: "password".into(),
                env: "PASSWORD".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
