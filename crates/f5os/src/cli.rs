//! Clap derive structures for the `f5os` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// f5os -- manage F5OS rSeries appliances and VELOS chassis
#[derive(Debug, Parser)]
#[command(
    name = "f5os",
    version,
    about = "Manage F5OS rSeries appliances and VELOS chassis from the command line",
    long_about = "Talks to the F5OS RESTCONF API: VLANs, tenants, tenant images,\n\
        configuration backups, file transfers and licensing.\n\n\
        Long-running operations (tenant deploy, image import, backup export)\n\
        wait for completion; Ctrl-C stops the wait.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "F5OS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host or URL (overrides profile)
    #[arg(long, short = 'H', env = "F5OS_HOST", global = true)]
    pub host: Option<String>,

    /// Device port when the host carries none (default 8888)
    #[arg(long, env = "F5OS_PORT", global = true)]
    pub port: Option<u16>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "F5OS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password (prefer the keyring or F5OS_PASSWORD)
    #[arg(long, env = "F5OS_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "F5OS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "F5OS_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "F5OS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the detected platform and software version
    Platform,

    /// Manage VLANs
    Vlan(VlanArgs),

    /// Manage tenants
    Tenant(TenantArgs),

    /// Manage tenant images
    Image(ImageArgs),

    /// Create and export configuration backups
    Backup(BackupArgs),

    /// List file-transfer operations
    Transfers,

    /// Show or install the license
    License(LicenseArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── VLAN ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VlanArgs {
    #[command(subcommand)]
    pub command: VlanCommand,
}

#[derive(Debug, Subcommand)]
pub enum VlanCommand {
    /// Show one VLAN, or all VLANs when no ID is given
    Get {
        /// VLAN ID (1-4094)
        #[arg(value_parser = clap::value_parser!(u16).range(1..=4094))]
        id: Option<u16>,
    },

    /// Create or update a VLAN
    Set {
        #[arg(value_parser = clap::value_parser!(u16).range(1..=4094))]
        id: u16,

        /// VLAN name
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a VLAN
    Delete {
        #[arg(value_parser = clap::value_parser!(u16).range(1..=4094))]
        id: u16,
    },
}

// ── Tenant ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TenantArgs {
    #[command(subcommand)]
    pub command: TenantCommand,
}

#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Show a tenant
    Get { name: String },

    /// Create or update a tenant and wait for it to run
    Deploy(TenantDeployArgs),

    /// Delete a tenant
    Delete { name: String },
}

#[derive(Debug, Args)]
pub struct TenantDeployArgs {
    /// Tenant name
    pub name: String,

    /// Tenant image file name
    #[arg(long)]
    pub image: String,

    /// Nodes (slots) to run on
    #[arg(long, value_delimiter = ',', default_value = "1")]
    pub nodes: Vec<u16>,

    /// Management IP address
    #[arg(long)]
    pub mgmt_ip: String,

    /// Management gateway
    #[arg(long)]
    pub gateway: String,

    /// Management prefix length
    #[arg(long, default_value = "24")]
    pub prefix_length: u8,

    /// VLANs attached to the tenant
    #[arg(long, value_delimiter = ',')]
    pub vlans: Vec<u16>,

    /// vCPU cores per node
    #[arg(long, default_value = "2")]
    pub vcpu: u32,

    /// Memory in MiB (default derived from vCPU count)
    #[arg(long)]
    pub memory: Option<u64>,

    /// Virtual disk size in GB
    #[arg(long)]
    pub storage: Option<u32>,

    /// Desired running state
    #[arg(long, value_enum, default_value = "deployed")]
    pub running_state: RunningStateArg,

    /// Disable crypto offload
    #[arg(long)]
    pub no_cryptos: bool,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunningStateArg {
    Configured,
    Provisioned,
    Deployed,
}

// ── Image ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ImageArgs {
    #[command(subcommand)]
    pub command: ImageCommand,
}

#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Import a tenant image from a remote server and wait for it
    Import {
        #[command(flatten)]
        remote: RemoteArgs,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show a tenant image
    Status { name: String },

    /// Remove a tenant image
    Remove { name: String },
}

// ── Backup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write the running configuration to a backup file on the device
    Create { name: String },

    /// Export a backup file to a remote server and wait for it
    Export {
        name: String,

        #[command(flatten)]
        remote: RemoteArgs,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a backup file from the device
    Delete { name: String },
}

// ── Shared transfer arguments ────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RemoteArgs {
    /// Remote server host
    #[arg(long)]
    pub remote_host: String,

    /// Path of the file on the remote server
    #[arg(long)]
    pub remote_path: String,

    /// Remote server username
    #[arg(long)]
    pub remote_user: Option<String>,

    /// Remote server password
    #[arg(long, env = "F5OS_REMOTE_PASSWORD", hide_env_values = true)]
    pub remote_password: Option<String>,

    /// Remote server port
    #[arg(long)]
    pub remote_port: Option<u16>,

    /// Transfer protocol
    #[arg(long, default_value = "https")]
    pub protocol: String,

    /// Skip certificate checks on the remote server
    #[arg(long)]
    pub remote_insecure: bool,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Give up waiting after this many seconds
    #[arg(long, default_value = "1800")]
    pub wait_timeout: u64,

    /// Seconds between status checks (default depends on the operation)
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

// ── License ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Show the installed license
    Show,

    /// Install a license from a registration key
    Install {
        registration_key: String,

        /// Add-on keys
        #[arg(long = "add-on", value_delimiter = ',')]
        add_on_keys: Vec<String>,
    },

    /// Print the EULA for a registration key
    Eula {
        registration_key: String,

        #[arg(long = "add-on", value_delimiter = ',')]
        add_on_keys: Vec<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (passwords masked)
    Show,

    /// Store the --password value in the system keyring for the profile
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,

    /// Output directory (prints to stdout if omitted)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}
