// f5os-api: Async Rust client for the F5OS RESTCONF API (rSeries and VELOS)

pub mod auth;
pub mod client;
pub mod dispatch;
pub mod error;
mod login;
pub mod platform;
pub mod poll;
pub mod resources;
pub mod teem;
pub mod transport;

pub use auth::{ApiRoot, DEFAULT_PORT};
pub use client::{ClientConfig, F5osClient, encode_key};
pub use dispatch::{ApiResponse, ErrorDecoder, RequestOptions, RetryPolicy};
pub use error::{Error, ErrorEntry};
pub use platform::{PlatformInfo, PlatformKind};
pub use poll::{PollConfig, PollStatus, wait_until};
pub use teem::{BoxError, UsageEvent, UsageReporter};
pub use transport::{TlsMode, TransportConfig};

pub use resources::file_transfer::{RemoteFile, TransferKey, TransferOperation};
pub use resources::tenants::{RunningState, Tenant, TenantSpec};

// Re-exported so callers can build secrets and cancellation tokens
// without pinning their own versions.
pub use secrecy::SecretString;
pub use tokio_util::sync::CancellationToken;
