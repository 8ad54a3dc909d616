// Usage reporting seam.
//
// The reporting backend lives outside this crate; the client only hands it
// a summary after a session is established, off the request path, and
// ignores any failure.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::platform::PlatformInfo;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Summary sent once per established session.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEvent {
    pub host: String,
    pub platform_type: String,
    pub platform_version: Option<String>,
    pub client_version: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(host: &str, platform: &PlatformInfo) -> Self {
        Self {
            host: host.to_owned(),
            platform_type: platform.platform_type(),
            platform_version: platform.version.clone(),
            client_version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        }
    }
}

/// Fire-and-forget usage reporter. The client calls it on the blocking
/// thread pool and never waits for it, so implementations may do
/// synchronous I/O.
pub trait UsageReporter: Send + Sync {
    fn report(&self, event: &UsageEvent) -> Result<(), BoxError>;
}
