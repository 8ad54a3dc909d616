// Long-running operation polling
//
// Tenant deployment, partition bring-up, image import and file export are
// asynchronous on the device. `wait_until` drives a status probe on a fixed
// interval until it reports a terminal state, the deadline passes, or the
// caller cancels. The classifiers below turn raw device status strings into
// a `PollStatus` for each kind of operation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info};

use crate::client::F5osClient;
use crate::error::Error;

/// What one probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Terminal success.
    Ready(T),
    /// Not there yet; carries the status seen, for logs and timeout errors.
    Pending(String),
    /// Terminal failure reported by the device.
    Failed(String),
}

/// Interval and deadline for a wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    /// Interval used for file-transfer operations.
    pub const TRANSFER_INTERVAL: Duration = Duration::from_secs(5);
    /// Interval used for tenant and partition deployment.
    pub const DEPLOY_INTERVAL: Duration = Duration::from_secs(20);

    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub const fn transfer(timeout: Duration) -> Self {
        Self::new(Self::TRANSFER_INTERVAL, timeout)
    }

    pub const fn deploy(timeout: Duration) -> Self {
        Self::new(Self::DEPLOY_INTERVAL, timeout)
    }
}

/// Poll `probe` until it reports a terminal state.
///
/// The first probe runs immediately. Probe errors propagate as-is.
/// `Failed` becomes [`Error::PollFailure`], an expired deadline
/// [`Error::TimedOut`], and a cancelled token [`Error::Cancelled`], whether
/// it fires during a sleep or while a probe is in flight.
pub async fn wait_until<T, F, Fut>(
    operation: &str,
    config: PollConfig,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, Error>>,
{
    let start = Instant::now();
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(Error::Cancelled {
                    operation: operation.to_owned(),
                });
            }
            status = probe() => status?,
        };
        match status {
            PollStatus::Ready(value) => {
                info!(operation, polls, elapsed = ?start.elapsed(), "operation complete");
                return Ok(value);
            }
            PollStatus::Failed(status) => {
                return Err(Error::PollFailure {
                    operation: operation.to_owned(),
                    status,
                });
            }
            PollStatus::Pending(status) => {
                let elapsed = start.elapsed();
                if elapsed >= config.timeout {
                    return Err(Error::TimedOut {
                        operation: operation.to_owned(),
                        elapsed,
                        last_status: status,
                    });
                }
                debug!(operation, polls, status, "operation pending");

                let remaining = config.timeout.saturating_sub(elapsed);
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return Err(Error::Cancelled {
                            operation: operation.to_owned(),
                        });
                    }
                    () = tokio::time::sleep(config.interval.min(remaining)) => {}
                }
            }
        }
    }
}

impl F5osClient {
    /// [`wait_until`] inside the session span, also ending when the session
    /// itself is shut down.
    pub(crate) async fn poll_until<T, F, Fut>(
        &self,
        operation: &str,
        config: PollConfig,
        cancel: &CancellationToken,
        probe: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollStatus<T>, Error>>,
    {
        let wait = wait_until(operation, config, cancel, probe).instrument(self.inner.span.clone());
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(Error::Cancelled {
                operation: operation.to_owned(),
            }),
            result = wait => result,
        }
    }
}

// ── Classifiers ──────────────────────────────────────────────────────

/// Tenant deployment.
///
/// `Running` or `Configured` succeed. `Pending` with instance diagnostics
/// is a failure (the scheduler has given its reason); anything else keeps
/// polling.
pub fn classify_tenant(status: Option<&str>, diagnostics: Option<&str>) -> PollStatus<()> {
    let status = status.unwrap_or_default();
    if status.contains("Running") || status.contains("Configured") {
        return PollStatus::Ready(());
    }
    if status.contains("Pending") {
        if let Some(diag) = diagnostics.filter(|d| !d.trim().is_empty()) {
            return PollStatus::Failed(diag.to_owned());
        }
    }
    PollStatus::Pending(if status.is_empty() {
        "no status reported".into()
    } else {
        status.to_owned()
    })
}

const PARTITION_RUNNING: [&str; 3] = ["running", "running-active", "running-standby"];

/// Partition deployment: every controller must report a running state.
pub fn classify_partition<'a, I>(statuses: I) -> PollStatus<()>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = Vec::new();
    let mut all_running = true;
    for status in statuses {
        let status = status.unwrap_or("unknown");
        all_running &= PARTITION_RUNNING.contains(&status);
        seen.push(status);
    }

    if seen.is_empty() {
        PollStatus::Pending("no controllers reported".into())
    } else if all_running {
        PollStatus::Ready(())
    } else {
        PollStatus::Pending(seen.join(","))
    }
}

const TRANSFER_FAILURES: [&str; 3] = ["HTTP Error", "Couldn't resolve host", "Failure"];

/// File-transfer operation (image import, config export).
pub fn classify_transfer(status: &str) -> PollStatus<()> {
    let status = status.trim();
    if status == "Completed" {
        PollStatus::Ready(())
    } else if TRANSFER_FAILURES.iter().any(|f| status.contains(f)) {
        PollStatus::Failed(status.to_owned())
    } else {
        // "In Progress..." and anything unrecognized keep polling.
        PollStatus::Pending(status.to_owned())
    }
}
