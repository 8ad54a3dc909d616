use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Top-level error type for the `f5os-api` crate.
///
/// Covers every failure mode of a session: login, transport, device-reported
/// errors, payload decoding, and long-running operation polling. Resource
/// operations propagate these unchanged to their caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login was rejected (HTTP 401) or returned no session token.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        /// `error-tag` from the device's error envelope, when present.
        error_tag: Option<String>,
        /// Raw response body for diagnostics.
        body: String,
    },

    /// Login answered with an HTML/JS page instead of JSON (captive portal,
    /// login redirect, WAF challenge). No token is cached in this case.
    #[error("Login returned a non-JSON challenge page (HTTP {status})")]
    ChallengePage { status: u16, preview: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Non-timeout network failure (DNS, connection refused, I/O). Not retried.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Every attempt of a request timed out.
    #[error("Request timed out after {attempts} attempt(s): {source}")]
    Timeout {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The configured host could not be turned into a URL.
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device ──────────────────────────────────────────────────────
    /// HTTP >= 400 from the device. `message` is the device-reported
    /// `error-message` when the envelope decodes, a status line otherwise.
    #[error("Device error (HTTP {status}): {message}")]
    Device {
        status: u16,
        message: String,
        error_tag: Option<String>,
        error_path: Option<String>,
        errors: Vec<ErrorEntry>,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The response did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    // ── Long-running operations ─────────────────────────────────────
    /// A poll loop exceeded its deadline without reaching a terminal state.
    #[error("{operation} timed out after {}s (last status: {last_status})", .elapsed.as_secs())]
    TimedOut {
        operation: String,
        elapsed: Duration,
        last_status: String,
    },

    /// The device reported an explicit failure status while polling.
    #[error("{operation} failed: {status}")]
    PollFailure { operation: String, status: String },

    /// The wait was interrupted through a cancellation token.
    #[error("{operation} cancelled")]
    Cancelled { operation: String },
}

impl Error {
    /// Returns `true` for login failures, including challenge pages.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::ChallengePage { .. })
    }

    /// Returns `true` if the dispatcher would retry this failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            Self::Device { status: 401, .. } => true,
            _ => false,
        }
    }

    /// The device-reported message for [`Device`](Self::Device) errors.
    pub fn device_message(&self) -> Option<&str> {
        match self {
            Self::Device { message, .. } => Some(message),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Device { status, .. } | Self::ChallengePage { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn decode(err: &serde_json::Error, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        let preview: String = body.chars().take(200).collect();
        Self::Decode {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

// ── RESTCONF error envelope ──────────────────────────────────────────

/// `{"ietf-restconf:errors": {"error": [ ... ]}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "ietf-restconf:errors", alias = "errors")]
    pub errors: ErrorList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorList {
    #[serde(default)]
    pub error: Vec<ErrorEntry>,
}

/// One entry of the device's error list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorEntry {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_tag: Option<String>,
    #[serde(default)]
    pub error_path: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorEnvelope {
    /// Parse an error body; `None` when it is not a well-formed envelope
    /// with at least one entry.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let env: Self = serde_json::from_slice(body).ok()?;
        if env.errors.error.is_empty() {
            None
        } else {
            Some(env)
        }
    }

    pub fn first(&self) -> Option<&ErrorEntry> {
        self.errors.error.first()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_first_entry() {
        let body = br#"{"ietf-restconf:errors":{"error":[{"error-type":"application","error-tag":"invalid-value","error-path":"/vlans","error-message":"vlan-id out of range"}]}}"#;
        let env = ErrorEnvelope::parse(body).unwrap();
        let first = env.first().unwrap();
        assert_eq!(first.error_tag.as_deref(), Some("invalid-value"));
        assert_eq!(first.error_message.as_deref(), Some("vlan-id out of range"));
    }

    #[test]
    fn envelope_rejects_empty_list_and_garbage() {
        assert!(ErrorEnvelope::parse(br#"{"ietf-restconf:errors":{"error":[]}}"#).is_none());
        assert!(ErrorEnvelope::parse(b"<html>nope</html>").is_none());
    }

    #[test]
    fn transient_classification() {
        let device_401 = Error::Device {
            status: 401,
            message: "expired".into(),
            error_tag: None,
            error_path: None,
            errors: Vec::new(),
            body: String::new(),
        };
        assert!(device_401.is_transient());
        assert!(!device_401.is_auth_failure());

        let challenge = Error::ChallengePage {
            status: 200,
            preview: "<html>".into(),
        };
        assert!(challenge.is_auth_failure());
        assert_eq!(challenge.status(), Some(200));
    }
}
