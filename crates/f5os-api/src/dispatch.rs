// Request dispatcher
//
// One code path for every data-tree call: attaches the session token and
// the YANG content type, retries timeouts and failed statuses with a fixed
// delay, re-authenticates on 401, and turns the final failure into a
// structured error through a pluggable decoder.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, trace, warn};
use url::Url;

use crate::client::F5osClient;
use crate::error::{Error, ErrorEnvelope};

/// Header carrying the session token on every call after login.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Content type for RESTCONF JSON bodies.
pub const YANG_JSON: &str = "application/yang-data+json";

// ── Policies ─────────────────────────────────────────────────────────

/// How many times a request is attempted, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no re-authentication.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// How a failing response body is turned into an [`Error::Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorDecoder {
    /// Message is the first envelope entry's `error-message`, or a
    /// status-based line when the body is not a usable envelope.
    #[default]
    Standard,
    /// Message wraps status, the device message and the full raw body.
    /// Used by the tenant endpoints.
    Tenant,
}

impl ErrorDecoder {
    pub fn decode(self, status: StatusCode, body: &[u8]) -> Error {
        let raw = String::from_utf8_lossy(body).into_owned();
        let envelope = ErrorEnvelope::parse(body);
        let first = envelope.as_ref().and_then(ErrorEnvelope::first);
        let device_message = first
            .and_then(|e| e.error_message.clone())
            .filter(|m| !m.is_empty());

        let message = match self {
            Self::Standard => device_message
                .unwrap_or_else(|| format!("request failed with HTTP status {}", status.as_u16())),
            Self::Tenant => {
                let detail = device_message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
                format!("HTTP {}: {detail}: {raw}", status.as_u16())
            }
        };

        Error::Device {
            status: status.as_u16(),
            message,
            error_tag: first.and_then(|e| e.error_tag.clone()),
            error_path: first.and_then(|e| e.error_path.clone()),
            errors: envelope.map(|e| e.errors.error).unwrap_or_default(),
            body: raw,
        }
    }
}

/// Retry policy and error decoder for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub retry: RetryPolicy,
    pub decoder: ErrorDecoder,
}

impl RequestOptions {
    /// The tenant call path: no retry loop, tenant error envelope.
    pub const fn tenant() -> Self {
        Self {
            retry: RetryPolicy::none(),
            decoder: ErrorDecoder::Tenant,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────

/// A successful response. 404 counts as success with an absent resource.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decode the body. `None` for 404 or an empty body (e.g. 204).
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        if self.is_not_found() || self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body)
            .map(Some)
            .map_err(|e| Error::decode(&e, &self.body))
    }
}

fn is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_FOUND
}

// ── Dispatch ─────────────────────────────────────────────────────────

impl F5osClient {
    /// Send a request to a data-tree path with the session's retry policy
    /// and the standard error decoder.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        let options = RequestOptions {
            retry: self.inner.retry,
            decoder: ErrorDecoder::Standard,
        };
        self.request_with(method, path, body, options).await
    }

    /// Send a request to a data-tree path with explicit options.
    pub async fn request_with<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<ApiResponse, Error> {
        let url = self.data_url(path)?;
        let body = body
            .map(|b| serde_json::to_vec(b).map(Bytes::from))
            .transpose()
            .map_err(|e| Error::Decode {
                message: format!("failed to encode request body: {e}"),
                body: String::new(),
            })?;
        self.send(method, url, body, options)
            .instrument(self.inner.span.clone())
            .await
    }

    /// Send a request to an absolute URL.
    ///
    /// Timeouts are retried; any other transport failure aborts at once.
    /// A 401 before the last attempt triggers one re-login and an immediate
    /// retry with the new token. Other failing statuses wait
    /// `options.retry.delay` before the next attempt. On the last attempt a
    /// failing status is decoded with `options.decoder`.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<ApiResponse, Error> {
        let max_attempts = options.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.inner.token.load_full();

            let mut builder = self
                .inner
                .http
                .request(method.clone(), url.clone())
                .header(CONTENT_TYPE, YANG_JSON)
                .header(ACCEPT, YANG_JSON);
            if let Some(ref t) = token.token {
                builder = builder.header(AUTH_TOKEN_HEADER, t.expose_secret());
            }
            if let Some(ref b) = body {
                builder = builder.body(b.clone());
            }

            debug!(%method, %url, attempt, "dispatching request");

            let result = match builder.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    resp.bytes().await.map(|b| (status, b))
                }
                Err(e) => Err(e),
            };

            let (status, bytes) = match result {
                Ok(pair) => pair,
                Err(e) if e.is_timeout() => {
                    if attempt >= max_attempts {
                        return Err(Error::Timeout {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(%url, attempt, error = %e, "request timed out, retrying");
                    self.retry_delay(options.retry.delay).await?;
                    continue;
                }
                Err(e) => return Err(Error::Transport(e)),
            };

            trace!(status = status.as_u16(), len = bytes.len(), "response received");

            if is_success(status) {
                return Ok(ApiResponse {
                    status,
                    body: bytes,
                });
            }

            if attempt >= max_attempts {
                return Err(options.decoder.decode(status, &bytes));
            }

            if status == StatusCode::UNAUTHORIZED {
                self.reauthenticate(token.generation).await?;
                continue;
            }

            warn!(%url, status = status.as_u16(), attempt, "request failed, retrying");
            self.retry_delay(options.retry.delay).await?;
        }
    }

    async fn retry_delay(&self, delay: Duration) -> Result<(), Error> {
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(Error::Cancelled {
                operation: "request retry".into(),
            }),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    // ── Typed helpers for endpoint modules ───────────────────────────

    /// GET and decode; `None` when the resource does not exist.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, Error> {
        self.request(Method::GET, path, None).await?.json()
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let options = self.default_options();
        self.request_with(Method::POST, path, Some(body), options).await
    }

    pub(crate) async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let options = self.default_options();
        self.request_with(Method::PATCH, path, Some(body), options).await
    }

    pub(crate) async fn delete_path(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(Method::DELETE, path, None).await
    }

    fn default_options(&self) -> RequestOptions {
        RequestOptions {
            retry: self.inner.retry,
            decoder: ErrorDecoder::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_decoder_uses_first_error_message() {
        let body = br#"{"ietf-restconf:errors":{"error":[
            {"error-type":"application","error-tag":"data-exists","error-message":"object already exists"},
            {"error-type":"application","error-tag":"other","error-message":"second"}
        ]}}"#;
        match ErrorDecoder::Standard.decode(StatusCode::CONFLICT, body) {
            Error::Device {
                status,
                message,
                error_tag,
                errors,
                ..
            } => {
                assert_eq!(status, 409);
                assert_eq!(message, "object already exists");
                assert_eq!(error_tag.as_deref(), Some("data-exists"));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[test]
    fn standard_decoder_falls_back_to_status_line() {
        let err = ErrorDecoder::Standard.decode(StatusCode::BAD_GATEWAY, b"upstream down");
        assert_eq!(
            err.device_message(),
            Some("request failed with HTTP status 502")
        );
    }

    #[test]
    fn tenant_decoder_wraps_status_message_and_body() {
        let body = br#"{"ietf-restconf:errors":{"error":[{"error-message":"tenant name in use"}]}}"#;
        let err = ErrorDecoder::Tenant.decode(StatusCode::BAD_REQUEST, body);
        let msg = err.device_message().unwrap_or_default();
        assert!(msg.starts_with("HTTP 400: tenant name in use: "), "{msg}");
        assert!(msg.contains("ietf-restconf:errors"), "{msg}");
    }

    #[test]
    fn not_found_and_empty_bodies_decode_to_none() {
        let nf = ApiResponse {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from_static(b"{\"ietf-restconf:errors\":{}}"),
        };
        assert!(nf.json::<serde_json::Value>().unwrap_or_default().is_none());

        let empty = ApiResponse {
            status: StatusCode::NO_CONTENT,
            body: Bytes::new(),
        };
        assert!(empty.json::<serde_json::Value>().unwrap_or_default().is_none());
    }

    #[test]
    fn default_retry_policy_matches_device_guidance() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(10));
        assert_eq!(RequestOptions::tenant().retry.max_attempts, 1);
    }
}
