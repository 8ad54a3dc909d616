// F5OS session client
//
// Owns one authenticated session: the HTTP client, the resolved base URL
// and API root, the credentials kept for re-login, the rotating token, and
// the platform classification detected at connect time. Endpoint modules
// (interfaces, tenants, etc.) are implemented as inherent methods in
// separate files so this module stays focused on session state.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, info_span};
use url::Url;

use crate::auth::{ApiRoot, resolve_base_url};
use crate::dispatch::RetryPolicy;
use crate::error::Error;
use crate::platform::PlatformInfo;
use crate::teem::{UsageEvent, UsageReporter};
use crate::transport::TransportConfig;

static UNKNOWN_PLATFORM: PlatformInfo = PlatformInfo::unknown();

/// Characters escaped in a list key: everything but RFC 3986 unreserved.
const KEY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a list key for a `list={key}` path segment, so names
/// like `1/1.0` stay one segment.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE).to_string()
}

/// Everything needed to open a session against one device.
///
/// Built by the caller (CLI, provider glue) -- the core never reads files
/// or environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bare hostname/IP or full URL (`https://10.1.1.5:8888`).
    pub host: String,
    /// Port used when `host` carries none.
    pub port: Option<u16>,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    /// Send a usage report after connecting (requires a reporter).
    pub teem: bool,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password,
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
            teem: false,
        }
    }
}

/// Token plus the generation counter used to make re-login single-flight.
pub(crate) struct TokenState {
    pub(crate) token: Option<SecretString>,
    pub(crate) generation: u64,
}

/// Client for one F5OS device session.
///
/// Cheaply cloneable via `Arc<ClientInner>`; clones share the token, so a
/// re-login performed by one clone is observed by all of them.
#[derive(Clone)]
pub struct F5osClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) api_root: ApiRoot,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) token: ArcSwap<TokenState>,
    /// Serializes re-authentication so concurrent 401s trigger one login.
    pub(crate) reauth: tokio::sync::Mutex<()>,
    pub(crate) retry: RetryPolicy,
    pub(crate) platform: OnceLock<PlatformInfo>,
    pub(crate) cancel: CancellationToken,
    pub(crate) span: Span,
    teem: bool,
    reporter: Option<Arc<dyn UsageReporter>>,
}

impl F5osClient {
    /// Build a client without contacting the device.
    ///
    /// Call [`login()`](Self::login) (and optionally
    /// [`detect_platform()`](Self::detect_platform)) before issuing requests,
    /// or use [`connect()`](Self::connect) which does both.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let (base_url, api_root) = resolve_base_url(&config.host, config.port)?;
        let http = config.transport.build_client()?;
        let span = info_span!("f5os_session", host = %base_url);
        debug!(parent: &span, root = api_root.prefix(), "session configured");

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                api_root,
                username: config.username,
                password: config.password,
                token: ArcSwap::from_pointee(TokenState {
                    token: None,
                    generation: 0,
                }),
                reauth: tokio::sync::Mutex::new(()),
                retry: config.retry,
                platform: OnceLock::new(),
                cancel: CancellationToken::new(),
                span,
                teem: config.teem,
                reporter: None,
            }),
        })
    }

    /// Attach a usage reporter. Only effective before the client is shared.
    pub fn with_reporter(mut self, reporter: Arc<dyn UsageReporter>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.reporter = Some(reporter);
        }
        self
    }

    /// Open a session: log in, classify the platform, send the usage report.
    ///
    /// Platform detection and reporting are best-effort; only login
    /// failures fail the call.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        Self::new(config)?.establish().await
    }

    /// [`connect()`](Self::connect) with a usage reporter attached.
    pub async fn connect_with_reporter(
        config: ClientConfig,
        reporter: Arc<dyn UsageReporter>,
    ) -> Result<Self, Error> {
        Self::new(config)?.with_reporter(reporter).establish().await
    }

    async fn establish(self) -> Result<Self, Error> {
        self.login().await?;
        let platform = self.detect_platform().await;
        let _ = self.inner.platform.set(platform);
        self.send_usage_report();
        Ok(self)
    }

    fn send_usage_report(&self) {
        if !self.inner.teem {
            return;
        }
        let Some(reporter) = self.inner.reporter.clone() else {
            return;
        };
        let event = UsageEvent::new(self.inner.base_url.as_str(), self.platform());
        let span = self.inner.span.clone();
        // Not awaited.
        drop(tokio::task::spawn_blocking(move || {
            if let Err(e) = reporter.report(&event) {
                debug!(parent: &span, error = %e, "usage report failed (ignored)");
            }
        }));
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The device base URL (`https://host:port/`).
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The data-tree prefix chosen from the port.
    pub fn api_root(&self) -> ApiRoot {
        self.inner.api_root
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    /// Platform classification from connect time, `Unknown` before that.
    pub fn platform(&self) -> &PlatformInfo {
        self.inner.platform.get().unwrap_or(&UNKNOWN_PLATFORM)
    }

    /// Whether a session token is currently held.
    pub fn has_token(&self) -> bool {
        self.inner.token.load().token.is_some()
    }

    /// Root cancellation token. Cancelling it aborts retry delays and
    /// every poll loop started with [`child_token()`](Self::child_token).
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// A child of the root token, for scoping one long-running wait.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }

    /// Cancel all in-flight waits on this session.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a data-tree path: `{base}{root}{path}`.
    ///
    /// `path` starts with `/`, e.g. `/openconfig-vlan:vlans`.
    pub fn data_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}{}{path}", self.inner.api_root.prefix());
        Ok(Url::parse(&full)?)
    }
}

impl std::fmt::Debug for F5osClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("F5osClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("api_root", &self.inner.api_root)
            .field("username", &self.inner.username)
            .field("platform", self.platform())
            .finish_non_exhaustive()
    }
}
