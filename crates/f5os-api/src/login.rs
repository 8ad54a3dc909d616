// Session authentication
//
// Login is a GET against the AAA container with HTTP Basic credentials;
// the device answers with the session token in the `X-Auth-Token` header.
// Re-authentication reuses the stored credentials and is single-flight
// per session.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, debug, info, warn};

use crate::auth::{LOGIN_PATH, looks_like_challenge_page};
use crate::client::{F5osClient, TokenState};
use crate::dispatch::{AUTH_TOKEN_HEADER, YANG_JSON};
use crate::error::{Error, ErrorEnvelope};

impl F5osClient {
    /// Authenticate with the stored username/password and cache the token.
    ///
    /// `GET {root}/openconfig-system:system/aaa` with Basic auth.
    pub async fn login(&self) -> Result<(), Error> {
        let token = self
            .fetch_token()
            .instrument(self.inner.span.clone())
            .await?;

        let next = self.inner.token.load().generation + 1;
        self.inner.token.store(Arc::new(TokenState {
            token: Some(token),
            generation: next,
        }));
        debug!(parent: &self.inner.span, generation = next, "session token stored");
        Ok(())
    }

    async fn fetch_token(&self) -> Result<SecretString, Error> {
        let url = self.data_url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let resp = self
            .inner
            .http
            .get(url)
            .basic_auth(&self.inner.username, Some(self.inner.password.expose_secret()))
            .header(reqwest::header::CONTENT_TYPE, YANG_JSON)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let token = resp
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.bytes().await.map_err(Error::Transport)?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            let envelope = ErrorEnvelope::parse(&body);
            let first = envelope.as_ref().and_then(ErrorEnvelope::first);
            return Err(Error::Authentication {
                message: first
                    .and_then(|e| e.error_message.clone())
                    .unwrap_or_else(|| "invalid username or password (HTTP 401)".into()),
                error_tag: first.and_then(|e| e.error_tag.clone()),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if looks_like_challenge_page(&body) {
            let preview: String = String::from_utf8_lossy(&body).chars().take(200).collect();
            warn!(status = status.as_u16(), "login returned an HTML/JS page");
            return Err(Error::ChallengePage {
                status: status.as_u16(),
                preview,
            });
        }

        if !status.is_success() {
            return Err(crate::dispatch::ErrorDecoder::Standard.decode(status, &body));
        }

        match token {
            Some(token) if !token.is_empty() => {
                info!("login successful");
                Ok(SecretString::from(token))
            }
            _ => Err(Error::Authentication {
                message: format!("login response (HTTP {status}) carried no {AUTH_TOKEN_HEADER} header"),
                error_tag: None,
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }

    /// Replace a token the device rejected.
    ///
    /// `stale_generation` is the generation the failed request was sent
    /// with; if another task already refreshed past it, no login is made.
    pub(crate) async fn reauthenticate(&self, stale_generation: u64) -> Result<(), Error> {
        let _guard = self.inner.reauth.lock().await;
        let current = self.inner.token.load().generation;
        if current != stale_generation {
            debug!(
                parent: &self.inner.span,
                stale_generation, current, "token already refreshed by another request"
            );
            return Ok(());
        }
        info!(parent: &self.inner.span, "session token rejected, logging in again");
        self.login().await
    }
}
