// Host normalization and API root selection.
//
// F5OS serves the same YANG data tree under two prefixes: the RESTCONF
// listener (default port 8888) uses `/restconf/data`, while the web
// listener on 443 exposes it as `/api/data`.

use url::Url;

use crate::error::Error;

/// Port used when neither the host URL nor the configuration names one.
pub const DEFAULT_PORT: u16 = 8888;

/// Path that answers the login probe and hands out `X-Auth-Token`.
pub const LOGIN_PATH: &str = "/openconfig-system:system/aaa";

/// Which data-tree prefix the device answers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRoot {
    /// `/restconf/data` on the RESTCONF port.
    Restconf,
    /// `/api/data` on the HTTPS port (443).
    Api,
}

impl ApiRoot {
    pub fn for_port(port: u16) -> Self {
        if port == 443 { Self::Api } else { Self::Restconf }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Restconf => "/restconf/data",
            Self::Api => "/api/data",
        }
    }
}

/// Normalize a configured host into a base URL plus its API root.
///
/// Bare hostnames get an `https://` prefix. The effective port is the one
/// written in `host`, else `port`, else [`DEFAULT_PORT`].
pub fn resolve_base_url(host: &str, port: Option<u16>) -> Result<(Url, ApiRoot), Error> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidHost {
            host: host.to_owned(),
            reason: "host is empty".into(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| Error::InvalidHost {
        host: host.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(Error::InvalidHost {
            host: host.to_owned(),
            reason: "no hostname".into(),
        });
    }

    // `Url::port()` hides scheme-default ports, so read the authority as written.
    let effective = explicit_port(&with_scheme)
        .or(port)
        .unwrap_or(DEFAULT_PORT);

    url.set_port(Some(effective)).map_err(|()| Error::InvalidHost {
        host: host.to_owned(),
        reason: "cannot carry a port".into(),
    })?;
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);

    Ok((url, ApiRoot::for_port(effective)))
}

fn explicit_port(url: &str) -> Option<u16> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = if host_port.starts_with('[') {
        host_port.split_once(']').map_or("", |(_, tail)| tail)
    } else {
        host_port
    };
    let (_, port) = after_host.rsplit_once(':')?;
    port.parse().ok()
}

/// Heuristic for login responses that are HTML or a JS redirect rather than
/// RESTCONF JSON.
pub(crate) fn looks_like_challenge_page(body: &[u8]) -> bool {
    let head = String::from_utf8_lossy(body.get(..4096).unwrap_or(body)).to_ascii_lowercase();
    ["<!doctype html", "<html", "<script", "window.location", "document.cookie"]
        .iter()
        .any(|marker| head.contains(marker))
}
