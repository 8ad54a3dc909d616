// DNS and NTP endpoints

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::client::{F5osClient, encode_key};
use crate::error::Error;

const DNS_PATH: &str = "/openconfig-system:system/dns";
const NTP_PATH: &str = "/openconfig-system:system/ntp";

// ── DNS ──────────────────────────────────────────────────────────────

/// Resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnsSettings {
    pub servers: Vec<String>,
    pub search_domains: Vec<String>,
}

#[derive(Deserialize)]
struct DnsResponse {
    #[serde(rename = "openconfig-system:dns", default)]
    dns: Option<DnsContainer>,
}

#[derive(Deserialize)]
struct DnsContainer {
    #[serde(default)]
    config: Option<DnsConfig>,
    #[serde(default)]
    servers: Option<AddressList>,
}

#[derive(Deserialize)]
struct DnsConfig {
    #[serde(default)]
    search: Vec<String>,
}

#[derive(Deserialize)]
struct AddressList {
    #[serde(default)]
    server: Vec<AddressEntry>,
}

#[derive(Deserialize)]
struct AddressEntry {
    address: String,
    #[serde(default)]
    config: Option<NtpServerConfig>,
}

pub(crate) fn dns_body(settings: &DnsSettings) -> serde_json::Value {
    let servers: Vec<_> = settings
        .servers
        .iter()
        .map(|a| json!({ "address": a, "config": { "address": a } }))
        .collect();
    json!({
        "openconfig-system:dns": {
            "config": { "search": settings.search_domains },
            "servers": { "server": servers }
        }
    })
}

// ── NTP ──────────────────────────────────────────────────────────────

/// One NTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtpServer {
    pub address: String,
    pub key_id: Option<u32>,
    pub prefer: bool,
    pub iburst: bool,
}

impl NtpServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            key_id: None,
            prefer: false,
            iburst: false,
        }
    }
}

/// Time service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NtpSettings {
    pub enabled: bool,
    pub servers: Vec<NtpServer>,
}

#[derive(Deserialize)]
struct NtpResponse {
    #[serde(rename = "openconfig-system:ntp", default)]
    ntp: Option<NtpContainer>,
}

#[derive(Deserialize)]
struct NtpContainer {
    #[serde(default)]
    config: Option<NtpConfig>,
    #[serde(default)]
    servers: Option<AddressList>,
}

#[derive(Deserialize)]
struct NtpConfig {
    #[serde(default)]
    enabled: Option<bool>,
}

#[derive(Deserialize)]
struct NtpServerConfig {
    #[serde(rename = "f5-openconfig-system-ntp:key-id", default)]
    key_id: Option<u32>,
    #[serde(default)]
    prefer: Option<bool>,
    #[serde(default)]
    iburst: Option<bool>,
}

pub(crate) fn ntp_body(settings: &NtpSettings) -> serde_json::Value {
    let servers: Vec<_> = settings
        .servers
        .iter()
        .map(|s| {
            let mut config = json!({
                "address": s.address,
                "prefer": s.prefer,
                "iburst": s.iburst
            });
            if let Some(key) = s.key_id {
                config["f5-openconfig-system-ntp:key-id"] = json!(key);
            }
            json!({ "address": s.address, "config": config })
        })
        .collect();
    json!({
        "openconfig-system:ntp": {
            "config": { "enabled": settings.enabled },
            "servers": { "server": servers }
        }
    })
}

impl F5osClient {
    /// Merge DNS servers and search domains into the device config.
    ///
    /// `PATCH /openconfig-system:system/dns`
    pub async fn set_dns(&self, settings: &DnsSettings) -> Result<(), Error> {
        info!(servers = ?settings.servers, "configuring dns");
        self.patch_json(DNS_PATH, &dns_body(settings)).await?;
        Ok(())
    }

    pub async fn get_dns(&self) -> Result<Option<DnsSettings>, Error> {
        debug!("fetching dns");
        let resp: Option<DnsResponse> = self.get_json(DNS_PATH).await?;
        Ok(resp.and_then(|r| r.dns).map(|d| DnsSettings {
            servers: d
                .servers
                .map(|s| s.server.into_iter().map(|e| e.address).collect())
                .unwrap_or_default(),
            search_domains: d.config.map(|c| c.search).unwrap_or_default(),
        }))
    }

    pub async fn delete_dns(&self) -> Result<(), Error> {
        info!("removing dns config");
        self.delete_path(DNS_PATH).await?;
        Ok(())
    }

    /// Merge NTP settings into the device config.
    ///
    /// `PATCH /openconfig-system:system/ntp`
    pub async fn set_ntp(&self, settings: &NtpSettings) -> Result<(), Error> {
        info!(enabled = settings.enabled, count = settings.servers.len(), "configuring ntp");
        self.patch_json(NTP_PATH, &ntp_body(settings)).await?;
        Ok(())
    }

    pub async fn get_ntp(&self) -> Result<Option<NtpSettings>, Error> {
        debug!("fetching ntp");
        let resp: Option<NtpResponse> = self.get_json(NTP_PATH).await?;
        Ok(resp.and_then(|r| r.ntp).map(|n| NtpSettings {
            enabled: n.config.and_then(|c| c.enabled).unwrap_or_default(),
            servers: n
                .servers
                .map(|s| {
                    s.server
                        .into_iter()
                        .map(|e| {
                            let cfg = e.config;
                            NtpServer {
                                address: e.address,
                                key_id: cfg.as_ref().and_then(|c| c.key_id),
                                prefer: cfg.as_ref().and_then(|c| c.prefer).unwrap_or_default(),
                                iburst: cfg.as_ref().and_then(|c| c.iburst).unwrap_or_default(),
                            }
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }))
    }

    /// Remove one NTP server.
    pub async fn delete_ntp_server(&self, address: &str) -> Result<(), Error> {
        info!(address, "removing ntp server");
        self.delete_path(&format!("{NTP_PATH}/servers/server={}", encode_key(address)))
            .await?;
        Ok(())
    }
}
