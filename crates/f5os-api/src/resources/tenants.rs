// Tenant endpoints
//
// Tenants are BIG-IP guests scheduled onto nodes. All calls go through the
// tenant request options: a single attempt, errors reported with status,
// device message and raw body.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{F5osClient, encode_key};
use crate::dispatch::RequestOptions;
use crate::error::Error;
use crate::poll::{PollConfig, PollStatus, classify_tenant};

const TENANTS_PATH: &str = "/f5-tenants:tenants";

/// Memory granted per vCPU core when the caller does not size it, in MiB.
pub const MEMORY_PER_VCPU_MIB: u64 = 3584;
/// Fixed memory overhead added on top, in MiB.
pub const MEMORY_OVERHEAD_MIB: u64 = 512;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunningState {
    Configured,
    Provisioned,
    #[default]
    Deployed,
}

/// Desired tenant configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSpec {
    pub name: String,
    pub image: String,
    pub nodes: Vec<u16>,
    pub mgmt_ip: String,
    pub gateway: String,
    pub prefix_length: u8,
    pub vlans: Vec<u16>,
    pub vcpu_cores_per_node: u32,
    /// MiB; derived from the vCPU count when unset.
    pub memory: Option<u64>,
    pub cryptos: bool,
    pub running_state: RunningState,
    /// GB of virtual disk.
    pub storage_size: Option<u32>,
}

impl TenantSpec {
    pub fn memory_mib(&self) -> u64 {
        self.memory.unwrap_or_else(|| {
            u64::from(self.vcpu_cores_per_node) * MEMORY_PER_VCPU_MIB + MEMORY_OVERHEAD_MIB
        })
    }

    pub(crate) fn config_body(&self) -> Value {
        let mut config = json!({
            "name": self.name,
            "type": "BIG-IP",
            "image": self.image,
            "nodes": self.nodes,
            "mgmt-ip": self.mgmt_ip,
            "gateway": self.gateway,
            "prefix-length": self.prefix_length,
            "vlans": self.vlans,
            "vcpu-cores-per-node": self.vcpu_cores_per_node,
            "memory": self.memory_mib(),
            "cryptos": if self.cryptos { "enabled" } else { "disabled" },
            "running-state": self.running_state.to_string(),
        });
        if let Some(size) = self.storage_size {
            config["storage"] = json!({ "size": size });
        }
        config
    }
}

/// Tenant as read back from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub name: String,
    pub image: Option<String>,
    pub nodes: Vec<u16>,
    pub mgmt_ip: Option<String>,
    pub vlans: Vec<u16>,
    pub vcpu_cores_per_node: Option<u32>,
    pub memory: Option<u64>,
    pub running_state: Option<String>,
    pub status: Option<String>,
    /// Scheduler message from the first instance that reports one.
    pub diagnostics: Option<String>,
}

impl Tenant {
    pub fn poll_status(&self) -> PollStatus<()> {
        classify_tenant(self.status.as_deref(), self.diagnostics.as_deref())
    }
}

// ── Response shapes ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct TenantResponse {
    #[serde(rename = "f5-tenants:tenant", default)]
    tenant: Vec<TenantEntry>,
}

#[derive(Deserialize)]
struct TenantEntry {
    name: String,
    #[serde(default)]
    config: Option<TenantConfig>,
    #[serde(default)]
    state: Option<TenantState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TenantConfig {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    nodes: Vec<u16>,
    #[serde(default)]
    mgmt_ip: Option<String>,
    #[serde(default)]
    vlans: Vec<u16>,
    #[serde(default)]
    vcpu_cores_per_node: Option<u32>,
    #[serde(default)]
    memory: Option<u64>,
    #[serde(default)]
    running_state: Option<String>,
}

#[derive(Deserialize)]
struct TenantState {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    instances: Option<Instances>,
}

#[derive(Deserialize)]
struct Instances {
    #[serde(default)]
    instance: Vec<Instance>,
}

#[derive(Deserialize)]
struct Instance {
    #[serde(default)]
    status: Option<String>,
}

impl From<TenantEntry> for Tenant {
    fn from(entry: TenantEntry) -> Self {
        let config = entry.config;
        let (status, diagnostics) = entry.state.map_or((None, None), |s| {
            let diag = s.instances.and_then(|i| {
                i.instance
                    .into_iter()
                    .filter_map(|inst| inst.status)
                    .find(|d| !d.trim().is_empty())
            });
            (s.status, diag)
        });
        match config {
            Some(c) => Self {
                name: entry.name,
                image: c.image,
                nodes: c.nodes,
                mgmt_ip: c.mgmt_ip,
                vlans: c.vlans,
                vcpu_cores_per_node: c.vcpu_cores_per_node,
                memory: c.memory,
                running_state: c.running_state,
                status,
                diagnostics,
            },
            None => Self {
                name: entry.name,
                image: None,
                nodes: Vec::new(),
                mgmt_ip: None,
                vlans: Vec::new(),
                vcpu_cores_per_node: None,
                memory: None,
                running_state: None,
                status,
                diagnostics,
            },
        }
    }
}

fn tenant_path(name: &str) -> String {
    format!("{TENANTS_PATH}/tenant={}", encode_key(name))
}

impl F5osClient {
    /// Create a tenant. Returns once the device accepted the request; use
    /// [`wait_tenant_ready`](Self::wait_tenant_ready) or
    /// [`deploy_tenant`](Self::deploy_tenant) to wait for scheduling.
    ///
    /// `POST /f5-tenants:tenants`
    pub async fn create_tenant(&self, spec: &TenantSpec) -> Result<(), Error> {
        info!(name = %spec.name, image = %spec.image, "creating tenant");
        let body = json!({ "tenant": [{ "name": spec.name, "config": spec.config_body() }] });
        self.request_with(Method::POST, TENANTS_PATH, Some(&body), RequestOptions::tenant())
            .await?;
        Ok(())
    }

    /// Replace the tenant's config container.
    ///
    /// `PATCH /f5-tenants:tenants/tenant={name}/config`
    pub async fn update_tenant(&self, spec: &TenantSpec) -> Result<(), Error> {
        info!(name = %spec.name, "updating tenant");
        let body = json!({ "f5-tenants:config": spec.config_body() });
        let path = format!("{}/config", tenant_path(&spec.name));
        self.request_with(Method::PATCH, &path, Some(&body), RequestOptions::tenant())
            .await?;
        Ok(())
    }

    /// Read a tenant, `None` when it does not exist.
    ///
    /// `GET /f5-tenants:tenants/tenant={name}`
    pub async fn get_tenant(&self, name: &str) -> Result<Option<Tenant>, Error> {
        debug!(name, "fetching tenant");
        let resp: Option<TenantResponse> = self
            .request_with::<Value>(Method::GET, &tenant_path(name), None, RequestOptions::tenant())
            .await?
            .json()?;
        Ok(resp.and_then(|r| r.tenant.into_iter().next().map(Tenant::from)))
    }

    /// Delete a tenant. Deleting an absent tenant succeeds.
    pub async fn delete_tenant(&self, name: &str) -> Result<(), Error> {
        info!(name, "deleting tenant");
        self.request_with::<Value>(Method::DELETE, &tenant_path(name), None, RequestOptions::tenant())
            .await?;
        Ok(())
    }

    /// Poll until the tenant reports `Running` or `Configured`.
    pub async fn wait_tenant_ready(
        &self,
        name: &str,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<Tenant, Error> {
        let operation = format!("tenant {name} deployment");
        self.poll_until(&operation, config, cancel, || async {
            Ok(match self.get_tenant(name).await? {
                Some(tenant) => match tenant.poll_status() {
                    PollStatus::Ready(()) => PollStatus::Ready(tenant),
                    PollStatus::Pending(s) => PollStatus::Pending(s),
                    PollStatus::Failed(s) => PollStatus::Failed(s),
                },
                None => PollStatus::Pending("tenant not found".into()),
            })
        })
        .await
    }

    /// Create a tenant, or update it if it exists, then wait for it.
    pub async fn deploy_tenant(
        &self,
        spec: &TenantSpec,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<Tenant, Error> {
        if self.get_tenant(&spec.name).await?.is_some() {
            self.update_tenant(spec).await?;
        } else {
            self.create_tenant(spec).await?;
        }
        self.wait_tenant_ready(&spec.name, config, cancel).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec() -> TenantSpec {
        TenantSpec {
            name: "tenant1".into(),
            image: "BIGIP-17.1.0-0.0.16.ALL-F5OS.qcow2.zip.bundle".into(),
            nodes: vec![1],
            mgmt_ip: "10.10.10.26".into(),
            gateway: "10.10.10.1".into(),
            prefix_length: 24,
            vlans: vec![444],
            vcpu_cores_per_node: 4,
            memory: None,
            cryptos: true,
            running_state: RunningState::Deployed,
            storage_size: Some(76),
        }
    }

    #[test]
    fn memory_derived_from_vcpu_count() {
        let mut s = spec();
        assert_eq!(s.memory_mib(), 4 * 3584 + 512);
        s.memory = Some(8192);
        assert_eq!(s.memory_mib(), 8192);
    }

    #[test]
    fn config_body_uses_device_field_names() {
        let body = spec().config_body();
        assert_eq!(body["mgmt-ip"], "10.10.10.26");
        assert_eq!(body["running-state"], "deployed");
        assert_eq!(body["cryptos"], "enabled");
        assert_eq!(body["storage"]["size"], 76);
        assert_eq!(body["memory"], 14848);
    }

    #[test]
    fn pending_instance_message_becomes_diagnostics() {
        let resp: TenantResponse = serde_json::from_value(json!({
            "f5-tenants:tenant": [{
                "name": "tenant1",
                "config": { "image": "img", "nodes": [1], "running-state": "deployed" },
                "state": {
                    "status": "Pending",
                    "instances": { "instance": [{
                        "node": 1,
                        "status": "Insufficient memory on node 1"
                    }]}
                }
            }]
        }))
        .unwrap();
        let tenant = Tenant::from(resp.tenant.into_iter().next().unwrap());
        assert_eq!(
            tenant.poll_status(),
            PollStatus::Failed("Insufficient memory on node 1".into())
        );
    }

    #[test]
    fn tenant_without_state_keeps_polling() {
        let resp: TenantResponse =
            serde_json::from_value(json!({ "f5-tenants:tenant": [{ "name": "t" }] })).unwrap();
        let tenant = Tenant::from(resp.tenant.into_iter().next().unwrap());
        assert!(matches!(tenant.poll_status(), PollStatus::Pending(_)));
    }
}
