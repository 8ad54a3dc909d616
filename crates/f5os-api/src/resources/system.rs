// System endpoints: primary key, TLS certificate, cluster nodes

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::client::F5osClient;
use crate::error::Error;

const PRIMARY_KEY_PATH: &str = "/openconfig-system:system/aaa/f5-primary-key:primary-key";
const TLS_PATH: &str = "/openconfig-system:system/aaa/f5-openconfig-aaa-tls:tls";
const CLUSTER_NODES_PATH: &str = "/f5-cluster:cluster/nodes";

/// State of the device's primary (master) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyStatus {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct PrimaryKeyResponse {
    #[serde(rename = "f5-primary-key:state", default)]
    state: Option<PrimaryKeyStatus>,
}

/// Subject and key parameters for a self-signed management certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfSignedCert {
    pub name: String,
    pub key_type: String,
    pub key_size: u32,
    pub days_valid: u32,
    pub email: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub organization: Option<String>,
    pub unit: Option<String>,
    pub subject_alt_name: Option<String>,
    pub store_tls: bool,
}

impl SelfSignedCert {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_type: "rsa".into(),
            key_size: 2048,
            days_valid: 365,
            email: None,
            city: None,
            region: None,
            country: None,
            organization: None,
            unit: None,
            subject_alt_name: None,
            store_tls: true,
        }
    }

    pub(crate) fn body(&self) -> serde_json::Value {
        const NS: &str = "f5-openconfig-aaa-tls:";
        let mut map = serde_json::Map::new();
        map.insert(format!("{NS}name"), json!(self.name));
        map.insert(format!("{NS}key-type"), json!(self.key_type));
        map.insert(format!("{NS}key-size"), json!(self.key_size));
        map.insert(format!("{NS}days-valid"), json!(self.days_valid));
        map.insert(format!("{NS}store-tls"), json!(self.store_tls));
        let optional = [
            ("email", &self.email),
            ("city", &self.city),
            ("region", &self.region),
            ("country", &self.country),
            ("organization", &self.organization),
            ("unit", &self.unit),
            ("subject-alternative-name", &self.subject_alt_name),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                map.insert(format!("{NS}{field}"), json!(v));
            }
        }
        serde_json::Value::Object(map)
    }
}

/// A node (blade or appliance) in the platform cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub name: String,
    pub enabled: Option<bool>,
    pub running_state: Option<String>,
    pub slot_number: Option<u16>,
}

#[derive(Deserialize)]
struct NodesResponse {
    #[serde(rename = "f5-cluster:nodes", default)]
    nodes: Option<NodeList>,
}

#[derive(Deserialize)]
struct NodeList {
    #[serde(default)]
    node: Vec<NodeEntry>,
}

#[derive(Deserialize)]
struct NodeEntry {
    name: String,
    #[serde(default)]
    state: Option<NodeState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NodeState {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    node_running_state: Option<String>,
    #[serde(default)]
    slot_number: Option<u16>,
}

impl From<NodeEntry> for ClusterNode {
    fn from(entry: NodeEntry) -> Self {
        let state = entry.state;
        Self {
            name: entry.name,
            enabled: state.as_ref().and_then(|s| s.enabled),
            running_state: state.as_ref().and_then(|s| s.node_running_state.clone()),
            slot_number: state.and_then(|s| s.slot_number),
        }
    }
}

impl F5osClient {
    /// Set the primary key used to encrypt secrets in the config store.
    ///
    /// `POST .../f5-primary-key:primary-key/f5-primary-key:set`
    pub async fn set_primary_key(&self, passphrase: &SecretString, salt: &SecretString) -> Result<(), Error> {
        info!("setting primary key");
        let body = json!({
            "f5-primary-key:passphrase": passphrase.expose_secret(),
            "f5-primary-key:confirm-passphrase": passphrase.expose_secret(),
            "f5-primary-key:salt": salt.expose_secret(),
            "f5-primary-key:confirm-salt": salt.expose_secret(),
        });
        self.post_json(&format!("{PRIMARY_KEY_PATH}/f5-primary-key:set"), &body)
            .await?;
        Ok(())
    }

    pub async fn primary_key_status(&self) -> Result<Option<PrimaryKeyStatus>, Error> {
        debug!("fetching primary key status");
        let resp: Option<PrimaryKeyResponse> = self.get_json(&format!("{PRIMARY_KEY_PATH}/state")).await?;
        Ok(resp.and_then(|r| r.state))
    }

    /// Generate a self-signed certificate and key on the device.
    ///
    /// `POST .../f5-openconfig-aaa-tls:create-self-signed-cert`
    pub async fn create_self_signed_cert(&self, cert: &SelfSignedCert) -> Result<(), Error> {
        info!(name = %cert.name, key_type = %cert.key_type, "creating self-signed certificate");
        self.post_json(
            &format!("{TLS_PATH}/f5-openconfig-aaa-tls:create-self-signed-cert"),
            &cert.body(),
        )
        .await?;
        Ok(())
    }

    /// List cluster nodes.
    ///
    /// `GET /f5-cluster:cluster/nodes`
    pub async fn list_cluster_nodes(&self) -> Result<Vec<ClusterNode>, Error> {
        debug!("listing cluster nodes");
        let resp: Option<NodesResponse> = self.get_json(CLUSTER_NODES_PATH).await?;
        Ok(resp
            .and_then(|r| r.nodes)
            .map(|n| n.node.into_iter().map(ClusterNode::from).collect())
            .unwrap_or_default())
    }
}
