// Physical interface endpoints
//
// VLAN membership of front-panel ports: native (untagged) VLAN and trunk
// (tagged) VLAN list under the openconfig switched-vlan container.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::{F5osClient, encode_key};
use crate::error::Error;

const INTERFACES_PATH: &str = "/openconfig-interfaces:interfaces";

/// VLAN membership of one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwitchedVlan {
    #[serde(default)]
    pub native_vlan: Option<u16>,
    #[serde(default)]
    pub trunk_vlans: Vec<u16>,
}

/// Interface as read back from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub enabled: Option<bool>,
    pub description: Option<String>,
    pub vlans: SwitchedVlan,
}

// ── Response shapes ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct InterfaceResponse {
    #[serde(rename = "openconfig-interfaces:interface", default)]
    interface: Vec<InterfaceEntry>,
}

#[derive(Deserialize)]
struct InterfaceEntry {
    name: String,
    #[serde(default)]
    config: Option<InterfaceConfig>,
    #[serde(rename = "openconfig-if-ethernet:ethernet", default)]
    ethernet: Option<Ethernet>,
}

#[derive(Deserialize)]
struct InterfaceConfig {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct Ethernet {
    #[serde(rename = "openconfig-vlan:switched-vlan", default)]
    switched_vlan: Option<SwitchedVlanContainer>,
}

#[derive(Deserialize)]
struct SwitchedVlanContainer {
    #[serde(default)]
    config: Option<SwitchedVlan>,
}

impl From<InterfaceEntry> for Interface {
    fn from(entry: InterfaceEntry) -> Self {
        let vlans = entry
            .ethernet
            .and_then(|e| e.switched_vlan)
            .and_then(|s| s.config)
            .unwrap_or_default();
        let (enabled, description) = entry
            .config
            .map_or((None, None), |c| (c.enabled, c.description));
        Self {
            name: entry.name,
            enabled,
            description,
            vlans,
        }
    }
}

pub(crate) fn interface_path(name: &str) -> String {
    format!("{INTERFACES_PATH}/interface={}", encode_key(name))
}

fn switched_vlan_path(name: &str) -> String {
    format!(
        "{}/openconfig-if-ethernet:ethernet/openconfig-vlan:switched-vlan/openconfig-vlan:config",
        interface_path(name)
    )
}

impl F5osClient {
    /// Read one interface.
    ///
    /// `GET /openconfig-interfaces:interfaces/interface={name}`
    pub async fn get_interface(&self, name: &str) -> Result<Option<Interface>, Error> {
        debug!(name, "fetching interface");
        let resp: Option<InterfaceResponse> = self.get_json(&interface_path(name)).await?;
        Ok(resp.and_then(|r| r.interface.into_iter().next().map(Interface::from)))
    }

    /// Set native and trunk VLANs on an interface (merge semantics).
    ///
    /// `PATCH /openconfig-interfaces:interfaces`
    pub async fn set_interface_vlans(&self, name: &str, vlans: &SwitchedVlan) -> Result<(), Error> {
        debug!(name, ?vlans, "setting interface vlans");
        let mut config = serde_json::Map::new();
        if let Some(native) = vlans.native_vlan {
            config.insert("native-vlan".into(), json!(native));
        }
        if !vlans.trunk_vlans.is_empty() {
            config.insert("trunk-vlans".into(), json!(vlans.trunk_vlans));
        }
        let body = json!({
            "openconfig-interfaces:interfaces": {
                "interface": [{
                    "name": name,
                    "config": { "name": name },
                    "openconfig-if-ethernet:ethernet": {
                        "openconfig-vlan:switched-vlan": { "config": config }
                    }
                }]
            }
        });
        self.patch_json(INTERFACES_PATH, &body).await?;
        Ok(())
    }

    /// Remove one trunk VLAN from an interface.
    pub async fn remove_trunk_vlan(&self, name: &str, vlan_id: u16) -> Result<(), Error> {
        debug!(name, vlan_id, "removing trunk vlan");
        let path = format!("{}/openconfig-vlan:trunk-vlans={vlan_id}", switched_vlan_path(name));
        self.delete_path(&path).await?;
        Ok(())
    }

    /// Remove the native VLAN from an interface.
    pub async fn remove_native_vlan(&self, name: &str) -> Result<(), Error> {
        debug!(name, "removing native vlan");
        let path = format!("{}/openconfig-vlan:native-vlan", switched_vlan_path(name));
        self.delete_path(&path).await?;
        Ok(())
    }
}
