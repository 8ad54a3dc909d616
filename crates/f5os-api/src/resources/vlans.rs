// VLAN endpoints
//
// `/openconfig-vlan:vlans` -- create/update is a PATCH merge keyed by
// vlan-id, so the same call serves both.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::F5osClient;
use crate::error::Error;

const VLANS_PATH: &str = "/openconfig-vlan:vlans";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vlan {
    pub vlan_id: u16,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct VlanEntry {
    #[serde(rename = "vlan-id")]
    vlan_id: u16,
    #[serde(default)]
    config: Option<VlanConfig>,
}

#[derive(Deserialize)]
struct VlanConfig {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct SingleVlanResponse {
    #[serde(rename = "openconfig-vlan:vlan", default)]
    vlan: Vec<VlanEntry>,
}

#[derive(Deserialize)]
struct VlanListResponse {
    #[serde(rename = "openconfig-vlan:vlans", default)]
    vlans: Option<VlanList>,
}

#[derive(Deserialize)]
struct VlanList {
    #[serde(default)]
    vlan: Vec<VlanEntry>,
}

impl From<VlanEntry> for Vlan {
    fn from(entry: VlanEntry) -> Self {
        Self {
            vlan_id: entry.vlan_id,
            name: entry.config.and_then(|c| c.name),
        }
    }
}

impl F5osClient {
    /// Create or update a VLAN.
    ///
    /// `PATCH /openconfig-vlan:vlans`
    pub async fn upsert_vlan(&self, vlan_id: u16, name: Option<&str>) -> Result<(), Error> {
        debug!(vlan_id, ?name, "upserting vlan");
        let mut config = json!({ "vlan-id": vlan_id });
        if let (Some(name), Some(obj)) = (name, config.as_object_mut()) {
            obj.insert("name".into(), json!(name));
        }
        let body = json!({
            "openconfig-vlan:vlans": {
                "vlan": [{ "vlan-id": vlan_id, "config": config }]
            }
        });
        self.patch_json(VLANS_PATH, &body).await?;
        Ok(())
    }

    /// Read one VLAN.
    ///
    /// `GET /openconfig-vlan:vlans/vlan={id}`
    pub async fn get_vlan(&self, vlan_id: u16) -> Result<Option<Vlan>, Error> {
        debug!(vlan_id, "fetching vlan");
        let resp: Option<SingleVlanResponse> =
            self.get_json(&format!("{VLANS_PATH}/vlan={vlan_id}")).await?;
        Ok(resp.and_then(|r| r.vlan.into_iter().next().map(Vlan::from)))
    }

    /// List all VLANs.
    pub async fn list_vlans(&self) -> Result<Vec<Vlan>, Error> {
        debug!("listing vlans");
        let resp: Option<VlanListResponse> = self.get_json(VLANS_PATH).await?;
        Ok(resp
            .and_then(|r| r.vlans)
            .map(|l| l.vlan.into_iter().map(Vlan::from).collect())
            .unwrap_or_default())
    }

    /// Delete a VLAN. Deleting an absent VLAN succeeds.
    pub async fn delete_vlan(&self, vlan_id: u16) -> Result<(), Error> {
        debug!(vlan_id, "deleting vlan");
        self.delete_path(&format!("{VLANS_PATH}/vlan={vlan_id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn list_response_tolerates_missing_config() {
        let resp: VlanListResponse = serde_json::from_value(json!({
            "openconfig-vlan:vlans": { "vlan": [
                { "vlan-id": 444, "config": { "vlan-id": 444, "name": "ext" } },
                { "vlan-id": 555 }
            ]}
        }))
        .unwrap();
        let vlans: Vec<Vlan> = resp.vlans.unwrap().vlan.into_iter().map(Vlan::from).collect();
        assert_eq!(
            vlans,
            vec![
                Vlan { vlan_id: 444, name: Some("ext".into()) },
                Vlan { vlan_id: 555, name: None },
            ]
        );
    }

    #[test]
    fn empty_list_response_is_empty() {
        let resp: VlanListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.vlans.is_none());
    }
}
