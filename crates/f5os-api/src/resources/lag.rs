// Link aggregation endpoints
//
// A LAG is an `ieee8023adLag` interface plus, for LACP LAGs, an entry
// under `/openconfig-lacp:lacp`. Member ports point at the LAG through
// their ethernet `aggregate-id`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{F5osClient, encode_key};
use crate::error::Error;
use crate::resources::interfaces::{SwitchedVlan, interface_path};

const LACP_INTERFACES_PATH: &str = "/openconfig-lacp:lacp/interfaces";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum LagType {
    #[strum(serialize = "LACP")]
    Lacp,
    #[strum(serialize = "STATIC")]
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum LacpMode {
    #[strum(serialize = "ACTIVE")]
    Active,
    #[strum(serialize = "PASSIVE")]
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum LacpInterval {
    #[strum(serialize = "FAST")]
    Fast,
    #[strum(serialize = "SLOW")]
    Slow,
}

/// Desired state of a LAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagSpec {
    pub name: String,
    pub lag_type: LagType,
    pub mode: LacpMode,
    pub interval: LacpInterval,
    pub members: Vec<String>,
    pub vlans: SwitchedVlan,
}

impl LagSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lag_type: LagType::Lacp,
            mode: LacpMode::Active,
            interval: LacpInterval::Fast,
            members: Vec::new(),
            vlans: SwitchedVlan::default(),
        }
    }
}

fn member_entries(lag: &str, members: &[String]) -> Vec<Value> {
    members
        .iter()
        .map(|m| {
            json!({
                "name": m,
                "config": { "name": m },
                "openconfig-if-ethernet:ethernet": {
                    "config": { "openconfig-if-aggregate:aggregate-id": lag }
                }
            })
        })
        .collect()
}

pub(crate) fn lag_body(spec: &LagSpec) -> Value {
    let mut vlan_config = serde_json::Map::new();
    if let Some(native) = spec.vlans.native_vlan {
        vlan_config.insert("native-vlan".into(), json!(native));
    }
    if !spec.vlans.trunk_vlans.is_empty() {
        vlan_config.insert("trunk-vlans".into(), json!(spec.vlans.trunk_vlans));
    }

    let mut interfaces = vec![json!({
        "name": spec.name,
        "config": {
            "name": spec.name,
            "type": "iana-if-type:ieee8023adLag",
            "enabled": true
        },
        "openconfig-if-aggregate:aggregation": {
            "config": {
                "lag-type": spec.lag_type.to_string(),
                "f5-if-aggregate:distribution-hash": "src-dst-ipport"
            },
            "openconfig-vlan:switched-vlan": { "config": vlan_config }
        }
    })];
    interfaces.extend(member_entries(&spec.name, &spec.members));

    let mut body = json!({
        "openconfig-interfaces:interfaces": { "interface": interfaces }
    });
    if spec.lag_type == LagType::Lacp {
        body["openconfig-lacp:lacp"] = json!({
            "interfaces": {
                "interface": [{
                    "name": spec.name,
                    "config": {
                        "name": spec.name,
                        "interval": spec.interval.to_string(),
                        "lacp-mode": spec.mode.to_string()
                    }
                }]
            }
        });
    }
    body
}

impl F5osClient {
    /// Create or update a LAG with its members and LACP settings.
    ///
    /// `PATCH /` with interfaces and lacp containers in one body.
    pub async fn upsert_lag(&self, spec: &LagSpec) -> Result<(), Error> {
        debug!(name = %spec.name, members = ?spec.members, "upserting lag");
        self.patch_json("/", &lag_body(spec)).await?;
        Ok(())
    }

    /// Read the LAG interface. Loosely typed: aggregation state differs
    /// between rSeries and VELOS firmware.
    pub async fn get_lag(&self, name: &str) -> Result<Option<Value>, Error> {
        debug!(name, "fetching lag");
        self.get_json(&interface_path(name)).await
    }

    /// Attach more member ports to a LAG.
    pub async fn add_lag_members(&self, lag: &str, members: &[String]) -> Result<(), Error> {
        debug!(lag, ?members, "adding lag members");
        let body = json!({
            "openconfig-interfaces:interfaces": { "interface": member_entries(lag, members) }
        });
        self.patch_json("/openconfig-interfaces:interfaces", &body).await?;
        Ok(())
    }

    /// Detach a member port from whatever LAG it belongs to.
    pub async fn remove_lag_member(&self, member: &str) -> Result<(), Error> {
        debug!(member, "removing lag member");
        let path = format!(
            "{}/openconfig-if-ethernet:ethernet/config/openconfig-if-aggregate:aggregate-id",
            interface_path(member)
        );
        self.delete_path(&path).await?;
        Ok(())
    }

    /// Delete a LAG: members first, then the LACP entry, then the interface.
    pub async fn delete_lag(&self, name: &str, members: &[String]) -> Result<(), Error> {
        debug!(name, "deleting lag");
        for member in members {
            self.remove_lag_member(member).await?;
        }
        self.delete_path(&format!("{LACP_INTERFACES_PATH}/interface={}", encode_key(name)))
            .await?;
        self.delete_path(&interface_path(name)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lacp_lag_body_carries_members_and_lacp_container() {
        let mut spec = LagSpec::new("lag1");
        spec.members = vec!["1.0".into(), "2.0".into()];
        spec.vlans.native_vlan = Some(444);
        let body = lag_body(&spec);

        let ifaces = body["openconfig-interfaces:interfaces"]["interface"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert_eq!(ifaces.len(), 3);
        assert_eq!(
            ifaces[0]["openconfig-if-aggregate:aggregation"]["config"]["lag-type"],
            "LACP"
        );
        assert_eq!(
            ifaces[2]["openconfig-if-ethernet:ethernet"]["config"]["openconfig-if-aggregate:aggregate-id"],
            "lag1"
        );
        assert_eq!(
            body["openconfig-lacp:lacp"]["interfaces"]["interface"][0]["config"]["lacp-mode"],
            "ACTIVE"
        );
    }

    #[test]
    fn static_lag_has_no_lacp_container() {
        let mut spec = LagSpec::new("lag2");
        spec.lag_type = LagType::Static;
        let body = lag_body(&spec);
        assert!(body.get("openconfig-lacp:lacp").is_none());
    }
}
