// Chassis partition and slot endpoints (VELOS system controller)
//
// A partition is created with an ISO version and management address,
// then given blades by assigning slots to it. Bring-up is tracked per
// controller under the partition's state.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{F5osClient, encode_key};
use crate::error::Error;
use crate::poll::{PollConfig, PollStatus, classify_partition};

const PARTITIONS_PATH: &str = "/f5-system-partition:partitions";
const SLOTS_PATH: &str = "/f5-system-slot:slots";

/// Partition name used by the device for unassigned slots.
pub const UNASSIGNED: &str = "none";

/// Desired partition configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    pub name: String,
    pub iso_version: String,
    pub mgmt_ipv4: Option<MgmtIpv4>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MgmtIpv4 {
    pub address: String,
    pub prefix_length: u8,
    pub gateway: String,
}

/// Partition as read back from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub name: String,
    pub enabled: Option<bool>,
    pub iso_version: Option<String>,
    pub mgmt_ipv4: Option<MgmtIpv4>,
}

/// One chassis slot and the partition it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Slot {
    pub slot_num: u16,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub partition: Option<String>,
}

/// Per-controller bring-up state of a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControllerStatus {
    pub controller: u16,
    #[serde(default)]
    pub partition_status: Option<String>,
}

// ── Response shapes ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct PartitionResponse {
    #[serde(rename = "f5-system-partition:partition", default)]
    partition: Vec<PartitionEntry>,
}

#[derive(Deserialize)]
struct PartitionEntry {
    name: String,
    #[serde(default)]
    config: Option<PartitionConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PartitionConfig {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    iso_version: Option<String>,
    #[serde(default)]
    mgmt_ip: Option<MgmtIp>,
}

#[derive(Deserialize)]
struct MgmtIp {
    #[serde(default)]
    ipv4: Option<MgmtIpv4>,
}

#[derive(Deserialize)]
struct SlotsResponse {
    #[serde(rename = "f5-system-slot:slots", default)]
    slots: Option<SlotList>,
}

#[derive(Deserialize)]
struct SlotList {
    #[serde(default)]
    slot: Vec<Slot>,
}

#[derive(Deserialize)]
struct ControllersResponse {
    #[serde(rename = "f5-system-partition:controllers", default)]
    controllers: Option<ControllerList>,
}

#[derive(Deserialize)]
struct ControllerList {
    #[serde(default)]
    controller: Vec<ControllerStatus>,
}

impl From<PartitionEntry> for Partition {
    fn from(entry: PartitionEntry) -> Self {
        let config = entry.config;
        Self {
            name: entry.name,
            enabled: config.as_ref().and_then(|c| c.enabled),
            iso_version: config.as_ref().and_then(|c| c.iso_version.clone()),
            mgmt_ipv4: config.and_then(|c| c.mgmt_ip).and_then(|m| m.ipv4),
        }
    }
}

fn partition_path(name: &str) -> String {
    format!("{PARTITIONS_PATH}/partition={}", encode_key(name))
}

pub(crate) fn slots_body(partition: &str, slots: &[u16]) -> serde_json::Value {
    let entries: Vec<_> = slots
        .iter()
        .map(|n| json!({ "slot-num": n, "enabled": true, "partition": partition }))
        .collect();
    json!({ "f5-system-slot:slots": { "slot": entries } })
}

impl F5osClient {
    /// Create a partition.
    ///
    /// `POST /f5-system-partition:partitions`
    pub async fn create_partition(&self, spec: &PartitionSpec) -> Result<(), Error> {
        info!(name = %spec.name, iso = %spec.iso_version, "creating partition");
        let mut config = json!({
            "enabled": spec.enabled,
            "iso-version": spec.iso_version,
        });
        if let Some(ref ip) = spec.mgmt_ipv4 {
            config["mgmt-ip"] = json!({ "ipv4": ip });
        }
        let body = json!({ "partition": [{ "name": spec.name, "config": config }] });
        self.post_json(PARTITIONS_PATH, &body).await?;
        Ok(())
    }

    /// Move a partition to another ISO version.
    ///
    /// `PATCH /f5-system-partition:partitions/partition={name}/config`
    pub async fn update_partition(&self, name: &str, iso_version: &str) -> Result<(), Error> {
        info!(name, iso = iso_version, "updating partition");
        let body = json!({ "f5-system-partition:config": { "iso-version": iso_version } });
        self.patch_json(&format!("{}/config", partition_path(name)), &body)
            .await?;
        Ok(())
    }

    /// Read a partition.
    pub async fn get_partition(&self, name: &str) -> Result<Option<Partition>, Error> {
        debug!(name, "fetching partition");
        let resp: Option<PartitionResponse> = self.get_json(&partition_path(name)).await?;
        Ok(resp.and_then(|r| r.partition.into_iter().next().map(Partition::from)))
    }

    /// Release the partition's slots, then delete it.
    pub async fn delete_partition(&self, name: &str) -> Result<(), Error> {
        info!(name, "deleting partition");
        let owned: Vec<u16> = self
            .list_slots()
            .await?
            .into_iter()
            .filter(|s| s.partition.as_deref() == Some(name))
            .map(|s| s.slot_num)
            .collect();
        if !owned.is_empty() {
            self.assign_slots(UNASSIGNED, &owned).await?;
        }
        self.delete_path(&partition_path(name)).await?;
        Ok(())
    }

    /// Per-controller status of a partition.
    ///
    /// `GET .../partition={name}/state/controllers`
    pub async fn partition_status(&self, name: &str) -> Result<Vec<ControllerStatus>, Error> {
        let resp: Option<ControllersResponse> = self
            .get_json(&format!("{}/state/controllers", partition_path(name)))
            .await?;
        Ok(resp
            .and_then(|r| r.controllers)
            .map(|c| c.controller)
            .unwrap_or_default())
    }

    /// Poll until every controller reports the partition running.
    pub async fn wait_partition_running(
        &self,
        name: &str,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let operation = format!("partition {name} bring-up");
        self.poll_until(&operation, config, cancel, || async {
            let controllers = self.partition_status(name).await?;
            let status: PollStatus<()> =
                classify_partition(controllers.iter().map(|c| c.partition_status.as_deref()));
            Ok(status)
        })
        .await
    }

    /// List chassis slots.
    ///
    /// `GET /f5-system-slot:slots`
    pub async fn list_slots(&self) -> Result<Vec<Slot>, Error> {
        debug!("listing slots");
        let resp: Option<SlotsResponse> = self.get_json(SLOTS_PATH).await?;
        Ok(resp.and_then(|r| r.slots).map(|s| s.slot).unwrap_or_default())
    }

    /// Assign slots to a partition; [`UNASSIGNED`] releases them.
    ///
    /// `PATCH /f5-system-slot:slots`
    pub async fn assign_slots(&self, partition: &str, slots: &[u16]) -> Result<(), Error> {
        info!(partition, ?slots, "assigning slots");
        self.patch_json(SLOTS_PATH, &slots_body(partition, slots)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slot_assignment_body() {
        let body = slots_body("part1", &[1, 2]);
        let slots = &body["f5-system-slot:slots"]["slot"];
        assert_eq!(slots[1]["slot-num"], 2);
        assert_eq!(slots[0]["partition"], "part1");
    }

    #[test]
    fn partition_entry_reads_mgmt_address() {
        let resp: PartitionResponse = serde_json::from_value(json!({
            "f5-system-partition:partition": [{
                "name": "part1",
                "config": {
                    "enabled": true,
                    "iso-version": "1.5.1-5621",
                    "mgmt-ip": { "ipv4": {
                        "address": "10.1.1.10",
                        "prefix-length": 24,
                        "gateway": "10.1.1.1"
                    }}
                }
            }]
        }))
        .unwrap();
        let part = Partition::from(resp.partition.into_iter().next().unwrap());
        assert_eq!(part.iso_version.as_deref(), Some("1.5.1-5621"));
        assert_eq!(part.mgmt_ipv4.unwrap().prefix_length, 24);
    }

    #[test]
    fn controller_statuses_decode() {
        let resp: ControllersResponse = serde_json::from_value(json!({
            "f5-system-partition:controllers": { "controller": [
                { "controller": 1, "partition-status": "running-active" },
                { "controller": 2, "partition-status": "starting" }
            ]}
        }))
        .unwrap();
        let list = resp.controllers.unwrap().controller;
        assert!(matches!(
            classify_partition(list.iter().map(|c| c.partition_status.as_deref())),
            PollStatus::Pending(_)
        ));
    }
}
