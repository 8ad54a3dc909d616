// Platform detection
//
// Classifies the device once per session from the platform components list:
// rSeries appliances expose a `platform` component, VELOS system controllers
// a `chassis` component, and a VELOS partition exposes exactly one component
// carrying its software inventory. Response shapes vary across firmware
// versions, so every lookup is optional and any mismatch degrades to
// `PlatformKind::Unknown` rather than an error.

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, warn};

use crate::client::F5osClient;
use crate::error::Error;

const COMPONENTS_PATH: &str = "/openconfig-platform:components";
const RSERIES_IMAGE_PATH: &str = "/openconfig-system:system/f5-system-image:image/state/install";
const CONTROLLER_IMAGE_PATH: &str =
    "/openconfig-system:system/f5-system-controller-image:image/state/controllers";

/// What kind of F5OS system the session talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum PlatformKind {
    #[strum(serialize = "rSeries Platform")]
    RseriesPlatform,
    #[strum(serialize = "Velos Partition")]
    VelosPartition,
    #[strum(serialize = "Velos Controller")]
    VelosController,
    #[strum(serialize = "Unknown")]
    Unknown,
}

/// Result of the detection cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub kind: PlatformKind,
    /// Component description, e.g. `R10900` on rSeries.
    pub description: Option<String>,
    /// Installed OS version, when it could be determined.
    pub version: Option<String>,
}

impl PlatformInfo {
    pub const fn unknown() -> Self {
        Self {
            kind: PlatformKind::Unknown,
            description: None,
            version: None,
        }
    }

    /// The platform type string reported to callers: the rSeries model
    /// description when known, the kind's label otherwise.
    pub fn platform_type(&self) -> String {
        match (self.kind, self.description.as_deref()) {
            (PlatformKind::RseriesPlatform, Some(desc)) => desc.to_owned(),
            (kind, _) => kind.to_string(),
        }
    }

    pub fn is_velos_controller(&self) -> bool {
        self.kind == PlatformKind::VelosController
    }

    pub fn is_velos_partition(&self) -> bool {
        self.kind == PlatformKind::VelosPartition
    }
}

impl Default for PlatformInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

// ── Response shapes ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ComponentsResponse {
    #[serde(rename = "openconfig-platform:components", default)]
    components: Option<ComponentList>,
}

#[derive(Debug, Default, Deserialize)]
struct ComponentList {
    #[serde(default)]
    component: Vec<Component>,
}

#[derive(Debug, Default, Deserialize)]
struct Component {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: Option<ComponentState>,
    #[serde(
        default,
        rename = "software",
        alias = "f5-platform:software",
        alias = "openconfig-platform-software:software"
    )]
    software: Option<Software>,
}

#[derive(Debug, Default, Deserialize)]
struct ComponentState {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Software {
    #[serde(default)]
    state: Option<SoftwareState>,
}

#[derive(Debug, Default, Deserialize)]
struct SoftwareState {
    #[serde(rename = "software-components", default)]
    software_components: Option<SoftwareComponents>,
}

#[derive(Debug, Default, Deserialize)]
struct SoftwareComponents {
    #[serde(rename = "software-component", default)]
    software_component: Vec<SoftwareComponent>,
}

#[derive(Debug, Default, Deserialize)]
struct SoftwareComponent {
    #[serde(rename = "software-index", default)]
    software_index: Option<String>,
    #[serde(default)]
    state: Option<SoftwareComponentState>,
}

#[derive(Debug, Default, Deserialize)]
struct SoftwareComponentState {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RseriesImageResponse {
    #[serde(rename = "f5-system-image:install", default)]
    install: Option<RseriesInstall>,
}

#[derive(Debug, Default, Deserialize)]
struct RseriesInstall {
    #[serde(rename = "install-os-version", default)]
    os_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ControllerImageResponse {
    #[serde(rename = "f5-system-controller-image:controllers", default)]
    controllers: Option<ControllerList>,
}

#[derive(Debug, Default, Deserialize)]
struct ControllerList {
    #[serde(default)]
    controller: Vec<ControllerImage>,
}

#[derive(Debug, Default, Deserialize)]
struct ControllerImage {
    #[serde(rename = "os-version", default)]
    os_version: Option<String>,
    #[serde(rename = "install-status", default)]
    install_status: Option<String>,
}

// ── Classification ───────────────────────────────────────────────────

/// First stage of the cascade, decided from the components list alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    Rseries { description: String },
    VelosController { description: String },
    VelosPartition { version: Option<String> },
    Unknown,
}

pub(crate) fn classify_components(resp: &ComponentsResponse) -> Classification {
    let components = resp
        .components
        .as_ref()
        .map_or(&[][..], |list| list.component.as_slice());

    match components {
        [] => Classification::Unknown,
        [only] => Classification::VelosPartition {
            version: partition_version(only),
        },
        many => {
            if let Some(description) = described(many, "platform") {
                Classification::Rseries { description }
            } else if let Some(description) = described(many, "chassis") {
                Classification::VelosController { description }
            } else {
                Classification::Unknown
            }
        }
    }
}

fn described(components: &[Component], name: &str) -> Option<String> {
    components
        .iter()
        .find(|c| c.name.as_deref() == Some(name))
        .and_then(|c| c.state.as_ref())
        .and_then(|s| s.description.clone())
}

/// Version from the first software component, adopted only for `blade-os`.
fn partition_version(component: &Component) -> Option<String> {
    let first = component
        .software
        .as_ref()?
        .state
        .as_ref()?
        .software_components
        .as_ref()?
        .software_component
        .first()?;
    if first.software_index.as_deref() != Some("blade-os") {
        return None;
    }
    first.state.as_ref()?.version.clone()
}

/// Version of the controller(s) reporting a successful install; the last
/// such controller wins.
fn controller_version(resp: &ControllerImageResponse) -> Option<String> {
    resp.controllers
        .as_ref()?
        .controller
        .iter()
        .rev()
        .filter(|c| c.install_status.as_deref() == Some("success"))
        .find_map(|c| c.os_version.clone())
}

// ── Detection ────────────────────────────────────────────────────────

impl F5osClient {
    /// Run the detection cascade against the device.
    ///
    /// Never fails: unexpected shapes or failed probes are logged and
    /// yield [`PlatformKind::Unknown`] (or a known kind without version).
    pub async fn detect_platform(&self) -> PlatformInfo {
        let span = self.inner.span.clone();
        match self.probe_platform().instrument(span).await {
            Ok(info) => {
                info!(
                    parent: &self.inner.span,
                    kind = %info.kind,
                    version = info.version.as_deref().unwrap_or("-"),
                    "platform detected"
                );
                info
            }
            Err(e) => {
                warn!(parent: &self.inner.span, error = %e, "platform detection failed; treating platform as unknown");
                PlatformInfo::unknown()
            }
        }
    }

    async fn probe_platform(&self) -> Result<PlatformInfo, Error> {
        let components: ComponentsResponse =
            self.get_json(COMPONENTS_PATH).await?.unwrap_or_default();

        let info = match classify_components(&components) {
            Classification::Rseries { description } => PlatformInfo {
                kind: PlatformKind::RseriesPlatform,
                version: self.version_or_none(RSERIES_IMAGE_PATH, |r: RseriesImageResponse| {
                    r.install.and_then(|i| i.os_version)
                })
                .await,
                description: Some(description),
            },
            Classification::VelosController { description } => PlatformInfo {
                kind: PlatformKind::VelosController,
                version: self
                    .version_or_none(CONTROLLER_IMAGE_PATH, |r: ControllerImageResponse| {
                        controller_version(&r)
                    })
                    .await,
                description: Some(description),
            },
            Classification::VelosPartition { version } => PlatformInfo {
                kind: PlatformKind::VelosPartition,
                description: None,
                version,
            },
            Classification::Unknown => {
                debug!("components list matched no known platform shape");
                PlatformInfo::unknown()
            }
        };
        Ok(info)
    }

    /// Fetch an image-state endpoint; failures leave the version unset.
    async fn version_or_none<T, F>(&self, path: &str, extract: F) -> Option<String>
    where
        T: serde::de::DeserializeOwned,
        F: FnOnce(T) -> Option<String>,
    {
        match self.get_json::<T>(path).await {
            Ok(Some(resp)) => extract(resp),
            Ok(None) => None,
            Err(e) => {
                warn!(path, error = %e, "image version lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> ComponentsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rseries_platform_component_wins() {
        let resp = parse(json!({
            "openconfig-platform:components": { "component": [
                { "name": "platform", "state": { "description": "r10900" } },
                { "name": "lcd", "state": { "description": "LCD" } }
            ]}
        }));
        assert_eq!(
            classify_components(&resp),
            Classification::Rseries {
                description: "r10900".into()
            }
        );
    }

    #[test]
    fn chassis_component_means_velos_controller() {
        let resp = parse(json!({
            "openconfig-platform:components": { "component": [
                { "name": "blade-1" },
                { "name": "chassis", "state": { "description": "CX410" } }
            ]}
        }));
        assert_eq!(
            classify_components(&resp),
            Classification::VelosController {
                description: "CX410".into()
            }
        );
    }

    #[test]
    fn platform_without_description_falls_through_to_unknown() {
        let resp = parse(json!({
            "openconfig-platform:components": { "component": [
                { "name": "platform", "state": {} },
                { "name": "fan-1" }
            ]}
        }));
        assert_eq!(classify_components(&resp), Classification::Unknown);
    }

    #[test]
    fn single_component_adopts_blade_os_version() {
        let resp = parse(json!({
            "openconfig-platform:components": { "component": [{
                "name": "blade",
                "software": { "state": { "software-components": { "software-component": [
                    { "software-index": "blade-os", "state": { "version": "1.6.1-12345" } }
                ]}}}
            }]}
        }));
        assert_eq!(
            classify_components(&resp),
            Classification::VelosPartition {
                version: Some("1.6.1-12345".into())
            }
        );
    }

    #[test]
    fn single_component_ignores_other_software_index() {
        let resp = parse(json!({
            "openconfig-platform:components": { "component": [{
                "name": "blade",
                "software": { "state": { "software-components": { "software-component": [
                    { "software-index": "blade-services", "state": { "version": "9.9.9" } }
                ]}}}
            }]}
        }));
        assert_eq!(
            classify_components(&resp),
            Classification::VelosPartition { version: None }
        );
    }

    #[test]
    fn missing_or_empty_components_are_unknown() {
        assert_eq!(
            classify_components(&parse(json!({}))),
            Classification::Unknown
        );
        assert_eq!(
            classify_components(&parse(json!({
                "openconfig-platform:components": { "component": [] }
            }))),
            Classification::Unknown
        );
    }

    #[test]
    fn last_successful_controller_version_wins() {
        let resp: ControllerImageResponse = serde_json::from_value(json!({
            "f5-system-controller-image:controllers": { "controller": [
                { "number": 1, "os-version": "1.5.0", "install-status": "success" },
                { "number": 2, "os-version": "1.6.0", "install-status": "success" },
                { "number": 3, "os-version": "1.7.0", "install-status": "in-progress" }
            ]}
        }))
        .unwrap();
        assert_eq!(controller_version(&resp).as_deref(), Some("1.6.0"));
    }

    #[test]
    fn platform_type_prefers_rseries_description() {
        let info = PlatformInfo {
            kind: PlatformKind::RseriesPlatform,
            description: Some("R5R10".into()),
            version: None,
        };
        assert_eq!(info.platform_type(), "R5R10");
        assert_eq!(PlatformInfo::unknown().platform_type(), "Unknown");
        assert_eq!(PlatformKind::VelosPartition.to_string(), "Velos Partition");
    }
}
