// Licensing endpoints

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::client::F5osClient;
use crate::error::Error;

const LICENSING_PATH: &str = "/openconfig-system:system/f5-system-licensing:licensing";

/// Installed license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct License {
    pub registration_key: Option<String>,
    pub add_on_keys: Vec<String>,
    /// Full license text as reported by the device.
    pub license: Option<String>,
}

#[derive(Deserialize)]
struct LicensingResponse {
    #[serde(rename = "f5-system-licensing:licensing", default)]
    licensing: Option<Licensing>,
}

#[derive(Deserialize)]
struct Licensing {
    #[serde(default)]
    config: Option<LicensingConfig>,
    #[serde(default)]
    state: Option<LicensingState>,
}

#[derive(Deserialize)]
struct LicensingConfig {
    #[serde(rename = "registration-key", default)]
    registration_key: Option<RegistrationKey>,
}

#[derive(Deserialize)]
struct RegistrationKey {
    #[serde(default)]
    base: Option<String>,
    #[serde(rename = "addon", default)]
    add_on: Vec<String>,
}

#[derive(Deserialize)]
struct LicensingState {
    #[serde(default)]
    license: Option<String>,
}

#[derive(Deserialize)]
struct EulaResponse {
    #[serde(rename = "f5-system-licensing-install:output", alias = "output", default)]
    output: Option<EulaOutput>,
}

#[derive(Deserialize)]
struct EulaOutput {
    #[serde(rename = "eula-text", default)]
    eula_text: Option<String>,
}

fn key_body(registration_key: &str, add_on_keys: &[String]) -> serde_json::Value {
    let mut body = json!({ "f5-system-licensing-install:registration-key": registration_key });
    if !add_on_keys.is_empty() {
        body["f5-system-licensing-install:add-on-keys"] = json!(add_on_keys);
    }
    body
}

impl F5osClient {
    /// Activate a license with the device's automatic licensing flow.
    ///
    /// `POST .../f5-system-licensing-install:install`
    pub async fn install_license(&self, registration_key: &str, add_on_keys: &[String]) -> Result<(), Error> {
        info!(add_ons = add_on_keys.len(), "installing license");
        self.post_json(
            &format!("{LICENSING_PATH}/f5-system-licensing-install:install"),
            &key_body(registration_key, add_on_keys),
        )
        .await?;
        Ok(())
    }

    pub async fn get_license(&self) -> Result<Option<License>, Error> {
        debug!("fetching license");
        let resp: Option<LicensingResponse> = self.get_json(LICENSING_PATH).await?;
        Ok(resp.and_then(|r| r.licensing).map(|l| {
            let key = l.config.and_then(|c| c.registration_key);
            License {
                registration_key: key.as_ref().and_then(|k| k.base.clone()),
                add_on_keys: key.map(|k| k.add_on).unwrap_or_default(),
                license: l.state.and_then(|s| s.license),
            }
        }))
    }

    /// Fetch the EULA the registration key must accept.
    ///
    /// `POST .../f5-system-licensing-install:get-eula`
    pub async fn get_eula(&self, registration_key: &str, add_on_keys: &[String]) -> Result<Option<String>, Error> {
        debug!("fetching eula");
        let resp: Option<EulaResponse> = self
            .post_json(
                &format!("{LICENSING_PATH}/f5-system-licensing-install:get-eula"),
                &key_body(registration_key, add_on_keys),
            )
            .await?
            .json()?;
        Ok(resp.and_then(|r| r.output).and_then(|o| o.eula_text))
    }
}
