// Tenant image endpoints
//
// Images are pulled onto the device with a file-transfer import into
// `images/tenant`, then show up under `/f5-tenant-images:images`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{F5osClient, encode_key};
use crate::error::Error;
use crate::poll::PollConfig;
use crate::resources::file_transfer::{RemoteFile, TransferKey};

const IMAGES_PATH: &str = "/f5-tenant-images:images";

/// Local directory tenant images are imported into.
pub const TENANT_IMAGE_DIR: &str = "images/tenant";

/// Tenant image as listed by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TenantImage {
    pub name: String,
    #[serde(default)]
    pub in_use: Option<bool>,
    #[serde(default, rename = "type")]
    pub image_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(rename = "f5-tenant-images:image", default)]
    image: Vec<TenantImage>,
}

impl F5osClient {
    /// Start importing a tenant image from a remote server.
    pub async fn import_tenant_image(&self, remote: &RemoteFile) -> Result<TransferKey, Error> {
        self.import_file(remote, TENANT_IMAGE_DIR).await
    }

    /// Import a tenant image and wait for the transfer to finish. Returns
    /// the image entry if the device already lists it.
    pub async fn import_tenant_image_and_wait(
        &self,
        remote: &RemoteFile,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<Option<TenantImage>, Error> {
        let key = self.import_tenant_image(remote).await?;
        self.wait_transfer(&key, config, cancel).await?;
        info!(image = remote.file_name(), "tenant image imported");
        self.get_tenant_image(remote.file_name()).await
    }

    /// Read one tenant image.
    ///
    /// `GET /f5-tenant-images:images/image={name}`
    pub async fn get_tenant_image(&self, name: &str) -> Result<Option<TenantImage>, Error> {
        debug!(name, "fetching tenant image");
        let resp: Option<ImageResponse> = self
            .get_json(&format!("{IMAGES_PATH}/image={}", encode_key(name)))
            .await?;
        Ok(resp.and_then(|r| r.image.into_iter().next()))
    }

    /// Remove a tenant image from the device.
    ///
    /// `POST /f5-tenant-images:images/remove`
    pub async fn remove_tenant_image(&self, name: &str) -> Result<(), Error> {
        info!(name, "removing tenant image");
        let body = json!({ "f5-tenant-images:name": name });
        self.post_json(&format!("{IMAGES_PATH}/remove"), &body).await?;
        Ok(())
    }
}
