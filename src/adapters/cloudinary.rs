use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::adapters::remote::read_failure;
use crate::config::toml_config::ImageSettings;
use crate::domain::ports::{ImageHost, ImageUpload};
use crate::utils::error::{KyoError, Result};

const SERVICE: &str = "Cloudinary";
const UPLOAD_FAILED: &str = "Image upload failed";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Unsigned uploads through an upload preset.
pub struct CloudinaryHost {
    client: Client,
    settings: ImageSettings,
}

impl CloudinaryHost {
    pub fn new(settings: ImageSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.settings.base_url, self.settings.cloud_name
        )
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        let size = image.bytes.len();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone());

        tracing::debug!("📤 Uploading {} ({} bytes)", image.file_name, size);
        let response = self.client.post(self.upload_url()).multipart(form).send().await?;

        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            tracing::warn!("❌ Upload of {} failed with {}: {}", image.file_name, status, message);
            return Err(KyoError::RemoteError {
                service: SERVICE,
                status,
                message: format!("{UPLOAD_FAILED}: {message}"),
            });
        }

        let body: UploadResponse = response.json().await?;
        let url = body
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| KyoError::DecodeError {
                service: SERVICE,
                message: format!("{UPLOAD_FAILED}: response without secure_url"),
            })?;

        tracing::info!("🖼️ Uploaded {} -> {}", image.file_name, url);
        Ok(url)
    }
}
