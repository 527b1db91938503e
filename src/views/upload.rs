use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::api::ImageApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{Image, NewImage};
use crate::session::Session;

const UPLOAD_FALLBACK: &str = "Upload failed. Please try again.";

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: String,
    pub file: Option<SelectedFile>,
    pub expose_me: bool,
}

impl UploadForm {
    pub fn validate(&self) -> ClientResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Please enter a title".to_string()));
        }
        match &self.file {
            Some(file) if !file.bytes.is_empty() => Ok(()),
            _ => Err(ClientError::Validation("Please select an image".to_string())),
        }
    }

    /// Request body with the file inlined as a base64 `data:` URL. No resizing
    /// and no size cap; the backend decides what it accepts.
    pub fn encode(&self) -> ClientResult<NewImage> {
        self.validate()?;
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| ClientError::Validation("Please select an image".to_string()))?;
        Ok(NewImage {
            title: self.title.trim().to_string(),
            image_data: data_url(&file.file_name, &file.bytes),
            expose_me: self.expose_me,
        })
    }

    /// Uploads the image, returning the message to show on failure.
    pub async fn submit(&self, api: &dyn ImageApi, session: &Session) -> Result<Image, String> {
        let Some(token) = session.token() else {
            return Err("Please log in to upload".to_string());
        };
        let body = self.encode().map_err(|e| e.user_message(UPLOAD_FALLBACK))?;
        let image = api.upload_image(token, &body).await.map_err(|e| {
            tracing::warn!("Upload failed: {}", e);
            e.user_message(UPLOAD_FALLBACK)
        })?;
        tracing::info!(image = %image.id, featured = image.expose_me, "Uploaded image");
        Ok(image)
    }
}

pub fn data_url(file_name: &str, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(file_name)
        .first_raw()
        .filter(|m| m.starts_with("image/"))
        .unwrap_or("image/jpeg");
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
