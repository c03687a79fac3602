// API client module: a small blocking HTTP client for the hairstyle
// service. It sends the face photo plus the hair-shape and hair-color
// templates in one multipart request and gets the composited image back.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use std::path::Path;

use crate::config::AppConfig;

/// Media type guessed from the file extension. Unknown extensions fall
/// back to `application/octet-stream`.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// An in-memory image supplied by the user. Owned by the caller and
/// never written anywhere by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageAsset {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read an image from disk; the name is the file name and the media
    /// type comes from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image file {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(ImageAsset::new(name, media_type_for(path), bytes))
    }

    fn to_part(&self) -> Result<multipart::Part> {
        multipart::Part::bytes(self.bytes.clone())
            .file_name(self.name.clone())
            .mime_str(&self.media_type)
            .with_context(|| format!("Invalid media type `{}` for {}", self.media_type, self.name))
    }
}

/// Image formats we can recognise in a service response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Unknown,
}

impl ImageFormat {
    /// Sniff the leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            ImageFormat::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            ImageFormat::Gif
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Unknown => "bin",
        }
    }
}

/// Composited image returned by the service.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl RenderedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let format = ImageFormat::detect(&bytes);
        RenderedImage { bytes, format }
    }
}

/// Blocking client for the hairstyle service.
#[derive(Clone)]
pub struct SwapClient {
    client: Client,
    base_url: String,
}

impl SwapClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_http_client(client, base_url))
    }

    /// Use an already configured `reqwest` client.
    pub fn with_http_client(client: Client, base_url: impl Into<String>) -> Self {
        SwapClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client pointed at `SWAP_API_URL` (see `config`).
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Self::new(cfg.swap_api_url.clone())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/swap/", self.base_url)
    }

    /// POST the three images as parts `face`, `shape` and `color`. Only a
    /// 200 counts as a result; anything else is an error carrying the
    /// status and body. Single attempt, no retry.
    pub fn swap(&self, face: &ImageAsset, shape: &ImageAsset, color: &ImageAsset) -> Result<RenderedImage> {
        let url = self.endpoint();
        let form = multipart::Form::new()
            .part("face", face.to_part()?)
            .part("shape", shape.to_part()?)
            .part("color", color.to_part()?);

        tracing::info!("Sending hairstyle request to {}", url);
        let res = self.client.post(&url)
            .multipart(form)
            .send()
            .context("Failed to send swap request")?;
        if res.status() != StatusCode::OK {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            tracing::warn!("Hairstyle service answered {}: {}", status, txt);
            anyhow::bail!("Swap failed: {} - {}", status, txt);
        }
        let bytes = res.bytes().context("Reading swap response body")?;
        let image = RenderedImage::new(bytes.to_vec());
        tracing::info!("Received {} bytes ({:?})", image.bytes.len(), image.format);
        Ok(image)
    }
}
