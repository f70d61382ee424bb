//! Logo sources and asynchronous logo decoding

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::DynamicImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

/// Where a logo image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// Encoded image bytes (PNG, JPEG, ...)
    Bytes(Bytes),
    /// A `data:<mime>;base64,<payload>` URI, as produced by browser file readers
    DataUri(String),
    /// An image file on disk
    Path(PathBuf),
}

impl LogoSource {
    /// Interpret a user-supplied string: `data:` URIs are kept inline,
    /// anything else is treated as a file path.
    pub fn from_user_input(value: &str) -> Self {
        if value.starts_with("data:") {
            LogoSource::DataUri(value.to_string())
        } else {
            LogoSource::Path(PathBuf::from(value))
        }
    }

    /// Read the raw encoded bytes of the logo.
    pub async fn read_bytes(&self) -> Result<Bytes> {
        match self {
            LogoSource::Bytes(bytes) => Ok(bytes.clone()),
            LogoSource::DataUri(uri) => decode_data_url(uri).map(Bytes::from),
            LogoSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| Error::LogoLoad(format!("{}: {e}", path.display()))),
        }
    }

    /// Read and decode the logo. Decoding runs on the blocking pool.
    pub async fn load(&self) -> Result<DynamicImage> {
        let bytes = self.read_bytes().await?;
        if bytes.is_empty() {
            return Err(Error::LogoLoad("logo data is empty".to_string()));
        }

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await?
            .map_err(|e| Error::LogoLoad(e.to_string()))?;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "Decoded logo image"
        );

        Ok(image)
    }

    fn describe(&self) -> String {
        match self {
            LogoSource::Bytes(bytes) => data_url("application/octet-stream", bytes),
            LogoSource::DataUri(uri) => uri.clone(),
            LogoSource::Path(path) => path.display().to_string(),
        }
    }
}

impl Serialize for LogoSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.describe())
    }
}

impl<'de> Deserialize<'de> for LogoSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LogoSource::from_user_input(&raw))
    }
}

/// Build a base64 `data:` URL for the given bytes.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Extract the payload of a base64 `data:` URL.
pub fn decode_data_url(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::LogoLoad("not a data: URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::LogoLoad("data: URI has no payload".to_string()))?;

    if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(Error::LogoLoad(
            "only base64-encoded data: URIs are supported".to_string(),
        ));
    }

    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::LogoLoad(format!("invalid base64 in data: URI: {e}")))
}
