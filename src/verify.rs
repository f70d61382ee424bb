//! Scan verification using rqrr
//!
//! Decodes a rendered bitmap the way a reader would, to confirm that the
//! composited symbol (logo occlusion, custom colors and shapes included)
//! still yields its payload.

use crate::error::{Error, Result};
use crate::pipeline::RenderedImage;
use image::{DynamicImage, GrayImage};

/// Decodes rendered symbols back to text
#[derive(Debug, Default)]
pub struct SymbolVerifier {}

impl SymbolVerifier {
    /// Create a verifier with default settings
    pub fn new() -> Self {
        Self {}
    }

    /// Decode the first QR code found in an image
    pub fn decode(&self, img: &DynamicImage) -> Result<String> {
        self.decode_gray(img.to_luma8())
    }

    /// Decode the first QR code found in a grayscale image
    pub fn decode_gray(&self, img: GrayImage) -> Result<String> {
        let mut prepared = rqrr::PreparedImage::prepare(img);
        let grids = prepared.detect_grids();

        let Some(grid) = grids.first() else {
            return Err(Error::Verify("no QR code found in image".to_string()));
        };

        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );
                Ok(content)
            }
            Err(e) => Err(Error::Verify(format!("decode failed: {:?}", e))),
        }
    }

    /// Check that a rendered image decodes to exactly its payload.
    pub fn verify(&self, rendered: &RenderedImage) -> Result<()> {
        let decoded = self.decode(&DynamicImage::ImageRgba8(rendered.image.clone()))?;
        if decoded == rendered.payload {
            Ok(())
        } else {
            Err(Error::Verify(format!(
                "decoded {} bytes that differ from the {}-byte payload",
                decoded.len(),
                rendered.payload.len()
            )))
        }
    }
}
