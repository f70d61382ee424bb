//! The formatter → renderer → compositor pipeline
//!
//! A run either produces a [`RenderedImage`], reports that there is nothing
//! to render yet (`Ok(None)` for an empty payload), or fails with the reason.

use crate::compositor;
use crate::error::{Error, Result};
use crate::logo::data_url;
use crate::metrics;
use crate::payload::{ContentKind, QrContent};
use crate::render::{EcLevel, RenderOptions, SymbolRenderer};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::time::Instant;

/// One complete set of user input
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// What to encode
    pub content: QrContent,
    /// How to draw it
    pub options: RenderOptions,
}

impl RenderRequest {
    /// Bundle content and options
    pub fn new(content: QrContent, options: RenderOptions) -> Self {
        Self { content, options }
    }
}

/// Export formats offered for a rendered image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Raster PNG of the composited bitmap
    #[default]
    Png,
    /// Vector SVG of the same symbol
    Svg,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    /// MIME type of the exported bytes
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(format!("Unsupported export format '{other}', expected png or svg")),
        }
    }
}

/// The final composited symbol and its vector twin
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Text that was encoded
    pub payload: String,
    /// Content type the payload came from
    pub kind: ContentKind,
    /// Error-correction level used
    pub ec_level: EcLevel,
    /// QR version (1-40)
    pub version: usize,
    /// Whether a logo was composited
    pub has_logo: bool,
    /// The composited bitmap
    pub image: RgbaImage,
    /// SVG document of the same symbol
    pub svg: String,
}

impl RenderedImage {
    /// Edge length of the bitmap in pixels
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Encode the bitmap as PNG.
    pub fn to_png(&self) -> Result<Bytes> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image.clone()).write_to(&mut buffer, ImageFormat::Png)?;
        Ok(Bytes::from(buffer.into_inner()))
    }

    /// The SVG document as bytes
    pub fn to_svg(&self) -> Bytes {
        Bytes::from(self.svg.clone())
    }

    /// Export in the requested format
    pub fn export(&self, format: ExportFormat) -> Result<Bytes> {
        match format {
            ExportFormat::Png => self.to_png(),
            ExportFormat::Svg => Ok(self.to_svg()),
        }
    }

    /// PNG bytes wrapped in a `data:image/png;base64,` URL
    pub fn to_data_url(&self) -> Result<String> {
        Ok(data_url(ExportFormat::Png.mime(), &self.to_png()?))
    }
}

/// Runs requests through formatting, rendering and compositing
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline;

impl Pipeline {
    /// Create a pipeline
    pub fn new() -> Self {
        Self
    }

    /// Run one request end to end.
    ///
    /// The logo (if any) is fully loaded before anything is drawn; a load
    /// failure fails the run.
    pub async fn run(&self, request: &RenderRequest) -> Result<Option<RenderedImage>> {
        let kind = request.content.kind();
        let payload = request.content.to_payload();
        if payload.is_empty() {
            tracing::debug!(%kind, "Empty payload, nothing to render");
            metrics::record_empty();
            return Ok(None);
        }

        let started = Instant::now();
        let result = match request.options.validate() {
            Ok(()) => self.render(kind, payload, &request.options).await,
            Err(err) => Err(err),
        };
        metrics::record(started.elapsed(), result.is_ok(), Some(kind.as_str()));

        match &result {
            Ok(rendered) => tracing::debug!(
                %kind,
                version = rendered.version,
                size = rendered.size(),
                has_logo = rendered.has_logo,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Rendered QR code"
            ),
            Err(err @ Error::QrEncode(_)) => {
                tracing::warn!(%kind, error = %err, "Encoder rejected payload")
            }
            Err(err) => tracing::warn!(%kind, error = %err, "Render failed"),
        }

        result.map(Some)
    }

    async fn render(
        &self,
        kind: ContentKind,
        payload: String,
        options: &RenderOptions,
    ) -> Result<RenderedImage> {
        let logo = match &options.logo {
            Some(source) => Some(source.load().await?),
            None => None,
        };

        let renderer = SymbolRenderer::new(options.clone());
        tokio::task::spawn_blocking(move || render_blocking(&renderer, kind, payload, logo))
            .await?
    }
}

fn render_blocking(
    renderer: &SymbolRenderer,
    kind: ContentKind,
    payload: String,
    logo: Option<DynamicImage>,
) -> Result<RenderedImage> {
    let symbol = renderer.encode(&payload)?;
    let base = renderer.rasterize(&symbol);
    let image = compositor::composite(&base, logo.as_ref(), renderer.options().background);
    let svg = renderer.vectorize(&symbol, logo.as_ref())?;

    Ok(RenderedImage {
        payload,
        kind,
        ec_level: symbol.ec_level(),
        version: symbol.version(),
        has_logo: logo.is_some(),
        image,
        svg,
    })
}
