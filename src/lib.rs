//! QRSTUDIO - styled QR code generation with logo compositing
//!
//! This library turns structured input (URLs, text, contact cards, WiFi
//! credentials) into customized QR code images.
//!
//! # Features
//!
//! - **Payload formatting**: vCard 3.0 and `WIFI:` payloads with proper escaping
//! - **Styled rendering**: colors, error-correction level, dot/round modules and finders
//! - **Logo compositing**: a centered, circularly clipped logo on an opaque backing
//! - **PNG and true SVG export** of the same symbol
//! - **Latest-wins previews**: superseded renders never overwrite newer ones
//!
//! # Example
//!
//! ```no_run
//! use qrstudio::{Pipeline, QrContent, RenderOptions, RenderRequest};
//! use qrstudio::payload::{WifiCredential, WifiEncryption};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let content = QrContent::Wifi(WifiCredential {
//!         ssid: "Home".to_string(),
//!         password: "secret1".to_string(),
//!         encryption: WifiEncryption::Wpa,
//!         hidden: false,
//!     });
//!
//!     let request = RenderRequest::new(content, RenderOptions::default());
//!     if let Some(rendered) = Pipeline::new().run(&request).await? {
//!         std::fs::write("wifi.png", rendered.to_png()?)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod compositor;
pub mod config;
pub mod error;
pub mod logging;
pub mod logo;
pub mod metrics;
pub mod output;
pub mod payload;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod verify;

// Re-exports for convenience
pub use error::{Error, Result};

pub use compositor::{LogoPlacement, composite};
pub use config::{LogRotation, LoggingOptions, OutputOptions, QrJob, QrStudioConfig, StyleOptions};
pub use logo::LogoSource;
pub use payload::{ContactInfo, QrContent, WifiCredential, WifiEncryption};
pub use pipeline::{ExportFormat, Pipeline, RenderRequest, RenderedImage};
pub use preview::{PreviewState, Previewer, RunOutcome};
pub use render::{Color, EcLevel, ModuleShape, RenderOptions, Symbol, SymbolRenderer};
pub use verify::SymbolVerifier;
