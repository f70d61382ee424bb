//! Structured and human-readable render reports

use crate::pipeline::{ExportFormat, RenderedImage};
use crate::render::RenderOptions;
use serde_json::{Value, json};
use std::path::Path;

/// Combined structured and human-readable description of a render
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Structured JSON representation for scripting
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Describe a finished render and where it was written.
pub fn render_report(
    rendered: &RenderedImage,
    options: &RenderOptions,
    format: ExportFormat,
    path: Option<&Path>,
    verified: Option<bool>,
) -> RenderReport {
    let json = json!({
        "content_type": rendered.kind.as_str(),
        "payload": rendered.payload,
        "payload_bytes": rendered.payload.len(),
        "qr_version": rendered.version,
        "ec_level": rendered.ec_level.as_char().to_string(),
        "size": rendered.size(),
        "margin": options.margin,
        "foreground": options.foreground.to_string(),
        "background": options.background.to_string(),
        "corner_style": options.corner_style,
        "pixel_style": options.pixel_style,
        "logo": rendered.has_logo,
        "format": format.extension(),
        "path": path.map(|p| p.display().to_string()),
        "verified": verified,
    });

    let mut human = vec![
        format!("QR code rendered ({})", rendered.kind),
        format!(
            "  Payload: {} bytes, version {}, EC level {}",
            rendered.payload.len(),
            rendered.version,
            rendered.ec_level.as_char()
        ),
        format!(
            "  Image: {0}x{0} px, {1} on {2}",
            rendered.size(),
            options.foreground,
            options.background
        ),
    ];

    if rendered.has_logo {
        human.push("  Logo: composited at center".to_string());
    }
    if let Some(path) = path {
        human.push(format!(
            "  Saved {} to {}",
            format.extension().to_ascii_uppercase(),
            path.display()
        ));
    }
    match verified {
        Some(true) => human.push("  Verified: decodes to the original payload".to_string()),
        Some(false) => human.push("  Verified: FAILED, symbol does not decode".to_string()),
        None => {}
    }

    RenderReport { json, human }
}

/// Report for input that produced no payload
pub fn empty_report() -> RenderReport {
    RenderReport {
        json: json!({ "rendered": false, "reason": "empty payload" }),
        human: vec!["Nothing to render: payload is empty".to_string()],
    }
}
