//! SVG output
//!
//! The document uses a pixel-space `viewBox` of `size × size`; the symbol is
//! drawn in module units inside a scaled group so it lines up exactly with
//! the raster output.

use super::shape::{self, Primitive};
use super::{Symbol, SymbolRenderer};
use crate::compositor::LogoPlacement;
use crate::error::Result;
use crate::logo::data_url;
use image::{DynamicImage, ImageFormat};
use std::fmt::Write as _;
use std::io::Cursor;

pub(super) fn document(
    renderer: &SymbolRenderer,
    symbol: &Symbol,
    logo: Option<&DynamicImage>,
) -> Result<String> {
    let options = renderer.options();
    let size = options.size;
    let scale = renderer.scale(symbol);
    let fg = options.foreground;
    let bg = options.background;

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<?xml version="1.0" encoding="UTF-8"?>"#
    );
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    let _ = writeln!(
        out,
        r#"<rect width="{size}" height="{size}" fill="{}" fill-opacity="{}"/>"#,
        bg.svg_hex(),
        num(bg.opacity())
    );
    let _ = writeln!(
        out,
        r#"<g transform="scale({})" fill="{}" fill-opacity="{}">"#,
        num(scale),
        fg.svg_hex(),
        num(fg.opacity())
    );

    let shapes = shape::layout(symbol, options.margin, options.corner_style, options.pixel_style);
    let mut square_path = String::new();
    for primitive in &shapes {
        match *primitive {
            Primitive::Rect { x, y, w, h, r } if r == 0.0 => {
                let _ = write!(
                    square_path,
                    "M{} {}h{}v{}h-{}z",
                    num(x),
                    num(y),
                    num(w),
                    num(h),
                    num(w)
                );
            }
            other => out.push_str(&element(&other, &fg.svg_hex())),
        }
    }
    if !square_path.is_empty() {
        let _ = writeln!(out, r#"<path d="{square_path}"/>"#);
    }
    out.push_str("</g>\n");

    if let Some(logo) = logo {
        let placement = LogoPlacement::for_canvas(size);
        let href = data_url("image/png", &logo_png(logo, &placement)?);
        let (cx, cy, r) = (placement.center_x, placement.center_y, placement.radius);
        let _ = writeln!(
            out,
            r#"<defs><clipPath id="logo-clip"><circle cx="{}" cy="{}" r="{}"/></clipPath></defs>"#,
            num(cx),
            num(cy),
            num(r)
        );
        let _ = writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="{}"/>"#,
            num(cx),
            num(cy),
            num(r),
            bg.svg_hex(),
            num(bg.opacity())
        );
        let _ = writeln!(
            out,
            r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" clip-path="url(#logo-clip)" href="{href}"/>"#,
            num(placement.x),
            num(placement.y),
            num(placement.logo_size),
            num(placement.logo_size)
        );
    }

    out.push_str("</svg>\n");
    Ok(out)
}

fn element(primitive: &Primitive, stroke: &str) -> String {
    match *primitive {
        Primitive::Rect { x, y, w, h, r } => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}"/>"#,
            num(x),
            num(y),
            num(w),
            num(h),
            num(r)
        ),
        Primitive::Circle { cx, cy, r } => format!(
            r#"<circle cx="{}" cy="{}" r="{}"/>"#,
            num(cx),
            num(cy),
            num(r)
        ),
        // A stroked outline centered on the frame's midline covers exactly
        // the outer-minus-inner region.
        Primitive::Frame {
            x,
            y,
            size,
            thickness,
            r,
        } => {
            let half = thickness / 2.0;
            format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="none" stroke="{stroke}" stroke-width="{}"/>"#,
                num(x + half),
                num(y + half),
                num(size - thickness),
                num(size - thickness),
                num((r - half).max(0.0)),
                num(thickness)
            )
        }
        Primitive::Annulus {
            cx,
            cy,
            outer,
            inner,
        } => format!(
            r#"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="{stroke}" stroke-width="{}"/>"#,
            num(cx),
            num(cy),
            num((outer + inner) / 2.0),
            num(outer - inner)
        ),
    }
}

fn logo_png(logo: &DynamicImage, placement: &LogoPlacement) -> Result<Vec<u8>> {
    let scaled = placement.scale_logo(logo);
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(scaled).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Format a coordinate with at most three decimals and no trailing zeros.
fn num(value: f64) -> String {
    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ModuleShape, RenderOptions};
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_num_trims() {
        assert_eq!(num(2.0), "2");
        assert_eq!(num(102.4), "102.4");
        assert_eq!(num(1.0 / 3.0), "0.333");
        assert_eq!(num(-0.0001), "0");
    }

    #[test]
    fn test_square_document_structure() {
        let renderer = SymbolRenderer::default();
        let symbol = renderer.encode("svg please").unwrap();
        let svg = renderer.vectorize(&symbol, None).unwrap();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 1024 1024""#));
        assert!(svg.contains(r##"fill="#000000""##));
        assert!(svg.contains("<path d=\"M"));
        assert!(!svg.contains("<image"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_dot_styles_emit_circles() {
        let renderer = SymbolRenderer::new(RenderOptions {
            corner_style: ModuleShape::Dot,
            pixel_style: ModuleShape::Dot,
            ..RenderOptions::default()
        });
        let symbol = renderer.encode("dots").unwrap();
        let svg = renderer.vectorize(&symbol, None).unwrap();

        assert!(svg.contains("<circle"));
        assert!(svg.contains("stroke-width=\"1\""));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_logo_is_embedded_with_circular_clip() {
        let renderer = SymbolRenderer::default();
        let symbol = renderer.encode("logo").unwrap();
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        let svg = renderer.vectorize(&symbol, Some(&logo)).unwrap();

        assert!(svg.contains(r#"<circle cx="512" cy="512" r="102.4"/>"#));
        assert!(svg.contains(r#"href="data:image/png;base64,"#));
        assert!(svg.contains(r#"clip-path="url(#logo-clip)""#));
    }
}
