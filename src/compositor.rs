//! Logo compositing
//!
//! Places a logo inside a circular clip at the center of a rendered symbol.
//! The circle is first filled with the background color so the logo stays
//! legible over the modules it covers. Nothing here guards scannability;
//! pick an error-correction level that tolerates the occlusion.

use crate::render::Color;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// Logo edge length relative to the symbol edge
pub const LOGO_RATIO: f64 = 0.2;

/// Where the logo lands on a square canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPlacement {
    /// Edge length of the logo's bounding square
    pub logo_size: f64,
    /// Left edge of the bounding square
    pub x: f64,
    /// Top edge of the bounding square
    pub y: f64,
    /// Clip circle center x
    pub center_x: f64,
    /// Clip circle center y
    pub center_y: f64,
    /// Clip circle radius
    pub radius: f64,
}

impl LogoPlacement {
    /// Centered placement for a `size × size` canvas.
    pub fn for_canvas(size: u32) -> Self {
        Self::centered(size, size)
    }

    /// Placement centered on both axes of a `width × height` canvas, sized
    /// from the shorter edge.
    pub fn centered(width: u32, height: u32) -> Self {
        let (width, height) = (f64::from(width), f64::from(height));
        let logo_size = LOGO_RATIO * width.min(height);
        let x = (width - logo_size) / 2.0;
        let y = (height - logo_size) / 2.0;
        Self {
            logo_size,
            x,
            y,
            center_x: x + logo_size / 2.0,
            center_y: y + logo_size / 2.0,
            radius: logo_size / 2.0,
        }
    }

    /// Whether the center of pixel `(px, py)` falls inside the clip circle
    pub fn clips(&self, px: u32, py: u32) -> bool {
        let dx = f64::from(px) + 0.5 - self.center_x;
        let dy = f64::from(py) + 0.5 - self.center_y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Pixel edge length the logo is resampled to before drawing
    pub fn pixel_size(&self) -> u32 {
        self.logo_size.ceil().max(1.0) as u32
    }

    /// Resample the logo to fill the bounding square exactly (aspect ratio
    /// is not preserved).
    pub fn scale_logo(&self, logo: &DynamicImage) -> RgbaImage {
        let edge = self.pixel_size();
        imageops::resize(&logo.to_rgba8(), edge, edge, FilterType::Triangle)
    }
}

/// Composite `logo` onto `base`, or return `base` unchanged when there is
/// no logo.
pub fn composite(base: &RgbaImage, logo: Option<&DynamicImage>, background: Color) -> RgbaImage {
    let Some(logo) = logo else {
        return base.clone();
    };

    let (width, height) = base.dimensions();
    let placement = LogoPlacement::centered(width, height);
    let scaled = placement.scale_logo(logo);
    let edge = scaled.width();
    let backing = background.to_rgba();

    let mut out = base.clone();
    let x0 = placement.x.floor().max(0.0) as u32;
    let y0 = placement.y.floor().max(0.0) as u32;
    let x1 = ((placement.x + placement.logo_size).ceil() as u32).min(width);
    let y1 = ((placement.y + placement.logo_size).ceil() as u32).min(height);

    for py in y0..y1 {
        for px in x0..x1 {
            if !placement.clips(px, py) {
                continue;
            }
            let u = (f64::from(px) + 0.5 - placement.x) / placement.logo_size;
            let v = (f64::from(py) + 0.5 - placement.y) / placement.logo_size;
            let sx = ((u * f64::from(edge)) as u32).min(edge - 1);
            let sy = ((v * f64::from(edge)) as u32).min(edge - 1);
            out.put_pixel(px, py, blend(*scaled.get_pixel(sx, sy), backing));
        }
    }

    tracing::trace!(
        center_x = placement.center_x,
        center_y = placement.center_y,
        radius = placement.radius,
        "Composited logo"
    );

    out
}

/// Porter-Duff "over": `top` drawn onto `bottom`.
fn blend(top: Rgba<u8>, bottom: Rgba<u8>) -> Rgba<u8> {
    let ta = f64::from(top.0[3]) / 255.0;
    let ba = f64::from(bottom.0[3]) / 255.0;
    let out_a = ta + ba * (1.0 - ta);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let t = f64::from(top.0[i]);
        let b = f64::from(bottom.0[i]);
        ((t * ta + b * ba * (1.0 - ta)) / out_a).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
