//! Symbol rendering
//!
//! Wraps the `qrcode` encoder and draws its module matrix into a fixed-size
//! bitmap (and an equivalent SVG document) using the configured colors,
//! error-correction level and module shapes.

mod shape;
pub mod style;
mod svg;

pub use shape::{FINDER_SIZE, Primitive};
pub use style::{
    Color, CornerStyle, DEFAULT_MARGIN, DEFAULT_SIZE, EcLevel, MAX_SIZE, MIN_SIZE, ModuleShape,
    PixelStyle, RenderOptions,
};

use crate::error::{Error, Result};
use image::{DynamicImage, RgbaImage};
use qrcode::QrCode;

/// An encoded QR symbol: a square matrix of dark/light modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    width: usize,
    modules: Vec<bool>,
    ec_level: EcLevel,
}

impl Symbol {
    /// Encode `text` at the given error-correction level.
    pub fn encode(text: &str, ec_level: EcLevel) -> Result<Self> {
        let code =
            QrCode::with_error_correction_level(text.as_bytes(), ec_level.into()).map_err(|e| {
                Error::QrEncode(format!(
                    "{e} ({} bytes at level {})",
                    text.len(),
                    ec_level.as_char()
                ))
            })?;

        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();

        Ok(Self {
            width,
            modules,
            ec_level,
        })
    }

    /// Modules per side, excluding the quiet zone
    pub fn width(&self) -> usize {
        self.width
    }

    /// QR version (1-40) implied by the module count
    pub fn version(&self) -> usize {
        (self.width - 17) / 4
    }

    /// Error-correction level the symbol was encoded with
    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    /// Whether module `(x, y)` is dark. Out-of-range coordinates are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }
}

/// Draws symbols with a fixed set of render options
#[derive(Debug, Clone)]
pub struct SymbolRenderer {
    options: RenderOptions,
}

impl SymbolRenderer {
    /// Create a renderer for the given options
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Options this renderer draws with
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Encode text using the configured error-correction level
    pub fn encode(&self, text: &str) -> Result<Symbol> {
        Symbol::encode(text, self.options.ec_level)
    }

    /// Number of modules across the output, quiet zone included
    pub fn total_modules(&self, symbol: &Symbol) -> usize {
        symbol.width() + 2 * self.options.margin as usize
    }

    /// Pixels per module (fractional; the symbol always fills the full edge)
    pub fn scale(&self, symbol: &Symbol) -> f64 {
        f64::from(self.options.size) / self.total_modules(symbol) as f64
    }

    /// Rasterize the symbol into a `size × size` bitmap.
    ///
    /// A pixel takes the foreground color when its center falls inside a
    /// module shape; everything else is background.
    pub fn rasterize(&self, symbol: &Symbol) -> RgbaImage {
        let size = self.options.size;
        let scale = self.scale(symbol);
        let fg = self.options.foreground.to_rgba();
        let mut image = RgbaImage::from_pixel(size, size, self.options.background.to_rgba());

        let shapes = shape::layout(
            symbol,
            self.options.margin,
            self.options.corner_style,
            self.options.pixel_style,
        );

        for primitive in &shapes {
            let (min_x, min_y, max_x, max_y) = primitive.bounds();
            let x0 = pixel_floor(min_x * scale);
            let y0 = pixel_floor(min_y * scale);
            let x1 = pixel_ceil(max_x * scale, size);
            let y1 = pixel_ceil(max_y * scale, size);

            for py in y0..y1 {
                let my = (f64::from(py) + 0.5) / scale;
                for px in x0..x1 {
                    let mx = (f64::from(px) + 0.5) / scale;
                    if primitive.contains(mx, my) {
                        image.put_pixel(px, py, fg);
                    }
                }
            }
        }

        image
    }

    /// Produce a vector rendering of the symbol, with the logo embedded
    /// behind the same circular clip the raster compositor uses.
    pub fn vectorize(&self, symbol: &Symbol, logo: Option<&DynamicImage>) -> Result<String> {
        svg::document(self, symbol, logo)
    }
}

impl Default for SymbolRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

fn pixel_floor(value: f64) -> u32 {
    value.floor().max(0.0) as u32
}

fn pixel_ceil(value: f64, limit: u32) -> u32 {
    (value.ceil().max(0.0) as u32).min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reports_geometry() {
        let symbol = Symbol::encode("Hello, QR!", EcLevel::Medium).unwrap();
        assert_eq!(symbol.width(), 21);
        assert_eq!(symbol.version(), 1);
        assert_eq!(symbol.ec_level(), EcLevel::Medium);
        // Top-left finder corner is always dark, the separator next to it light.
        assert!(symbol.is_dark(0, 0));
        assert!(!symbol.is_dark(7, 0));
        assert!(!symbol.is_dark(100, 100));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let text = "x".repeat(4000);
        let err = Symbol::encode(&text, EcLevel::High).unwrap_err();
        assert!(matches!(err, Error::QrEncode(_)));
    }

    #[test]
    fn test_rasterize_fills_requested_size() {
        let renderer = SymbolRenderer::default();
        let symbol = renderer.encode("https://example.com").unwrap();
        let image = renderer.rasterize(&symbol);

        assert_eq!(image.dimensions(), (DEFAULT_SIZE, DEFAULT_SIZE));
        assert_eq!(*image.get_pixel(0, 0), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_rasterize_uses_configured_colors() {
        let fg = Color::rgb(10, 20, 200);
        let bg = Color::rgb(250, 240, 10);
        let renderer = SymbolRenderer::new(RenderOptions {
            foreground: fg,
            background: bg,
            size: 290,
            ..RenderOptions::default()
        });
        let symbol = renderer.encode("colors").unwrap();
        let image = renderer.rasterize(&symbol);

        // One module of quiet zone, then the finder's dark outer ring.
        let scale = renderer.scale(&symbol);
        let inside_finder = (scale * 1.5) as u32;
        assert_eq!(*image.get_pixel(1, 1), bg.to_rgba());
        assert_eq!(*image.get_pixel(inside_finder, inside_finder), fg.to_rgba());
        assert!(image.pixels().all(|p| *p == fg.to_rgba() || *p == bg.to_rgba()));
    }

    #[test]
    fn test_dot_style_draws_less_ink_than_square() {
        let text = "ink coverage";
        let count_dark = |pixel_style| {
            let renderer = SymbolRenderer::new(RenderOptions {
                pixel_style,
                size: 400,
                ..RenderOptions::default()
            });
            let symbol = renderer.encode(text).unwrap();
            renderer
                .rasterize(&symbol)
                .pixels()
                .filter(|p| p.0[0] == 0)
                .count()
        };

        assert!(count_dark(ModuleShape::Dot) < count_dark(ModuleShape::Square));
        assert!(count_dark(ModuleShape::Round) < count_dark(ModuleShape::Square));
    }
}
