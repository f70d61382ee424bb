//! Visual options for rendered symbols

use crate::error::{Error, Result};
use crate::logo::LogoSource;
use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default edge length of the rendered bitmap in pixels
pub const DEFAULT_SIZE: u32 = 1024;

/// Default quiet zone around the symbol, in modules
pub const DEFAULT_MARGIN: u32 = 1;

/// Smallest accepted output edge: one pixel per module of a version 1 symbol
pub const MIN_SIZE: u32 = 21;

/// Largest accepted output edge, in pixels
pub const MAX_SIZE: u32 = 8192;

/// An sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Build an opaque color from its channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 | 8 => digits.to_string(),
            _ => return Err(Error::InvalidColor(value.to_string())),
        };

        let bytes =
            hex::decode(&expanded).map_err(|_| Error::InvalidColor(value.to_string()))?;

        Ok(Self {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
            a: bytes.get(3).copied().unwrap_or(255),
        })
    }

    /// Pixel value for `image` buffers
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Color as used in SVG attributes (`#rrggbb`)
    pub fn svg_hex(&self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }

    /// Alpha as an SVG opacity in `0.0..=1.0`
    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.svg_hex())
        } else {
            write!(f, "#{}", hex::encode([self.r, self.g, self.b, self.a]))
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// QR error-correction level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcLevel {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery; survives a centered logo best
    #[default]
    High,
}

impl EcLevel {
    /// Single-letter code (`L`, `M`, `Q`, `H`)
    pub fn as_char(&self) -> char {
        match self {
            EcLevel::Low => 'L',
            EcLevel::Medium => 'M',
            EcLevel::Quartile => 'Q',
            EcLevel::High => 'H',
        }
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::Low => qrcode::EcLevel::L,
            EcLevel::Medium => qrcode::EcLevel::M,
            EcLevel::Quartile => qrcode::EcLevel::Q,
            EcLevel::High => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Self::Low),
            "m" | "medium" => Ok(Self::Medium),
            "q" | "quartile" => Ok(Self::Quartile),
            "h" | "high" => Ok(Self::High),
            other => Err(format!(
                "Unknown error-correction level '{other}', expected l, m, q or h"
            )),
        }
    }
}

/// Shape used for one family of modules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleShape {
    /// Plain squares
    #[default]
    Square,
    /// Circles
    Dot,
    /// Rounded squares
    Round,
}

impl FromStr for ModuleShape {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "dot" => Ok(Self::Dot),
            "round" | "rounded" => Ok(Self::Round),
            other => Err(format!(
                "Unknown style '{other}', expected square, dot or round"
            )),
        }
    }
}

/// Shape of the three finder patterns
pub type CornerStyle = ModuleShape;

/// Shape of data modules
pub type PixelStyle = ModuleShape;

/// Everything that controls how a payload is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Color of dark modules
    pub foreground: Color,
    /// Color of light modules, the quiet zone and the logo backing
    pub background: Color,
    /// Error-correction level passed to the encoder
    pub ec_level: EcLevel,
    /// Finder pattern shape
    pub corner_style: CornerStyle,
    /// Data module shape
    pub pixel_style: PixelStyle,
    /// Edge length of the square output bitmap, in pixels
    pub size: u32,
    /// Quiet zone width, in modules
    pub margin: u32,
    /// Optional logo drawn at the center
    pub logo: Option<LogoSource>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: Color::WHITE,
            ec_level: EcLevel::High,
            corner_style: ModuleShape::Square,
            pixel_style: ModuleShape::Square,
            size: DEFAULT_SIZE,
            margin: DEFAULT_MARGIN,
            logo: None,
        }
    }
}

impl RenderOptions {
    /// Check that the output size lies within [`MIN_SIZE`]..=[`MAX_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(Error::Config(format!(
                "Output size {} is out of range, expected {MIN_SIZE} to {MAX_SIZE} pixels",
                self.size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_size_bounds() {
        let options = |size| RenderOptions {
            size,
            ..RenderOptions::default()
        };
        assert!(options(MIN_SIZE).validate().is_ok());
        assert!(options(MAX_SIZE).validate().is_ok());
        assert!(matches!(options(MIN_SIZE - 1).validate(), Err(Error::Config(_))));
        assert!(matches!(options(200_000).validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_color_parse_forms() {
        assert_eq!(Color::parse("#000000").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("FFFFFF").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#f0a").unwrap(), Color::rgb(0xff, 0x00, 0xaa));

        let translucent = Color::parse("#11223380").unwrap();
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_string(), "#11223380");
    }

    #[test]
    fn test_color_parse_rejects_garbage() {
        assert!(matches!(Color::parse("#12345"), Err(Error::InvalidColor(_))));
        assert!(matches!(Color::parse("#zzzzzz"), Err(Error::InvalidColor(_))));
        assert!(Color::parse("").is_err());
    }

    #[test]
    fn test_color_display_round_trips() {
        let color = Color::rgb(0x12, 0xab, 0xef);
        assert_eq!(color.to_string(), "#12abef");
        assert_eq!(color.to_string().parse::<Color>().unwrap(), color);
    }

    #[test]
    fn test_ec_level_parse_and_map() {
        assert_eq!("q".parse::<EcLevel>(), Ok(EcLevel::Quartile));
        assert_eq!("High".parse::<EcLevel>(), Ok(EcLevel::High));
        assert!("x".parse::<EcLevel>().is_err());
        assert_eq!(qrcode::EcLevel::from(EcLevel::Low), qrcode::EcLevel::L);
    }

    #[test]
    fn test_render_options_deserialize_with_defaults() {
        let options: RenderOptions = toml::from_str(
            r##"
            foreground = "#1a1a1a"
            ec_level = "medium"
            pixel_style = "dot"
            "##,
        )
        .unwrap();

        assert_eq!(options.foreground, Color::rgb(0x1a, 0x1a, 0x1a));
        assert_eq!(options.background, Color::WHITE);
        assert_eq!(options.ec_level, EcLevel::Medium);
        assert_eq!(options.pixel_style, ModuleShape::Dot);
        assert_eq!(options.corner_style, ModuleShape::Square);
        assert_eq!(options.size, DEFAULT_SIZE);
        assert!(options.logo.is_none());
    }
}
