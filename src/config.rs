//! qrstudio runtime configuration handling

use crate::error::{Error, Result};
use crate::logo::LogoSource;
use crate::payload::QrContent;
use crate::pipeline::ExportFormat;
use crate::render::{Color, EcLevel, ModuleShape, RenderOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration structure loaded from disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrStudioConfig {
    /// Default style applied to every render
    pub style: StyleOptions,
    /// Where and how results are written
    pub output: OutputOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrStudioConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrstudio.toml / qrstudio.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrstudio.toml", "qrstudio.yaml", "qrstudio.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrstudio");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        parse_file(path)
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.style.apply_env_overrides();
        self.output.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Produce fully resolved render options from the configured style.
    pub fn render_options(&self) -> Result<RenderOptions> {
        self.style.to_render_options()
    }
}

/// Parse a TOML or YAML file, chosen by extension.
pub(crate) fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "toml" => toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))),
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))),
        other => Err(Error::Config(format!(
            "Unsupported config format '{}', expected toml/yaml",
            other
        ))),
    }
}

/// User-friendly style overrides that are merged on top of `RenderOptions::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Foreground color (`#RRGGBB`)
    pub foreground: Option<String>,
    /// Background color (`#RRGGBB`)
    pub background: Option<String>,
    /// Error-correction level (l/m/q/h)
    pub ec_level: Option<String>,
    /// Finder pattern style (square/dot/round)
    pub corner_style: Option<String>,
    /// Data module style (square/dot/round)
    pub pixel_style: Option<String>,
    /// Output edge length in pixels
    pub size: Option<u32>,
    /// Quiet zone in modules
    pub margin: Option<u32>,
    /// Logo file path or `data:` URI
    pub logo: Option<String>,
}

impl StyleOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(fg) = env::var("QRSTUDIO_FOREGROUND") {
            self.foreground = Some(fg);
        }
        if let Ok(bg) = env::var("QRSTUDIO_BACKGROUND") {
            self.background = Some(bg);
        }
        if let Ok(level) = env::var("QRSTUDIO_EC_LEVEL") {
            self.ec_level = Some(level);
        }
        if let Ok(style) = env::var("QRSTUDIO_CORNER_STYLE") {
            self.corner_style = Some(style);
        }
        if let Ok(style) = env::var("QRSTUDIO_PIXEL_STYLE") {
            self.pixel_style = Some(style);
        }
        if let Ok(size) = env::var("QRSTUDIO_SIZE") {
            if let Ok(parsed) = size.trim().parse::<u32>() {
                self.size = Some(parsed);
            }
        }
        if let Ok(margin) = env::var("QRSTUDIO_MARGIN") {
            if let Ok(parsed) = margin.trim().parse::<u32>() {
                self.margin = Some(parsed);
            }
        }
        if let Ok(logo) = env::var("QRSTUDIO_LOGO") {
            if logo.trim().is_empty() {
                self.logo = None;
            } else {
                self.logo = Some(logo);
            }
        }
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &StyleOptions) -> StyleOptions {
        StyleOptions {
            foreground: other.foreground.clone().or_else(|| self.foreground.clone()),
            background: other.background.clone().or_else(|| self.background.clone()),
            ec_level: other.ec_level.clone().or_else(|| self.ec_level.clone()),
            corner_style: other
                .corner_style
                .clone()
                .or_else(|| self.corner_style.clone()),
            pixel_style: other
                .pixel_style
                .clone()
                .or_else(|| self.pixel_style.clone()),
            size: other.size.or(self.size),
            margin: other.margin.or(self.margin),
            logo: other.logo.clone().or_else(|| self.logo.clone()),
        }
    }

    /// Merge overrides onto the default render options.
    pub fn to_render_options(&self) -> Result<RenderOptions> {
        let mut options = RenderOptions::default();

        if let Some(fg) = &self.foreground {
            options.foreground = parse_color("foreground", fg)?;
        }
        if let Some(bg) = &self.background {
            options.background = parse_color("background", bg)?;
        }
        if let Some(level) = &self.ec_level {
            options.ec_level = EcLevel::from_str(level).map_err(Error::Config)?;
        }
        if let Some(style) = &self.corner_style {
            options.corner_style = ModuleShape::from_str(style).map_err(Error::Config)?;
        }
        if let Some(style) = &self.pixel_style {
            options.pixel_style = ModuleShape::from_str(style).map_err(Error::Config)?;
        }
        if let Some(size) = self.size {
            options.size = size;
        }
        if let Some(margin) = self.margin {
            options.margin = margin;
        }
        if let Some(logo) = &self.logo {
            options.logo = Some(LogoSource::from_user_input(logo));
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color> {
    Color::parse(value).map_err(|e| Error::Config(format!("Invalid {field} color: {e}")))
}

/// Output location and format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Directory results are written to when no explicit path is given
    pub directory: PathBuf,
    /// File name without extension
    pub file_stem: String,
    /// Default export format
    pub format: ExportFormat,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_stem: "qr-code".to_string(),
            format: ExportFormat::Png,
        }
    }
}

impl OutputOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("QRSTUDIO_OUTPUT_DIR") {
            self.directory = PathBuf::from(dir);
        }
        if let Ok(stem) = env::var("QRSTUDIO_OUTPUT_STEM") {
            if !stem.trim().is_empty() {
                self.file_stem = stem;
            }
        }
        if let Ok(format) = env::var("QRSTUDIO_OUTPUT_FORMAT") {
            if let Ok(parsed) = format.parse::<ExportFormat>() {
                self.format = parsed;
            }
        }
    }

    /// Default output path for the given format
    pub fn path_for(&self, format: ExportFormat) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.file_stem, format.extension()))
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRSTUDIO_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Enable metrics collection and periodic summaries over tracing
    pub metrics: bool,
    /// Interval in seconds for emitting aggregated metrics when enabled
    pub metrics_interval_secs: u64,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
    /// Format used when metrics are printed on exit (`json` or `prometheus`)
    pub metrics_format: MetricsFormat,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            metrics: false,
            metrics_interval_secs: 60,
            rotation: None,
            metrics_format: MetricsFormat::Json,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRSTUDIO_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRSTUDIO_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRSTUDIO_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(metrics) = env::var("QRSTUDIO_LOG_METRICS") {
            match metrics.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.metrics = true,
                "0" | "false" | "off" => self.metrics = false,
                _ => {}
            }
        }
        if let Ok(interval) = env::var("QRSTUDIO_LOG_METRICS_INTERVAL") {
            if let Ok(value) = interval.parse::<u64>() {
                self.metrics_interval_secs = value.max(5);
            }
        }
        if let Ok(rotation) = env::var("QRSTUDIO_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
        if let Ok(format) = env::var("QRSTUDIO_METRICS_FORMAT") {
            if let Ok(parsed) = format.parse::<MetricsFormat>() {
                self.metrics_format = parsed;
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

/// Supported serialization formats for metrics output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Emit metrics as structured JSON
    Json,
    /// Emit metrics in Prometheus text exposition format
    Prometheus,
}

impl MetricsFormat {
    /// Parse a metrics format identifier (case-insensitive) from a string slice.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "prometheus" => Some(Self::Prometheus),
            _ => None,
        }
    }
}

impl FromStr for MetricsFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            format!("Unsupported metrics format '{value}', expected 'json' or 'prometheus'")
        })
    }
}

/// A saved QR job: what to encode plus per-job style overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrJob {
    /// Content to encode
    pub content: QrContent,
    /// Style overrides layered on top of the configured defaults
    #[serde(default)]
    pub style: StyleOptions,
}

impl QrJob {
    /// Read a job from a TOML or YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        parse_file(path)
    }
}
