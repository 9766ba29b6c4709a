//! Configuration and settings management for ReliefKit
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats.
//!
//! Configuration is organized into logical sections:
//! - Generator settings (resolution, depths, feeds, safety height)
//! - Analyzer settings (distance-noise floor, trajectory cap)
//! - Display settings (colours used by external renderers)
//! - Log settings (level, optional log file)
//!
//! File keys use the established option names (`passos_por_mm`,
//! `altura_seguranca_z`, ...); the English field names are accepted as
//! aliases.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Image-to-program generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Spatial resolution in grid points per millimeter
    #[serde(rename = "passos_por_mm", alias = "steps_per_mm")]
    pub steps_per_mm: f64,
    /// Grayscale threshold below which a pixel is cut in binary mode (0-255)
    #[serde(rename = "limiar_preto_branco", alias = "threshold")]
    pub threshold: u8,
    /// Maximum depth removed by a single pass (mm, positive)
    #[serde(rename = "profundidade_max_corte", alias = "max_depth_per_pass")]
    pub max_depth_per_pass: f64,
    /// Default total depth for binary mode (mm, negative = below surface)
    #[serde(rename = "profundidade_total", alias = "total_depth")]
    pub total_depth: f64,
    /// Deepest cut produced by grayscale relief mode (mm)
    #[serde(rename = "profundidade_relevo", alias = "relief_depth")]
    pub relief_depth: f64,
    /// Z height used for every rapid traverse (mm)
    #[serde(rename = "altura_seguranca_z", alias = "safe_z")]
    pub safe_z: f64,
    /// Rapid traverse feed (mm/min)
    #[serde(rename = "velocidade_f_rapida", alias = "rapid_feed")]
    pub rapid_feed: f64,
    /// Cutting feed (mm/min)
    #[serde(rename = "velocidade_f_corte", alias = "cut_feed")]
    pub cut_feed: f64,
    /// Tool diameter (mm), informational only
    #[serde(rename = "diametro_ferramenta", alias = "tool_diameter")]
    pub tool_diameter: f64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            steps_per_mm: 1.0,
            threshold: 128,
            max_depth_per_pass: 2.0,
            total_depth: -3.0,
            relief_depth: 2.0,
            safe_z: 5.0,
            rapid_feed: 3000.0,
            cut_feed: 1500.0,
            tool_diameter: 3.175,
        }
    }
}

impl GeneratorSettings {
    /// Distance between neighbouring grid points (mm)
    pub fn step_mm(&self) -> f64 {
        1.0 / self.steps_per_mm
    }
}

/// Program analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Distances at or below this are treated as no movement (mm)
    #[serde(rename = "tolerancia_flutuante", alias = "float_tolerance")]
    pub float_tolerance: f64,
    /// Maximum number of XY points kept for trajectory plotting
    #[serde(rename = "limite_trajetoria", alias = "trajectory_limit")]
    pub trajectory_limit: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            float_tolerance: 1e-6,
            trajectory_limit: 1_000_000,
        }
    }
}

/// Colours consumed by external renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Colour for rapid (G0) segments, `#RRGGBB`
    #[serde(rename = "cor_g0", alias = "rapid_color")]
    pub rapid_color: String,
    /// Colour for cut (G1) segments, `#RRGGBB`
    #[serde(rename = "cor_g1", alias = "cut_color")]
    pub cut_color: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            rapid_color: "#ff0000".to_string(),
            cut_color: "#0000ff".to_string(),
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "TRACE")]
    Trace,
    #[serde(alias = "DEBUG")]
    Debug,
    #[default]
    #[serde(alias = "INFO")]
    Info,
    #[serde(alias = "WARN", alias = "WARNING", alias = "warning")]
    Warn,
    #[serde(alias = "ERROR")]
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(SettingsError::invalid("nivel", format!("unknown level: {}", s))),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Minimum level written
    #[serde(rename = "nivel", alias = "level")]
    pub level: LogLevel,
    /// Append log output to this file instead of stderr
    #[serde(rename = "arquivo", alias = "file", skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation settings
    #[serde(rename = "gerador", alias = "generator")]
    pub generator: GeneratorSettings,
    /// Analysis settings
    #[serde(rename = "analisador", alias = "analyzer")]
    pub analyzer: AnalyzerSettings,
    /// Renderer colours
    #[serde(rename = "visualizacao", alias = "display")]
    pub display: DisplaySettings,
    /// Logging
    pub log: LogSettings,
}

enum ConfigFormat {
    Json,
    Toml,
}

fn format_for(path: &Path) -> SettingsResult<ConfigFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_for(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Platform configuration file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        crate::persistence::SettingsPersistence::default_path()
    }

    /// Load an explicit file, else the default location if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        crate::persistence::SettingsPersistence::load_or_default(path)
            .map(|persistence| persistence.into_config())
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_for(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let g = &self.generator;

        if !(g.steps_per_mm.is_finite() && g.steps_per_mm > 0.0) {
            return Err(SettingsError::invalid("passos_por_mm", "must be > 0"));
        }
        if !(g.max_depth_per_pass.is_finite() && g.max_depth_per_pass > 0.0) {
            return Err(SettingsError::invalid(
                "profundidade_max_corte",
                "must be > 0",
            ));
        }
        if !g.total_depth.is_finite() {
            return Err(SettingsError::invalid("profundidade_total", "must be finite"));
        }
        if !(g.relief_depth.is_finite() && g.relief_depth >= 0.0) {
            return Err(SettingsError::invalid("profundidade_relevo", "must be >= 0"));
        }
        if !(g.safe_z.is_finite() && g.safe_z > 0.0) {
            return Err(SettingsError::invalid("altura_seguranca_z", "must be > 0"));
        }
        if !(g.cut_feed.is_finite() && g.cut_feed > 0.0) {
            return Err(SettingsError::invalid("velocidade_f_corte", "must be > 0"));
        }
        if !(g.rapid_feed.is_finite() && g.rapid_feed > 0.0) {
            return Err(SettingsError::invalid("velocidade_f_rapida", "must be > 0"));
        }
        if !(g.tool_diameter.is_finite() && g.tool_diameter >= 0.0) {
            return Err(SettingsError::invalid("diametro_ferramenta", "must be >= 0"));
        }

        let a = &self.analyzer;
        if !(a.float_tolerance.is_finite() && a.float_tolerance >= 0.0) {
            return Err(SettingsError::invalid("tolerancia_flutuante", "must be >= 0"));
        }

        for (key, value) in [
            ("cor_g0", &self.display.rapid_color),
            ("cor_g1", &self.display.cut_color),
        ] {
            if !is_hex_color(value) {
                return Err(SettingsError::invalid(
                    key,
                    format!("expected #RRGGBB, got {:?}", value),
                ));
            }
        }

        Ok(())
    }
}
