//! ReliefKit Settings Crate
//!
//! Typed configuration for both pipelines. A `Config` is loaded and
//! validated once per run and then only ever borrowed.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    AnalyzerSettings, Config, DisplaySettings, GeneratorSettings, LogLevel, LogSettings,
};
pub use error::{SettingsError, SettingsResult};
pub use persistence::SettingsPersistence;
