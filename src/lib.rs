//! # ReliefKit
//!
//! Turns raster images into relief-carving G-code and analyzes existing
//! G-code programs for machining time and travel.
//!
//! ## Architecture
//!
//! ReliefKit is organized as a workspace with multiple crates:
//!
//! 1. **reliefkit-core** - Shared value types and error taxonomy
//! 2. **reliefkit-settings** - Typed configuration, TOML/JSON persistence
//! 3. **reliefkit-camtools** - Image to height grid to toolpath to program text
//! 4. **reliefkit-visualizer** - Program tokenizer, modal replay, statistics
//! 5. **reliefkit** - Logging setup, job queue and the command-line binary

pub mod jobs;

pub use jobs::{Job, JobOutcome, JobQueue, JobTicket};

pub use reliefkit_core::{
    Axis, AxisWords, ImageLoadError, MotionKind, NumericParseWarning, Position, ProgramReadError,
};

pub use reliefkit_settings::{
    AnalyzerSettings, Config, DisplaySettings, GeneratorSettings, LogLevel, LogSettings,
    SettingsError, SettingsPersistence,
};

pub use reliefkit_camtools::{
    generate_from_file, ActiveMask, CamToolError, ColorHeightMapper, GenerationMode,
    GenerationPipeline, HeightFieldBuilder, HeightGrid, MotionCommand, MotionPlan,
    ReliefEnhancement, TargetSize, ToolpathGenerator,
};

pub use reliefkit_visualizer::{
    AnalysisReport, MachineStateTracker, ProgramAnalyzer, ProgramTokenizer, SegmentMetric,
    StatisticsAggregator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("RELIEFKIT_BUILD_DATE");

/// Initialize logging from the `[log]` configuration section
///
/// Sets up structured logging with:
/// - `RUST_LOG` taking precedence over the configured level
/// - Output appended to `settings.file` when set, stderr otherwise
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_string()));

    match &settings.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            let fmt_layer = fmt::layer()
                .with_writer(std::sync::Arc::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .context("Logging already initialized")?;
        }
        None => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .context("Logging already initialized")?;
        }
    }

    Ok(())
}
