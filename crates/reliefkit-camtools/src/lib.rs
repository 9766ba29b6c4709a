//! # ReliefKit CAM Tools
//!
//! Turns raster images into relief-carving G-code.
//!
//! ## Pipeline
//!
//! - **Colour heights**: nearest-palette mapping of pixel colours to heights
//! - **Height field**: image loading, Lanczos3 resampling, grayscale relief
//!   enhancement and binary thresholding
//! - **Toolpath**: zigzag raster scanning, single pass or sliced into depth passes
//! - **Emitter**: plan to program text
//! - **Pipeline**: per-operation driver with explicit readiness checks

pub mod color_height;
pub mod emitter;
pub mod error;
pub mod height_field;
pub mod pipeline;
pub mod toolpath;

pub use color_height::{ColorHeightMapper, PaletteEntry, COLOR_HEIGHT_TABLE, MAX_PALETTE_HEIGHT};
pub use emitter::GcodeEmitter;
pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
pub use height_field::{ActiveMask, HeightFieldBuilder, HeightGrid, ReliefEnhancement, TargetSize};
pub use pipeline::{generate_from_file, GenerationMode, GenerationPipeline};
pub use toolpath::{
    pass_depths, zigzag_columns, MachineCode, MotionCommand, MotionPlan, PlanStep, Target,
    ToolpathGenerator, ToolpathParameters,
};
