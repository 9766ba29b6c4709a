//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for image-to-toolpath
//! generation and parameter validation.

use reliefkit_core::ImageLoadError;
use thiserror::Error;

/// Errors that can occur during generation.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// A stage was invoked before its input was available.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The source image could not be loaded.
    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),

    /// G-code generation failed.
    #[error("G-code generation failed: {0}")]
    GenerationFailed(String),

    /// Invalid parameters were provided to a generator.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

impl CamToolError {
    /// True for failures of the image stage (the caller gets no plan)
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            CamToolError::ImageLoad(_) | CamToolError::GenerationFailed(_)
        )
    }
}

/// Errors related to generator parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Dimensions are invalid (zero or negative).
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;
