//! # ReliefKit Core
//!
//! Core value types and the error taxonomy shared by the generation and
//! analysis crates. Nothing in here performs I/O.

pub mod error;
pub mod types;

pub use error::{ImageLoadError, NumericParseWarning, ProgramReadError};

pub use types::{Axis, AxisWords, MotionKind, Position};
