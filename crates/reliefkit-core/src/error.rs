//! Error handling for ReliefKit
//!
//! Provides the error taxonomy shared by both pipelines:
//! - Image errors (missing or undecodable source image)
//! - Program errors (missing or unreadable motion program)
//! - Numeric parse warnings (one malformed axis value, recovered locally)
//!
//! I/O-level failures abort the whole operation; parse-level issues never do.

use std::path::PathBuf;
use thiserror::Error;

/// Image error type
///
/// Raised when the source image of a generation run cannot be used.
/// No partial height grid is ever produced alongside one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageLoadError {
    /// The image file does not exist
    #[error("Image not found: {}", .path.display())]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The image exists but could not be decoded
    #[error("Failed to decode image {}: {reason}", .path.display())]
    Decode {
        /// The path that was requested.
        path: PathBuf,
        /// The decoder's explanation.
        reason: String,
    },
}

/// Program error type
///
/// Raised when a motion program cannot be opened or read. The analysis
/// aborts and no partial report is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramReadError {
    /// The program file does not exist
    #[error("Program not found: {}", .path.display())]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The program could not be read
    #[error("Failed to read program {} at line {line_number}: {reason}", .path.display())]
    Io {
        /// The path that was requested.
        path: PathBuf,
        /// The last line number reached before the failure (0 if none).
        line_number: usize,
        /// The underlying I/O error message.
        reason: String,
    },
}

/// A malformed numeric value attached to an axis letter.
///
/// This is a warning, not a failure: the tokenizer drops the value and
/// keeps processing the rest of the line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Line {line_number}: ignored non-numeric value for {letter}: {text}")]
pub struct NumericParseWarning {
    /// 1-based line number in the program.
    pub line_number: usize,
    /// The axis letter the value belonged to.
    pub letter: char,
    /// The text that failed to parse.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_error_display() {
        let err = ImageLoadError::NotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        assert_eq!(err.to_string(), "Image not found: /tmp/missing.png");

        let err = ImageLoadError::Decode {
            path: PathBuf::from("bad.png"),
            reason: "invalid signature".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to decode image bad.png: invalid signature"
        );
    }

    #[test]
    fn test_program_error_display() {
        let err = ProgramReadError::NotFound {
            path: PathBuf::from("part.gcode"),
        };
        assert_eq!(err.to_string(), "Program not found: part.gcode");
    }

    #[test]
    fn test_warning_display() {
        let warning = NumericParseWarning {
            line_number: 12,
            letter: 'X',
            text: "1.2.3".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Line 12: ignored non-numeric value for X: 1.2.3"
        );
    }
}
