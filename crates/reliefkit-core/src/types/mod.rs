//! Value types shared by the generator and the analyzer.
//!
//! - [`Position`]: absolute XYZ machine position in millimeters
//! - [`AxisWords`]: a partial set of X/Y/Z/F values from one program line
//! - [`MotionKind`]: rapid, cut, or any other G-word
//! - [`Axis`]: the parameter letters the analyzer recognizes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter letters recognized on a program line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X coordinate
    X,
    /// Y coordinate
    Y,
    /// Z coordinate
    Z,
    /// Feed rate
    F,
}

impl Axis {
    /// Map a parameter letter (either case) to an axis
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'F' => Some(Axis::F),
            _ => None,
        }
    }

    /// Upper-case letter for this axis
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::F => 'F',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Kind of motion selected by a G-word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    /// G0 - rapid traverse
    Rapid,
    /// G1 - linear cut at the programmed feed
    Cut,
    /// Any other G-word (G17, G21, G90, ...)
    Other,
}

impl MotionKind {
    /// Classify a G-word number (`G00` and `G0` are both 0)
    pub fn from_g_number(number: u32) -> Self {
        match number {
            0 => MotionKind::Rapid,
            1 => MotionKind::Cut,
            _ => MotionKind::Other,
        }
    }
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionKind::Rapid => write!(f, "rapid"),
            MotionKind::Cut => write!(f, "cut"),
            MotionKind::Other => write!(f, "other"),
        }
    }
}

/// Absolute position in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Partial set of parameter values from a single line
///
/// Each field is `Some` only if the line explicitly carried that letter.
/// Omitted axes are modal: they keep whatever value the machine already had.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisWords {
    /// X value, if present
    pub x: Option<f64>,
    /// Y value, if present
    pub y: Option<f64>,
    /// Z value, if present
    pub z: Option<f64>,
    /// Feed rate, if present
    pub f: Option<f64>,
}

impl AxisWords {
    /// Create an empty set (all letters absent)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for one letter, replacing any earlier value
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = Some(value),
            Axis::Y => self.y = Some(value),
            Axis::Z => self.z = Some(value),
            Axis::F => self.f = Some(value),
        }
    }

    /// True when no letter was present
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.f.is_none()
    }

    /// Overlay the present coordinates onto `pos`, keeping the rest
    pub fn apply_to(&self, pos: &Position) -> Position {
        Position {
            x: self.x.unwrap_or(pos.x),
            y: self.y.unwrap_or(pos.y),
            z: self.z.unwrap_or(pos.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_from_letter_is_case_insensitive() {
        assert_eq!(Axis::from_letter('x'), Some(Axis::X));
        assert_eq!(Axis::from_letter('F'), Some(Axis::F));
        assert_eq!(Axis::from_letter('S'), None);
    }

    #[test]
    fn test_motion_kind_from_g_number() {
        assert_eq!(MotionKind::from_g_number(0), MotionKind::Rapid);
        assert_eq!(MotionKind::from_g_number(1), MotionKind::Cut);
        assert_eq!(MotionKind::from_g_number(21), MotionKind::Other);
    }

    #[test]
    fn test_distance_to() {
        let a = Position::default();
        let b = Position::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_to_keeps_omitted_axes() {
        let start = Position::new(1.0, 2.0, 3.0);
        let mut words = AxisWords::new();
        words.set(Axis::Y, 7.0);
        words.set(Axis::F, 600.0);

        let end = words.apply_to(&start);
        assert_eq!(end, Position::new(1.0, 7.0, 3.0));
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let mut words = AxisWords::new();
        assert!(words.is_empty());
        words.set(Axis::X, 1.0);
        words.set(Axis::X, 2.0);
        assert_eq!(words.x, Some(2.0));
    }
}
