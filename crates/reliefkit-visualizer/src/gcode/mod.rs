//! G-Code tokenizer and state machine
//!
//! This module provides:
//! - Line tokenizing (comment removal, first G-word, axis values)
//! - Modal state tracking with per-line distance and time
//! - Statistics aggregation into a report

pub mod state;
pub mod stats;
pub mod tokenizer;

pub use state::{MachineState, MachineStateTracker, SegmentMetric};
pub use stats::{AnalysisReport, Bounds, ChartSeries, MotionSummary, StatisticsAggregator, ValueStats};
pub use tokenizer::{strip_comments, ProgramToken, ProgramTokenizer};
