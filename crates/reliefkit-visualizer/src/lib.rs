//! # ReliefKit Visualizer
//!
//! G-code program analysis for ReliefKit: replays a program against modal
//! machine state and reports machining time, travel distances, feed and
//! height ranges, and the XY trajectory used by plotting front ends.

pub mod analyzer;
pub mod gcode;
pub mod utils;

pub use analyzer::ProgramAnalyzer;
pub use gcode::{
    strip_comments, AnalysisReport, Bounds, ChartSeries, MachineState, MachineStateTracker,
    MotionSummary, ProgramToken, ProgramTokenizer, SegmentMetric, StatisticsAggregator,
    ValueStats,
};
pub use utils::{FileReadStats, GcodeFileReader};
