//! Statistics aggregation
//!
//! Folds [`SegmentMetric`]s, in program order, into an [`AnalysisReport`].
//! Reductions over no data report zero.

use super::state::SegmentMetric;
use reliefkit_core::MotionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Extrema and mean of a series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    max: f64,
    min: f64,
    sum: f64,
    count: usize,
}

impl RunningStats {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.max = value;
            self.min = value;
        } else {
            self.max = self.max.max(value);
            self.min = self.min.min(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn finish(&self) -> ValueStats {
        if self.count == 0 {
            return ValueStats::default();
        }
        ValueStats {
            max: self.max,
            min: self.min,
            mean: self.sum / self.count as f64,
            count: self.count,
        }
    }
}

/// X/Y extents over lines that set each axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Line, command, distance and time totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSummary {
    /// Raw lines read from the source, including blanks and comments
    pub lines_read: usize,
    /// Lines that produced a token
    pub processed_lines: usize,
    /// G0 lines
    pub rapid_moves: usize,
    /// G1 lines
    pub cut_moves: usize,
    /// Count per distinct G-word (`"G0"`, `"G21"`, ...)
    pub g_word_counts: BTreeMap<String, usize>,
    /// Total cutting distance (mm)
    pub cut_distance_mm: f64,
    /// Total cutting time (seconds)
    pub cut_time_s: f64,
    /// Total rapid distance (mm)
    pub rapid_distance_mm: f64,
    /// Malformed numeric values skipped
    pub warnings: usize,
}

/// Series for charting collaborators
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Effective feed of every line where it was positive
    pub feeds: Vec<f64>,
    /// Every explicitly programmed Z
    pub z_values: Vec<f64>,
    /// Machine (x, y) after each line that set X or Y
    pub trajectory: Vec<(f64, f64)>,
}

/// Result of analyzing one program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: MotionSummary,
    pub feeds: ValueStats,
    pub heights: ValueStats,
    pub bounds: Bounds,
    pub chart: ChartSeries,
}

impl AnalysisReport {
    pub fn cut_time_minutes(&self) -> f64 {
        self.summary.cut_time_s / 60.0
    }

    pub fn cut_distance_m(&self) -> f64 {
        self.summary.cut_distance_mm / 1000.0
    }

    pub fn rapid_distance_m(&self) -> f64 {
        self.summary.rapid_distance_mm / 1000.0
    }

    /// Most frequent G-words, highest count first, ties by name
    pub fn top_g_words(&self, n: usize) -> Vec<(&str, usize)> {
        let mut words: Vec<(&str, usize)> = self
            .summary
            .g_word_counts
            .iter()
            .map(|(word, &count)| (word.as_str(), count))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        words.truncate(n);
        words
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "=== Program analysis ===")?;
        writeln!(f, "Lines read:        {}", s.lines_read)?;
        writeln!(f, "Lines processed:   {}", s.processed_lines)?;
        writeln!(f, "Rapid moves (G0):  {}", s.rapid_moves)?;
        writeln!(f, "Cut moves (G1):    {}", s.cut_moves)?;
        if s.warnings > 0 {
            writeln!(f, "Warnings:          {}", s.warnings)?;
        }
        writeln!(f)?;
        writeln!(f, "Cutting time:      {:.2} min", self.cut_time_minutes())?;
        writeln!(f, "Cutting distance:  {:.3} m", self.cut_distance_m())?;
        writeln!(f, "Rapid distance:    {:.3} m", self.rapid_distance_m())?;
        writeln!(f)?;
        writeln!(
            f,
            "Feed (mm/min):     max {:.0}  min {:.0}  mean {:.1}",
            self.feeds.max, self.feeds.min, self.feeds.mean
        )?;
        writeln!(
            f,
            "Z (mm):            max {:.3}  min {:.3}  mean {:.3}",
            self.heights.max, self.heights.min, self.heights.mean
        )?;
        writeln!(
            f,
            "X range (mm):      {:.3} .. {:.3}",
            self.bounds.x_min, self.bounds.x_max
        )?;
        writeln!(
            f,
            "Y range (mm):      {:.3} .. {:.3}",
            self.bounds.y_min, self.bounds.y_max
        )?;

        let top = self.top_g_words(5);
        if !top.is_empty() {
            writeln!(f)?;
            writeln!(f, "Most frequent G-words:")?;
            for (word, count) in top {
                writeln!(f, "  {:<6} {}", word, count)?;
            }
        }
        Ok(())
    }
}

/// Folds segment metrics into a report
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    summary: MotionSummary,
    feeds: RunningStats,
    heights: RunningStats,
    x: RunningStats,
    y: RunningStats,
    chart: ChartSeries,
    trajectory_limit: usize,
}

impl StatisticsAggregator {
    /// Aggregator keeping at most `trajectory_limit` trajectory points
    pub fn new(trajectory_limit: usize) -> Self {
        Self {
            summary: MotionSummary::default(),
            feeds: RunningStats::default(),
            heights: RunningStats::default(),
            x: RunningStats::default(),
            y: RunningStats::default(),
            chart: ChartSeries::default(),
            trajectory_limit,
        }
    }

    /// Fold one metric
    pub fn record(&mut self, metric: &SegmentMetric) {
        let s = &mut self.summary;
        s.processed_lines += 1;

        match metric.motion {
            Some(MotionKind::Cut) => {
                s.cut_moves += 1;
                if metric.moved {
                    s.cut_distance_mm += metric.distance;
                    s.cut_time_s += metric.time;
                }
            }
            Some(MotionKind::Rapid) => {
                s.rapid_moves += 1;
                if metric.moved {
                    s.rapid_distance_mm += metric.distance;
                }
            }
            _ => {}
        }

        if let Some(number) = metric.g_word {
            *s.g_word_counts.entry(format!("G{}", number)).or_insert(0) += 1;
        }

        if metric.feed_at_line > 0.0 {
            self.feeds.push(metric.feed_at_line);
            self.chart.feeds.push(metric.feed_at_line);
        }

        if let Some(z) = metric.words.z {
            self.heights.push(z);
            self.chart.z_values.push(z);
        }
        if let Some(x) = metric.words.x {
            self.x.push(x);
        }
        if let Some(y) = metric.words.y {
            self.y.push(y);
        }

        let sets_xy = metric.words.x.is_some() || metric.words.y.is_some();
        if sets_xy && self.chart.trajectory.len() < self.trajectory_limit {
            self.chart.trajectory.push((metric.end.x, metric.end.y));
        }
    }

    /// Count skipped numeric values
    pub fn record_warnings(&mut self, count: usize) {
        self.summary.warnings += count;
    }

    /// Finish with the raw number of lines read from the source
    pub fn finish(mut self, lines_read: usize) -> AnalysisReport {
        self.summary.lines_read = lines_read;
        let x = self.x.finish();
        let y = self.y.finish();

        AnalysisReport {
            summary: self.summary,
            feeds: self.feeds.finish(),
            heights: self.heights.finish(),
            bounds: Bounds {
                x_min: x.min,
                x_max: x.max,
                y_min: y.min,
                y_max: y.max,
            },
            chart: self.chart,
        }
    }
}
