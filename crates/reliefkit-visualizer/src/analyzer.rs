//! Program analyzer
//!
//! Drives tokenizer, state tracker and aggregator over a whole program.
//! Each call starts from a fresh machine state, so one analyzer can be
//! reused for any number of programs.

use crate::gcode::{MachineStateTracker, ProgramTokenizer, StatisticsAggregator};
use crate::gcode::AnalysisReport;
use crate::utils::GcodeFileReader;
use reliefkit_core::ProgramReadError;
use reliefkit_settings::AnalyzerSettings;
use std::path::Path;

/// Replays programs and reports machining statistics
#[derive(Debug, Clone, Default)]
pub struct ProgramAnalyzer {
    settings: AnalyzerSettings,
    tokenizer: ProgramTokenizer,
}

struct AnalysisRun {
    tokenizer: ProgramTokenizer,
    tracker: MachineStateTracker,
    aggregator: StatisticsAggregator,
}

impl AnalysisRun {
    fn new(settings: &AnalyzerSettings, tokenizer: ProgramTokenizer) -> Self {
        Self {
            tokenizer,
            tracker: MachineStateTracker::new(settings.float_tolerance),
            aggregator: StatisticsAggregator::new(settings.trajectory_limit),
        }
    }

    fn line(&mut self, line_number: usize, line: &str) {
        if let Some(token) = self.tokenizer.tokenize(line, line_number) {
            self.aggregator.record_warnings(token.warnings.len());
            let metric = self.tracker.apply(&token, line_number);
            self.aggregator.record(&metric);
        }
    }
}

impl ProgramAnalyzer {
    /// Analyzer using the given settings
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self {
            settings,
            tokenizer: ProgramTokenizer::new(),
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Analyze in-memory lines
    pub fn analyze_lines<I, S>(&self, lines: I) -> AnalysisReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run = AnalysisRun::new(&self.settings, self.tokenizer);
        let mut lines_read = 0;
        for (index, line) in lines.into_iter().enumerate() {
            run.line(index + 1, line.as_ref());
            lines_read = index + 1;
        }
        run.aggregator.finish(lines_read)
    }

    /// Analyze program text
    pub fn analyze_str(&self, program: &str) -> AnalysisReport {
        self.analyze_lines(program.lines())
    }

    /// Analyze a program file; no partial report is returned on failure
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisReport, ProgramReadError> {
        let path = path.as_ref();
        let reader = GcodeFileReader::new(path).map_err(|e| {
            tracing::error!("{}", e);
            e
        })?;

        let mut run = AnalysisRun::new(&self.settings, self.tokenizer);
        let stats = reader
            .read_lines(|line_number, line| run.line(line_number, line))
            .map_err(|e| {
                tracing::error!("{}", e);
                e
            })?;

        let report = run.aggregator.finish(stats.lines_read);
        tracing::info!(
            "Analyzed {} ({} bytes, {} lines, {} processed) in {} ms",
            path.display(),
            reader.file_size(),
            stats.lines_read,
            report.summary.processed_lines,
            stats.read_time_ms
        );
        Ok(report)
    }
}
