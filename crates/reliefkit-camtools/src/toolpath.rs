//! Toolpath Generator
//!
//! Turns a [`HeightGrid`] or an [`ActiveMask`] into an ordered [`MotionPlan`].
//!
//! Both modes scan rows in zigzag order: even rows left to right, odd rows
//! right to left. Grid cell (row, col) sits at `(col * step, row * step)`.

use crate::error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
use crate::height_field::{ActiveMask, HeightGrid};
use reliefkit_core::MotionKind;
use reliefkit_settings::GeneratorSettings;
use serde::{Deserialize, Serialize};

/// Target coordinates of a move; `None` axes are left unchanged
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Target {
    /// Fully specified target
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// XY target, Z unchanged
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    /// Z-only target
    pub fn z(z: f64) -> Self {
        Self {
            x: None,
            y: None,
            z: Some(z),
        }
    }
}

/// A single linear move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Non-cutting traverse (G0)
    Rapid { target: Target, feed: Option<f64> },
    /// Cutting move at a programmed feed (G1)
    Cut { target: Target, feed: Option<f64> },
}

impl MotionCommand {
    /// Rapid move without a feed word
    pub fn rapid(target: Target) -> Self {
        MotionCommand::Rapid { target, feed: None }
    }

    /// Cutting move at `feed`
    pub fn cut(target: Target, feed: f64) -> Self {
        MotionCommand::Cut {
            target,
            feed: Some(feed),
        }
    }

    /// Rapid or cut
    pub fn kind(&self) -> MotionKind {
        match self {
            MotionCommand::Rapid { .. } => MotionKind::Rapid,
            MotionCommand::Cut { .. } => MotionKind::Cut,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            MotionCommand::Rapid { target, .. } | MotionCommand::Cut { target, .. } => target,
        }
    }

    pub fn feed(&self) -> Option<f64> {
        match self {
            MotionCommand::Rapid { feed, .. } | MotionCommand::Cut { feed, .. } => *feed,
        }
    }
}

/// Non-motion program words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineCode {
    /// G21
    UnitsMillimeters,
    /// G90
    AbsolutePositioning,
    /// G17
    PlaneXY,
    /// M3
    SpindleOn,
    /// M5
    SpindleOff,
    /// M30
    ProgramEnd,
}

impl MachineCode {
    /// The program word
    pub fn word(&self) -> &'static str {
        match self {
            MachineCode::UnitsMillimeters => "G21",
            MachineCode::AbsolutePositioning => "G90",
            MachineCode::PlaneXY => "G17",
            MachineCode::SpindleOn => "M3",
            MachineCode::SpindleOff => "M5",
            MachineCode::ProgramEnd => "M30",
        }
    }

    /// Short description written as an inline comment
    pub fn description(&self) -> &'static str {
        match self {
            MachineCode::UnitsMillimeters => "Set units to millimeters",
            MachineCode::AbsolutePositioning => "Absolute positioning",
            MachineCode::PlaneXY => "XY plane selection",
            MachineCode::SpindleOn => "Start spindle",
            MachineCode::SpindleOff => "Stop spindle",
            MachineCode::ProgramEnd => "End program",
        }
    }
}

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanStep {
    /// Free-text comment line
    Comment(String),
    /// Modal or machine word
    Code(MachineCode),
    /// Linear move
    Motion(MotionCommand),
}

/// Ordered program produced by the generator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionPlan {
    steps: Vec<PlanStep>,
    passes: usize,
}

impl MotionPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.steps.push(PlanStep::Comment(text.into()));
    }

    pub fn code(&mut self, code: MachineCode) {
        self.steps.push(PlanStep::Code(code));
    }

    pub fn motion(&mut self, command: MotionCommand) {
        self.steps.push(PlanStep::Motion(command));
    }

    pub fn extend_motions<I: IntoIterator<Item = MotionCommand>>(&mut self, commands: I) {
        self.steps
            .extend(commands.into_iter().map(PlanStep::Motion));
    }

    /// All steps in program order
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Only the motion steps, in program order
    pub fn motions(&self) -> impl Iterator<Item = &MotionCommand> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Motion(command) => Some(command),
            _ => None,
        })
    }

    /// Number of depth passes the plan was built with
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn cut_count(&self) -> usize {
        self.motions()
            .filter(|m| m.kind() == MotionKind::Cut)
            .count()
    }

    pub fn rapid_count(&self) -> usize {
        self.motions()
            .filter(|m| m.kind() == MotionKind::Rapid)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Depth of each pass for total depth `total_depth` (negative is below the
/// surface) and per-pass limit `max_per_pass`.
///
/// Depths approach `total_depth` monotonically and the last one equals it.
/// A non-negative `total_depth` is a single pass.
pub fn pass_depths(total_depth: f64, max_per_pass: f64) -> ParameterResult<Vec<f64>> {
    if !(max_per_pass.is_finite() && max_per_pass > 0.0) {
        return Err(ParameterError::OutOfRange {
            name: "max_depth_per_pass".to_string(),
            value: max_per_pass,
            min: 0.0,
            max: f64::MAX,
        });
    }
    if !total_depth.is_finite() {
        return Err(ParameterError::OutOfRange {
            name: "total_depth".to_string(),
            value: total_depth,
            min: f64::MIN,
            max: f64::MAX,
        });
    }
    if total_depth >= 0.0 {
        return Ok(vec![total_depth]);
    }

    // 1e-9 keeps exact multiples like 0.6/0.2 from gaining a duplicate pass
    let passes = ((total_depth.abs() / max_per_pass) - 1e-9).ceil().max(1.0) as usize;
    let mut depths: Vec<f64> = (1..=passes)
        .map(|i| total_depth.max(-max_per_pass * i as f64))
        .collect();
    if let Some(last) = depths.last_mut() {
        *last = total_depth;
    }
    Ok(depths)
}

/// Column visiting order for a row: ascending on even rows, descending on odd
pub fn zigzag_columns(row: usize, cols: usize) -> Box<dyn Iterator<Item = usize>> {
    if row % 2 == 0 {
        Box::new(0..cols)
    } else {
        Box::new((0..cols).rev())
    }
}

/// Generator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ToolpathParameters {
    /// Distance between grid points (mm)
    pub step_mm: f64,
    /// Safety height for traverses (mm)
    pub safe_z: f64,
    /// Feed for the header safety move (mm/min)
    pub rapid_feed: f64,
    /// Feed for every cut (mm/min)
    pub cut_feed: f64,
    /// Per-pass depth limit in binary mode (mm, positive)
    pub max_depth_per_pass: f64,
    /// Tool diameter, recorded in the header
    pub tool_diameter: f64,
}

impl Default for ToolpathParameters {
    fn default() -> Self {
        Self::from_settings(&GeneratorSettings::default())
    }
}

impl ToolpathParameters {
    /// Parameters from the generator section of the configuration
    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        Self {
            step_mm: settings.step_mm(),
            safe_z: settings.safe_z,
            rapid_feed: settings.rapid_feed,
            cut_feed: settings.cut_feed,
            max_depth_per_pass: settings.max_depth_per_pass,
            tool_diameter: settings.tool_diameter,
        }
    }

    /// Reject values the scanner cannot use
    pub fn validate(&self) -> ParameterResult<()> {
        for (name, value) in [
            ("step_mm", self.step_mm),
            ("cut_feed", self.cut_feed),
            ("max_depth_per_pass", self.max_depth_per_pass),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParameterError::OutOfRange {
                    name: name.to_string(),
                    value,
                    min: 0.0,
                    max: f64::MAX,
                });
            }
        }
        Ok(())
    }
}

/// Raster toolpath generator
#[derive(Debug, Clone)]
pub struct ToolpathGenerator {
    params: ToolpathParameters,
}

impl ToolpathGenerator {
    /// Create a generator, validating its parameters
    pub fn new(params: ToolpathParameters) -> CamToolResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Generator configured from settings
    pub fn from_settings(settings: &GeneratorSettings) -> CamToolResult<Self> {
        Self::new(ToolpathParameters::from_settings(settings))
    }

    pub fn params(&self) -> &ToolpathParameters {
        &self.params
    }

    fn position(&self, row: usize, col: usize) -> (f64, f64) {
        (col as f64 * self.params.step_mm, row as f64 * self.params.step_mm)
    }

    /// Moves for one continuous-height scan (no header or footer)
    pub fn surface_moves(&self, grid: &HeightGrid) -> Vec<MotionCommand> {
        let mut moves = Vec::with_capacity(grid.rows() * (grid.cols() + 1));

        for row in 0..grid.rows() {
            let heights = grid.row(row);
            for col in zigzag_columns(row, grid.cols()) {
                let (x, y) = self.position(row, col);
                moves.push(MotionCommand::cut(
                    Target::xyz(x, y, -heights[col]),
                    self.params.cut_feed,
                ));
            }
            if row + 1 < grid.rows() {
                moves.push(MotionCommand::rapid(Target::z(self.params.safe_z)));
            }
        }

        moves
    }

    /// Moves for one binary pass at `depth` (no header or footer)
    pub fn pass_moves(&self, mask: &ActiveMask, depth: f64) -> Vec<MotionCommand> {
        let safe_z = self.params.safe_z;
        let feed = self.params.cut_feed;
        let mut moves = Vec::new();

        for row in 0..mask.rows() {
            let mut cutting = false;

            for col in zigzag_columns(row, mask.cols()) {
                let (x, y) = self.position(row, col);
                match (cutting, mask.is_active(row, col)) {
                    (false, true) => {
                        moves.push(MotionCommand::rapid(Target::xyz(x, y, safe_z)));
                        moves.push(MotionCommand::cut(Target::xyz(x, y, depth), feed));
                        cutting = true;
                    }
                    (true, true) => {
                        moves.push(MotionCommand::cut(Target::xyz(x, y, depth), feed));
                    }
                    (true, false) => {
                        moves.push(MotionCommand::rapid(Target::z(safe_z)));
                        cutting = false;
                    }
                    (false, false) => {}
                }
            }

            if cutting {
                moves.push(MotionCommand::rapid(Target::z(safe_z)));
            }
        }

        moves
    }

    fn header(&self, plan: &mut MotionPlan, title: &str, rows: usize, cols: usize) {
        let p = &self.params;
        plan.comment(title);
        plan.comment(format!(
            "Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        plan.comment(format!(
            "Grid: {} x {} points, {:.3} mm step",
            cols, rows, p.step_mm
        ));
        plan.comment(format!(
            "Size: {:.2}mm x {:.2}mm",
            cols as f64 * p.step_mm,
            rows as f64 * p.step_mm
        ));
        plan.comment(format!("Tool diameter: {:.3} mm", p.tool_diameter));
        plan.comment(format!("Feed rate: {:.0} mm/min", p.cut_feed));

        plan.code(MachineCode::UnitsMillimeters);
        plan.code(MachineCode::AbsolutePositioning);
        plan.code(MachineCode::PlaneXY);
        plan.code(MachineCode::SpindleOn);
        plan.motion(MotionCommand::Rapid {
            target: Target::z(p.safe_z),
            feed: Some(p.rapid_feed),
        });
        plan.motion(MotionCommand::rapid(Target::xy(0.0, 0.0)));
    }

    fn footer(&self, plan: &mut MotionPlan) {
        plan.comment("End of program");
        plan.code(MachineCode::SpindleOff);
        plan.motion(MotionCommand::rapid(Target::z(self.params.safe_z)));
        plan.motion(MotionCommand::rapid(Target::xy(0.0, 0.0)));
        plan.code(MachineCode::ProgramEnd);
    }

    /// Single-pass plan: one cut per grid cell at `-height`
    pub fn single_pass(&self, grid: &HeightGrid) -> MotionPlan {
        self.single_pass_with_progress(grid, |_| {})
    }

    /// Single-pass plan with progress callback (0.0 to 1.0)
    pub fn single_pass_with_progress<F>(&self, grid: &HeightGrid, mut progress: F) -> MotionPlan
    where
        F: FnMut(f32),
    {
        let mut plan = MotionPlan::new();
        plan.passes = 1;
        self.header(&mut plan, "Relief carving toolpath", grid.rows(), grid.cols());
        plan.comment(format!("Max height: {:.3} mm", grid.max_height()));
        progress(0.1);

        plan.extend_motions(self.surface_moves(grid));
        progress(0.9);

        self.footer(&mut plan);
        progress(1.0);

        tracing::debug!(
            "Single-pass plan: {} cuts, {} rapids",
            plan.cut_count(),
            plan.rapid_count()
        );
        plan
    }

    /// Multi-pass plan over the active cells down to `total_depth`
    pub fn multi_pass(&self, mask: &ActiveMask, total_depth: f64) -> CamToolResult<MotionPlan> {
        self.multi_pass_with_progress(mask, total_depth, |_| {})
    }

    /// Multi-pass plan with progress callback (0.0 to 1.0)
    pub fn multi_pass_with_progress<F>(
        &self,
        mask: &ActiveMask,
        total_depth: f64,
        mut progress: F,
    ) -> CamToolResult<MotionPlan>
    where
        F: FnMut(f32),
    {
        let depths = pass_depths(total_depth, self.params.max_depth_per_pass)
            .map_err(|e| CamToolError::InvalidParameters(e.to_string()))?;

        let mut plan = MotionPlan::new();
        plan.passes = depths.len();
        self.header(&mut plan, "Binary multi-pass toolpath", mask.rows(), mask.cols());
        plan.comment(format!(
            "Total depth: {:.3} mm in {} passes of at most {:.3} mm",
            total_depth,
            depths.len(),
            self.params.max_depth_per_pass
        ));
        progress(0.05);

        let count = depths.len();
        for (index, depth) in depths.iter().enumerate() {
            plan.comment(format!("Pass {}/{} at Z{:.3}", index + 1, count, depth));
            plan.extend_motions(self.pass_moves(mask, *depth));
            progress(0.05 + 0.9 * (index + 1) as f32 / count as f32);
        }

        self.footer(&mut plan);
        progress(1.0);

        tracing::debug!(
            "Multi-pass plan: {} passes, {} active cells, {} cuts",
            count,
            mask.active_count(),
            plan.cut_count()
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> ToolpathGenerator {
        ToolpathGenerator::new(ToolpathParameters {
            step_mm: 1.0,
            safe_z: 5.0,
            rapid_feed: 3000.0,
            cut_feed: 1500.0,
            max_depth_per_pass: 2.0,
            tool_diameter: 3.175,
        })
        .unwrap()
    }

    #[test]
    fn test_pass_depths_reference_case() {
        let depths = pass_depths(-5.2, 2.0).unwrap();
        assert_eq!(depths, vec![-2.0, -4.0, -5.2]);
    }

    #[test]
    fn test_pass_depths_exact_multiple() {
        assert_eq!(pass_depths(-4.0, 2.0).unwrap(), vec![-2.0, -4.0]);
        assert_eq!(pass_depths(-0.6, 0.2).unwrap().len(), 3);
    }

    #[test]
    fn test_pass_depths_non_negative_is_single_pass() {
        assert_eq!(pass_depths(0.0, 2.0).unwrap(), vec![0.0]);
        assert_eq!(pass_depths(1.5, 2.0).unwrap(), vec![1.5]);
    }

    #[test]
    fn test_pass_depths_rejects_zero_step() {
        assert!(pass_depths(-3.0, 0.0).is_err());
    }

    #[test]
    fn test_zigzag_columns() {
        assert_eq!(zigzag_columns(0, 3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(zigzag_columns(1, 3).collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn test_surface_moves_zigzag_and_depth() {
        let grid = HeightGrid::filled(2, 3, 1.5, 6.0).unwrap();
        let moves = generator().surface_moves(&grid);

        // 6 cuts + 1 rapid between rows
        assert_eq!(moves.len(), 7);
        let xs: Vec<f64> = moves
            .iter()
            .filter(|m| m.kind() == MotionKind::Cut)
            .map(|m| m.target().x.unwrap())
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]);
        assert_eq!(moves[3], MotionCommand::rapid(Target::z(5.0)));
        assert!(moves
            .iter()
            .filter(|m| m.kind() == MotionKind::Cut)
            .all(|m| m.target().z == Some(-1.5) && m.feed() == Some(1500.0)));
    }

    #[test]
    fn test_pass_moves_transitions() {
        let mask = ActiveMask::from_rows(&[".##."]).unwrap();
        let moves = generator().pass_moves(&mask, -2.0);

        assert_eq!(
            moves,
            vec![
                MotionCommand::rapid(Target::xyz(1.0, 0.0, 5.0)),
                MotionCommand::cut(Target::xyz(1.0, 0.0, -2.0), 1500.0),
                MotionCommand::cut(Target::xyz(2.0, 0.0, -2.0), 1500.0),
                MotionCommand::rapid(Target::z(5.0)),
            ]
        );
    }

    #[test]
    fn test_pass_moves_retract_at_row_end() {
        let mask = ActiveMask::from_rows(&["..#", "...", "#.."]).unwrap();
        let moves = generator().pass_moves(&mask, -1.0);

        // row 0 ends while cutting, row 1 is empty, row 2 is scanned right to left and ends cutting
        assert_eq!(moves.len(), 6);
        assert_eq!(moves[2], MotionCommand::rapid(Target::z(5.0)));
        assert_eq!(moves[3], MotionCommand::rapid(Target::xyz(0.0, 2.0, 5.0)));
        assert_eq!(moves[5], MotionCommand::rapid(Target::z(5.0)));
    }

    #[test]
    fn test_multi_pass_plan_has_one_block_per_pass() {
        let mask = ActiveMask::from_rows(&["##"]).unwrap();
        let plan = generator().multi_pass(&mask, -5.2).unwrap();
        assert_eq!(plan.passes(), 3);

        let depths: Vec<f64> = plan
            .motions()
            .filter(|m| m.kind() == MotionKind::Cut)
            .map(|m| m.target().z.unwrap())
            .collect();
        assert_eq!(depths, vec![-2.0, -2.0, -4.0, -4.0, -5.2, -5.2]);
    }

    fn codes(plan: &MotionPlan) -> Vec<MachineCode> {
        plan.steps()
            .iter()
            .filter_map(|s| match s {
                PlanStep::Code(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_both_modes_share_header_and_footer() {
        let gen = generator();
        let single = gen.single_pass(&HeightGrid::filled(1, 1, 0.0, 6.0).unwrap());
        let multi = gen
            .multi_pass(&ActiveMask::from_rows(&["#."]).unwrap(), -3.0)
            .unwrap();

        let expected_codes = vec![
            MachineCode::UnitsMillimeters,
            MachineCode::AbsolutePositioning,
            MachineCode::PlaneXY,
            MachineCode::SpindleOn,
            MachineCode::SpindleOff,
            MachineCode::ProgramEnd,
        ];
        let opening = [
            MotionCommand::Rapid {
                target: Target::z(5.0),
                feed: Some(3000.0),
            },
            MotionCommand::rapid(Target::xy(0.0, 0.0)),
        ];
        let closing = [
            MotionCommand::rapid(Target::z(5.0)),
            MotionCommand::rapid(Target::xy(0.0, 0.0)),
        ];

        for plan in [&single, &multi] {
            assert_eq!(codes(plan), expected_codes);
            let motions: Vec<MotionCommand> = plan.motions().copied().collect();
            assert_eq!(&motions[..2], &opening);
            assert_eq!(&motions[motions.len() - 2..], &closing);
            assert_eq!(plan.steps().last(), Some(&PlanStep::Code(MachineCode::ProgramEnd)));
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let params = ToolpathParameters {
            step_mm: 0.0,
            ..ToolpathParameters::default()
        };
        assert!(ToolpathGenerator::new(params).is_err());
    }
}
