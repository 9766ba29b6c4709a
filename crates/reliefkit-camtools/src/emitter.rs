//! Text emission for motion plans.

use crate::toolpath::{MachineCode, MotionCommand, MotionPlan, PlanStep};
use std::fmt::Write;
use std::path::Path;

/// Formats plan steps as program lines
#[derive(Debug, Clone, Copy)]
pub struct GcodeEmitter {
    /// Append the word description to machine codes (`G21 ; Set units ...`)
    pub annotate_codes: bool,
}

impl Default for GcodeEmitter {
    fn default() -> Self {
        Self {
            annotate_codes: true,
        }
    }
}

impl GcodeEmitter {
    /// One motion command, e.g. `G1 X1.000 Y2.000 Z-0.500 F1500`
    pub fn format_motion(&self, command: &MotionCommand) -> String {
        let mut line = String::from(match command {
            MotionCommand::Rapid { .. } => "G0",
            MotionCommand::Cut { .. } => "G1",
        });

        let target = command.target();
        for (letter, value) in [('X', target.x), ('Y', target.y), ('Z', target.z)] {
            if let Some(v) = value {
                // anything that rounds to zero prints unsigned
                let v = (v * 1000.0).round() / 1000.0;
                let v = if v == 0.0 { 0.0 } else { v };
                let _ = write!(line, " {}{:.3}", letter, v);
            }
        }
        if let Some(feed) = command.feed() {
            let _ = write!(line, " F{:.0}", feed);
        }

        line
    }

    pub fn format_code(&self, code: MachineCode) -> String {
        if self.annotate_codes {
            format!("{} ; {}", code.word(), code.description())
        } else {
            code.word().to_string()
        }
    }

    pub fn format_step(&self, step: &PlanStep) -> String {
        match step {
            PlanStep::Comment(text) => format!("; {}", text),
            PlanStep::Code(code) => self.format_code(*code),
            PlanStep::Motion(command) => self.format_motion(command),
        }
    }

    /// All lines of a plan
    pub fn lines(&self, plan: &MotionPlan) -> Vec<String> {
        plan.steps().iter().map(|s| self.format_step(s)).collect()
    }
}

impl MotionPlan {
    /// Program lines with the default formatting
    pub fn to_lines(&self) -> Vec<String> {
        GcodeEmitter::default().lines(self)
    }

    /// Newline-terminated program text
    pub fn to_gcode(&self) -> String {
        let mut gcode = String::new();
        for line in self.to_lines() {
            gcode.push_str(&line);
            gcode.push('\n');
        }
        gcode
    }

    /// Write the program to `path`, replacing any existing file
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_gcode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolpath::Target;

    #[test]
    fn test_format_cut() {
        let emitter = GcodeEmitter::default();
        let line = emitter.format_motion(&MotionCommand::cut(Target::xyz(1.0, 2.5, -0.25), 1500.0));
        assert_eq!(line, "G1 X1.000 Y2.500 Z-0.250 F1500");
    }

    #[test]
    fn test_format_rapid_omits_axes() {
        let emitter = GcodeEmitter::default();
        assert_eq!(
            emitter.format_motion(&MotionCommand::rapid(Target::z(5.0))),
            "G0 Z5.000"
        );
        assert_eq!(
            emitter.format_motion(&MotionCommand::Rapid {
                target: Target::z(5.0),
                feed: Some(3000.0)
            }),
            "G0 Z5.000 F3000"
        );
    }

    #[test]
    fn test_negative_zero_prints_unsigned() {
        let emitter = GcodeEmitter::default();
        let line = emitter.format_motion(&MotionCommand::cut(Target::xyz(0.0, 0.0, -0.0), 100.0));
        assert_eq!(line, "G1 X0.000 Y0.000 Z0.000 F100");

        let line = emitter.format_motion(&MotionCommand::cut(Target::xyz(-0.0004, 0.0, -0.0003), 100.0));
        assert_eq!(line, "G1 X0.000 Y0.000 Z0.000 F100");
        let line = emitter.format_motion(&MotionCommand::cut(Target::xyz(0.0, 0.0, -0.0006), 100.0));
        assert_eq!(line, "G1 X0.000 Y0.000 Z-0.001 F100");
    }

    #[test]
    fn test_codes_and_comments() {
        let plain = GcodeEmitter {
            annotate_codes: false,
        };
        assert_eq!(plain.format_code(MachineCode::ProgramEnd), "M30");
        assert_eq!(
            GcodeEmitter::default().format_step(&PlanStep::Code(MachineCode::UnitsMillimeters)),
            "G21 ; Set units to millimeters"
        );
        assert_eq!(
            GcodeEmitter::default().format_step(&PlanStep::Comment("hello".into())),
            "; hello"
        );
    }

    #[test]
    fn test_to_gcode_ends_with_newline() {
        let mut plan = MotionPlan::new();
        plan.code(MachineCode::ProgramEnd);
        assert_eq!(plan.to_gcode(), "M30 ; End program\n");
    }
}
