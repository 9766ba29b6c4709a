//! Program line tokenizer
//!
//! Splits one raw line into its first G-word and the X/Y/Z/F values it
//! carries. Comments are removed first: everything from the first `;` or `(`
//! to the end of the line is dropped.

use regex::Regex;
use reliefkit_core::{Axis, AxisWords, MotionKind, NumericParseWarning};
use std::sync::OnceLock;

fn g_word_regex() -> &'static Regex {
    static G_WORD: OnceLock<Regex> = OnceLock::new();
    G_WORD.get_or_init(|| Regex::new(r"(?i)G(\d+)").expect("invalid regex pattern"))
}

fn axis_regex() -> &'static Regex {
    static AXIS: OnceLock<Regex> = OnceLock::new();
    AXIS.get_or_init(|| Regex::new(r"(?i)([XYZF])([+-]?[\d.]+)").expect("invalid regex pattern"))
}

fn comment_regex() -> &'static Regex {
    static COMMENT: OnceLock<Regex> = OnceLock::new();
    COMMENT.get_or_init(|| Regex::new(r"[;(].*").expect("invalid regex pattern"))
}

/// Remove comments from a program line
pub fn strip_comments(line: &str) -> String {
    comment_regex().replace(line, "").into_owned()
}

/// Parsed content of one non-empty line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramToken {
    /// Number of the first G-word on the line, if any
    pub g_word: Option<u32>,
    /// Motion classification of that G-word
    pub motion: Option<MotionKind>,
    /// Axis and feed values; the last occurrence of a letter wins
    pub words: AxisWords,
    /// Values that were dropped because they did not parse
    pub warnings: Vec<NumericParseWarning>,
}

impl ProgramToken {
    /// True if the line explicitly set X or Y
    pub fn sets_xy(&self) -> bool {
        self.words.x.is_some() || self.words.y.is_some()
    }
}

/// Line tokenizer
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramTokenizer;

impl ProgramTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize `line`; `None` when nothing remains after removing comments.
    ///
    /// `line_number` is only used to label warnings.
    pub fn tokenize(&self, line: &str, line_number: usize) -> Option<ProgramToken> {
        let cleaned = strip_comments(line);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }

        let mut token = ProgramToken::default();

        // Only the first G-word decides the motion kind
        if let Some(caps) = g_word_regex().captures(cleaned) {
            let number = caps[1].parse::<u32>().ok();
            token.g_word = number;
            token.motion = Some(number.map_or(MotionKind::Other, MotionKind::from_g_number));
        }

        for caps in axis_regex().captures_iter(cleaned) {
            let letter = caps[1].chars().next().unwrap_or('?');
            let Some(axis) = Axis::from_letter(letter) else {
                continue;
            };
            let text = &caps[2];
            match text.parse::<f64>() {
                Ok(value) => token.words.set(axis, value),
                Err(_) => {
                    let warning = NumericParseWarning {
                        line_number,
                        letter: axis.letter(),
                        text: text.to_string(),
                    };
                    tracing::warn!("{}", warning);
                    token.warnings.push(warning);
                }
            }
        }

        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("G1 X1 ; move"), "G1 X1 ");
        assert_eq!(strip_comments("G1 (inline) X1"), "G1 ");
        assert_eq!(strip_comments("G1 X1 (never closed"), "G1 X1 ");
        assert_eq!(strip_comments("G0 X1 ; a (b) c"), "G0 X1 ");
        assert_eq!(strip_comments("(a;b) G0"), "");
        assert_eq!(strip_comments("; only a comment"), "");
    }

    #[test]
    fn test_words_after_parenthesis_are_dropped() {
        let token = ProgramTokenizer::new().tokenize("G1 (note) X5", 1).unwrap();
        assert_eq!(token.motion, Some(MotionKind::Cut));
        assert_eq!(token.words.x, None);
        assert!(ProgramTokenizer::new().tokenize("(a;b) G0 X3", 2).is_none());
    }

    #[test]
    fn test_comment_only_line_has_no_token() {
        let tokenizer = ProgramTokenizer::new();
        assert!(tokenizer.tokenize("; header", 1).is_none());
        assert!(tokenizer.tokenize("(setup)", 2).is_none());
        assert!(tokenizer.tokenize("   ", 3).is_none());
    }

    #[test]
    fn test_basic_cut_line() {
        let token = ProgramTokenizer::new()
            .tokenize("G1 X10 Y0 Z-1 F600", 1)
            .unwrap();
        assert_eq!(token.g_word, Some(1));
        assert_eq!(token.motion, Some(MotionKind::Cut));
        assert_eq!(token.words.x, Some(10.0));
        assert_eq!(token.words.y, Some(0.0));
        assert_eq!(token.words.z, Some(-1.0));
        assert_eq!(token.words.f, Some(600.0));
    }

    #[test]
    fn test_first_g_word_wins() {
        let token = ProgramTokenizer::new().tokenize("G0 G1 X5", 1).unwrap();
        assert_eq!(token.motion, Some(MotionKind::Rapid));

        let token = ProgramTokenizer::new().tokenize("G90 G1 X5", 1).unwrap();
        assert_eq!(token.g_word, Some(90));
        assert_eq!(token.motion, Some(MotionKind::Other));
    }

    #[test]
    fn test_leading_zero_g_word() {
        let token = ProgramTokenizer::new().tokenize("g01 x1", 1).unwrap();
        assert_eq!(token.g_word, Some(1));
        assert_eq!(token.words.x, Some(1.0));
    }

    #[test]
    fn test_last_value_per_letter() {
        let token = ProgramTokenizer::new().tokenize("G1 X1 X2 X3", 1).unwrap();
        assert_eq!(token.words.x, Some(3.0));
    }

    #[test]
    fn test_malformed_value_is_warning() {
        let token = ProgramTokenizer::new()
            .tokenize("G1 X1.2.3 Y4", 7)
            .unwrap();
        assert_eq!(token.words.x, None);
        assert_eq!(token.words.y, Some(4.0));
        assert_eq!(token.warnings.len(), 1);
        assert_eq!(token.warnings[0].line_number, 7);
        assert_eq!(token.warnings[0].letter, 'X');
        assert_eq!(token.warnings[0].text, "1.2.3");
    }

    #[test]
    fn test_line_without_g_word() {
        let token = ProgramTokenizer::new().tokenize("M30", 1).unwrap();
        assert_eq!(token.g_word, None);
        assert_eq!(token.motion, None);
        assert!(token.words.is_empty());
    }
}
