//! Text cleanup: turn a PDF page's raw text layer into translatable prose.
//!
//! PDF text layers break lines wherever the typesetter wrapped them, carry
//! copyright footers and running headers, and letter-space display headings.
//! Sent verbatim, every hard line break becomes a sentence boundary for the
//! translator. These rules undo that without touching the wording.
//!
//! ## Rule Order
//!
//! Boilerplate is removed before lines are joined (the patterns are line
//! based), and bullets are split out after joining so each bullet item starts
//! its own line again.

use crate::error::TranslateError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Page-text normaliser with the caller's boilerplate patterns compiled in.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    strip: Vec<Regex>,
}

impl Normalizer {
    /// Compile `patterns` (regular expressions for running headers and the like).
    pub fn new(patterns: &[String]) -> Result<Self, TranslateError> {
        Ok(Self {
            strip: compile_strip_patterns(patterns)?,
        })
    }

    /// Apply all cleanup rules to one page of raw text.
    ///
    /// Rules (applied in order):
    /// 1. Drop `Copyright …` lines
    /// 2. Drop configured boilerplate (plus trailing spaces, dashes, newline)
    /// 3. Join soft-wrapped lines
    /// 4. Start every bullet glyph on its own line
    /// 5. Collapse letter-spaced capitals (`C H A P T E R` → `CHAPTER`)
    /// 6. Collapse runs of spaces
    pub fn normalize(&self, raw: &str) -> String {
        let s = RE_COPYRIGHT.replace_all(raw, "").into_owned();
        let s = self
            .strip
            .iter()
            .fold(s, |acc, re| re.replace_all(&acc, "").into_owned());
        let s = join_soft_wraps(&s);
        let s = RE_BULLET.replace_all(&s, "\n$1").into_owned();
        let s = collapse_spaced_capitals(&s);
        RE_SPACES.replace_all(&s, " ").into_owned()
    }
}

/// Clean one page with the default rules only.
pub fn normalize(raw: &str) -> String {
    Normalizer::default().normalize(raw)
}

/// Compile boilerplate patterns, each extended to swallow trailing
/// separators and the line break.
pub fn compile_strip_patterns(patterns: &[String]) -> Result<Vec<Regex>, TranslateError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(&format!(r"(?:{p})[\s\-]*\n?")).map_err(|e| {
                TranslateError::InvalidConfig(format!("Invalid strip pattern '{p}': {e}"))
            })
        })
        .collect()
}

// ── Rule 1: Copyright lines ──────────────────────────────────────────────────

static RE_COPYRIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"Copyright.*\n?").unwrap());

// ── Rule 3: Soft wraps ───────────────────────────────────────────────────────

/// Characters that make a following line a real new line (list items,
/// numbered steps, sentence-leading punctuation).
fn keeps_line_break(next: char) -> bool {
    matches!(next, '.' | '!' | '?' | '؟' | ')' | '*' | '-') || next.is_numeric()
}

fn join_soft_wraps(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' && !chars.peek().copied().is_some_and(keeps_line_break) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

// ── Rule 4: Bullets ──────────────────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "\n?([\u{2022}\u{2013}\u{25cb}\u{25a0}\u{2666}\u{2023}\u{203a}\u{261b}\u{2192}\u{25cf}\u{25e6}\u{25aa}\u{25ab}\u{25c9}\u{25d8}\u{25d9}\u{25c6}\u{25c7}\u{274f}\u{2756}\u{2765}\u{2767}])",
    )
    .unwrap()
});

// ── Rule 5: Letter-spaced capitals ───────────────────────────────────────────

static RE_SPACED_CAPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z](?: [A-Z]){2,}\b").unwrap());

fn collapse_spaced_capitals(input: &str) -> String {
    RE_SPACED_CAPS
        .replace_all(input, |caps: &regex::Captures| caps[0].replace(' ', ""))
        .into_owned()
}

// ── Rule 6: Spaces ───────────────────────────────────────────────────────────

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_copyright_line() {
        let raw = "Intro text.\nCopyright 2021 Pearson Education\n1. Next";
        assert_eq!(normalize(raw), "Intro text.\n1. Next");
    }

    #[test]
    fn joins_soft_wrapped_lines() {
        let raw = "The quick brown\nfox jumps over\nthe lazy dog.";
        assert_eq!(normalize(raw), "The quick brown fox jumps over the lazy dog.");
    }

    #[test]
    fn keeps_breaks_before_numbers_and_punctuation() {
        let raw = "Steps:\n1) open\n2) close\n- dash item\n* star item";
        assert_eq!(normalize(raw), "Steps:\n1) open\n2) close\n- dash item\n* star item");
    }

    #[test]
    fn trailing_newline_becomes_space() {
        assert_eq!(normalize("end of page\n"), "end of page ");
    }

    #[test]
    fn bullets_start_new_lines() {
        let raw = "Benefits: \u{2022} speed \u{2022} cost";
        assert_eq!(normalize(raw), "Benefits: \n\u{2022} speed \n\u{2022} cost");
    }

    #[test]
    fn wrapped_bullet_is_rejoined_then_split() {
        let raw = "Goals\n\u{25cf} first\ngoal";
        assert_eq!(normalize(raw), "Goals \n\u{25cf} first goal");
    }

    #[test]
    fn collapses_letter_spaced_headings_only() {
        assert_eq!(normalize("C H A P T E R one"), "CHAPTER one");
        // Ordinary capitalised words are left alone.
        assert_eq!(normalize("I Think USA Today"), "I Think USA Today");
    }

    #[test]
    fn collapses_space_runs() {
        assert_eq!(normalize("a    b  c"), "a b c");
    }

    #[test]
    fn strips_configured_boilerplate() {
        let n = Normalizer::new(&["Information Technology|Industry 4\\.0".to_string()]).unwrap();
        let raw = "Information Technology - \nCloud computing\nis here.";
        assert_eq!(n.normalize(raw), "Cloud computing is here.");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = Normalizer::new(&["(unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidConfig(_)));
    }

    #[test]
    fn blank_stays_blank() {
        assert!(normalize("  \n \n").trim().is_empty());
    }
}
