use std::sync::LazyLock;

use regex::Regex;

use crate::buffer::TextBuffer;
use crate::constants::limits;

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(void|int|String|boolean|double|float|long|short|byte|char|Object|List|Map|Set|fn|def|func|function)\b",
    )
    .expect("valid method pattern")
});
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(class|struct|interface|enum|trait|impl)\b").expect("valid class pattern"));
static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(if|for|while|match|switch)\b").expect("valid control pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalUnit {
    Method,
    Class,
    ControlStructure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// One-based line number.
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

/// Advisory signals about the cursor position. Never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisHints {
    /// The cursor sits where appending text is plausible.
    pub can_complete_with_insertion: bool,
    /// The cursor line is definitely malformed, e.g. a doubled semicolon.
    pub syntax_error: bool,
    /// The cursor line is unfinished: open string or brackets, or a trailing operator.
    pub incomplete: bool,
    pub logical_unit: Option<LogicalUnit>,
    pub issues: Vec<Issue>,
}

impl AnalysisHints {
    pub fn needs_complex_edit(&self) -> bool {
        self.syntax_error || self.incomplete
    }
}

/// Pluggable source of [`AnalysisHints`].
pub trait ContextAnalyzer: Send + Sync {
    fn analyze(&self, buffer: &TextBuffer, cursor: usize) -> AnalysisHints;
}

/// Text-only heuristics over the cursor line and its surroundings.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    window_chars: usize,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self {
            window_chars: limits::ANALYSIS_WINDOW_CHARS,
        }
    }
}

impl HeuristicAnalyzer {
    pub fn new(window_chars: usize) -> Self {
        Self { window_chars }
    }

    /// The line up to a trailing `//` comment, plus whether a string literal is left open.
    /// Single quotes are not tracked: they are lifetimes and char literals as often as
    /// they are apostrophes.
    fn split_code(line: &str) -> (&str, bool) {
        let mut in_string = false;
        let mut escaped = false;
        let mut prev = '\0';
        for (i, c) in line.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
            } else if c == '"' {
                in_string = true;
            } else if c == '/' && prev == '/' {
                return (&line[..i - 1], false);
            }
            prev = c;
        }
        (line, in_string)
    }

    /// A hit can override the model's classification; only unambiguous breakage counts.
    fn has_syntax_error(code: &str) -> bool {
        code.contains(";;")
    }

    fn is_incomplete(code: &str, open_string: bool) -> bool {
        let unbalanced = |open: char, close: char| code.matches(open).count() != code.matches(close).count();
        let trimmed = code.trim_end();
        open_string
            || unbalanced('(', ')')
            || unbalanced('{', '}')
            || unbalanced('[', ']')
            || trimmed.ends_with(['.', '+', '-', '*', '/', '=', ','])
    }

    fn logical_unit(before: &str) -> Option<LogicalUnit> {
        if METHOD_RE.is_match(before) {
            Some(LogicalUnit::Method)
        } else if CLASS_RE.is_match(before) {
            Some(LogicalUnit::Class)
        } else if CONTROL_RE.is_match(before) {
            Some(LogicalUnit::ControlStructure)
        } else {
            None
        }
    }
}

impl ContextAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, buffer: &TextBuffer, cursor: usize) -> AnalysisHints {
        let cursor = cursor.min(buffer.len());
        let Ok(line_no) = buffer.line_at(cursor) else {
            return AnalysisHints::default();
        };
        let Ok(bounds) = buffer.line_bounds(line_no) else {
            return AnalysisHints::default();
        };
        let line = buffer.slice(bounds.start, bounds.end).unwrap_or_default();
        let before_cursor = buffer
            .slice(bounds.start, cursor.clamp(bounds.start, bounds.end))
            .unwrap_or_default();

        let head = before_cursor.trim();
        let can_complete_with_insertion = cursor + 1 >= bounds.end
            || head.is_empty()
            || head.ends_with(';')
            || head.ends_with('{')
            || head.ends_with('}');

        let mut hints = AnalysisHints {
            can_complete_with_insertion,
            ..Default::default()
        };

        let (code, open_string) = Self::split_code(&line);
        if Self::has_syntax_error(code) {
            hints.syntax_error = true;
            hints.issues.push(Issue {
                line: line_no + 1,
                severity: Severity::Error,
                message: format!("Syntax error in current line: {}", line.trim()),
            });
        }
        if Self::is_incomplete(code, open_string) {
            hints.incomplete = true;
            hints.issues.push(Issue {
                line: line_no + 1,
                severity: Severity::Warning,
                message: format!("Incomplete expression: {}", line.trim()),
            });
        }

        let window_start = cursor.saturating_sub(self.window_chars);
        let before = buffer.slice(window_start, cursor).unwrap_or_default();
        hints.logical_unit = Self::logical_unit(&before);
        hints
    }
}
