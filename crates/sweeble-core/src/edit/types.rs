use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EditKind {
    Insert,
    Replace,
    Delete,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Insert => f.write_str("INSERT"),
            EditKind::Replace => f.write_str("REPLACE"),
            EditKind::Delete => f.write_str("DELETE"),
        }
    }
}

/// An edit as proposed by the model: anchor text instead of offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdit {
    #[serde(rename = "type")]
    pub kind: EditKind,
    #[serde(rename = "oldText", default)]
    pub anchor_text: String,
    #[serde(rename = "newText", default)]
    pub new_text: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl RawEdit {
    pub fn insert(new_text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            anchor_text: String::new(),
            new_text: new_text.into(),
            confidence: 1.0,
        }
    }

    pub fn replace(anchor_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            anchor_text: anchor_text.into(),
            new_text: new_text.into(),
            confidence: 1.0,
        }
    }

    pub fn delete(anchor_text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            anchor_text: anchor_text.into(),
            new_text: String::new(),
            confidence: 1.0,
        }
    }

    pub fn with_anchor(mut self, anchor_text: impl Into<String>) -> Self {
        self.anchor_text = anchor_text.into();
        self
    }

    /// Clamped into `[0, 1]`; NaN counts as zero.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }
}

/// Which resolver tier located the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Cursor,
    Exact,
    Whitespace,
    Line,
    Window,
}

/// An edit pinned to `[start, end)` character offsets of a specific buffer state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdit {
    pub kind: EditKind,
    pub anchor_text: String,
    pub new_text: String,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    pub tier: MatchTier,
}

impl ResolvedEdit {
    pub fn new(raw: RawEdit, range: Range<usize>, tier: MatchTier) -> Self {
        let end = match raw.kind {
            EditKind::Insert => range.start,
            _ => range.end.max(range.start),
        };
        Self {
            kind: raw.kind,
            anchor_text: raw.anchor_text,
            new_text: raw.new_text,
            confidence: raw.confidence,
            start: range.start,
            end,
            tier,
        }
    }

    /// Build an already-placed edit, bypassing anchor resolution.
    pub fn at(kind: EditKind, start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self {
            kind,
            anchor_text: String::new(),
            new_text: new_text.into(),
            confidence: 1.0,
            start,
            end,
            tier: MatchTier::Exact,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Net change in buffer length once applied.
    pub fn delta(&self) -> isize {
        let inserted = match self.kind {
            EditKind::Delete => 0,
            _ => self.new_text.chars().count() as isize,
        };
        inserted - (self.end - self.start) as isize
    }
}
