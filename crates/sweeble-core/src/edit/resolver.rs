//! Maps model-supplied anchor text onto exact buffer offsets.
//!
//! Tiers run in order and the first hit wins: exact substring, whitespace-normalized
//! substring, line similarity, then a fixed-width sliding window. Every tier returns
//! the first occurrence in the buffer; there is no disambiguation by cursor proximity.
//! Both fuzzy tiers (line similarity and window) skip anchors of `2 * tolerance`
//! characters or fewer, which would match almost anywhere.

use std::ops::Range;

use tracing::{debug, warn};

use crate::buffer::TextBuffer;
use crate::constants::{limits, CURSOR_MARKER};
use crate::edit::types::{EditKind, MatchTier, RawEdit, ResolvedEdit};
use crate::error::{Result, SweebleError};

pub fn strip_cursor_marker(text: &str) -> String {
    text.replace(CURSOR_MARKER, "")
}

#[derive(Debug, Clone, Copy)]
pub struct OffsetResolver {
    tolerance: usize,
}

impl Default for OffsetResolver {
    fn default() -> Self {
        Self::new(limits::TYPO_TOLERANCE)
    }
}

impl OffsetResolver {
    pub fn new(tolerance: usize) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Pin `edit` to offsets in `buffer`.
    ///
    /// Inserts never fail: an empty anchor lands on `cursor`, a non-empty anchor places
    /// the insertion right after its match, falling back to `cursor` when nothing matches.
    /// Replace and Delete fail with [`SweebleError::UnresolvedAnchor`].
    pub fn resolve(&self, buffer: &TextBuffer, mut edit: RawEdit, cursor: usize) -> Result<ResolvedEdit> {
        let anchor = strip_cursor_marker(&edit.anchor_text);
        edit.anchor_text = anchor.clone();
        let cursor = cursor.min(buffer.len());

        if edit.kind == EditKind::Insert {
            if anchor.is_empty() {
                return Ok(ResolvedEdit::new(edit, cursor..cursor, MatchTier::Cursor));
            }
            let text = buffer.text();
            return Ok(match self.locate(&text, &anchor) {
                Some((range, tier)) => ResolvedEdit::new(edit, range.end..range.end, tier),
                None => {
                    debug!("Insert anchor not found, falling back to cursor {}", cursor);
                    ResolvedEdit::new(edit, cursor..cursor, MatchTier::Cursor)
                }
            });
        }

        if anchor.is_empty() {
            return Err(SweebleError::UnresolvedAnchor(anchor));
        }

        let text = buffer.text();
        match self.locate(&text, &anchor) {
            Some((range, tier)) => {
                debug!("{} anchor resolved to {:?} via {:?}", edit.kind, range, tier);
                Ok(ResolvedEdit::new(edit, range, tier))
            }
            None => Err(SweebleError::UnresolvedAnchor(anchor)),
        }
    }

    /// Resolve a proposal list, silently dropping edits whose anchor cannot be found.
    pub fn resolve_all(&self, buffer: &TextBuffer, edits: Vec<RawEdit>, cursor: usize) -> Vec<ResolvedEdit> {
        let mut resolved = Vec::with_capacity(edits.len());
        for edit in edits {
            let kind = edit.kind;
            match self.resolve(buffer, edit, cursor) {
                Ok(edit) => resolved.push(edit),
                Err(e) => warn!("Dropping {} edit: {}", kind, e),
            }
        }
        resolved
    }

    /// Find `anchor` (already stripped of the cursor marker) in `text`.
    pub fn locate(&self, text: &str, anchor: &str) -> Option<(Range<usize>, MatchTier)> {
        if anchor.is_empty() {
            return None;
        }

        if let Some(byte) = text.find(anchor) {
            let start = text[..byte].chars().count();
            return Some((start..start + anchor.chars().count(), MatchTier::Exact));
        }

        let chars: Vec<char> = text.chars().collect();

        if let Some(range) = whitespace_match(&chars, anchor) {
            return Some((range, MatchTier::Whitespace));
        }
        if let Some(range) = self.line_match(text, anchor) {
            return Some((range, MatchTier::Line));
        }
        if let Some(range) = self.window_match(&chars, anchor) {
            return Some((range, MatchTier::Window));
        }
        None
    }

    /// Compare the anchor's first line against each buffer line; the range spans as
    /// many lines as the anchor has.
    fn line_match(&self, text: &str, anchor: &str) -> Option<Range<usize>> {
        let first = anchor.lines().next()?.trim();
        if first.is_empty() {
            return None;
        }
        let anchor_lines = anchor.lines().count().max(1);

        let lines: Vec<&str> = text.split('\n').collect();
        let mut starts = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            starts.push(offset);
            offset += line.chars().count() + 1;
        }

        let index = lines.iter().position(|line| self.similar_line(line, first))?;
        let last = (index + anchor_lines - 1).min(lines.len() - 1);
        let end = starts[last] + lines[last].trim_end_matches('\r').chars().count();
        Some(starts[index]..end)
    }

    fn similar_line(&self, line: &str, anchor_line: &str) -> bool {
        let line = line.trim();
        if line == anchor_line {
            return true;
        }
        let (a, b) = (line.chars().count(), anchor_line.chars().count());
        if b <= self.tolerance * 2 || a.abs_diff(b) > self.tolerance {
            return false;
        }
        // Covers same-length substitutions as well as a dropped or doubled character.
        strsim::levenshtein(line, anchor_line) <= self.tolerance
    }

    fn window_match(&self, chars: &[char], anchor: &str) -> Option<Range<usize>> {
        let needle: Vec<char> = anchor.chars().collect();
        let n = needle.len();
        if n <= self.tolerance * 2 || n > chars.len() {
            return None;
        }
        (0..=chars.len() - n)
            .find(|&i| {
                let mut mismatches = 0;
                for (a, b) in chars[i..i + n].iter().zip(&needle) {
                    if a != b {
                        mismatches += 1;
                        if mismatches > self.tolerance {
                            return false;
                        }
                    }
                }
                true
            })
            .map(|i| i..i + n)
    }
}

/// Collapse whitespace runs to one space, remembering where each kept char came from.
fn normalize_whitespace(chars: &[char]) -> (Vec<char>, Vec<usize>) {
    let mut normalized = Vec::with_capacity(chars.len());
    let mut origin = Vec::with_capacity(chars.len());
    let mut in_whitespace = false;
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push(' ');
                origin.push(i);
            }
            in_whitespace = true;
        } else {
            normalized.push(c);
            origin.push(i);
            in_whitespace = false;
        }
    }
    (normalized, origin)
}

fn whitespace_match(chars: &[char], anchor: &str) -> Option<Range<usize>> {
    let anchor_chars: Vec<char> = anchor.chars().collect();
    let (needle, _) = normalize_whitespace(&anchor_chars);
    let first = needle.iter().position(|c| *c != ' ')?;
    let last = needle.iter().rposition(|c| *c != ' ')?;
    let needle = &needle[first..=last];

    let (haystack, origin) = normalize_whitespace(chars);
    if needle.len() > haystack.len() {
        return None;
    }
    let pos = haystack.windows(needle.len()).position(|w| w == needle)?;
    Some(origin[pos]..origin[pos + needle.len() - 1] + 1)
}
