//! Bookkeeping for proposed-but-unapplied edits and the spans drawn for them.
//!
//! Drawing is the host's job ([`HighlightRenderer`]). This module decides what to draw,
//! remembers the handles, and makes sure at most one proposal is visible.

use tracing::debug;

use crate::buffer::TextBuffer;
use crate::coordinator::{Generation, InlineSuggestion, PendingSuggestionState};
use crate::edit::{EditKind, ResolvedEdit};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Removal styling over one whole line, `[start, end)` without the terminator.
    Removal { start: usize, end: usize },
    /// Block preview of added text, anchored after `offset`.
    Addition { offset: usize, text: String },
    /// Ghost text for an inline completion at `offset`.
    Inline { offset: usize, text: String },
}

/// Host-side drawing surface.
pub trait HighlightRenderer {
    fn render(&mut self, handle: SpanHandle, span: &Span);
    fn remove(&mut self, handle: SpanHandle);
}

/// Keeps live spans in memory. Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    live: Vec<(SpanHandle, Span)>,
    rendered: usize,
    removed: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> impl Iterator<Item = &Span> {
        self.live.iter().map(|(_, span)| span)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total spans ever drawn.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl HighlightRenderer for RecordingRenderer {
    fn render(&mut self, handle: SpanHandle, span: &Span) {
        self.rendered += 1;
        self.live.push((handle, span.clone()));
    }

    fn remove(&mut self, handle: SpanHandle) {
        let before = self.live.len();
        self.live.retain(|(h, _)| *h != handle);
        self.removed += before - self.live.len();
    }
}

/// What to draw for a proposal, against the buffer the edits were resolved on.
///
/// Replace and Delete mark every line they touch for removal. Replace and Insert add a
/// preview of the trimmed new text at the end of the last affected line.
pub fn spans_for(buffer: &TextBuffer, edits: &[ResolvedEdit]) -> Result<Vec<Span>> {
    let mut spans = Vec::new();
    for edit in edits {
        let first = buffer.line_at(edit.start)?;
        let last = match edit.kind {
            EditKind::Insert => first,
            _ if edit.end > edit.start => buffer.line_at(edit.end - 1)?,
            _ => first,
        };

        if edit.kind != EditKind::Insert {
            for line in first..=last {
                let bounds = buffer.line_bounds(line)?;
                spans.push(Span::Removal {
                    start: bounds.start,
                    end: bounds.end,
                });
            }
        }

        let preview = edit.new_text.trim();
        if edit.kind != EditKind::Delete && !preview.is_empty() {
            spans.push(Span::Addition {
                offset: buffer.line_bounds(last)?.end,
                text: preview.to_string(),
            });
        }
    }
    Ok(spans)
}

pub struct HighlightStateManager<R> {
    renderer: R,
    next_handle: u64,
}

impl<R: HighlightRenderer> HighlightStateManager<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            next_handle: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn draw(&mut self, span: &Span) -> SpanHandle {
        self.next_handle += 1;
        let handle = SpanHandle(self.next_handle);
        self.renderer.render(handle, span);
        handle
    }

    /// Replace whatever is shown with `edits`. Nothing is drawn if span layout fails.
    pub fn show(
        &mut self,
        state: &mut PendingSuggestionState,
        generation: Generation,
        buffer: &TextBuffer,
        edits: Vec<ResolvedEdit>,
    ) -> Result<usize> {
        self.clear(state);
        let spans = spans_for(buffer, &edits)?;
        let handles: Vec<SpanHandle> = spans.iter().map(|span| self.draw(span)).collect();
        debug!("Showing {} edits as {} spans for {}", edits.len(), handles.len(), generation);
        let count = handles.len();
        state.set_edits(generation, edits, handles);
        Ok(count)
    }

    pub fn show_inline(&mut self, state: &mut PendingSuggestionState, generation: Generation, inline: InlineSuggestion) {
        self.clear(state);
        let handle = self.draw(&Span::Inline {
            offset: inline.offset,
            text: inline.text.clone(),
        });
        state.set_inline(generation, inline, handle);
    }

    /// Remove every span and forget the shown suggestion. Safe to repeat.
    pub fn clear(&mut self, state: &mut PendingSuggestionState) {
        let handles = state.take_spans();
        if handles.is_empty() {
            return;
        }
        debug!("Clearing {} spans", handles.len());
        for handle in handles {
            self.renderer.remove(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::GenerationCounter;

    const SRC: &str = "fn a() {\n    retrn x;\n}\nfn b() {}";

    fn manager() -> (HighlightStateManager<RecordingRenderer>, PendingSuggestionState, Generation) {
        let generation = GenerationCounter::new().advance();
        (
            HighlightStateManager::new(RecordingRenderer::new()),
            PendingSuggestionState::new(),
            generation,
        )
    }

    #[test]
    fn test_replace_marks_line_and_previews_at_line_end() {
        let buffer = TextBuffer::new(SRC);
        let start = SRC.find("retrn").unwrap();
        let edit = ResolvedEdit::at(EditKind::Replace, start, start + 8, "  return x;  ");

        let spans = spans_for(&buffer, &[edit]).unwrap();
        assert_eq!(
            spans,
            vec![
                Span::Removal { start: 9, end: 21 },
                Span::Addition {
                    offset: 21,
                    text: "return x;".into()
                },
            ]
        );
    }

    #[test]
    fn test_multiline_delete_marks_each_line_without_preview() {
        let buffer = TextBuffer::new(SRC);
        let spans = spans_for(&buffer, &[ResolvedEdit::at(EditKind::Delete, 0, 23, "")]).unwrap();
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| matches!(s, Span::Removal { .. })));
    }

    #[test]
    fn test_insert_previews_at_end_of_cursor_line() {
        let buffer = TextBuffer::new(SRC);
        let spans = spans_for(&buffer, &[ResolvedEdit::at(EditKind::Insert, 3, 3, "x")]).unwrap();
        assert_eq!(
            spans,
            vec![Span::Addition {
                offset: 8,
                text: "x".into()
            }]
        );
    }

    #[test]
    fn test_show_replaces_previous_set() {
        let (mut highlights, mut state, generation) = manager();
        let buffer = TextBuffer::new(SRC);

        highlights
            .show(&mut state, generation, &buffer, vec![ResolvedEdit::at(EditKind::Delete, 0, 23, "")])
            .unwrap();
        assert_eq!(highlights.renderer().live_count(), 3);

        highlights
            .show(&mut state, generation, &buffer, vec![ResolvedEdit::at(EditKind::Insert, 3, 3, "y")])
            .unwrap();
        assert_eq!(highlights.renderer().live_count(), 1);
        assert_eq!(highlights.renderer().removed(), 3);
        assert_eq!(state.edits().len(), 1);
        assert_eq!(state.spans().len(), 1);
        assert_eq!(state.shown_for(), Some(generation));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut highlights, mut state, generation) = manager();
        highlights.clear(&mut state);

        highlights.show_inline(
            &mut state,
            generation,
            InlineSuggestion {
                offset: 2,
                text: "return x;".into(),
            },
        );
        assert!(state.has_suggestion());

        highlights.clear(&mut state);
        highlights.clear(&mut state);
        assert_eq!(highlights.renderer().live_count(), 0);
        assert_eq!(highlights.renderer().removed(), 1);
        assert!(!state.has_suggestion());
        assert_eq!(state.shown_for(), None);
    }

    #[test]
    fn test_failed_layout_leaves_nothing_drawn() {
        let (mut highlights, mut state, generation) = manager();
        let buffer = TextBuffer::new("short");
        let result = highlights.show(
            &mut state,
            generation,
            &buffer,
            vec![ResolvedEdit::at(EditKind::Replace, 0, 99, "x")],
        );
        assert!(result.is_err());
        assert_eq!(highlights.renderer().rendered(), 0);
        assert!(!state.has_suggestion());
    }
}
