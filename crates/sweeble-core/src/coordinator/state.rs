use crate::context::ContextHash;
use crate::coordinator::Generation;
use crate::edit::ResolvedEdit;
use crate::highlight::SpanHandle;

/// Completion text waiting at an offset, not yet in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSuggestion {
    pub offset: usize,
    pub text: String,
}

/// Per-session record of the suggestion currently on screen.
///
/// Owned by the session. Background workers never touch it; they hand results back
/// and the foreground decides whether they still apply.
#[derive(Debug, Clone, Default)]
pub struct PendingSuggestionState {
    generation: Generation,
    shown_for: Option<Generation>,
    edits: Vec<ResolvedEdit>,
    inline: Option<InlineSuggestion>,
    spans: Vec<SpanHandle>,
    last_hash: Option<ContextHash>,
}

impl PendingSuggestionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest issued generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Generation whose result is currently shown.
    pub fn shown_for(&self) -> Option<Generation> {
        self.shown_for
    }

    pub fn edits(&self) -> &[ResolvedEdit] {
        &self.edits
    }

    pub fn inline(&self) -> Option<&InlineSuggestion> {
        self.inline.as_ref()
    }

    pub fn spans(&self) -> &[SpanHandle] {
        &self.spans
    }

    pub fn last_hash(&self) -> Option<ContextHash> {
        self.last_hash
    }

    pub fn has_suggestion(&self) -> bool {
        !self.edits.is_empty() || self.inline.is_some()
    }

    pub(crate) fn begin(&mut self, generation: Generation) {
        self.generation = generation;
    }

    pub(crate) fn record_hash(&mut self, hash: ContextHash) {
        self.last_hash = Some(hash);
    }

    pub(crate) fn set_edits(&mut self, generation: Generation, edits: Vec<ResolvedEdit>, spans: Vec<SpanHandle>) {
        self.shown_for = Some(generation);
        self.edits = edits;
        self.inline = None;
        self.spans = spans;
    }

    pub(crate) fn set_inline(&mut self, generation: Generation, inline: InlineSuggestion, span: SpanHandle) {
        self.shown_for = Some(generation);
        self.edits.clear();
        self.inline = Some(inline);
        self.spans = vec![span];
    }

    /// Drop the shown suggestion, returning its span handles for removal.
    pub(crate) fn take_spans(&mut self) -> Vec<SpanHandle> {
        self.shown_for = None;
        self.edits.clear();
        self.inline = None;
        std::mem::take(&mut self.spans)
    }
}
