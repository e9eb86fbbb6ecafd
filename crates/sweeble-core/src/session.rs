use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

use crate::buffer::TextBuffer;
use crate::classify::{NoSuggestionReason, Suggestion, SuggestionClassifier, SuggestionRequest};
use crate::config::Settings;
use crate::context::{ContextBuilder, EditorContext};
use crate::coordinator::{Generation, GenerationResult, InlineSuggestion, PendingSuggestionState, RequestCoordinator};
use crate::edit::{
    preview_text, unified_diff, BatchReport, DocumentMutationSink, EditBatchApplier, EditKind,
    ResolvedEdit,
};
use crate::error::Result;
use crate::highlight::{HighlightRenderer, HighlightStateManager};
use crate::llm::Assistant;
use crate::project::IgnoreFilter;

/// What the host should know after a result was published.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Inline {
        generation: Generation,
        offset: usize,
        text: String,
    },
    Edits {
        generation: Generation,
        count: usize,
    },
    NoSuggestion {
        generation: Generation,
        reason: NoSuggestionReason,
    },
}

/// The document after accepting the pending suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    pub diff: String,
}

/// One open document. Owns the buffer and everything shown over it; all mutation
/// happens through `&mut self`, so it stays on the foreground.
pub struct EditorSession<R, S> {
    id: Uuid,
    span: Span,
    buffer: TextBuffer,
    path: Option<PathBuf>,
    context: ContextBuilder,
    coordinator: RequestCoordinator,
    highlights: HighlightStateManager<R>,
    state: PendingSuggestionState,
    applier: EditBatchApplier,
    sink: S,
    respect_gitignore: bool,
    ignored: Option<(PathBuf, bool)>,
}

impl<R: HighlightRenderer, S: DocumentMutationSink> EditorSession<R, S> {
    pub fn new(assistant: Arc<dyn Assistant>, settings: &Settings, renderer: R, sink: S) -> Self {
        let classifier = SuggestionClassifier::from_settings(assistant, settings);
        Self::with_classifier(classifier, settings, renderer, sink)
    }

    pub fn with_classifier(classifier: SuggestionClassifier, settings: &Settings, renderer: R, sink: S) -> Self {
        let id = Uuid::new_v4();
        let coordinator = RequestCoordinator::new(Arc::new(classifier)).with_debounce(settings.timing.debounce());
        Self {
            id,
            span: info_span!("session", id = %id),
            buffer: TextBuffer::default(),
            path: None,
            context: ContextBuilder::new().with_window(settings.context.window_chars),
            coordinator,
            highlights: HighlightStateManager::new(renderer),
            state: PendingSuggestionState::new(),
            applier: EditBatchApplier::default(),
            sink,
            respect_gitignore: settings.filter.respect_gitignore,
            ignored: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn state(&self) -> &PendingSuggestionState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        self.highlights.renderer()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    fn is_ignored(&mut self, path: Option<&Path>) -> bool {
        let Some(path) = path else {
            return false;
        };
        if !self.respect_gitignore {
            return false;
        }
        if let Some((cached, ignored)) = &self.ignored {
            if cached == path {
                return *ignored;
            }
        }
        let ignored = IgnoreFilter::for_file(path).is_some_and(|filter| filter.is_ignored(path));
        self.ignored = Some((path.to_path_buf(), ignored));
        ignored
    }

    /// Register a keystroke or cursor move. Returns the generation issued for it, or
    /// `None` when the file is git-ignored.
    pub fn on_input(&mut self, ctx: &dyn EditorContext) -> Option<Generation> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.is_ignored(ctx.file_path()) {
            debug!("Input in ignored file, no request");
            return None;
        }
        self.path = ctx.file_path().map(Path::to_path_buf);

        let text = ctx.text();
        let changed = self.buffer.text() != text;
        if changed {
            self.buffer.set_text(&text);
        }

        let prompt = self.context.build(&text, ctx.cursor_offset(), ctx.language());
        if changed || self.state.last_hash() != Some(prompt.hash()) {
            self.highlights.clear(&mut self.state);
        }

        let request = SuggestionRequest::new(prompt, self.buffer.clone());
        let generation = self.coordinator.issue(request, self.state.last_hash());
        self.state.begin(generation);
        debug!("Issued {}", generation);
        Some(generation)
    }

    /// Wait for the next result that is still current and publish it.
    /// Stale results are dropped on the way. Waits indefinitely when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let result = self.coordinator.next_result().await?;
            if let Some(event) = self.publish(result) {
                return Some(event);
            }
        }
    }

    /// Publish whatever results are already waiting, without blocking.
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.coordinator.try_next_result() {
            events.extend(self.publish(result));
        }
        events
    }

    fn publish(&mut self, result: GenerationResult) -> Option<SessionEvent> {
        let _enter = self.span.enter();
        let generation = result.generation;
        if !self.coordinator.is_current(generation) {
            debug!("Discarding result of superseded {}", generation);
            return None;
        }

        let records_hash = result.suggestion.records_hash();
        let event = match result.suggestion {
            Suggestion::Inline { offset, text } => {
                self.highlights.show_inline(
                    &mut self.state,
                    generation,
                    InlineSuggestion {
                        offset,
                        text: text.clone(),
                    },
                );
                SessionEvent::Inline {
                    generation,
                    offset,
                    text,
                }
            }
            Suggestion::Edits(edits) => match self.highlights.show(&mut self.state, generation, &self.buffer, edits) {
                Ok(_) => SessionEvent::Edits {
                    generation,
                    count: self.state.edits().len(),
                },
                Err(e) => {
                    warn!("Could not lay out proposal: {}", e);
                    return Some(SessionEvent::NoSuggestion {
                        generation,
                        reason: NoSuggestionReason::Empty,
                    });
                }
            },
            Suggestion::None(reason) => SessionEvent::NoSuggestion { generation, reason },
        };

        if records_hash {
            self.state.record_hash(result.hash);
        }
        info!("Published {:?}", event);
        Some(event)
    }

    fn pending_edits(&self) -> Vec<ResolvedEdit> {
        match self.state.inline() {
            Some(inline) => vec![ResolvedEdit::at(
                EditKind::Insert,
                inline.offset,
                inline.offset,
                inline.text.clone(),
            )],
            None => self.state.edits().to_vec(),
        }
    }

    /// Apply the shown suggestion through the mutation sink, then clear it.
    ///
    /// On failure the suggestion is cleared as well; edits applied before the failing
    /// one stay applied.
    pub fn accept(&mut self) -> Result<BatchReport> {
        let span = self.span.clone();
        let _enter = span.enter();

        let edits = self.pending_edits();
        if edits.is_empty() {
            return Ok(BatchReport { applied: 0, delta: 0 });
        }

        self.coordinator.cancel();
        let result = self.applier.apply_batch(&mut self.buffer, &edits, &mut self.sink);
        self.highlights.clear(&mut self.state);
        match &result {
            Ok(report) => info!("Accepted {} edits", report.applied),
            Err(e) => warn!("Edit not applied: {}", e),
        }
        result
    }

    /// Hide the shown suggestion and drop any in-flight work.
    pub fn dismiss(&mut self) {
        let _enter = self.span.enter();
        self.coordinator.cancel();
        self.highlights.clear(&mut self.state);
    }

    pub fn preview(&self) -> Result<Option<Preview>> {
        let edits = self.pending_edits();
        if edits.is_empty() {
            return Ok(None);
        }
        let text = preview_text(&self.buffer, &edits)?;
        let label = self
            .path
            .as_ref()
            .map_or_else(|| "document".to_string(), |p| p.display().to_string());
        let diff = unified_diff(&self.buffer.text(), &text, &label);
        Ok(Some(Preview { text, diff }))
    }
}
