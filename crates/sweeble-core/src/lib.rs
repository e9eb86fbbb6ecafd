pub mod analysis;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod constants;
pub mod context;
pub mod coordinator;
pub mod edit;
pub mod error;
pub mod highlight;
pub mod llm;
pub mod project;
pub mod session;

// Re-export key types
pub use buffer::TextBuffer;
pub use classify::{ClassifierState, NoSuggestionReason, Suggestion, SuggestionClassifier, SuggestionRequest};
pub use config::Settings;
pub use context::{ContextBuilder, DocumentSnapshot, EditorContext, PromptContext};
pub use coordinator::{Generation, PendingSuggestionState, RequestCoordinator};
pub use edit::{
    ApplyOrder, DocumentMutationSink, EditBatchApplier, EditKind, Mutation, OffsetResolver, RawEdit, ResolvedEdit,
};
pub use error::{Result, SweebleError};
pub use highlight::{HighlightRenderer, HighlightStateManager, RecordingRenderer, Span, SpanHandle};
pub use llm::{Assistant, Classification, ClassificationService, CompletionService, EditProposalService, OpenAiAssistant};
pub use session::{EditorSession, Preview, SessionEvent};
