//! Turns one captured context into a suggestion.
//!
//! A request moves `Idle -> Classifying -> Classified(..) -> Idle`. Every collaborator
//! call has a hard deadline; a late or failed call degrades to "no suggestion" and is
//! never surfaced as an error. The only error is [`Cancelled`](crate::error::SweebleError::Cancelled), returned
//! when the request's generation is superseded between suspension points.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::analysis::{ContextAnalyzer, HeuristicAnalyzer};
use crate::buffer::TextBuffer;
use crate::config::{Settings, TimingSettings};
use crate::context::PromptContext;
use crate::coordinator::GenerationToken;
use crate::edit::{drop_overlapping, OffsetResolver, ResolvedEdit};
use crate::error::{Result, SweebleError};
use crate::llm::{Assistant, Classification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    Idle,
    Classifying,
    Classified(Classification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSuggestionReason {
    /// The model said nothing is needed here.
    Classified,
    /// Nothing usable came back: blank context, blank completion, or no edit survived.
    Empty,
    /// A collaborator failed or missed its deadline.
    Unavailable,
    /// Context identical to the last processed one; no round-trip made.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    /// Text to render at `offset` without touching the buffer.
    Inline { offset: usize, text: String },
    /// Resolved edits, ordered as proposed (highest confidence first).
    Edits(Vec<ResolvedEdit>),
    None(NoSuggestionReason),
}

impl Suggestion {
    /// Whether the context that produced this may be skipped next time: only after
    /// something was shown or the model explicitly declined.
    pub fn records_hash(&self) -> bool {
        matches!(
            self,
            Suggestion::Inline { .. } | Suggestion::Edits(_) | Suggestion::None(NoSuggestionReason::Classified)
        )
    }
}

/// Everything one classification run works on. Owned, so it can move to a worker.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub prompt: PromptContext,
    /// Snapshot of the document the prompt was captured from.
    pub buffer: TextBuffer,
    pub cursor: usize,
}

impl SuggestionRequest {
    pub fn new(prompt: PromptContext, buffer: TextBuffer) -> Self {
        let cursor = prompt.cursor.min(buffer.len());
        Self { prompt, buffer, cursor }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub classification: Duration,
    pub completion: Duration,
    pub proposal: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self::from(&TimingSettings::default())
    }
}

impl From<&TimingSettings> for Deadlines {
    fn from(timing: &TimingSettings) -> Self {
        Self {
            classification: timing.classification_timeout(),
            completion: timing.completion_timeout(),
            proposal: timing.proposal_timeout(),
        }
    }
}

pub struct SuggestionClassifier {
    assistant: Arc<dyn Assistant>,
    analyzer: Arc<dyn ContextAnalyzer>,
    resolver: OffsetResolver,
    deadlines: Deadlines,
    min_confidence: f64,
    trust_local_hints: bool,
    state: watch::Sender<ClassifierState>,
}

impl SuggestionClassifier {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        let (state, _) = watch::channel(ClassifierState::Idle);
        Self {
            assistant,
            analyzer: Arc::new(HeuristicAnalyzer::default()),
            resolver: OffsetResolver::default(),
            deadlines: Deadlines::default(),
            min_confidence: 0.0,
            trust_local_hints: true,
            state,
        }
    }

    pub fn from_settings(assistant: Arc<dyn Assistant>, settings: &Settings) -> Self {
        Self::new(assistant)
            .with_deadlines(Deadlines::from(&settings.timing))
            .with_resolver(OffsetResolver::new(settings.edits.typo_tolerance))
            .with_min_confidence(settings.edits.min_confidence)
            .with_local_hints(settings.edits.trust_local_hints)
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ContextAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_resolver(mut self, resolver: OffsetResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_local_hints(mut self, trust: bool) -> Self {
        self.trust_local_hints = trust;
        self
    }

    pub fn state(&self) -> ClassifierState {
        *self.state.borrow()
    }

    /// Watch state transitions of the current request, e.g. for a busy indicator.
    pub fn subscribe(&self) -> watch::Receiver<ClassifierState> {
        self.state.subscribe()
    }

    fn transition(&self, token: &GenerationToken, next: ClassifierState) {
        if token.is_current() {
            let prev = self.state.send_replace(next);
            debug!("Classifier {:?} -> {:?}", prev, next);
        }
    }

    pub async fn suggest(&self, request: SuggestionRequest, token: &GenerationToken) -> Result<Suggestion> {
        let result = self.run(request, token).await;
        self.transition(token, ClassifierState::Idle);
        result
    }

    async fn run(&self, request: SuggestionRequest, token: &GenerationToken) -> Result<Suggestion> {
        token.check()?;
        if request.prompt.is_blank() {
            debug!("Blank context, nothing to suggest");
            return Ok(Suggestion::None(NoSuggestionReason::Empty));
        }
        let hints = self.analyzer.analyze(&request.buffer, request.cursor);

        self.transition(token, ClassifierState::Classifying);
        let classified = timeout(self.deadlines.classification, self.assistant.classify(&request.prompt)).await;
        token.check()?;
        let mut classification = match classified {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => return Ok(degrade("Classification", e)),
            Err(_) => return Ok(degrade("Classification", SweebleError::Timeout(self.deadlines.classification))),
        };

        if classification == Classification::SimpleInsertion && self.trust_local_hints && hints.syntax_error {
            debug!("Cursor line looks broken, upgrading to a complex edit");
            classification = Classification::ComplexEdit;
        }
        self.transition(token, ClassifierState::Classified(classification));

        match classification {
            Classification::NoSuggestion => Ok(Suggestion::None(NoSuggestionReason::Classified)),
            Classification::SimpleInsertion => self.complete(&request, token).await,
            Classification::ComplexEdit => self.propose(&request, token).await,
        }
    }

    async fn complete(&self, request: &SuggestionRequest, token: &GenerationToken) -> Result<Suggestion> {
        let completed = timeout(self.deadlines.completion, self.assistant.complete(&request.prompt)).await;
        token.check()?;
        match completed {
            Ok(Ok(Some(text))) => {
                info!("Inline completion of {} chars at {}", text.chars().count(), request.cursor);
                Ok(Suggestion::Inline {
                    offset: request.cursor,
                    text,
                })
            }
            Ok(Ok(None)) => Ok(Suggestion::None(NoSuggestionReason::Empty)),
            Ok(Err(e)) => Ok(degrade("Completion", e)),
            Err(_) => Ok(degrade("Completion", SweebleError::Timeout(self.deadlines.completion))),
        }
    }

    async fn propose(&self, request: &SuggestionRequest, token: &GenerationToken) -> Result<Suggestion> {
        let proposed = timeout(self.deadlines.proposal, self.assistant.propose_edits(&request.prompt)).await;
        token.check()?;
        let raw = match proposed {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Ok(degrade("Edit proposal", e)),
            Err(_) => return Ok(degrade("Edit proposal", SweebleError::Timeout(self.deadlines.proposal))),
        };

        let proposed_count = raw.len();
        let confident: Vec<_> = raw
            .into_iter()
            .filter(|edit| edit.confidence >= self.min_confidence)
            .collect();
        if confident.len() < proposed_count {
            debug!(
                "Dropped {} edits below confidence {}",
                proposed_count - confident.len(),
                self.min_confidence
            );
        }

        let resolved = drop_overlapping(self.resolver.resolve_all(&request.buffer, confident, request.cursor));
        if resolved.is_empty() {
            return Ok(Suggestion::None(NoSuggestionReason::Empty));
        }
        info!("{} of {} proposed edits resolved", resolved.len(), proposed_count);
        Ok(Suggestion::Edits(resolved))
    }
}

/// Collaborator failures never reach the user; anything unexpected is logged louder.
fn degrade(stage: &str, e: SweebleError) -> Suggestion {
    if e.is_degradable() {
        warn!("{} unavailable: {}", stage, e);
    } else {
        error!("{} failed: {}", stage, e);
    }
    Suggestion::None(NoSuggestionReason::Unavailable)
}

impl std::fmt::Debug for SuggestionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionClassifier")
            .field("deadlines", &self.deadlines)
            .field("min_confidence", &self.min_confidence)
            .field("trust_local_hints", &self.trust_local_hints)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::context::ContextBuilder;
    use crate::coordinator::GenerationCounter;
    use crate::edit::{EditKind, RawEdit};
    use crate::error::SweebleError;
    use crate::llm::{ClassificationService, CompletionService, EditProposalService};

    struct Scripted {
        classification: std::result::Result<Classification, ()>,
        classify_delay: Duration,
        completion: Option<String>,
        edits: Vec<RawEdit>,
        calls: AtomicUsize,
        follow_ups: AtomicUsize,
    }

    impl Scripted {
        fn new(classification: Classification) -> Self {
            Self {
                classification: Ok(classification),
                classify_delay: Duration::ZERO,
                completion: None,
                edits: Vec::new(),
                calls: AtomicUsize::new(0),
                follow_ups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ClassificationService for Scripted {
        async fn classify(&self, _context: &PromptContext) -> std::result::Result<Classification, SweebleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.classify_delay).await;
            self.classification
                .map_err(|_| SweebleError::ClassificationUnavailable("scripted failure".into()))
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for Scripted {
        async fn complete(&self, _context: &PromptContext) -> std::result::Result<Option<String>, SweebleError> {
            self.follow_ups.fetch_add(1, Ordering::SeqCst);
            Ok(self.completion.clone())
        }
    }

    #[async_trait::async_trait]
    impl EditProposalService for Scripted {
        async fn propose_edits(&self, _context: &PromptContext) -> std::result::Result<Vec<RawEdit>, SweebleError> {
            self.follow_ups.fetch_add(1, Ordering::SeqCst);
            Ok(self.edits.clone())
        }
    }

    fn request(text: &str, cursor: usize) -> SuggestionRequest {
        SuggestionRequest::new(ContextBuilder::new().build(text, cursor, "Java"), TextBuffer::new(text))
    }

    async fn run(assistant: Arc<Scripted>, req: SuggestionRequest) -> Result<Suggestion> {
        let counter = GenerationCounter::new();
        let token = counter.token(counter.advance());
        SuggestionClassifier::new(assistant).suggest(req, &token).await
    }

    #[tokio::test]
    async fn test_blank_context_makes_no_call() {
        let assistant = Arc::new(Scripted::new(Classification::SimpleInsertion));
        let result = run(assistant.clone(), request("   \n", 2)).await.unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Empty));
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_suggestion_stops_after_classification() {
        let assistant = Arc::new(Scripted::new(Classification::NoSuggestion));
        let result = run(assistant.clone(), request("return;", 7)).await.unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Classified));
        assert_eq!(assistant.follow_ups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_simple_insertion_yields_inline_text_at_cursor() {
        let mut scripted = Scripted::new(Classification::SimpleInsertion);
        scripted.completion = Some("(int n) {}".into());
        let result = run(Arc::new(scripted), request("int next", 8)).await.unwrap();
        assert_eq!(
            result,
            Suggestion::Inline {
                offset: 8,
                text: "(int n) {}".into()
            }
        );
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty() {
        let result = run(Arc::new(Scripted::new(Classification::SimpleInsertion)), request("int x", 5))
            .await
            .unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Empty));
        assert!(!result.records_hash());
    }

    #[test]
    fn test_only_shown_or_declined_results_record_hash() {
        assert!(Suggestion::Inline { offset: 0, text: "x".into() }.records_hash());
        assert!(Suggestion::Edits(Vec::new()).records_hash());
        assert!(Suggestion::None(NoSuggestionReason::Classified).records_hash());
        assert!(!Suggestion::None(NoSuggestionReason::Empty).records_hash());
        assert!(!Suggestion::None(NoSuggestionReason::Unavailable).records_hash());
        assert!(!Suggestion::None(NoSuggestionReason::Duplicate).records_hash());
    }

    #[tokio::test(start_paused = true)]
    async fn test_classification_timeout_degrades() {
        let mut scripted = Scripted::new(Classification::ComplexEdit);
        scripted.classify_delay = Duration::from_secs(10);
        let assistant = Arc::new(scripted);

        let result = run(assistant.clone(), request("retrn x;", 3)).await.unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Unavailable));
        assert!(!result.records_hash());
        assert_eq!(assistant.follow_ups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classification_error_degrades() {
        let mut scripted = Scripted::new(Classification::ComplexEdit);
        scripted.classification = Err(());
        let result = run(Arc::new(scripted), request("retrn x;", 3)).await.unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Unavailable));
    }

    #[tokio::test]
    async fn test_unresolved_edit_dropped_others_kept() {
        let text = "int a = 1;\nretrn a;\n";
        let mut scripted = Scripted::new(Classification::ComplexEdit);
        scripted.edits = vec![
            RawEdit::replace("retrn a;", "return a;"),
            RawEdit::delete("completely unrelated text that is nowhere"),
        ];
        let result = run(Arc::new(scripted), request(text, 11)).await.unwrap();

        let edits = match result {
            Suggestion::Edits(edits) => edits,
            other => panic!("expected edits, got {other:?}"),
        };
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Replace);
        assert_eq!(edits[0].range(), 11..19);
    }

    #[tokio::test]
    async fn test_low_confidence_edits_filtered() {
        let mut scripted = Scripted::new(Classification::ComplexEdit);
        scripted.edits = vec![RawEdit::replace("retrn a;", "return a;").with_confidence(0.3)];
        let counter = GenerationCounter::new();
        let token = counter.token(counter.advance());

        let result = SuggestionClassifier::new(Arc::new(scripted))
            .with_min_confidence(0.5)
            .suggest(request("retrn a;", 0), &token)
            .await
            .unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Empty));
    }

    #[tokio::test]
    async fn test_broken_line_upgrades_simple_insertion() {
        let mut scripted = Scripted::new(Classification::SimpleInsertion);
        scripted.edits = vec![RawEdit::replace("x = 1;;", "x = 1;")];
        let assistant = Arc::new(scripted);

        let result = run(assistant.clone(), request("x = 1;;", 7)).await.unwrap();
        assert!(matches!(result, Suggestion::Edits(ref edits) if edits.len() == 1));

        let counter = GenerationCounter::new();
        let token = counter.token(counter.advance());
        let result = SuggestionClassifier::new(assistant)
            .with_local_hints(false)
            .suggest(request("x = 1;;", 7), &token)
            .await
            .unwrap();
        assert_eq!(result, Suggestion::None(NoSuggestionReason::Empty));
    }

    #[tokio::test]
    async fn test_superseded_request_is_cancelled() {
        let assistant = Arc::new(Scripted::new(Classification::SimpleInsertion));
        let counter = GenerationCounter::new();
        let token = counter.token(counter.advance());
        counter.advance();

        let classifier = SuggestionClassifier::new(assistant.clone());
        let err = classifier.suggest(request("int x", 5), &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
        assert_eq!(classifier.state(), ClassifierState::Idle);
    }

    #[tokio::test]
    async fn test_state_returns_to_idle() {
        let classifier = SuggestionClassifier::new(Arc::new(Scripted::new(Classification::NoSuggestion)));
        let mut states = classifier.subscribe();
        let counter = GenerationCounter::new();
        let token = counter.token(counter.advance());

        classifier.suggest(request("done();", 7), &token).await.unwrap();
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ClassifierState::Idle);
    }
}
