//! Debounced, generation-tagged dispatch of suggestion requests.
//!
//! Every input issues a new generation. The spawned worker sleeps through the
//! debounce window, skips the round-trip when the context hash matches the last
//! processed one, and hands its result back over a channel. Older generations are
//! never interrupted; their results are simply discarded by whoever consumes them.

mod generation;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use crate::classify::{NoSuggestionReason, Suggestion, SuggestionClassifier, SuggestionRequest};
use crate::constants::timing;
use crate::context::ContextHash;

pub use generation::{Generation, GenerationCounter, GenerationToken};
pub use state::{InlineSuggestion, PendingSuggestionState};

/// What one generation's worker produced.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub generation: Generation,
    pub hash: ContextHash,
    pub suggestion: Suggestion,
}

pub struct RequestCoordinator {
    classifier: Arc<SuggestionClassifier>,
    counter: GenerationCounter,
    debounce: Duration,
    tx: mpsc::UnboundedSender<GenerationResult>,
    rx: mpsc::UnboundedReceiver<GenerationResult>,
    workers: Vec<JoinHandle<()>>,
}

impl RequestCoordinator {
    pub fn new(classifier: Arc<SuggestionClassifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            classifier,
            counter: GenerationCounter::new(),
            debounce: Duration::from_millis(timing::DEBOUNCE_MS),
            tx,
            rx,
            workers: Vec::new(),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn classifier(&self) -> &SuggestionClassifier {
        &self.classifier
    }

    pub fn current(&self) -> Generation {
        self.counter.current()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.counter.is_current(generation)
    }

    /// Invalidate all outstanding work without starting any.
    pub fn cancel(&mut self) -> Generation {
        let generation = self.counter.advance();
        debug!("Cancelled outstanding work, now at {}", generation);
        generation
    }

    /// Start a new generation for `request`. `skip_hash` is the hash of the last
    /// processed context; a match ends the worker without any collaborator call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn issue(&mut self, request: SuggestionRequest, skip_hash: Option<ContextHash>) -> Generation {
        let generation = self.counter.advance();
        let token = self.counter.token(generation);
        let classifier = Arc::clone(&self.classifier);
        let tx = self.tx.clone();
        let debounce = self.debounce;

        self.workers.retain(|worker| !worker.is_finished());
        let span = info_span!("suggestion", generation = generation.get());
        let worker = tokio::spawn(
            async move {
                tokio::time::sleep(debounce).await;
                if !token.is_current() {
                    debug!("Superseded during debounce");
                    return;
                }

                let hash = request.prompt.hash();
                let suggestion = if skip_hash == Some(hash) {
                    debug!("Context unchanged since last request, skipping");
                    Suggestion::None(NoSuggestionReason::Duplicate)
                } else {
                    match classifier.suggest(request, &token).await {
                        Ok(suggestion) => suggestion,
                        Err(e) => {
                            debug!("Dropping result: {}", e);
                            return;
                        }
                    }
                };

                if token.is_current() {
                    let _ = tx.send(GenerationResult {
                        generation,
                        hash,
                        suggestion,
                    });
                }
            }
            .instrument(span),
        );
        self.workers.push(worker);
        generation
    }

    /// Next result from any worker. Callers must re-check [`Self::is_current`]
    /// before publishing, since a newer generation may have been issued since.
    pub async fn next_result(&mut self) -> Option<GenerationResult> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Self::next_result`].
    pub fn try_next_result(&mut self) -> Option<GenerationResult> {
        self.rx.try_recv().ok()
    }
}

impl Drop for RequestCoordinator {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}
