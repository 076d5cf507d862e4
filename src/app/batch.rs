use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::domain::{
    GenerationError, ItemId, McqRecord, Notifier, ProgressReporter, ScopeId, SelectionError,
    VocabularyStore, fields, select_options,
};

use super::cancel::CancelToken;
use super::generator::SentenceSource;

/// Lifecycle of one batch run. A runner moves through these once; it is not
/// reused after reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Pending,
    Running,
    Completed,
    Aborted,
    Cancelled,
}

/// Reason a batch stopped before its last item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchAbort {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { generated: usize, skipped: usize },
    Aborted { error: BatchAbort, generated: usize },
    Cancelled { generated: usize },
}

/// Sequential driver over a set of vocabulary items. Each item becomes one
/// MCQ note: a generated cloze sentence plus three distractors drawn from the
/// rest of the pool.
///
/// Items are processed strictly one at a time. Results committed before a
/// failure or cancellation stay committed.
pub struct McqBatchRunner<G> {
    generator: G,
    notifier: Arc<dyn Notifier>,
    cancel: CancelToken,
    state: BatchState,
}

impl<G: SentenceSource> McqBatchRunner<G> {
    pub fn new(generator: G, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            generator,
            notifier,
            cancel: CancelToken::new(),
            state: BatchState::default(),
        }
    }

    /// Handle for requesting cancellation from outside the run loop. Takes
    /// effect at the next between-items checkpoint.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub async fn run<R: Rng + ?Sized>(
        &mut self,
        store: &mut dyn VocabularyStore,
        scope: ScopeId,
        items: &[ItemId],
        progress: &dyn ProgressReporter,
        rng: &mut R,
    ) -> BatchOutcome {
        self.state = BatchState::Running;

        // Snapshot the pool once; records written during this run do not
        // change the distractor candidates of later items.
        let pool = store.list_words(scope);

        progress.set_total(items.len());

        let mut generated = 0usize;
        let mut skipped = 0usize;

        for (index, &item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.state = BatchState::Cancelled;
                self.notifier
                    .info(&format!("Generation cancelled. {generated} note(s) kept."));
                return BatchOutcome::Cancelled { generated };
            }

            let word = match store.get_field(item, fields::WORD) {
                Some(value) if !value.trim().is_empty() => value.trim().to_string(),
                _ => continue,
            };

            let selection = match select_options(&word, &pool, rng) {
                Ok(selection) => selection,
                Err(error) => {
                    self.state = BatchState::Aborted;
                    self.notifier.info(&format!(
                        "Generation stopped: {error}. Add more words to the collection and retry."
                    ));
                    return BatchOutcome::Aborted {
                        error: BatchAbort::Selection(error),
                        generated,
                    };
                }
            };

            let sentence = match self.generator.generate(&word, &self.cancel).await {
                Ok(sentence) => sentence,
                Err(GenerationError::Cancelled) => {
                    self.state = BatchState::Cancelled;
                    self.notifier
                        .info(&format!("Generation cancelled. {generated} note(s) kept."));
                    return BatchOutcome::Cancelled { generated };
                }
                Err(error) if error.is_batch_fatal() => {
                    self.state = BatchState::Aborted;
                    self.notifier.info(&error.user_message());
                    return BatchOutcome::Aborted {
                        error: BatchAbort::Generation(error),
                        generated,
                    };
                }
                Err(error) => {
                    self.notifier
                        .info(&format!("Skipping '{word}': {}", error.user_message()));
                    skipped += 1;
                    continue;
                }
            };

            let record = McqRecord {
                word: word.clone(),
                sentence_with_blank: sentence,
                options: selection.options,
                answer: selection.answer,
            };

            store.set_fields(item, &record.store_fields());
            store.commit(item);

            generated += 1;
            progress.advance(index + 1);
        }

        self.state = BatchState::Completed;
        self.notifier.info(&format!(
            "Done. Generated {generated} MCQ note(s), skipped {skipped} item(s)."
        ));
        BatchOutcome::Completed { generated, skipped }
    }
}
