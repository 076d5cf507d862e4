use std::collections::BTreeSet;

/// Identifier of one vocabulary item in the external store.
pub type ItemId = u64;

/// Identifier of the scope (deck, collection) the pool is drawn from.
pub type ScopeId = u64;

/// Read/write access to the external vocabulary store. The persistence format
/// is the host's concern; this core only reads words and writes MCQ fields.
pub trait VocabularyStore {
    /// Deduplicated words of every item in the scope.
    fn list_words(&self, scope: ScopeId) -> BTreeSet<String>;

    fn get_field(&self, item: ItemId, name: &str) -> Option<String>;

    fn set_fields(&mut self, item: ItemId, pairs: &[(&str, String)]);

    fn commit(&mut self, item: ItemId);
}

/// Fire-and-forget user notification channel.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
}

/// Batch progress sink, typically backed by a host progress widget.
pub trait ProgressReporter {
    fn set_total(&self, total: usize);

    fn advance(&self, done: usize);
}
