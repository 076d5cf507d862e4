mod collaborators;
mod distractors;
mod errors;
mod quiz;

pub use collaborators::{ItemId, Notifier, ProgressReporter, ScopeId, VocabularyStore};
pub use distractors::{McqOptions, select_options};
pub use errors::{FailureScope, GenerationError, SelectionError};
pub use quiz::{DifficultyLevel, GenerationRequest, McqRecord, OPTION_COUNT, fields};
