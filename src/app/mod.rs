mod batch;
mod cancel;
mod generator;

pub use batch::{BatchAbort, BatchOutcome, BatchState, McqBatchRunner};
pub use cancel::CancelToken;
pub use generator::{SentenceGenerator, SentenceSource};
