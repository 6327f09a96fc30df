/// Enters a debug span until the end of the enclosing scope.
/// Sync code only: the guard must not be held across an `.await`.
#[macro_export]
macro_rules! profile {
  ($name:expr) => {
    let _span = tracing::span!(tracing::Level::DEBUG, $name);
    let _enter = _span.enter();
  };
}

pub mod batch;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod prompt;
pub mod provider;
pub mod quality;
pub mod redact;

// Re-exports
pub use batch::{Batch, BatchAborted, BatchOutcome, CommitSource, Decision, Entry, KeepReason, Observer};
pub use commit::CommitRecord;
pub use config::RunConfig;
pub use provider::Provider;
pub use quality::QualityAssessment;
