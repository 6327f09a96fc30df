//! Sequential batch over a branch's commits.
//!
//! Commits are processed one at a time, oldest first. Every commit ends up
//! with exactly one [`Entry`], in input order, so the outcome lines up with
//! the commit list by position and by id.

use std::time::Duration;

use anyhow::Error;
use thiserror::Error;

use crate::commit::{self, CommitRecord};
use crate::config::RunConfig;
use crate::error::is_auth_error;
use crate::provider::Provider;
use crate::quality;

/// Read-only access to commits by id.
pub trait CommitSource {
  fn fetch(&self, id: &str) -> anyhow::Result<CommitRecord>;
}

/// Progress callbacks. Both default to doing nothing.
pub trait Observer {
  fn started(&self, _index: usize, _total: usize, _record: &CommitRecord) {}
  fn finished(&self, _index: usize, _total: usize, _entry: &Entry) {}
}

/// Observer that ignores everything.
pub struct Silent;

impl Observer for Silent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
  /// The scorer accepted the existing message.
  AlreadyAcceptable,
  /// The provider answered with the original message.
  Unchanged,
  /// The provider failed; the original message stays.
  GenerationFailed
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Keep(KeepReason),
  Replace(String)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  pub id:       String,
  pub original: String,
  pub decision: Decision
}

impl Entry {
  /// The message this commit ends up with.
  pub fn message(&self) -> &str {
    match &self.decision {
      Decision::Replace(message) => message,
      Decision::Keep(_) => &self.original
    }
  }

  pub fn is_replaced(&self) -> bool {
    matches!(self.decision, Decision::Replace(_))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
  pub entries: Vec<Entry>
}

impl BatchOutcome {
  /// Final messages in commit order.
  pub fn messages(&self) -> Vec<String> {
    self.entries.iter().map(|entry| entry.message().to_string()).collect()
  }

  /// `(commit id, new message)` for every replaced commit, in commit order.
  pub fn replacements(&self) -> Vec<(String, String)> {
    self
      .entries
      .iter()
      .filter_map(|entry| {
        match &entry.decision {
          Decision::Replace(message) => Some((entry.id.clone(), message.clone())),
          Decision::Keep(_) => None
        }
      })
      .collect()
  }

  pub fn count(&self, reason: KeepReason) -> usize {
    self
      .entries
      .iter()
      .filter(|entry| entry.decision == Decision::Keep(reason))
      .count()
  }

  pub fn replaced(&self) -> usize {
    self.entries.iter().filter(|entry| entry.is_replaced()).count()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// The batch stopped because a commit could not be read. Entries recorded
/// before the failure are kept in `completed`.
#[derive(Error, Debug)]
#[error("Failed to read commit {id} after {} of {total} commits", .completed.len())]
pub struct BatchAborted {
  pub id:        String,
  pub total:     usize,
  pub completed: BatchOutcome,
  #[source]
  pub source:    Error
}

pub struct Batch<'a> {
  source:   &'a dyn CommitSource,
  provider: &'a dyn Provider,
  config:   &'a RunConfig,
  observer: &'a dyn Observer
}

impl<'a> Batch<'a> {
  pub fn new(source: &'a dyn CommitSource, provider: &'a dyn Provider, config: &'a RunConfig) -> Self {
    Self { source, provider, config, observer: &Silent }
  }

  pub fn with_observer(mut self, observer: &'a dyn Observer) -> Self {
    self.observer = observer;
    self
  }

  pub async fn run(&self, ids: &[String]) -> Result<BatchOutcome, BatchAborted> {
    let total = ids.len();
    let mut outcome = BatchOutcome { entries: Vec::with_capacity(total) };

    for (index, id) in ids.iter().enumerate() {
      if index > 0 {
        pause(self.config.delay).await;
      }

      let record = match self.source.fetch(id) {
        Ok(record) => record,
        Err(source) => {
          return Err(BatchAborted { id: id.clone(), total, completed: outcome, source });
        }
      };

      self.observer.started(index, total, &record);
      let entry = self.process(&record).await;
      self.observer.finished(index, total, &entry);
      outcome.entries.push(entry);
    }

    Ok(outcome)
  }

  async fn process(&self, record: &CommitRecord) -> Entry {
    let decision = self.decide(record).await;
    Entry { id: record.id.clone(), original: record.original_message.clone(), decision }
  }

  async fn decide(&self, record: &CommitRecord) -> Decision {
    if self.config.skip_well_formed {
      let assessment = quality::assess(&record.original_message, self.config.min_quality_score);
      log::debug!(
        "[{}] score {}/{}: {}",
        record.short_id(),
        assessment.score,
        quality::MAX_SCORE,
        assessment.explanation
      );

      if assessment.is_acceptable {
        return Decision::Keep(KeepReason::AlreadyAcceptable);
      }
    }

    match commit::suggest(self.provider, record, self.config).await {
      Ok(message) if message.trim() == record.original_message.trim() => Decision::Keep(KeepReason::Unchanged),
      Ok(message) => Decision::Replace(message),
      Err(err) => {
        if is_auth_error(&err) {
          log::warn!("[{}] {:#} (check your API key)", record.short_id(), err);
        } else {
          log::warn!("[{}] keeping original message: {:#}", record.short_id(), err);
        }
        Decision::Keep(KeepReason::GenerationFailed)
      }
    }
  }
}

async fn pause(delay: Duration) {
  if !delay.is_zero() {
    tokio::time::sleep(delay).await;
  }
}
