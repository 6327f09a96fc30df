//! Heuristic scoring of existing commit messages.
//!
//! A message earns up to 10 points from five independent checks. Messages at
//! or above the configured threshold are left alone by the batch.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_SCORE: u8 = 10;
pub const MIN_SUBJECT_LENGTH: usize = 10;
pub const MAX_SUBJECT_LENGTH: usize = 72;

pub const CONVENTIONAL_TYPES: [&str; 11] =
  ["feat", "fix", "docs", "style", "refactor", "test", "chore", "perf", "ci", "build", "revert"];

const GENERIC_MESSAGES: [&str; 8] = ["update", "fix", "change", "modify", "commit", "initial", "test", "wip"];

static CONVENTIONAL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(&format!(r"^({})(\(.+\))?: .+", CONVENTIONAL_TYPES.join("|"))).expect("invalid conventional commit pattern")
});

static PRESENT_TENSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+(\(.+\))?: [a-z]").expect("invalid present tense pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityAssessment {
  pub score:         u8,
  pub is_acceptable: bool,
  pub explanation:   String
}

/// Scores `message` and compares the result against `min_score`.
///
/// ```
/// use reword::quality::assess;
///
/// let assessment = assess("fix: resolve null pointer exception", 7);
/// assert_eq!(assessment.score, 10);
/// assert!(assessment.is_acceptable);
/// ```
pub fn assess(message: &str, min_score: u8) -> QualityAssessment {
  let subject = message.lines().next().unwrap_or_default();
  let subject_length = subject.chars().count();
  let mut score = 0;
  let mut reasons: Vec<&str> = Vec::with_capacity(5);

  if CONVENTIONAL.is_match(message) {
    score += 4;
    reasons.push("follows conventional format");
  } else {
    reasons.push("not conventional format");
  }

  if subject_length < MIN_SUBJECT_LENGTH {
    reasons.push("too short");
  } else if subject_length > MAX_SUBJECT_LENGTH {
    reasons.push("too long");
  } else {
    score += 2;
    reasons.push("appropriate length");
  }

  if is_generic(message) {
    reasons.push("too generic");
  } else {
    score += 2;
    reasons.push("descriptive");
  }

  if PRESENT_TENSE.is_match(message) {
    score += 1;
    reasons.push("uses present tense");
  } else {
    reasons.push("subject not lowercase");
  }

  if subject.ends_with('.') {
    reasons.push("has trailing period");
  } else {
    score += 1;
    reasons.push("no trailing period");
  }

  QualityAssessment {
    score,
    is_acceptable: score >= min_score,
    explanation: reasons.join(", ")
  }
}

fn is_generic(message: &str) -> bool {
  let lower = message.to_lowercase();

  GENERIC_MESSAGES.iter().any(|generic| {
    lower == *generic ||
      lower.strip_suffix('.') == Some(*generic) ||
      lower.strip_suffix(" commit") == Some(*generic)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_perfect_message() {
    let assessment = assess("fix: resolve null pointer exception", 7);
    assert_eq!(assessment.score, MAX_SCORE);
    assert!(assessment.is_acceptable);
    assert_eq!(
      assessment.explanation,
      "follows conventional format, appropriate length, descriptive, uses present tense, no trailing period"
    );
  }

  #[test]
  fn test_generic_message() {
    let assessment = assess("update", 7);
    assert_eq!(assessment.score, 1);
    assert!(!assessment.is_acceptable);
    assert!(assessment.explanation.contains("too short"));
    assert!(assessment.explanation.contains("too generic"));
  }

  #[test]
  fn test_empty_message() {
    let assessment = assess("", 7);
    assert_eq!(assessment.score, 3);
    assert!(!assessment.is_acceptable);
  }

  #[test]
  fn test_generic_variants() {
    assert!(is_generic("WIP"));
    assert!(is_generic("Update."));
    assert!(is_generic("initial commit"));
    assert!(!is_generic("update readme"));
    assert!(!is_generic("fixed"));
  }

  #[test]
  fn test_scope_is_accepted() {
    let assessment = assess("feat(parser): support nested arrays", 7);
    assert_eq!(assessment.score, MAX_SCORE);
  }

  #[test]
  fn test_unknown_type_is_not_conventional() {
    let assessment = assess("feature: support nested arrays", 7);
    assert_eq!(assessment.score, 6);
    assert!(assessment.explanation.starts_with("not conventional format"));
  }

  #[test]
  fn test_uppercase_subject_loses_tense_point() {
    let assessment = assess("feat: Support nested arrays", 7);
    assert_eq!(assessment.score, 9);
  }

  #[test]
  fn test_trailing_period_only_checks_subject() {
    let assessment = assess("docs: describe config layering\n\nSee the README.", 7);
    assert_eq!(assessment.score, MAX_SCORE);
    assert_eq!(assess("docs: describe config layering.", 7).score, 9);
  }

  #[test]
  fn test_too_long_subject() {
    let message = format!("refactor: {}", "a".repeat(70));
    let assessment = assess(&message, 7);
    assert_eq!(assessment.score, 8);
    assert!(assessment.explanation.contains("too long"));
  }
}
