use reword::quality::{assess, MAX_SCORE, MAX_SUBJECT_LENGTH, MIN_SUBJECT_LENGTH};

#[test]
fn test_conventional_prefix_is_worth_four_points() {
  let good = assess("feat: add user login flow", 7);
  let typo = assess("feet: add user login flow", 7);

  assert_eq!(good.score, MAX_SCORE);
  assert_eq!(good.score - typo.score, 4);
  assert!(good.is_acceptable);
  assert!(!typo.is_acceptable);
}

#[test]
fn test_subject_length_boundaries() {
  let subject = |length: usize| format!("fix: {}", "a".repeat(length - "fix: ".len()));

  assert_eq!(assess(&subject(MIN_SUBJECT_LENGTH - 1), 7).score, 8);
  assert_eq!(assess(&subject(MIN_SUBJECT_LENGTH), 7).score, 10);
  assert_eq!(assess(&subject(MAX_SUBJECT_LENGTH), 7).score, 10);
  assert_eq!(assess(&subject(MAX_SUBJECT_LENGTH + 1), 7).score, 8);
}

#[test]
fn test_length_counts_characters() {
  // 10 characters, more than 10 bytes
  let message = "fix: añaña";
  assert_eq!(message.chars().count(), 10);
  assert_eq!(assess(message, 7).score, 10);
}

#[test]
fn test_threshold_decides_acceptance() {
  let assessment = assess("feat: Add login form", 7);
  assert_eq!(assessment.score, 9);
  assert!(assessment.is_acceptable);

  assert!(!assess("feat: Add login form", 10).is_acceptable);
  assert!(assess("wip", 0).is_acceptable);
}

#[test]
fn test_common_bad_messages() {
  for message in ["update", "fix", "WIP", "changes", "Fixed the bug."] {
    let assessment = assess(message, 7);
    assert!(!assessment.is_acceptable, "{message} scored {}", assessment.score);
  }
}

#[test]
fn test_only_first_line_is_length_checked() {
  let message = format!("fix(api): retry on timeout\n\n{}", "detail ".repeat(30));
  assert_eq!(assess(&message, 7).score, MAX_SCORE);
}
