// These tests shell out to the `git` binary for filter-branch.
mod common;

use anyhow::Result;
use common::TestRepo;
use reword::git::Repo;
use reword::history::{rewrite, RewritePlan};

#[test]
fn test_rewrite_whole_branch() -> Result<()> {
  let test = TestRepo::default();
  let first = test.commit_file("greet.txt", "hello\n", "update")?;
  let second = test.commit_file("greet.txt", "hello, world\n", "wip")?;
  test.commit_file("README.md", "# greet\n", "docs: add readme")?;

  let repo = Repo::new_with_path(test.path())?;
  let branch = repo.current_branch()?;
  let plan = RewritePlan {
    branch:       branch.clone(),
    base:         None,
    replacements: vec![
      (first, "feat: add greeting file".to_string()),
      (second, "feat(greet): address the whole world".to_string()),
    ]
  };

  rewrite(test.path(), &plan)?;

  assert_eq!(test.message_of("HEAD~2")?.trim_end(), "feat: add greeting file");
  assert_eq!(test.message_of("HEAD~1")?.trim_end(), "feat(greet): address the whole world");
  assert_eq!(test.message_of("HEAD")?.trim_end(), "docs: add readme");

  // Content is untouched
  assert_eq!(repo.commits(&branch, None)?.len(), 3);
  assert_eq!(std::fs::read_to_string(test.path().join("greet.txt"))?, "hello, world\n");
  Ok(())
}

#[test]
fn test_rewrite_keeps_commits_below_base() -> Result<()> {
  let test = TestRepo::default();
  let first = test.commit_file("a.txt", "a\n", "first")?;
  let second = test.commit_file("a.txt", "b\n", "second")?;

  let repo = Repo::new_with_path(test.path())?;
  let branch = repo.current_branch()?;
  let plan = RewritePlan {
    branch:       branch.clone(),
    base:         repo.parent_of(&second)?,
    replacements: vec![(second, "fix: write b into a.txt".to_string())]
  };

  rewrite(test.path(), &plan)?;

  let ids = repo.commits(&branch, None)?;
  assert_eq!(ids[0], first);
  assert_eq!(test.message_of("HEAD")?.trim_end(), "fix: write b into a.txt");
  Ok(())
}

#[test]
fn test_rewrite_failure_is_reported() {
  let test = TestRepo::default();
  let plan = RewritePlan {
    branch:       "missing".into(),
    base:         None,
    replacements: vec![("0000000000000000000000000000000000000000".into(), "feat: x".into())]
  };

  let error = rewrite(test.path(), &plan).unwrap_err();
  assert!(error.to_string().starts_with("git filter-branch failed"));
}
