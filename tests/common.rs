#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use git2::{Commit, Repository, Signature};
use tempfile::TempDir;

pub const NAME: &str = "Test User";
pub const EMAIL: &str = "test@example.com";

pub struct TestRepo {
  pub repo: Repository,
  pub dir:  TempDir
}

impl Default for TestRepo {
  fn default() -> Self {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    // filter-branch and friends need an identity without touching global config
    let mut config = repo.config().unwrap();
    config.set_str("user.name", NAME).unwrap();
    config.set_str("user.email", EMAIL).unwrap();

    Self { repo, dir }
  }
}

impl TestRepo {
  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn write(&self, name: &str, content: &str) -> Result<()> {
    let path = self.dir.path().join(name);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  pub fn stage(&self, name: &str) -> Result<()> {
    let mut index = self.repo.index()?;
    index.add_path(Path::new(name))?;
    index.write()?;
    Ok(())
  }

  /// Writes, stages and commits `name`. Returns the new commit id.
  pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Result<String> {
    self.write(name, content)?;
    self.stage(name)?;
    self.commit(message)
  }

  pub fn commit(&self, message: &str) -> Result<String> {
    let mut index = self.repo.index()?;
    let tree = self.repo.find_tree(index.write_tree()?)?;
    let signature = Signature::now(NAME, EMAIL)?;
    let parent = self.repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();

    let oid = self
      .repo
      .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    Ok(oid.to_string())
  }

  /// Full message of the commit `reference` points at.
  pub fn message_of(&self, reference: &str) -> Result<String> {
    let commit = self.repo.revparse_single(reference)?.peel_to_commit()?;
    Ok(commit.message().unwrap_or_default().to_string())
  }
}
