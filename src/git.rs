use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use git2::{RepositoryOpenFlags as Flag, *};
use log::debug;
use thiserror::Error;

use crate::batch::CommitSource;
use crate::commit::CommitRecord;
use crate::profile;

/// Identifier used for the pseudo-commit built from the index.
pub const STAGED_ID: &str = "staged";

#[derive(Error, Debug)]
pub enum GitError {
  #[error("Git error: {0}")]
  Git(#[from] git2::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Working tree has uncommitted changes, commit or stash them first")]
  DirtyWorkingTree,

  #[error("HEAD is detached, check out a branch first")]
  DetachedHead,

  #[error("Repository has no working directory")]
  BareRepository,

  #[error("No commits found on {0}")]
  NoCommits(String),

  #[error("No staged changes")]
  NothingStaged,

  #[error("git filter-branch failed: {0}")]
  Rewrite(String)
}

pub type Result<T, E = GitError> = std::result::Result<T, E>;

pub struct Repo {
  repo: Repository
}

trait Utf8String {
  fn to_utf8(&self) -> String;
}

impl Utf8String for [u8] {
  fn to_utf8(&self) -> String {
    String::from_utf8_lossy(self).into_owned()
  }
}

trait DiffDeltaPath {
  fn path(&self) -> Option<String>;
}

impl DiffDeltaPath for DiffDelta<'_> {
  fn path(&self) -> Option<String> {
    self
      .new_file()
      .path()
      .or_else(|| self.old_file().path())
      .map(|path| path.to_string_lossy().into_owned())
  }
}

impl Repo {
  pub fn new() -> Result<Self> {
    Self::new_with_path(".")
  }

  pub fn new_with_path(path: impl AsRef<Path>) -> Result<Self> {
    Ok(Repo {
      repo: Repository::open_ext(path.as_ref(), Flag::empty(), Vec::<&Path>::new())?
    })
  }

  pub fn workdir(&self) -> Result<&Path> {
    self.repo.workdir().ok_or(GitError::BareRepository)
  }

  pub fn current_branch(&self) -> Result<String> {
    let head = self.repo.head()?;
    if !head.is_branch() {
      return Err(GitError::DetachedHead);
    }

    head
      .shorthand()
      .map(str::to_string)
      .ok_or_else(|| GitError::Git(git2::Error::from_str("Branch name is not valid UTF-8")))
  }

  /// Ids of the newest `max` commits reachable from `branch`, oldest first.
  /// `Some(0)` gives an empty list.
  pub fn commits(&self, branch: &str, max: Option<usize>) -> Result<Vec<String>> {
    profile!("List commits");

    if max == Some(0) {
      return Ok(Vec::new());
    }

    let mut walk = self.repo.revwalk()?;
    walk.push(self.resolve(branch)?.id())?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    let mut ids = walk
      .take(max.unwrap_or(usize::MAX))
      .map(|oid| oid.map(|oid| oid.to_string()))
      .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
      return Err(GitError::NoCommits(branch.to_string()));
    }

    ids.reverse();
    debug!("[commits] {} commits on {}", ids.len(), branch);
    Ok(ids)
  }

  /// First parent of `id`, or `None` for a root commit.
  pub fn parent_of(&self, id: &str) -> Result<Option<String>> {
    let commit = self.repo.find_commit(Oid::from_str(id)?)?;
    Ok(commit.parent_ids().next().map(|oid| oid.to_string()))
  }

  pub fn read_commit(&self, id: &str) -> Result<CommitRecord> {
    profile!("Read commit");

    let commit = self.repo.find_commit(Oid::from_str(id)?)?;
    let tree = commit.tree()?;
    // Root commits are diffed against the empty tree
    let parent_tree = match commit.parents().next() {
      Some(parent) => Some(parent.tree()?),
      None => None
    };

    let mut opts = Repo::diff_options();
    let diff = self.repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;
    let message = commit.summary().unwrap_or_default().to_string();

    Repo::record(id.to_string(), message, &diff)
  }

  /// The staged changes against HEAD as a record with an empty message.
  pub fn staged(&self) -> Result<CommitRecord> {
    let tree = self.repo.head().ok().and_then(|head| head.peel_to_tree().ok());
    let mut opts = Repo::diff_options();
    let diff = self.repo.diff_tree_to_index(tree.as_ref(), None, Some(&mut opts))?;

    if diff.deltas().len() == 0 {
      return Err(GitError::NothingStaged);
    }

    Repo::record(STAGED_ID.to_string(), String::new(), &diff)
  }

  pub fn is_clean(&self) -> Result<bool> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);
    Ok(self.repo.statuses(Some(&mut opts))?.is_empty())
  }

  /// Points `backup/<branch>-<unix seconds>` at the tip of `branch`.
  pub fn create_backup_branch(&self, branch: &str) -> Result<String> {
    let seconds = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|elapsed| elapsed.as_secs())
      .unwrap_or_default();
    let name = format!("backup/{}-{}", branch, seconds);

    let commit = self.resolve(branch)?;
    self.repo.branch(&name, &commit, false)?;
    debug!("[backup] Created {} at {}", name, commit.id());
    Ok(name)
  }

  fn resolve(&self, reference: &str) -> Result<Commit<'_>> {
    Ok(self.repo.revparse_single(reference)?.peel_to_commit()?)
  }

  fn record(id: String, original_message: String, diff: &Diff<'_>) -> Result<CommitRecord> {
    let changed_files = diff.deltas().filter_map(|delta| delta.path()).collect();

    let mut patch = Vec::new();
    diff.print(DiffFormat::Patch, |_, _, line| {
      if matches!(line.origin(), '+' | '-' | ' ') {
        patch.push(line.origin() as u8);
      }
      patch.extend_from_slice(line.content());
      true
    })?;

    Ok(CommitRecord { id, original_message, changed_files, diff: patch.to_utf8() })
  }

  fn diff_options() -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts
      .ignore_submodules(true)
      .include_untracked(false)
      .include_ignored(false)
      .context_lines(3)
      .patience(true);
    opts
  }
}

impl CommitSource for Repo {
  fn fetch(&self, id: &str) -> anyhow::Result<CommitRecord> {
    Ok(self.read_commit(id)?)
  }
}
