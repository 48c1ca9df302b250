//! Recovery for an aborted forward run
//!
//! The guard has two modes, decided by how far the run got:
//!
//! - **Before the release branch exists**: if the mutation marker is set, restore only
//!   the release files (version file, lock artifact, changelog), skipping any that
//!   were already modified before the run started. Those belong to the operator.
//!   Each file goes back to the state recorded when the marker was set: tracked files
//!   from HEAD, untracked (e.g. ignored) files to their saved bytes, and files that did
//!   not exist are removed.
//! - **After the release branch exists**: run the registered compensations in the
//!   order they were registered, and nothing else.
//!
//! Recovery runs from `Drop`, so it covers early `?` returns and panics alike, and it
//! runs at most once. A successful run disarms the guard.

use crate::core::error::ReleaseResult;
use crate::core::vcs::Vcs;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One undo step registered by the forward path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
  /// Discard uncommitted changes to the release files
  RestoreFiles(Vec<PathBuf>),
  CheckoutBranch(String),
  DeleteLocalBranch(String),
  DeleteRemoteBranch { branch: String, remote: String },
}

impl Compensation {
  fn describe(&self) -> String {
    match self {
      Compensation::RestoreFiles(paths) => format!("restore {}", join_paths(paths)),
      Compensation::CheckoutBranch(branch) => format!("switch back to {}", branch),
      Compensation::DeleteLocalBranch(branch) => format!("delete local branch {}", branch),
      Compensation::DeleteRemoteBranch { branch, remote } => format!("delete {}/{}", remote, branch),
    }
  }
}

/// A release file as it was before the first mutation
#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
  Tracked,
  Untracked(Vec<u8>),
  Absent,
}

fn join_paths(paths: &[PathBuf]) -> String {
  paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

pub struct CleanupGuard<'a> {
  vcs: &'a dyn Vcs,
  root: PathBuf,
  release_files: Vec<PathBuf>,
  pre_dirty: HashSet<String>,
  mutation_started: bool,
  snapshots: HashMap<PathBuf, Snapshot>,
  compensations: Vec<Compensation>,
  armed: bool,
}

impl<'a> CleanupGuard<'a> {
  /// `pre_dirty` is the uncommitted path set captured before preflight
  pub fn new(vcs: &'a dyn Vcs, root: &Path, release_files: Vec<PathBuf>, pre_dirty: Vec<String>) -> Self {
    Self {
      vcs,
      root: root.to_path_buf(),
      release_files,
      pre_dirty: pre_dirty.into_iter().collect(),
      mutation_started: false,
      snapshots: HashMap::new(),
      compensations: Vec::new(),
      armed: true,
    }
  }

  /// Set once preflight has passed and the first file is about to change
  ///
  /// Records how each release file looks now, so recovery can put it back.
  pub fn mark_mutation_started(&mut self) -> ReleaseResult<()> {
    for path in &self.release_files {
      let snapshot = if self.vcs.is_tracked(&path.to_string_lossy())? {
        Snapshot::Tracked
      } else {
        match std::fs::read(self.root.join(path)) {
          Ok(bytes) => Snapshot::Untracked(bytes),
          Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::Absent,
          Err(e) => return Err(e.into()),
        }
      };
      self.snapshots.insert(path.clone(), snapshot);
    }
    tracing::info!(files = self.snapshots.len(), "mutation started");
    self.mutation_started = true;
    Ok(())
  }

  pub fn register(&mut self, compensation: Compensation) {
    tracing::debug!(compensation = ?compensation, "registered compensation");
    self.compensations.push(compensation);
  }

  pub fn compensations(&self) -> &[Compensation] {
    &self.compensations
  }

  /// The run succeeded; nothing to undo
  pub fn disarm(&mut self) {
    self.armed = false;
  }

  /// Release files safe to restore: not modified before this run
  pub fn owned_files(&self) -> Vec<PathBuf> {
    self
      .release_files
      .iter()
      .filter(|p| !self.pre_dirty.contains(p.to_string_lossy().as_ref()))
      .cloned()
      .collect()
  }

  fn restore_files(&self, paths: &[PathBuf]) -> Result<(), String> {
    let mut failures = Vec::new();
    for path in paths {
      let full = self.root.join(path);
      let result = match self.snapshots.get(path) {
        Some(Snapshot::Tracked) => self.vcs.restore_paths(std::slice::from_ref(path)).map_err(|e| e.to_string()),
        Some(Snapshot::Untracked(bytes)) => std::fs::write(&full, bytes).map_err(|e| e.to_string()),
        // Created by this run
        Some(Snapshot::Absent) => match std::fs::remove_file(&full) {
          Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.to_string()),
          _ => Ok(()),
        },
        None => {
          tracing::warn!(path = %path.display(), "no snapshot, leaving file alone");
          Ok(())
        }
      };
      if let Err(e) = result {
        failures.push(format!("{}: {}", path.display(), e));
      }
    }
    if failures.is_empty() {
      Ok(())
    } else {
      Err(failures.join("; "))
    }
  }

  fn apply(&self, compensation: &Compensation) -> Result<(), String> {
    match compensation {
      Compensation::RestoreFiles(paths) => self.restore_files(paths),
      Compensation::CheckoutBranch(branch) => self.vcs.checkout_branch(branch).map_err(|e| e.to_string()),
      Compensation::DeleteLocalBranch(branch) => self.vcs.delete_local_branch(branch).map_err(|e| e.to_string()),
      Compensation::DeleteRemoteBranch { branch, remote } => {
        self.vcs.delete_remote_branch(branch, remote).map_err(|e| e.to_string())
      }
    }
  }

  /// Undo what this run did; best effort, every step is attempted
  pub fn recover(&mut self) {
    if !self.armed {
      return;
    }
    self.armed = false;

    if self.compensations.is_empty() {
      if !self.mutation_started {
        return;
      }
      let files = self.owned_files();
      if files.is_empty() {
        return;
      }
      println!("\n🧹 Restoring {}", join_paths(&files));
      match self.restore_files(&files) {
        Ok(()) => println!("   ✅ Release files restored"),
        Err(e) => {
          tracing::warn!(error = %e, "file restore failed");
          println!("   ⚠️  Could not restore: {}", e);
        }
      }
      return;
    }

    println!("\n🧹 Undoing release steps");
    for compensation in std::mem::take(&mut self.compensations) {
      match self.apply(&compensation) {
        Ok(()) => println!("   ✅ {}", compensation.describe()),
        Err(e) => {
          tracing::warn!(compensation = ?compensation, error = %e, "compensation failed");
          println!("   ⚠️  Could not {}: {}", compensation.describe(), e);
        }
      }
    }
  }
}

impl Drop for CleanupGuard<'_> {
  fn drop(&mut self) {
    self.recover();
  }
}
