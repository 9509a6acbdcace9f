use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use stepwise_graph::TargetId;
use tracing::{debug, warn};

use crate::{StateError, StateStore};

/// Characters left as-is in file names. `/` is encoded so every target maps
/// to a single file directly under the state directory.
const FILE_NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-');

const LOCK_SUFFIX: &str = ".locked";

/// Filesystem-based state store.
///
/// Each target maps to `{state_dir}/{percent-encoded id}` plus a sibling
/// `.locked` marker. The directory itself is not created implicitly; call
/// [`FsStateStore::ensure_dir`] first.
#[derive(Debug, Clone)]
pub struct FsStateStore {
  state_dir: PathBuf,
}

impl FsStateStore {
  pub fn new(state_dir: impl Into<PathBuf>) -> Self {
    Self {
      state_dir: state_dir.into(),
    }
  }

  pub fn state_dir(&self) -> &Path {
    &self.state_dir
  }

  pub fn ensure_dir(&self) -> Result<(), StateError> {
    fs::create_dir_all(&self.state_dir).map_err(|source| StateError::Io {
      path: self.state_dir.clone(),
      source,
    })
  }

  pub fn file_name(target: &TargetId) -> String {
    utf8_percent_encode(target.as_str(), FILE_NAME_ESCAPES).to_string()
  }

  pub fn lock_path(&self, target: &TargetId) -> PathBuf {
    let mut name = Self::file_name(target);
    name.push_str(LOCK_SUFFIX);
    self.state_dir.join(name)
  }

  /// Contents of the lock marker (the owning process id), if locked.
  pub fn lock_owner(&self, target: &TargetId) -> Option<String> {
    fs::read_to_string(self.lock_path(target))
      .ok()
      .map(|s| s.trim().to_string())
  }
}

fn remove_if_present(path: &Path) -> Result<(), StateError> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(source) => Err(StateError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}

impl StateStore for FsStateStore {
  fn artifact_path(&self, target: &TargetId) -> PathBuf {
    self.state_dir.join(Self::file_name(target))
  }

  fn has_artifact(&self, target: &TargetId) -> bool {
    self.artifact_path(target).exists()
  }

  fn is_locked(&self, target: &TargetId) -> bool {
    self.lock_path(target).exists()
  }

  fn lock(&self, target: &TargetId) -> Result<bool, StateError> {
    let path = self.lock_path(target);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(file) => file,
      Err(e) if e.kind() == ErrorKind::AlreadyExists => {
        debug!(target = %target, "lock marker already present");
        return Ok(false);
      }
      Err(source) => return Err(StateError::Io { path, source }),
    };

    if let Err(e) = write!(file, "{}", std::process::id()) {
      // The marker is ours either way; the pid is only informative.
      warn!(target = %target, error = %e, "failed to record pid in lock marker");
    }

    debug!(target = %target, pid = std::process::id(), "target locked");
    Ok(true)
  }

  fn unlock(&self, target: &TargetId) -> Result<(), StateError> {
    remove_if_present(&self.lock_path(target))?;
    debug!(target = %target, "target unlocked");
    Ok(())
  }

  fn remove_artifact(&self, target: &TargetId) -> Result<(), StateError> {
    remove_if_present(&self.artifact_path(target))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::TargetStatus;

  fn store() -> (FsStateStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    (FsStateStore::new(dir.path()), dir)
  }

  #[test]
  fn test_file_name_encoding() {
    assert_eq!(FsStateStore::file_name(&"result[3]".into()), "result%5B3%5D");
    assert_eq!(FsStateStore::file_name(&"a/b c".into()), "a%2Fb%20c");
    assert_eq!(FsStateStore::file_name(&"plain_name-1.txt".into()), "plain_name-1.txt");
  }

  #[test]
  fn test_status_transitions() {
    let (store, _dir) = store();
    let t = TargetId::from("t");

    assert_eq!(store.status(&t), TargetStatus::Pending);

    assert!(store.lock(&t).unwrap());
    assert_eq!(store.status(&t), TargetStatus::Locked);

    fs::write(store.artifact_path(&t), "out").unwrap();
    // A locked target is never done, even with an artifact present.
    assert!(!store.is_done(&t));
    assert_eq!(store.status(&t), TargetStatus::Locked);

    store.unlock(&t).unwrap();
    assert!(store.is_done(&t));
    assert_eq!(store.status(&t), TargetStatus::Done);
  }

  #[test]
  fn test_lock_is_exclusive() {
    let (store, _dir) = store();
    let t = TargetId::from("t");
    assert!(store.lock(&t).unwrap());
    assert!(!store.lock(&t).unwrap());
  }

  #[test]
  fn test_lock_records_pid() {
    let (store, _dir) = store();
    let t = TargetId::from("t");
    store.lock(&t).unwrap();
    assert_eq!(store.lock_owner(&t), Some(std::process::id().to_string()));
  }

  #[test]
  fn test_unlock_and_remove_are_idempotent() {
    let (store, _dir) = store();
    let t = TargetId::from("never-touched");
    store.unlock(&t).unwrap();
    store.unlock(&t).unwrap();
    store.remove_artifact(&t).unwrap();
    store.remove_artifact(&t).unwrap();
    assert_eq!(store.status(&t), TargetStatus::Pending);
  }

  #[test]
  fn test_lock_fails_without_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStateStore::new(dir.path().join("missing"));
    let err = store.lock(&TargetId::from("t")).unwrap_err();
    assert!(matches!(err, StateError::Io { .. }));

    store.ensure_dir().unwrap();
    assert!(store.lock(&TargetId::from("t")).unwrap());
  }
}
