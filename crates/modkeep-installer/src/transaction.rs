use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Running,
    Committed,
    RolledBack,
}

#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    /// Captured pre-transaction bytes; `None` marks a path that did not
    /// exist when first snapshotted.
    prior: Option<Vec<u8>>,
}

/// Best-effort multi-file transaction: every mutated path is snapshotted
/// before its first mutation, and `rollback` restores all of them. This is
/// crash/exception recovery scoped to this process, not ACID isolation;
/// writes are applied eagerly and outside readers may observe them
/// mid-transaction.
#[derive(Debug)]
pub struct FileTransaction {
    snapshots: Vec<Snapshot>,
    state: TxnState,
}

impl FileTransaction {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            state: TxnState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == TxnState::Running
    }

    /// Captures the current bytes of `path` (or its absence). The first
    /// snapshot of a path wins; later calls are no-ops.
    pub fn snapshot(&mut self, path: &Path) -> Result<()> {
        self.ensure_running()?;
        if self.snapshots.iter().any(|snapshot| snapshot.path == path) {
            return Ok(());
        }

        let prior = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to snapshot {}", path.display()));
            }
        };
        self.snapshots.push(Snapshot {
            path: path.to_path_buf(),
            prior,
        });
        Ok(())
    }

    pub fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.snapshot(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn delete(&mut self, path: &Path) -> Result<()> {
        self.snapshot(path)?;
        remove_existing(path).with_context(|| format!("failed to delete {}", path.display()))
    }

    /// Finalizes the transaction: syncs every mutated file that still
    /// exists, then drops the snapshots. A finalize failure triggers an
    /// automatic rollback and reports the commit failure.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_running()?;

        let paths: Vec<PathBuf> = self
            .snapshots
            .iter()
            .map(|snapshot| snapshot.path.clone())
            .collect();
        for path in paths {
            if !path.exists() {
                continue;
            }
            let sync = fs::File::open(&path)
                .and_then(|file| file.sync_all())
                .with_context(|| format!("commit failed syncing {}", path.display()));
            if let Err(err) = sync {
                return match self.rollback() {
                    Ok(()) => Err(err.context("commit failed; prior state restored")),
                    Err(rollback_err) => Err(err.context(format!(
                        "commit failed and rollback was incomplete: {rollback_err:#}"
                    ))),
                };
            }
        }

        self.snapshots.clear();
        self.state = TxnState::Committed;
        Ok(())
    }

    /// Restores every snapshotted path to its captured state, most recent
    /// first. Safe to call with mutations partially applied; restore
    /// failures do not stop the remaining restores but are reported as a
    /// distinct fatal error.
    pub fn rollback(&mut self) -> Result<()> {
        if self.state != TxnState::Running {
            return Ok(());
        }
        self.state = TxnState::RolledBack;

        let mut failed = Vec::new();
        for snapshot in self.snapshots.drain(..).rev() {
            let restored = match &snapshot.prior {
                Some(bytes) => restore_bytes(&snapshot.path, bytes),
                None => remove_existing(&snapshot.path).map_err(anyhow::Error::from),
            };
            if restored.is_err() {
                failed.push(snapshot.path.display().to_string());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("rollback incomplete: {}", failed.join(", ")))
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.state == TxnState::Running {
            Ok(())
        } else {
            Err(anyhow!("file transaction is already finished"))
        }
    }
}

impl Default for FileTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FileTransaction {
    fn drop(&mut self) {
        // An unfinished transaction restores prior state on every exit path.
        if self.state == TxnState::Running {
            let _ = self.rollback();
        }
    }
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn restore_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to restore {}", path.display()))
}
