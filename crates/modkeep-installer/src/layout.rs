use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Path book for one managed game prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    prefix: PathBuf,
}

impl GameLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Root of the live game data tree.
    pub fn data_dir(&self) -> PathBuf {
        self.prefix.join("data")
    }

    /// Root for shadowed payloads written by non-top owners.
    pub fn overwrite_dir(&self) -> PathBuf {
        self.prefix.join("overwrites")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.prefix.join("config")
    }

    pub fn config_path(&self, file: &str) -> PathBuf {
        self.config_dir().join(file)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.prefix.join("state")
    }

    pub fn ledger_store_path(&self) -> PathBuf {
        self.state_dir().join("ledger.json")
    }

    pub fn plugins_state_path(&self) -> PathBuf {
        self.state_dir().join("plugins.txt")
    }

    pub fn live_data_path(&self, rel: &str) -> PathBuf {
        self.data_dir().join(rel)
    }

    /// Side location for a payload shadowed by `shadowing_owner`: the
    /// overwrite root, the resource's directory, and an owner-tagged file
    /// name, so the archive can be promoted if that owner is uninstalled.
    pub fn side_archive_path(&self, rel: &str, shadowing_owner: &str) -> PathBuf {
        let rel_path = Path::new(rel);
        let file_name = rel_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| rel.to_string());
        let mut path = self.overwrite_dir();
        if let Some(parent) = rel_path.parent() {
            path.push(parent);
        }
        path.join(format!("{shadowing_owner}_{file_name}"))
    }

    /// Existing config files, sorted; the session snapshots all of them.
    pub fn config_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.config_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read config directory: {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.data_dir(),
            self.overwrite_dir(),
            self.config_dir(),
            self.state_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
