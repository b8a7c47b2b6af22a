use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ResourceId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    pub file: String,
    pub section: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderKey {
    pub package: String,
    pub shader: String,
}

/// Everything one install/upgrade session touched, by identity only.
/// Values are not tracked here; the ledger's claim order decides which
/// payload is live.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRecord {
    #[serde(default)]
    pub data_files: BTreeSet<String>,
    #[serde(default)]
    pub config_edits: BTreeSet<ConfigKey>,
    #[serde(default)]
    pub shader_edits: BTreeSet<ShaderKey>,
}

/// Per-kind set difference between two change records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDiff {
    pub data_files: BTreeSet<String>,
    pub config_edits: BTreeSet<ConfigKey>,
    pub shader_edits: BTreeSet<ShaderKey>,
}

impl ChangeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &ResourceId) {
        match id {
            ResourceId::DataFile(path) => {
                self.data_files.insert(path.clone());
            }
            ResourceId::ConfigEntry { file, section, key } => {
                self.config_edits.insert(ConfigKey {
                    file: file.clone(),
                    section: section.clone(),
                    key: key.clone(),
                });
            }
            ResourceId::ShaderEntry { package, shader } => {
                self.shader_edits.insert(ShaderKey {
                    package: package.clone(),
                    shader: shader.clone(),
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_files.is_empty() && self.config_edits.is_empty() && self.shader_edits.is_empty()
    }

    /// Resources in `self` that `current` no longer touches.
    pub fn difference(&self, current: &Self) -> RecordDiff {
        RecordDiff {
            data_files: self
                .data_files
                .difference(&current.data_files)
                .cloned()
                .collect(),
            config_edits: self
                .config_edits
                .difference(&current.config_edits)
                .cloned()
                .collect(),
            shader_edits: self
                .shader_edits
                .difference(&current.shader_edits)
                .cloned()
                .collect(),
        }
    }

    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids = Vec::new();
        for path in &self.data_files {
            ids.push(ResourceId::DataFile(path.clone()));
        }
        for entry in &self.config_edits {
            ids.push(ResourceId::ConfigEntry {
                file: entry.file.clone(),
                section: entry.section.clone(),
                key: entry.key.clone(),
            });
        }
        for entry in &self.shader_edits {
            ids.push(ResourceId::ShaderEntry {
                package: entry.package.clone(),
                shader: entry.shader.clone(),
            });
        }
        ids
    }
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.data_files.is_empty() && self.config_edits.is_empty() && self.shader_edits.is_empty()
    }
}

impl ConfigKey {
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::ConfigEntry {
            file: self.file.clone(),
            section: self.section.clone(),
            key: self.key.clone(),
        }
    }
}

impl ShaderKey {
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::ShaderEntry {
            package: self.package.clone(),
            shader: self.shader.clone(),
        }
    }
}
