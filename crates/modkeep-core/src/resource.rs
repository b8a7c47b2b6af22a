use std::path::{Component, Path};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Identity of one mutable resource a package can claim.
///
/// Identities are normalized on construction: path separators fold to `/`
/// and all components fold to ASCII lowercase (config files on the target
/// platforms are case-insensitive; a simple ASCII fold is applied on every
/// platform rather than locale-sensitive casing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    DataFile(String),
    ConfigEntry {
        file: String,
        section: String,
        key: String,
    },
    ShaderEntry {
        package: String,
        shader: String,
    },
}

impl ResourceId {
    pub fn data_file(path: &str) -> Self {
        Self::DataFile(normalize_data_path(path))
    }

    pub fn config_entry(file: &str, section: &str, key: &str) -> Self {
        Self::ConfigEntry {
            file: normalize_token(file),
            section: normalize_token(section),
            key: normalize_token(key),
        }
    }

    pub fn shader_entry(package: &str, shader: &str) -> Self {
        Self::ShaderEntry {
            package: normalize_token(package),
            shader: normalize_token(shader),
        }
    }

    /// Stable string form used as the persisted store key.
    pub fn as_key(&self) -> String {
        match self {
            Self::DataFile(path) => format!("data:{path}"),
            Self::ConfigEntry { file, section, key } => {
                format!("config:{file}|{section}|{key}")
            }
            Self::ShaderEntry { package, shader } => format!("shader:{package}|{shader}"),
        }
    }

    pub fn parse_key(input: &str) -> Result<Self> {
        let (kind, payload) = input
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid resource key: {input}"))?;
        match kind {
            "data" => {
                if payload.is_empty() {
                    return Err(anyhow!("empty data file resource key"));
                }
                Ok(Self::DataFile(payload.to_string()))
            }
            "config" => {
                let mut parts = payload.splitn(3, '|');
                let file = parts.next().unwrap_or_default();
                let section = parts.next().unwrap_or_default();
                let key = parts
                    .next()
                    .ok_or_else(|| anyhow!("invalid config resource key: {input}"))?;
                Ok(Self::ConfigEntry {
                    file: file.to_string(),
                    section: section.to_string(),
                    key: key.to_string(),
                })
            }
            "shader" => {
                let (package, shader) = payload
                    .split_once('|')
                    .ok_or_else(|| anyhow!("invalid shader resource key: {input}"))?;
                Ok(Self::ShaderEntry {
                    package: package.to_string(),
                    shader: shader.to_string(),
                })
            }
            _ => Err(anyhow!("unknown resource key kind: {input}")),
        }
    }
}

/// Rejects data-file targets that could escape the data root.
pub fn validate_data_path(path: &str) -> Result<()> {
    let rel = Path::new(path);
    if rel.as_os_str().is_empty() {
        return Err(anyhow!("data file path must not be empty"));
    }
    if rel.is_absolute() || path.starts_with('\\') {
        return Err(anyhow!("data file path must be relative: {path}"));
    }
    if rel
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(anyhow!("data file path must not include '..': {path}"));
    }
    if path.split(['/', '\\']).any(|part| part == "..") {
        return Err(anyhow!("data file path must not include '..': {path}"));
    }
    Ok(())
}

/// Normal form of a game-data-relative path: trimmed, ASCII-lowercased,
/// separators folded to `/`, no leading separator. `ResourceId::data_file`
/// applies this before storage.
pub fn normalize_data_path(path: &str) -> String {
    let folded = normalize_token(path).replace('\\', "/");
    folded.trim_start_matches('/').to_string()
}

/// Normal form of a config/shader identity component: trimmed and
/// ASCII-lowercased (simple fold on every platform).
pub fn normalize_token(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
