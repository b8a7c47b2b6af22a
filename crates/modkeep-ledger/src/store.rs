use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use modkeep_core::ResourceId;

use crate::{InstallLedger, PackageHistory};

pub const LEDGER_STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerStoreFile {
    version: u32,
    owners: Vec<OwnerEntry>,
    packages: BTreeMap<String, PackageHistory>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OwnerEntry {
    resource: String,
    claims: Vec<String>,
}

/// Loads the persisted ledger. A missing store file is an empty ledger.
pub fn load_ledger(path: &Path) -> Result<InstallLedger> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(InstallLedger::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read ledger store: {}", path.display()));
        }
    };

    let file: LedgerStoreFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse ledger store: {}", path.display()))?;
    if file.version != LEDGER_STORE_VERSION {
        return Err(anyhow!(
            "unsupported ledger store version {} in {}",
            file.version,
            path.display()
        ));
    }

    let mut owners = BTreeMap::new();
    for entry in file.owners {
        ResourceId::parse_key(&entry.resource)
            .with_context(|| format!("invalid ledger store entry in {}", path.display()))?;
        if entry.claims.is_empty() {
            continue;
        }
        owners.insert(entry.resource, entry.claims);
    }

    Ok(InstallLedger::from_parts(owners, file.packages))
}

/// Renders the ledger to its persisted form. The caller writes the result
/// through the session transaction so the flush is covered by rollback.
pub fn render_ledger(ledger: &InstallLedger) -> Result<String> {
    let file = LedgerStoreFile {
        version: LEDGER_STORE_VERSION,
        owners: ledger
            .owner_entries()
            .iter()
            .map(|(resource, claims)| OwnerEntry {
                resource: resource.clone(),
                claims: claims.clone(),
            })
            .collect(),
        packages: ledger.package_entries().clone(),
    };
    serde_json::to_string_pretty(&file).context("failed serializing ledger store")
}
