mod store;

use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use modkeep_core::{ChangeRecord, Package, ResourceId};

pub use store::{load_ledger, render_ledger, LEDGER_STORE_VERSION};

/// Stored state for one installed package: the version last committed and
/// the change record of that install/upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageHistory {
    pub version: Version,
    pub record: ChangeRecord,
}

/// The persistent resource-ownership record.
///
/// Each claimed resource maps to its claim order: oldest claim first, the
/// last entry is the top owner whose payload is live. A base name appears
/// at most once per entry. The ledger is an explicit injected store; it is
/// loaded once at startup and flushed through the session's transaction on
/// every successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallLedger {
    owners: BTreeMap<String, Vec<String>>,
    packages: BTreeMap<String, PackageHistory>,
}

impl InstallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim order for a resource, oldest first. Empty if never claimed.
    pub fn owners(&self, id: &ResourceId) -> &[String] {
        self.owners
            .get(&id.as_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The owner whose payload is live, if any.
    pub fn top_owner(&self, id: &ResourceId) -> Option<&str> {
        self.owners(id).last().map(String::as_str)
    }

    /// Appends `base_name` if absent, else moves it to the end. Repeated
    /// calls from the top owner are no-ops.
    pub fn record_claim(&mut self, id: &ResourceId, base_name: &str) {
        let claims = self.owners.entry(id.as_key()).or_default();
        if let Some(position) = claims.iter().position(|claim| claim == base_name) {
            if position + 1 == claims.len() {
                return;
            }
            claims.remove(position);
        }
        claims.push(base_name.to_string());
    }

    /// Removes a claim; drops the whole entry when the last claim goes.
    /// Returns whether anything was removed.
    pub fn remove_claim(&mut self, id: &ResourceId, base_name: &str) -> bool {
        let key = id.as_key();
        let Some(claims) = self.owners.get_mut(&key) else {
            return false;
        };
        let Some(position) = claims.iter().position(|claim| claim == base_name) else {
            return false;
        };
        claims.remove(position);
        if claims.is_empty() {
            self.owners.remove(&key);
        }
        true
    }

    pub fn historical_change_record(&self, base_name: &str) -> Option<&ChangeRecord> {
        self.packages.get(base_name).map(|history| &history.record)
    }

    pub fn installed_version(&self, base_name: &str) -> Option<&Version> {
        self.packages.get(base_name).map(|history| &history.version)
    }

    /// Replaces the stored history for the package and makes sure every
    /// resource in the new record carries a claim for it. Claims already
    /// present keep their rank; an upgrade never reorders other packages.
    ///
    /// Stale claims from the superseded record must already have been
    /// removed by reconciliation before this is called.
    pub fn merge_upgrade(&mut self, package: &Package, record: ChangeRecord) {
        for id in record.resource_ids() {
            let claims = self.owners.entry(id.as_key()).or_default();
            if !claims.iter().any(|claim| claim == &package.base_name) {
                claims.push(package.base_name.clone());
            }
        }
        self.packages.insert(
            package.base_name.clone(),
            PackageHistory {
                version: package.version.clone(),
                record,
            },
        );
    }

    /// Drops a package's history and every claim it holds.
    pub fn remove_package(&mut self, base_name: &str) -> Option<PackageHistory> {
        let history = self.packages.remove(base_name)?;
        for id in history.record.resource_ids() {
            self.remove_claim(&id, base_name);
        }
        Some(history)
    }

    pub fn installed_packages(&self) -> impl Iterator<Item = (&str, &PackageHistory)> {
        self.packages
            .iter()
            .map(|(name, history)| (name.as_str(), history))
    }

    fn owner_entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.owners
    }

    fn package_entries(&self) -> &BTreeMap<String, PackageHistory> {
        &self.packages
    }

    fn from_parts(
        owners: BTreeMap<String, Vec<String>>,
        packages: BTreeMap<String, PackageHistory>,
    ) -> Self {
        Self { owners, packages }
    }
}

#[cfg(test)]
mod tests;
