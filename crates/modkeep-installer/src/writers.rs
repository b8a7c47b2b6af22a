use std::fs;
use std::io;

use anyhow::{anyhow, Context, Result};

use modkeep_core::{
    normalize_data_path, normalize_token, validate_data_path, ChangeRecord, ResourceId,
};
use modkeep_ledger::InstallLedger;

use crate::collaborators::{OverwritePolicy, ShaderCodec};
use crate::config_edit::set_config_value;
use crate::layout::GameLayout;
use crate::transaction::FileTransaction;

/// Outcome of one write request. `Declined` is the user refusing an
/// overwrite through the default policy; it is not an error and nothing is
/// recorded for the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Declined,
}

impl WriteOutcome {
    pub fn was_written(self) -> bool {
        self == Self::Written
    }
}

/// Where a write landed, decided from the requesting package's position in
/// the resource's claim order before the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// No prior claim: default install policy decides.
    NewClaim,
    /// Prior claim shadowed by a later owner: payload goes to the side
    /// archive, the live value is untouched.
    Shadowed,
    /// Top of the claim order: payload goes live.
    Top,
}

/// The per-kind resource writers handed to the install procedure. Every
/// successful write records the resource in the session change record and
/// re-asserts the package's claim in the ledger.
pub struct ResourceWriters<'a> {
    layout: &'a GameLayout,
    ledger: &'a mut InstallLedger,
    txn: &'a mut FileTransaction,
    policy: &'a mut dyn OverwritePolicy,
    codec: &'a mut dyn ShaderCodec,
    base_name: String,
    record: ChangeRecord,
}

impl<'a> ResourceWriters<'a> {
    pub fn new(
        layout: &'a GameLayout,
        ledger: &'a mut InstallLedger,
        txn: &'a mut FileTransaction,
        policy: &'a mut dyn OverwritePolicy,
        codec: &'a mut dyn ShaderCodec,
        base_name: &str,
    ) -> Self {
        Self {
            layout,
            ledger,
            txn,
            policy,
            codec,
            base_name: base_name.to_string(),
            record: ChangeRecord::new(),
        }
    }

    pub fn change_record(&self) -> &ChangeRecord {
        &self.record
    }

    pub fn into_change_record(self) -> ChangeRecord {
        self.record
    }

    pub fn write_data_file(&mut self, rel_path: &str, bytes: &[u8]) -> Result<WriteOutcome> {
        validate_data_path(rel_path)?;
        let rel = normalize_data_path(rel_path);
        let id = ResourceId::DataFile(rel.clone());

        match self.placement(&id) {
            Placement::NewClaim => {
                let live = self.layout.live_data_path(&rel);
                if !self.policy.confirm_data_file(&rel, live.exists())? {
                    return Ok(WriteOutcome::Declined);
                }
                self.txn.write(&live, bytes)?;
            }
            Placement::Shadowed => {
                let top = self
                    .ledger
                    .top_owner(&id)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("claimed resource has no top owner: {rel}"))?;
                let side = self.layout.side_archive_path(&rel, &top);
                self.txn.write(&side, bytes)?;
            }
            Placement::Top => {
                let live = self.layout.live_data_path(&rel);
                self.txn.write(&live, bytes)?;
            }
        }

        self.claim_and_record(&id);
        Ok(WriteOutcome::Written)
    }

    pub fn write_config_entry(
        &mut self,
        file: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<WriteOutcome> {
        validate_config_target(file, section, key)?;
        let file_norm = normalize_token(file);
        let section_norm = normalize_token(section);
        let key_norm = normalize_token(key);
        let id = ResourceId::ConfigEntry {
            file: file_norm.clone(),
            section: section_norm.clone(),
            key: key_norm.clone(),
        };

        match self.placement(&id) {
            Placement::NewClaim => {
                if !self
                    .policy
                    .confirm_config_entry(&file_norm, &section_norm, &key_norm)?
                {
                    return Ok(WriteOutcome::Declined);
                }
                self.apply_config_value(&file_norm, &section_norm, &key_norm, value)?;
            }
            Placement::Shadowed => {
                // Config files hold only the current top value; a shadowed
                // writer's contribution lives in the change record alone.
            }
            Placement::Top => {
                self.apply_config_value(&file_norm, &section_norm, &key_norm, value)?;
            }
        }

        self.claim_and_record(&id);
        Ok(WriteOutcome::Written)
    }

    pub fn write_shader_edit(
        &mut self,
        package: &str,
        shader: &str,
        bytes: &[u8],
    ) -> Result<WriteOutcome> {
        validate_shader_target(package, shader)?;
        let package_norm = normalize_token(package);
        let shader_norm = normalize_token(shader);
        let id = ResourceId::ShaderEntry {
            package: package_norm.clone(),
            shader: shader_norm.clone(),
        };

        match self.placement(&id) {
            Placement::NewClaim => {
                if !self.policy.confirm_shader_edit(&package_norm, &shader_norm)? {
                    return Ok(WriteOutcome::Declined);
                }
                self.apply_shader_edit(&package_norm, &shader_norm, bytes)?;
            }
            Placement::Shadowed => {
                // Shader archives hold only the top value; same membership
                // archive as config entries.
            }
            Placement::Top => {
                self.apply_shader_edit(&package_norm, &shader_norm, bytes)?;
            }
        }

        self.claim_and_record(&id);
        Ok(WriteOutcome::Written)
    }

    fn placement(&self, id: &ResourceId) -> Placement {
        let owners = self.ledger.owners(id);
        match owners.iter().position(|owner| owner == &self.base_name) {
            None => Placement::NewClaim,
            Some(position) if position + 1 == owners.len() => Placement::Top,
            Some(_) => Placement::Shadowed,
        }
    }

    fn claim_and_record(&mut self, id: &ResourceId) {
        self.ledger.record_claim(id, &self.base_name);
        self.record.record(id);
    }

    fn apply_config_value(
        &mut self,
        file: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let path = self.layout.config_path(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };
        let updated = set_config_value(&text, section, key, value);
        self.txn.write(&path, updated.as_bytes())
    }

    fn apply_shader_edit(&mut self, package: &str, shader: &str, bytes: &[u8]) -> Result<()> {
        let edit = self
            .codec
            .apply_edit(package, shader, bytes)
            .with_context(|| format!("shader edit failed: {package}/{shader}"))?;
        if !edit.applied {
            return Err(anyhow!("shader codec refused edit: {package}/{shader}"));
        }
        Ok(())
    }
}

fn validate_config_target(file: &str, section: &str, key: &str) -> Result<()> {
    validate_data_path(file).context("invalid config file target")?;
    if section.trim().is_empty() {
        return Err(anyhow!("config section must not be empty"));
    }
    if key.trim().is_empty() {
        return Err(anyhow!("config key must not be empty"));
    }
    Ok(())
}

fn validate_shader_target(package: &str, shader: &str) -> Result<()> {
    if package.trim().is_empty() {
        return Err(anyhow!("shader package must not be empty"));
    }
    if shader.trim().is_empty() {
        return Err(anyhow!("shader name must not be empty"));
    }
    Ok(())
}
