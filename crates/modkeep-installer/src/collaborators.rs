use anyhow::Result;

use modkeep_core::Package;

use crate::layout::GameLayout;
use crate::writers::ResourceWriters;

/// Executes a package's install procedure, issuing writes through the
/// session's resource writers. Returns `false` when the procedure declines
/// to install (user cancel); that is not an error.
pub trait InstallRunner {
    fn run_custom(&mut self, package: &Package, writers: &mut ResourceWriters<'_>)
        -> Result<bool>;
    fn run_basic(
        &mut self,
        package: &Package,
        label: &str,
        writers: &mut ResourceWriters<'_>,
    ) -> Result<bool>;
}

/// Default (non-upgrade) install policy consulted when the requesting
/// package holds no prior claim on a resource. May prompt the user;
/// `Ok(false)` means the overwrite was declined and nothing is written.
pub trait OverwritePolicy {
    fn confirm_data_file(&mut self, rel_path: &str, exists: bool) -> Result<bool>;
    fn confirm_config_entry(&mut self, file: &str, section: &str, key: &str) -> Result<bool>;
    fn confirm_shader_edit(&mut self, package: &str, shader: &str) -> Result<bool>;
}

/// Result of one shader-archive edit. `applied == false` means the codec
/// refused the edit, which is fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderEdit {
    pub applied: bool,
    pub old_bytes: Option<Vec<u8>>,
}

/// The physical shader-archive codec. Keeps its own `old_bytes` backup for
/// later undo; this core only tracks membership.
pub trait ShaderCodec {
    fn apply_edit(&mut self, package: &str, shader: &str, bytes: &[u8]) -> Result<ShaderEdit>;
}

/// Undo operations invoked by reconciliation for resources a superseded
/// version touched that the new version no longer produces. The ledger
/// claim is already removed when these run; the collaborator restores the
/// next-lower owner's archived value or deletes the resource outright.
pub trait UndoOps {
    fn uninstall_data_file(&mut self, layout: &GameLayout, rel_path: &str) -> Result<()>;
    fn un_edit_config(
        &mut self,
        layout: &GameLayout,
        file: &str,
        section: &str,
        key: &str,
    ) -> Result<()>;
    fn un_edit_shader(&mut self, package: &str, shader: &str) -> Result<()>;
}

/// Writes the plugin-activation list after a successful install run.
pub trait PluginActivator {
    fn commit_active_plugins(&mut self, layout: &GameLayout) -> Result<()>;
}
