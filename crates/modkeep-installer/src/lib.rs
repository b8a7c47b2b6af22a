mod collaborators;
mod config_edit;
mod layout;
mod reconcile;
mod session;
mod transaction;
mod writers;

pub use collaborators::{
    InstallRunner, OverwritePolicy, PluginActivator, ShaderCodec, ShaderEdit, UndoOps,
};
pub use config_edit::{read_config_value, set_config_value};
pub use layout::GameLayout;
pub use reconcile::{reconcile, ReconcileReport, UndoFailure};
pub use session::{
    run_uninstall, run_upgrade, SessionCollaborators, SessionState, UninstallReport,
    UninstallStatus, UpgradeReport,
};
pub use transaction::FileTransaction;
pub use writers::{ResourceWriters, WriteOutcome};
