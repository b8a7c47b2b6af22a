use anyhow::{Context, Result};
use semver::Version;

use modkeep_core::{ChangeRecord, Package};
use modkeep_ledger::{render_ledger, InstallLedger};

use crate::collaborators::{
    InstallRunner, OverwritePolicy, PluginActivator, ShaderCodec, UndoOps,
};
use crate::layout::GameLayout;
use crate::reconcile::{reconcile, ReconcileReport, UndoFailure};
use crate::transaction::FileTransaction;
use crate::writers::ResourceWriters;

/// Upgrade session state machine: `Idle -> Running -> {Committed, RolledBack}`.
/// `Idle` is also the terminal state of the no-op short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Committed,
    RolledBack,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        }
    }
}

/// The external collaborators one session requires, injected so the core
/// owns no UI, script engine, or codec.
pub struct SessionCollaborators<'a> {
    pub runner: &'a mut dyn InstallRunner,
    pub policy: &'a mut dyn OverwritePolicy,
    pub codec: &'a mut dyn ShaderCodec,
    pub undo: &'a mut dyn UndoOps,
    pub plugins: &'a mut dyn PluginActivator,
}

#[derive(Debug)]
pub struct UpgradeReport {
    pub base_name: String,
    pub version: Version,
    pub state: SessionState,
    pub success: bool,
    pub wrote_changes: bool,
    pub undo_failures: Vec<UndoFailure>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Uninstalled,
}

#[derive(Debug)]
pub struct UninstallReport {
    pub base_name: String,
    pub version: Option<Version>,
    pub status: UninstallStatus,
    pub undo_failures: Vec<UndoFailure>,
    pub message: String,
}

enum StepOutcome {
    Declined,
    Committed {
        record: ChangeRecord,
        reconciled: ReconcileReport,
    },
}

/// Runs one in-place upgrade as a single atomic session.
///
/// The whole operation is guarded: global config/state files and the ledger
/// store are snapshotted up front, the install procedure runs against fresh
/// resource writers, the fresh change record is reconciled against the
/// previous version's record, ownership is merged, and the transaction
/// commits. Any failure rolls everything back (in-memory ledger included)
/// and the original error is re-raised carrying the rollback disposition.
///
/// At most one session may run against a given ledger; callers serialize.
pub fn run_upgrade(
    layout: &GameLayout,
    ledger: &mut InstallLedger,
    collaborators: &mut SessionCollaborators<'_>,
    package: &Package,
) -> Result<UpgradeReport> {
    if ledger.installed_version(&package.base_name) == Some(&package.version) {
        return Ok(UpgradeReport {
            base_name: package.base_name.clone(),
            version: package.version.clone(),
            state: SessionState::Idle,
            success: true,
            wrote_changes: false,
            undo_failures: Vec::new(),
            message: format!(
                "'{}' is already at version {}; nothing to do",
                package.base_name, package.version
            ),
        });
    }

    let ledger_before = ledger.clone();
    let mut txn = FileTransaction::new();

    match upgrade_steps(layout, ledger, collaborators, package, &mut txn) {
        Ok(StepOutcome::Committed { record, reconciled }) => Ok(UpgradeReport {
            base_name: package.base_name.clone(),
            version: package.version.clone(),
            state: SessionState::Committed,
            success: true,
            wrote_changes: !record.is_empty(),
            message: if reconciled.failures.is_empty() {
                format!(
                    "upgraded '{}' to version {}",
                    package.base_name, package.version
                )
            } else {
                format!(
                    "upgraded '{}' to version {}; {} undo operation(s) failed during reconciliation",
                    package.base_name,
                    package.version,
                    reconciled.failures.len()
                )
            },
            undo_failures: reconciled.failures,
        }),
        Ok(StepOutcome::Declined) => {
            *ledger = ledger_before;
            txn.rollback().context("rollback after declined install")?;
            Ok(UpgradeReport {
                base_name: package.base_name.clone(),
                version: package.version.clone(),
                state: SessionState::RolledBack,
                success: false,
                wrote_changes: false,
                undo_failures: Vec::new(),
                message: format!(
                    "install procedure for '{}' declined; prior state restored",
                    package.base_name
                ),
            })
        }
        Err(err) => {
            *ledger = ledger_before;
            match txn.rollback() {
                Ok(()) => Err(err.context(format!(
                    "upgrade of '{}' failed; prior state restored",
                    package.base_name
                ))),
                Err(rollback_err) => Err(err.context(format!(
                    "upgrade of '{}' failed and rollback was incomplete: {rollback_err:#}",
                    package.base_name
                ))),
            }
        }
    }
}

fn upgrade_steps(
    layout: &GameLayout,
    ledger: &mut InstallLedger,
    collaborators: &mut SessionCollaborators<'_>,
    package: &Package,
    txn: &mut FileTransaction,
) -> Result<StepOutcome> {
    snapshot_session_state(txn, layout)?;

    let mut writers = ResourceWriters::new(
        layout,
        ledger,
        txn,
        collaborators.policy,
        collaborators.codec,
        &package.base_name,
    );
    let ran = if package.has_install_procedure {
        collaborators.runner.run_custom(package, &mut writers)?
    } else {
        collaborators
            .runner
            .run_basic(package, &package.base_name, &mut writers)?
    };
    if !ran {
        return Ok(StepOutcome::Declined);
    }
    let record = writers.into_change_record();

    let previous = ledger
        .historical_change_record(&package.base_name)
        .cloned()
        .unwrap_or_default();
    snapshot_stale_data_files(txn, layout, &previous, &record)?;
    let reconciled = reconcile(
        ledger,
        layout,
        collaborators.undo,
        &package.base_name,
        &previous,
        &record,
    );

    ledger.merge_upgrade(package, record.clone());
    collaborators.plugins.commit_active_plugins(layout)?;

    let rendered = render_ledger(ledger)?;
    txn.write(&layout.ledger_store_path(), rendered.as_bytes())?;
    txn.commit()?;

    Ok(StepOutcome::Committed { record, reconciled })
}

/// Removes an installed package: every resource its last change record
/// touched is reconciled away (claims dropped, undo collaborators invoked)
/// and its history leaves the ledger, all under one transaction.
pub fn run_uninstall(
    layout: &GameLayout,
    ledger: &mut InstallLedger,
    undo: &mut dyn UndoOps,
    base_name: &str,
) -> Result<UninstallReport> {
    let Some(previous) = ledger.historical_change_record(base_name).cloned() else {
        return Ok(UninstallReport {
            base_name: base_name.to_string(),
            version: None,
            status: UninstallStatus::NotInstalled,
            undo_failures: Vec::new(),
            message: format!("'{base_name}' is not installed"),
        });
    };
    let version = ledger.installed_version(base_name).cloned();

    let ledger_before = ledger.clone();
    let mut txn = FileTransaction::new();

    let steps = uninstall_steps(layout, ledger, undo, base_name, &previous, &mut txn);
    match steps {
        Ok(reconciled) => Ok(UninstallReport {
            base_name: base_name.to_string(),
            version,
            status: UninstallStatus::Uninstalled,
            message: if reconciled.failures.is_empty() {
                format!("uninstalled '{base_name}'")
            } else {
                format!(
                    "uninstalled '{base_name}'; {} undo operation(s) failed",
                    reconciled.failures.len()
                )
            },
            undo_failures: reconciled.failures,
        }),
        Err(err) => {
            *ledger = ledger_before;
            match txn.rollback() {
                Ok(()) => Err(err.context(format!(
                    "uninstall of '{base_name}' failed; prior state restored"
                ))),
                Err(rollback_err) => Err(err.context(format!(
                    "uninstall of '{base_name}' failed and rollback was incomplete: {rollback_err:#}"
                ))),
            }
        }
    }
}

fn uninstall_steps(
    layout: &GameLayout,
    ledger: &mut InstallLedger,
    undo: &mut dyn UndoOps,
    base_name: &str,
    previous: &ChangeRecord,
    txn: &mut FileTransaction,
) -> Result<ReconcileReport> {
    snapshot_session_state(txn, layout)?;
    snapshot_stale_data_files(txn, layout, previous, &ChangeRecord::new())?;

    let reconciled = reconcile(
        ledger,
        layout,
        undo,
        base_name,
        previous,
        &ChangeRecord::new(),
    );
    ledger.remove_package(base_name);

    let rendered = render_ledger(ledger)?;
    txn.write(&layout.ledger_store_path(), rendered.as_bytes())?;
    txn.commit()?;

    Ok(reconciled)
}

/// The fixed snapshot set any session may touch: the ledger store, the
/// plugin-activation state, and every tracked config file.
fn snapshot_session_state(txn: &mut FileTransaction, layout: &GameLayout) -> Result<()> {
    txn.snapshot(&layout.ledger_store_path())?;
    txn.snapshot(&layout.plugins_state_path())?;
    for config_file in layout.config_files()? {
        txn.snapshot(&config_file)?;
    }
    Ok(())
}

/// Reconciliation hands stale data files to the undo collaborator, which may
/// delete them outright. Their live paths are snapshotted first so a failure
/// later in the session restores them too.
fn snapshot_stale_data_files(
    txn: &mut FileTransaction,
    layout: &GameLayout,
    previous: &ChangeRecord,
    current: &ChangeRecord,
) -> Result<()> {
    for rel_path in &previous.difference(current).data_files {
        txn.snapshot(&layout.live_data_path(rel_path))?;
    }
    Ok(())
}
