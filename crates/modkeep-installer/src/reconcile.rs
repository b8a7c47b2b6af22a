use modkeep_core::{ChangeRecord, ResourceId};
use modkeep_ledger::InstallLedger;

use crate::collaborators::UndoOps;
use crate::layout::GameLayout;

/// One undo operation that failed during reconciliation. Surfaced in the
/// session report; never aborts the remaining reconciliation work.
#[derive(Debug)]
pub struct UndoFailure {
    pub resource: ResourceId,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub undone: Vec<ResourceId>,
    pub failures: Vec<UndoFailure>,
}

impl ReconcileReport {
    pub fn undo_calls(&self) -> usize {
        self.undone.len() + self.failures.len()
    }
}

/// Undoes every resource the previous change record touched that the
/// current one no longer does: the stale ledger claim is removed first,
/// then the matching undo collaborator restores or deletes the physical
/// value. Runs to completion across all three kinds even when individual
/// undo calls fail. Must run before the ledger merge, or the merge would
/// persist claims pointing at unreconciled data.
pub fn reconcile(
    ledger: &mut InstallLedger,
    layout: &GameLayout,
    undo: &mut dyn UndoOps,
    base_name: &str,
    previous: &ChangeRecord,
    current: &ChangeRecord,
) -> ReconcileReport {
    let diff = previous.difference(current);
    let mut report = ReconcileReport::default();

    for rel_path in &diff.data_files {
        let id = ResourceId::DataFile(rel_path.clone());
        ledger.remove_claim(&id, base_name);
        match undo.uninstall_data_file(layout, rel_path) {
            Ok(()) => report.undone.push(id),
            Err(error) => report.failures.push(UndoFailure {
                resource: id,
                error,
            }),
        }
    }

    for entry in &diff.config_edits {
        let id = entry.resource_id();
        ledger.remove_claim(&id, base_name);
        match undo.un_edit_config(layout, &entry.file, &entry.section, &entry.key) {
            Ok(()) => report.undone.push(id),
            Err(error) => report.failures.push(UndoFailure {
                resource: id,
                error,
            }),
        }
    }

    for entry in &diff.shader_edits {
        let id = entry.resource_id();
        ledger.remove_claim(&id, base_name);
        match undo.un_edit_shader(&entry.package, &entry.shader) {
            Ok(()) => report.undone.push(id),
            Err(error) => report.failures.push(UndoFailure {
                resource: id,
                error,
            }),
        }
    }

    report
}
