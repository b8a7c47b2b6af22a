use std::fs;
use std::path::PathBuf;

use semver::Version;

use modkeep_core::{ChangeRecord, Package, ResourceId};

use crate::{load_ledger, render_ledger, InstallLedger};

fn test_store_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "modkeep-ledger-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path.join("ledger.json")
}

fn version(input: &str) -> Version {
    Version::parse(input).expect("must parse version")
}

#[test]
fn claims_never_duplicate_and_reclaim_moves_to_end() {
    let mut ledger = InstallLedger::new();
    let file1 = ResourceId::data_file("file1.esp");

    ledger.record_claim(&file1, "foo");
    ledger.record_claim(&file1, "bar");
    assert_eq!(ledger.owners(&file1), ["foo", "bar"]);
    assert_eq!(ledger.top_owner(&file1), Some("bar"));

    ledger.record_claim(&file1, "foo");
    assert_eq!(ledger.owners(&file1), ["bar", "foo"]);

    ledger.record_claim(&file1, "foo");
    ledger.record_claim(&file1, "foo");
    assert_eq!(ledger.owners(&file1), ["bar", "foo"]);
}

#[test]
fn owners_empty_when_never_claimed() {
    let ledger = InstallLedger::new();
    assert!(ledger.owners(&ResourceId::data_file("missing.nif")).is_empty());
    assert!(ledger.top_owner(&ResourceId::data_file("missing.nif")).is_none());
}

#[test]
fn remove_claim_drops_empty_entries() {
    let mut ledger = InstallLedger::new();
    let id = ResourceId::config_entry("game.ini", "display", "isize");

    ledger.record_claim(&id, "foo");
    assert!(ledger.remove_claim(&id, "foo"));
    assert!(ledger.owners(&id).is_empty());
    assert!(!ledger.remove_claim(&id, "foo"));
}

#[test]
fn merge_upgrade_preserves_existing_rank() {
    let mut ledger = InstallLedger::new();
    let file1 = ResourceId::data_file("file1.esp");
    ledger.record_claim(&file1, "foo");
    ledger.record_claim(&file1, "bar");

    let mut record = ChangeRecord::new();
    record.record(&file1);
    record.record(&ResourceId::data_file("file2.esp"));
    let package = Package::new("foo", version("2.0.0"), true);
    ledger.merge_upgrade(&package, record.clone());

    // foo already held rank 0 on file1; merge must not move it.
    assert_eq!(ledger.owners(&file1), ["foo", "bar"]);
    assert_eq!(ledger.owners(&ResourceId::data_file("file2.esp")), ["foo"]);
    assert_eq!(ledger.installed_version("foo"), Some(&version("2.0.0")));
    assert_eq!(ledger.historical_change_record("foo"), Some(&record));
}

#[test]
fn merge_upgrade_replaces_historical_record() {
    let mut ledger = InstallLedger::new();
    let package_v1 = Package::new("foo", version("1.0.0"), true);
    let mut record_v1 = ChangeRecord::new();
    record_v1.record(&ResourceId::data_file("old.nif"));
    ledger.merge_upgrade(&package_v1, record_v1);

    let package_v2 = Package::new("foo", version("2.0.0"), true);
    let mut record_v2 = ChangeRecord::new();
    record_v2.record(&ResourceId::data_file("new.nif"));
    ledger.merge_upgrade(&package_v2, record_v2.clone());

    assert_eq!(ledger.historical_change_record("foo"), Some(&record_v2));
    assert_eq!(ledger.installed_version("foo"), Some(&version("2.0.0")));
}

#[test]
fn remove_package_drops_history_and_claims() {
    let mut ledger = InstallLedger::new();
    let file1 = ResourceId::data_file("file1.esp");
    let mut record = ChangeRecord::new();
    record.record(&file1);
    ledger.record_claim(&file1, "foo");
    ledger.record_claim(&file1, "bar");
    ledger.merge_upgrade(&Package::new("foo", version("1.0.0"), false), record);

    let removed = ledger.remove_package("foo").expect("must remove");
    assert_eq!(removed.version, version("1.0.0"));
    assert_eq!(ledger.owners(&file1), ["bar"]);
    assert!(ledger.historical_change_record("foo").is_none());
    assert!(ledger.remove_package("foo").is_none());
}

#[test]
fn installed_packages_lists_history_in_name_order() {
    let mut ledger = InstallLedger::new();
    ledger.merge_upgrade(&Package::new("zeta", version("1.0.0"), false), ChangeRecord::new());
    ledger.merge_upgrade(&Package::new("alpha", version("2.0.0"), true), ChangeRecord::new());

    let names: Vec<&str> = ledger.installed_packages().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn store_round_trip() {
    let path = test_store_path();

    let mut ledger = InstallLedger::new();
    let file1 = ResourceId::data_file("file1.esp");
    ledger.record_claim(&file1, "foo");
    ledger.record_claim(&file1, "bar");
    let mut record = ChangeRecord::new();
    record.record(&file1);
    record.record(&ResourceId::config_entry("game.ini", "display", "isize"));
    record.record(&ResourceId::shader_entry("shaderpackage013", "water"));
    ledger.merge_upgrade(&Package::new("foo", version("1.2.3"), true), record);

    let rendered = render_ledger(&ledger).expect("must render ledger");
    fs::write(&path, &rendered).expect("must write ledger store");

    let loaded = load_ledger(&path).expect("must load ledger");
    assert_eq!(loaded, ledger);

    let _ = fs::remove_dir_all(path.parent().expect("store has parent"));
}

#[test]
fn load_missing_store_is_empty_ledger() {
    let path = test_store_path();
    let missing = path.with_file_name("absent.json");

    let ledger = load_ledger(&missing).expect("must load empty ledger");
    assert_eq!(ledger, InstallLedger::new());

    let _ = fs::remove_dir_all(path.parent().expect("store has parent"));
}

#[test]
fn load_rejects_unknown_store_version() {
    let path = test_store_path();
    fs::write(&path, "{\"version\": 99, \"owners\": [], \"packages\": {}}")
        .expect("must write store");

    let err = load_ledger(&path).expect_err("must reject version");
    assert!(err.to_string().contains("unsupported ledger store version"));

    let _ = fs::remove_dir_all(path.parent().expect("store has parent"));
}

#[test]
fn load_rejects_malformed_resource_keys() {
    let path = test_store_path();
    fs::write(
        &path,
        "{\"version\": 1, \"owners\": [{\"resource\": \"bogus-key\", \"claims\": [\"foo\"]}], \"packages\": {}}",
    )
    .expect("must write store");

    let err = load_ledger(&path).expect_err("must reject malformed key");
    assert!(format!("{err:#}").contains("invalid ledger store entry"));

    let _ = fs::remove_dir_all(path.parent().expect("store has parent"));
}
