use crate::{normalize_data_path, normalize_token, validate_data_path, ChangeRecord, ResourceId};

#[test]
fn data_file_identity_normalizes_separators_and_case() {
    let id = ResourceId::data_file("Textures\\Armor\\Iron.DDS");
    assert_eq!(id, ResourceId::DataFile("textures/armor/iron.dds".to_string()));
    assert_eq!(id, ResourceId::data_file("textures/armor/iron.dds"));
}

#[test]
fn constructors_agree_with_standalone_normalizers() {
    assert_eq!(
        ResourceId::data_file(" \\Meshes\\Chair.NIF "),
        ResourceId::DataFile(normalize_data_path(" \\Meshes\\Chair.NIF "))
    );
    assert_eq!(normalize_data_path(" \\Meshes\\Chair.NIF "), "meshes/chair.nif");
    assert_eq!(
        ResourceId::config_entry("Game.ini", " Display ", "iSize"),
        ResourceId::ConfigEntry {
            file: normalize_token("Game.ini"),
            section: normalize_token(" Display "),
            key: normalize_token("iSize"),
        }
    );
    assert_eq!(normalize_token(" Display "), "display");
}

#[test]
fn config_identity_folds_case() {
    let id = ResourceId::config_entry("Game.ini", "Display", "iSize");
    assert_eq!(id, ResourceId::config_entry("GAME.INI", "display", "isize"));
}

#[test]
fn resource_key_round_trip() {
    let ids = [
        ResourceId::data_file("meshes/chair.nif"),
        ResourceId::config_entry("game.ini", "display", "isize"),
        ResourceId::shader_entry("shaderpackage013", "water"),
    ];
    for id in ids {
        let key = id.as_key();
        let parsed = ResourceId::parse_key(&key).expect("must parse key");
        assert_eq!(parsed, id);
    }
}

#[test]
fn parse_key_rejects_malformed_input() {
    assert!(ResourceId::parse_key("no-kind-separator").is_err());
    assert!(ResourceId::parse_key("bogus:whatever").is_err());
    assert!(ResourceId::parse_key("config:game.ini|display").is_err());
    assert!(ResourceId::parse_key("shader:no-separator").is_err());
    assert!(ResourceId::parse_key("data:").is_err());
}

#[test]
fn validate_data_path_rejects_traversal_and_absolute() {
    assert!(validate_data_path("meshes/chair.nif").is_ok());
    assert!(validate_data_path("").is_err());
    assert!(validate_data_path("/etc/passwd").is_err());
    assert!(validate_data_path("..\\..\\boot.ini").is_err());
    assert!(validate_data_path("meshes/../../../secret").is_err());
}

#[test]
fn change_record_difference_is_per_kind() {
    let mut previous = ChangeRecord::new();
    previous.record(&ResourceId::data_file("a.nif"));
    previous.record(&ResourceId::data_file("b.nif"));
    previous.record(&ResourceId::config_entry("game.ini", "display", "isize"));
    previous.record(&ResourceId::shader_entry("pkg", "water"));

    let mut current = ChangeRecord::new();
    current.record(&ResourceId::data_file("b.nif"));
    current.record(&ResourceId::shader_entry("pkg", "water"));

    let diff = previous.difference(&current);
    assert_eq!(
        diff.data_files.iter().cloned().collect::<Vec<_>>(),
        vec!["a.nif".to_string()]
    );
    assert_eq!(diff.config_edits.len(), 1);
    assert!(diff.shader_edits.is_empty());

    let none = previous.difference(&previous);
    assert!(none.is_empty());
}

#[test]
fn change_record_membership_is_deduplicated() {
    let mut record = ChangeRecord::new();
    record.record(&ResourceId::data_file("Meshes\\Chair.nif"));
    record.record(&ResourceId::data_file("meshes/chair.nif"));
    assert_eq!(record.data_files.len(), 1);
    assert_eq!(record.resource_ids().len(), 1);
}
