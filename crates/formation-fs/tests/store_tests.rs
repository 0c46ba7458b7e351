use formation_fs::{DocumentStore, Error, Format};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct StateDoc {
    next_id: u64,
    names: Vec<String>,
}

#[test]
fn test_load_yaml_template() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("template.yaml");
    fs::write(
        &path,
        r#"
name: My Project
type: Project
children:
  - name: Data
    type: Folder
  - raw
"#,
    )
    .unwrap();

    let template: Value = DocumentStore::new().load_template(&path).unwrap();

    assert_eq!(
        template,
        json!({
            "name": "My Project",
            "type": "Project",
            "children": [{"name": "Data", "type": "Folder"}, "raw"]
        })
    );
}

#[test]
fn test_load_json_template_through_yaml_parser() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("template.json");
    fs::write(&path, r#"[{"name": "P", "type": "Project"}]"#).unwrap();

    let template: Value = DocumentStore::new().load_template(&path).unwrap();

    assert_eq!(template, json!([{"name": "P", "type": "Project"}]));
}

#[test]
fn test_load_template_with_unknown_extension_reads_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("template.formation");
    fs::write(&path, "- name: F\n").unwrap();

    let template: Value = DocumentStore::new().load_template(&path).unwrap();

    assert_eq!(template, json!([{"name": "F"}]));
}

#[test]
fn test_principal_ids_stay_numeric_in_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("acl.yml");
    fs::write(&path, "acl:\n  - principal_id: 3379097\n    access_type: [READ]\n").unwrap();

    let template: Value = DocumentStore::new().load_template(&path).unwrap();

    assert_eq!(template["acl"][0]["principal_id"], json!(3379097));
}

#[test]
fn test_save_and_load_each_format() {
    let temp = TempDir::new().unwrap();
    let store = DocumentStore::new();
    let doc = StateDoc {
        next_id: 4,
        names: vec!["P".into(), "F1".into()],
    };

    for file in ["state.json", "state.yaml", "state.toml"] {
        let path = temp.path().join(file);
        store.save(&path, &doc).unwrap();
        let loaded: StateDoc = store.load(&path).unwrap();
        assert_eq!(loaded, doc, "format of {}", file);
    }
}

#[test]
fn test_parse_error_names_format_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = DocumentStore::new()
        .load::<Value>(&path)
        .unwrap_err();

    match err {
        Error::Parse { format, path: p, .. } => {
            assert_eq!(format, "JSON");
            assert_eq!(p, path);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_save_unsupported_extension_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.bin");

    let err = DocumentStore::new().save(&path, &json!({})).unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { .. }));
    assert!(!path.exists());
}

#[test]
fn test_save_as_ignores_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("annotated.out");

    DocumentStore::new()
        .save_as(&path, Format::Json, &json!({"id": "syn1"}))
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"id\": \"syn1\""));
}
