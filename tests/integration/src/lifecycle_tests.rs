//! Lifecycle Integration Tests
//!
//! Each test drives the whole stack the way the CLI does: templates and
//! platform state live in files, every run starts from what the previous
//! run persisted.

use formation_core::{
    AccessType, CreationPolicy, Entity, EntityKind, LocalPlatform, ResourceGateway,
    SettingsResolver, TemplateWalker,
};
use formation_fs::DocumentStore;
use formation_test_utils::{TestWorkspace, templates};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// =============================================================================
// Test Infrastructure
// =============================================================================

const STATE: &str = "platform.json";

/// One run: load template and state, walk, persist both.
fn apply(ws: &TestWorkspace, template: &str, output: &str, policy: CreationPolicy) -> formation_core::Result<usize> {
    let store = DocumentStore::new();
    let mut document: Value = store.load_template(&ws.path(template))?;
    let platform = LocalPlatform::open(&ws.path(STATE))?;

    let mut walker = TemplateWalker::new(ResourceGateway::new(platform, policy));
    let outcome = walker.build(&mut document);

    walker.into_gateway().into_transport().save(&ws.path(STATE))?;
    store.save(&ws.path(output), &document)?;
    outcome.map(|tree| tree.len())
}

// =============================================================================
// Annotated templates
// =============================================================================

#[test]
fn annotated_template_reapplies_without_new_resources() {
    let ws = TestWorkspace::new();
    ws.write("site.yaml", templates::CHALLENGE_SITE);

    apply(&ws, "site.yaml", "site.out.yaml", CreationPolicy::CreateOnly).unwrap();
    let first = ws.read_document("site.out.yaml");
    let resources = ws.load_state(STATE).records().len();

    // The annotated output is the input of the next run, still create-only
    apply(&ws, "site.out.yaml", "site.out.yaml", CreationPolicy::CreateOnly).unwrap();

    assert_eq!(ws.read_document("site.out.yaml"), first);
    assert_eq!(ws.load_state(STATE).records().len(), resources);
    assert_eq!(ws.load_state(STATE).challenges().len(), 1);
}

#[test]
fn growing_template_creates_only_new_nodes() {
    let ws = TestWorkspace::new();
    ws.write("site.yaml", templates::PROJECT_WITH_FOLDERS);
    apply(&ws, "site.yaml", "site.yaml", CreationPolicy::CreateOnly).unwrap();

    let mut document = ws.read_document("site.yaml");
    document["children"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "F3"}));
    DocumentStore::new()
        .save(&ws.path("site.yaml"), &document)
        .unwrap();

    apply(&ws, "site.yaml", "site.yaml", CreationPolicy::CreateOnly).unwrap();

    let annotated = ws.read_document("site.yaml");
    assert_eq!(annotated["children"][0]["id"], "syn2");
    assert_eq!(annotated["children"][2]["id"], "syn4");
    assert_eq!(ws.load_state(STATE).records().len(), 4);
}

#[test]
fn failed_run_keeps_ids_of_resolved_nodes() {
    let ws = TestWorkspace::new();
    ws.write(
        "site.yaml",
        "name: P\ntype: Project\nchildren:\n  - A\n  - name: V\n    type: View\n    include_entity_types: [spreadsheet]\n  - B\n",
    );

    let err = apply(&ws, "site.yaml", "site.out.json", CreationPolicy::CreateOnly).unwrap_err();

    assert_eq!(err.location(), Some("/children/1"));
    let partial = ws.read_document("site.out.json");
    assert_eq!(partial["id"], "syn1");
    assert_eq!(partial["children"][0]["id"], "syn2");
    assert_eq!(partial["children"][2], json!("B"));
    assert_eq!(ws.load_state(STATE).records().len(), 2);
}

// =============================================================================
// Persisted platform state
// =============================================================================

#[test]
fn state_survives_between_runs() {
    let ws = TestWorkspace::new();
    ws.write("site.yaml", templates::CHALLENGE_SITE);
    apply(&ws, "site.yaml", "site.out.yaml", CreationPolicy::CreateOnly).unwrap();

    let platform = ws.load_state(STATE);
    let annotated = ws.read_document("site.out.yaml");

    let project_id = annotated[2]["id"].as_str().unwrap();
    let acl = platform.acl_of(project_id).unwrap();
    assert_eq!(acl["273948"], vec![AccessType::Read]);

    let data_id = annotated[2]["children"][0]["id"].as_str().unwrap();
    let data_acl = platform.acl_of(data_id).unwrap();
    assert_eq!(data_acl["3324230"], vec![AccessType::Read, AccessType::Download]);

    let queue_id = annotated[2]["children"][4]["id"].as_str().unwrap();
    match &platform.record(queue_id).unwrap().entity {
        Entity::Evaluation(queue) => assert_eq!(queue.content_source, project_id),
        other => panic!("expected an evaluation queue, got {other:?}"),
    }

    assert_eq!(platform.invitations().len(), 1);
    assert_eq!(platform.invitations()[0].user.as_deref(), Some("1111"));
    assert!(platform.calls().is_empty());
}

#[test]
fn get_or_create_adopts_resources_created_elsewhere() {
    let ws = TestWorkspace::new();
    ws.write("first.yaml", "name: P\ntype: Project\nchildren: [shared]\n");
    ws.write("second.yaml", "name: P\ntype: Project\nchildren: [shared, extra]\n");

    apply(&ws, "first.yaml", "first.yaml", CreationPolicy::CreateOnly).unwrap();
    let err = apply(&ws, "second.yaml", "second.out.yaml", CreationPolicy::CreateOnly).unwrap_err();
    assert!(err.to_string().contains("already exists"));

    let resolved = apply(&ws, "second.yaml", "second.out.yaml", CreationPolicy::GetOrCreate).unwrap();

    assert_eq!(resolved, 3);
    let second = ws.read_document("second.out.yaml");
    let first = ws.read_document("first.yaml");
    assert_eq!(second["children"][0]["id"], first["children"][0]["id"]);
    assert_eq!(ws.load_state(STATE).records().len(), 3);
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn project_settings_choose_policy() {
    let ws = TestWorkspace::new();
    ws.write_settings("[gateway]\npolicy = \"create-or-update\"\n");
    ws.write("site.yaml", templates::PROJECT_WITH_FOLDERS);

    let resolver = SettingsResolver::with_global_config_dir(ws.root(), ws.path("global"));
    let settings = resolver.resolve().unwrap();
    assert_eq!(settings.policy, CreationPolicy::CreateOrUpdate);

    apply(&ws, "site.yaml", "out.yaml", settings.policy).unwrap();
    apply(&ws, "site.yaml", "out.yaml", settings.policy).unwrap();

    let platform = ws.load_state(STATE);
    assert_eq!(platform.records().len(), 3);
    assert!(
        platform
            .records()
            .iter()
            .all(|r| matches!(r.entity.kind(), EntityKind::Project | EntityKind::Folder))
    );
}
