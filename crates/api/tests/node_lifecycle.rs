#![forbid(unsafe_code)]

mod support;

use ot_storage::{ErrorKind, StoreError};
use support::*;

#[test]
fn root_is_unique() {
    let (mut harness, root_id) = service_with_root("root_is_unique");
    assert_eq!(harness.service.root_id().unwrap(), Some(root_id));
    let err = harness.service.init_root("another root").unwrap_err();
    assert!(matches!(err, StoreError::RootAlreadyExists));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn create_under_root_attaches_a_collection() {
    let (mut harness, root_id) = service_with_root("create_under_root_attaches_a_collection");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .expect("create program");
    assert!(program.has_collection, "program-depth node owns a collection");
    assert_eq!(program.parent_id, Some(root_id));
    assert_eq!(program.owner.as_deref(), Some("alice@example.com"));
    assert!(program.owned_by_current_user);
    assert!(program.active);
}

#[test]
fn deeper_nodes_get_no_collection() {
    let (mut harness, root_id) = service_with_root("deeper_nodes_get_no_collection");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let project = harness
        .service
        .create(form(program.id, "proj1"), &alice())
        .expect("owner may create under own node");
    assert!(!project.has_collection);
}

#[test]
fn blank_and_duplicate_names_are_validation_errors() {
    let (mut harness, root_id) = service_with_root("blank_and_duplicate_names");
    let err = harness
        .service
        .create(form(root_id, "   "), &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::NameBlank));
    assert_eq!(err.kind(), ErrorKind::Validation);

    harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let err = harness
        .service
        .create(form(root_id, "Program1"), &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::NameTaken { .. }), "names are unique across the whole tree");
}

#[test]
fn cost_code_format_is_enforced() {
    let (mut harness, root_id) = service_with_root("cost_code_format_is_enforced");

    let mut bad = form(root_id, "program1");
    bad.cost_code = "S123".to_string();
    let err = harness.service.create(bad, &alice()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidCostCode));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut good = form(root_id, "program1");
    good.cost_code = "S1234".to_string();
    let node = harness.service.create(good, &alice()).unwrap();
    assert_eq!(node.cost_code.as_deref(), Some("S1234"));

    // Blank is accepted and stored as absent.
    let blank = harness.service.create(form(root_id, "program2"), &alice()).unwrap();
    assert_eq!(blank.cost_code, None);
}

#[test]
fn missing_parent_is_structural() {
    let (mut harness, _root_id) = service_with_root("missing_parent_is_structural");
    let err = harness
        .service
        .create(form(9999, "orphan"), &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownParent));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn deactivation_is_blocked_by_active_children() {
    let (mut harness, root_id) = service_with_root("deactivation_blocked_by_children");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let project = harness
        .service
        .create(form(program.id, "proj1"), &alice())
        .unwrap();

    let err = harness.service.deactivate(program.id, &alice()).unwrap_err();
    assert!(matches!(err, StoreError::HasActiveChildren));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Leaf first, then the parent goes through.
    harness.service.deactivate(project.id, &alice()).unwrap();
    let deactivated = harness.service.deactivate(program.id, &alice()).unwrap();
    assert!(!deactivated.active);
    assert_eq!(
        deactivated.deactivated_by.as_deref(),
        Some("alice@example.com")
    );
    assert!(deactivated.deactivated_at.is_some());
    // The collection survives deactivation.
    assert!(deactivated.has_collection);
}

#[test]
fn deactivating_twice_is_a_conflict() {
    let (mut harness, root_id) = service_with_root("deactivating_twice_is_a_conflict");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    harness.service.deactivate(program.id, &alice()).unwrap();
    let err = harness.service.deactivate(program.id, &alice()).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyDeactivated));
}

#[test]
fn update_replaces_attributes_and_grants() {
    let (mut harness, root_id) = service_with_root("update_replaces_attributes_and_grants");
    let mut create = form(root_id, "program1");
    create.user_writers = Some("bob@example.com".to_string());
    let program = harness.service.create(create, &alice()).unwrap();

    let updated = harness
        .service
        .update(
            program.id,
            ot_api::UpdateNodeForm {
                name: "program one".to_string(),
                description: Some("renamed".to_string()),
                cost_code: "S5678".to_string(),
                user_writers: None,
                group_writers: Some("pirates".to_string()),
                user_spenders: None,
                group_spenders: None,
            },
            &alice(),
        )
        .expect("owner may update");
    assert_eq!(updated.name, "program one");
    assert_eq!(updated.cost_code.as_deref(), Some("S5678"));

    // The explicit individual grant for bob is gone; the group grant now
    // carries his access instead.
    let docs = harness
        .service
        .fetch(&ot_storage::NodeFilter::default(), &bob())
        .unwrap();
    let doc = docs.iter().find(|d| d.id == program.id).unwrap();
    assert!(doc.writable, "bob writes via the pirates group now");

    let docs = harness
        .service
        .fetch(&ot_storage::NodeFilter::default(), &carol())
        .unwrap();
    let doc = docs.iter().find(|d| d.id == program.id).unwrap();
    assert!(!doc.writable);
}

#[test]
fn parents_chain_runs_root_to_direct_parent() {
    let (mut harness, root_id) = service_with_root("parents_chain");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let project = harness
        .service
        .create(form(program.id, "proj1"), &alice())
        .unwrap();
    let sub = harness
        .service
        .create(form(project.id, "subproj"), &alice())
        .unwrap();

    let chain = harness.service.parents(sub.id).unwrap();
    assert_eq!(chain, vec![root_id, program.id, project.id]);
    assert!(harness.service.parents(root_id).unwrap().is_empty());
}
