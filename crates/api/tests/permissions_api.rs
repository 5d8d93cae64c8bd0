#![forbid(unsafe_code)]

mod support;

use ot_storage::{ErrorKind, StoreError};
use support::*;

#[test]
fn anyone_may_create_directly_under_root() {
    let (mut harness, root_id) = service_with_root("anyone_may_create_under_root");
    // carol holds no grants anywhere, yet a new top-level program needs none.
    let program = harness
        .service
        .create(form(root_id, "program1"), &carol())
        .expect("root is the universally writable anchor");
    assert_eq!(program.owner.as_deref(), Some("carol@example.com"));
}

#[test]
fn creating_under_an_ungranted_node_is_forbidden() {
    let (mut harness, root_id) = service_with_root("creating_under_ungranted_node");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();

    let err = harness
        .service
        .create(form(program.id, "proj1"), &carol())
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // Nothing was created.
    let docs = harness
        .service
        .fetch(&ot_storage::NodeFilter::default(), &carol())
        .unwrap();
    assert!(docs.iter().all(|doc| doc.name != "proj1"));
}

#[test]
fn a_write_grant_on_the_parent_allows_creation() {
    let (mut harness, root_id) = service_with_root("write_grant_allows_creation");
    let mut program_form = form(root_id, "program1");
    program_form.group_writers = Some("pirates".to_string());
    let program = harness.service.create(program_form, &alice()).unwrap();

    let project = harness
        .service
        .create(form(program.id, "proj1"), &bob())
        .expect("bob creates via the pirates group grant");
    assert_eq!(project.owner.as_deref(), Some("bob@example.com"));
}

#[test]
fn updating_without_a_grant_is_forbidden() {
    let (mut harness, root_id) = service_with_root("updating_without_grant");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();

    let err = harness
        .service
        .update(
            program.id,
            ot_api::UpdateNodeForm {
                name: "hijacked".to_string(),
                description: None,
                cost_code: String::new(),
                user_writers: None,
                group_writers: None,
                user_spenders: None,
                group_spenders: None,
            },
            &carol(),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
}

#[test]
fn reparent_requires_write_on_node_and_destination() {
    let (mut harness, root_id) = service_with_root("reparent_requires_both_writes");
    let program_a = harness
        .service
        .create(form(root_id, "programA"), &alice())
        .unwrap();
    let program_b = harness
        .service
        .create(form(root_id, "programB"), &bob())
        .unwrap();
    let project = harness
        .service
        .create(form(program_a.id, "proj1"), &alice())
        .unwrap();

    // alice owns the node but holds nothing on the destination.
    let err = harness
        .service
        .reparent(project.id, program_b.id, &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));

    // bob owns the destination but holds nothing on the node.
    let err = harness
        .service
        .reparent(project.id, program_b.id, &bob())
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));

    // A root destination is exempt on the destination side.
    let moved = harness
        .service
        .reparent(project.id, root_id, &alice())
        .expect("alice writes the node, root needs no grant");
    assert_eq!(moved.parent_id, Some(root_id));
}

#[test]
fn reparent_onto_a_descendant_is_structural() {
    let (mut harness, root_id) = service_with_root("reparent_onto_descendant");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let project = harness
        .service
        .create(form(program.id, "proj1"), &alice())
        .unwrap();

    for target in [program.id, project.id] {
        let err = harness
            .service
            .reparent(program.id, target, &alice())
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentCycle));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }
    // Tree left unchanged.
    let unchanged = harness
        .service
        .fetch(&ot_storage::NodeFilter::default(), &alice())
        .unwrap();
    let doc = unchanged.iter().find(|d| d.id == program.id).unwrap();
    assert_eq!(doc.parent_id, Some(root_id));
}

#[test]
fn moving_to_program_depth_attaches_a_collection_once() {
    let (mut harness, root_id) = service_with_root("moving_to_program_depth");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let project = harness
        .service
        .create(form(program.id, "proj1"), &alice())
        .unwrap();
    assert!(!project.has_collection);

    let moved = harness
        .service
        .reparent(project.id, root_id, &alice())
        .unwrap();
    assert!(moved.has_collection, "promotion to program depth attaches one");

    // Moving away again leaves the collection in place.
    let demoted = harness
        .service
        .reparent(project.id, program.id, &alice())
        .unwrap();
    assert!(demoted.has_collection);
}

#[test]
fn the_root_cannot_be_moved_or_deactivated() {
    let (mut harness, root_id) = service_with_root("root_cannot_be_moved");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();

    let err = harness
        .service
        .reparent(root_id, program.id, &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::RootImmovable));

    let err = harness.service.deactivate(root_id, &alice()).unwrap_err();
    assert!(matches!(err, StoreError::RootImmovable));
}

#[test]
fn forbidden_renders_apart_from_validation() {
    let (mut harness, root_id) = service_with_root("forbidden_renders_apart");
    let program = harness
        .service
        .create(form(root_id, "program1"), &alice())
        .unwrap();
    let err = harness
        .service
        .create(form(program.id, "proj1"), &carol())
        .unwrap_err();

    let doc = ot_api::error_document(&err);
    assert_eq!(doc["errors"][0]["status"], "403");

    let err = harness
        .service
        .create(form(root_id, "   "), &alice())
        .unwrap_err();
    let doc = ot_api::error_document(&err);
    assert_eq!(doc["errors"][0]["status"], "422");
}
