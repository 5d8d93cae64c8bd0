#![forbid(unsafe_code)]

use ot_core::model::{Grant, Grantee, PermissionKind, Principal};
use ot_storage::{CreateNodeRequest, NodeFilter, PermissionPredicate, SqliteStore};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("ot_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn principal(identifier: &str) -> Principal {
    Principal::new(identifier, Vec::new())
}

fn request(parent_id: i64, name: &str, grants: Vec<Grant>) -> CreateNodeRequest {
    CreateNodeRequest {
        parent_id,
        name: name.to_string(),
        description: None,
        cost_code: String::new(),
        grants,
    }
}

fn read(grantee: Grantee) -> Grant {
    Grant {
        grantee,
        kind: PermissionKind::Read,
    }
}

#[test]
fn readable_by_matches_read_grants_and_ownership() {
    let storage_dir = temp_dir("readable_by_matches");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let root = store.init_root("root").expect("seed root");

    let granted = store
        .create_node(
            request(
                root.id,
                "granted",
                vec![read(Grantee::Individual("bob".to_string()))],
            ),
            &principal("alice"),
        )
        .expect("create granted");
    let group_granted = store
        .create_node(
            request(
                root.id,
                "group granted",
                vec![read(Grantee::Group("pirates".to_string()))],
            ),
            &principal("alice"),
        )
        .expect("create group granted");
    let owned = store
        .create_node(request(root.id, "owned by bob", Vec::new()), &principal("bob"))
        .expect("create owned");
    let unrelated = store
        .create_node(request(root.id, "unrelated", Vec::new()), &principal("carol"))
        .expect("create unrelated");

    let matches = store
        .fetch_nodes(&NodeFilter {
            permission: Some(PermissionPredicate::ReadableBy(Grantee::Individual(
                "bob".to_string(),
            ))),
            ..NodeFilter::default()
        })
        .expect("fetch readable by bob");
    let ids: Vec<i64> = matches.iter().map(|record| record.node.id).collect();
    assert!(ids.contains(&granted.id), "explicit read grant matches");
    assert!(ids.contains(&owned.id), "ownership matches without a grant row");
    assert!(!ids.contains(&group_granted.id), "group grant needs a group predicate");
    assert!(!ids.contains(&unrelated.id));

    let group_matches = store
        .fetch_nodes(&NodeFilter {
            permission: Some(PermissionPredicate::ReadableBy(Grantee::Group(
                "pirates".to_string(),
            ))),
            ..NodeFilter::default()
        })
        .expect("fetch readable by pirates");
    let ids: Vec<i64> = group_matches.iter().map(|record| record.node.id).collect();
    assert_eq!(ids, vec![group_granted.id]);

    let _ = std::fs::remove_dir_all(&storage_dir);
}

#[test]
fn readable_by_does_not_match_other_kinds() {
    let storage_dir = temp_dir("readable_by_kind_bound");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let root = store.init_root("root").expect("seed root");

    store
        .create_node(
            request(
                root.id,
                "write only",
                vec![Grant {
                    grantee: Grantee::Individual("bob".to_string()),
                    kind: PermissionKind::Write,
                }],
            ),
            &principal("alice"),
        )
        .expect("create");

    let matches = store
        .fetch_nodes(&NodeFilter {
            permission: Some(PermissionPredicate::ReadableBy(Grantee::Individual(
                "bob".to_string(),
            ))),
            ..NodeFilter::default()
        })
        .expect("fetch");
    assert!(matches.is_empty(), "a write grant is not a read grant");

    let _ = std::fs::remove_dir_all(&storage_dir);
}
