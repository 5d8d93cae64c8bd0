#![forbid(unsafe_code)]
#![allow(dead_code)]

use ot_api::{CreateNodeForm, NodeService};
use ot_core::model::Principal;
use std::path::PathBuf;

pub struct TestService {
    pub service: NodeService,
    storage_dir: PathBuf,
}

impl Drop for TestService {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub fn service(test_name: &str) -> TestService {
    let storage_dir = temp_dir(test_name);
    let service = NodeService::open(&storage_dir).expect("open service");
    TestService {
        service,
        storage_dir,
    }
}

/// A fresh service with the root already seeded; returns the root id too.
pub fn service_with_root(test_name: &str) -> (TestService, i64) {
    let mut harness = service(test_name);
    let root_id = harness.service.init_root("root").expect("seed root");
    (harness, root_id)
}

pub fn alice() -> Principal {
    Principal::new("alice@example.com", vec!["world".to_string()])
}

pub fn bob() -> Principal {
    Principal::new(
        "bob@example.com",
        vec!["world".to_string(), "pirates".to_string()],
    )
}

pub fn carol() -> Principal {
    Principal::new("carol@example.com", vec!["world".to_string()])
}

pub fn form(parent_id: i64, name: &str) -> CreateNodeForm {
    CreateNodeForm {
        parent_id,
        name: name.to_string(),
        description: None,
        cost_code: String::new(),
        user_writers: None,
        group_writers: None,
        user_spenders: None,
        group_spenders: None,
    }
}

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("ot_api_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
