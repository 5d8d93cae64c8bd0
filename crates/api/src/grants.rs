#![forbid(unsafe_code)]

use ot_core::model::{Grant, Grantee, PermissionKind};

/// Converts one comma-separated permission list into tagged grants.
///
/// Whether the names are individuals or groups is decided by which form
/// field they arrived in — this is the only place the distinction is made,
/// and nothing downstream re-derives it from the strings themselves. Names
/// are trimmed, lowercased and deduplicated; the owner is dropped because
/// ownership already implies every permission kind.
pub fn parse_grant_list(
    raw: Option<&str>,
    is_group: bool,
    kind: PermissionKind,
    owner: Option<&str>,
) -> Vec<Grant> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut seen: Vec<String> = Vec::new();
    let mut grants = Vec::new();
    for entry in raw.split(',') {
        let name = entry.trim().to_lowercase();
        if name.is_empty() || seen.contains(&name) {
            continue;
        }
        if !is_group && owner == Some(name.as_str()) {
            continue;
        }
        seen.push(name.clone());
        let grantee = if is_group {
            Grantee::Group(name)
        } else {
            Grantee::Individual(name)
        };
        grants.push(Grant { grantee, kind });
    }
    grants
}
