#![forbid(unsafe_code)]

//! The surface exposed to the (external) transport layer: typed request and
//! response documents, grantee tagging for raw permission strings, the two
//! JSON tree shapes, and a service facade over the node store.

mod documents;
mod grants;
mod service;
mod support;

pub use documents::{
    LayoutDocument, NodeDocument, TreeMode, error_document, render_tree,
};
pub use grants::parse_grant_list;
pub use service::{CreateNodeForm, NodeService, UpdateNodeForm};
