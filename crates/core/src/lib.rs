#![forbid(unsafe_code)]

pub mod layout;
pub mod model;
pub mod permissions;
pub mod tree;
