#![forbid(unsafe_code)]

//! Domain attributes and the principal/grantee vocabulary.
//!
//! Node identifiers are plain `i64` row ids; the sibling-ordering rule in the
//! layout module compares them numerically, so a string newtype would only get
//! in the way.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeName(String);

impl NodeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, NodeNameError> {
        let value = value.into();
        let trimmed = value.trim();
        validate_node_name(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeNameError {
    Empty,
    TooLong,
    ContainsControl,
}

impl NodeNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "node name must not be empty",
            Self::TooLong => "node name is too long",
            Self::ContainsControl => "node name contains control characters",
        }
    }
}

fn validate_node_name(value: &str) -> Result<(), NodeNameError> {
    if value.is_empty() {
        return Err(NodeNameError::Empty);
    }
    if value.len() > 255 {
        return Err(NodeNameError::TooLong);
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(NodeNameError::ContainsControl);
    }
    Ok(())
}

/// A billing cost code: the letter `S` followed by exactly four digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CostCode(String);

impl CostCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Blank input is accepted and stored as absent, not rejected.
    pub fn parse(value: &str) -> Result<Option<Self>, CostCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        validate_cost_code(trimmed)?;
        Ok(Some(Self(trimmed.to_string())))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CostCodeError {
    InvalidFormat,
}

impl CostCodeError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "cost code must be 'S' followed by exactly four digits",
        }
    }
}

fn validate_cost_code(value: &str) -> Result<(), CostCodeError> {
    let Some(digits) = value.strip_prefix('S') else {
        return Err(CostCodeError::InvalidFormat);
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CostCodeError::InvalidFormat);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Read,
    Write,
    Spend,
}

impl PermissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::Read => "read",
            PermissionKind::Write => "write",
            PermissionKind::Spend => "spend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "read" => Some(PermissionKind::Read),
            "write" => Some(PermissionKind::Write),
            "spend" => Some(PermissionKind::Spend),
            _ => None,
        }
    }
}

/// Who a grant names. The individual/group distinction is decided at the
/// boundary where the raw strings arrive; nothing in here sniffs for `@`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Grantee {
    Individual(String),
    Group(String),
}

impl Grantee {
    pub fn name(&self) -> &str {
        match self {
            Grantee::Individual(name) | Grantee::Group(name) => name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Grantee::Group(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub grantee: Grantee,
    pub kind: PermissionKind,
}

/// An already-authenticated actor. Credential verification happens outside
/// this crate; by the time a `Principal` exists it is trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub identifier: String,
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(identifier: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            groups,
        }
    }

    pub fn in_group(&self, name: &str) -> bool {
        self.groups.iter().any(|group| group == name)
    }
}
