#![forbid(unsafe_code)]

/// Coarse classification used by the transport layer to pick a response
/// status: malformed input, tree-invariant violation, blocked-by-state,
/// missing permission, or plumbing failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Structural,
    Conflict,
    Authorization,
    Internal,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    NameBlank,
    NameTaken {
        name: String,
    },
    InvalidCostCode,
    UnknownNode,
    UnknownParent,
    ParentCycle,
    RootAlreadyExists,
    RootImmovable,
    HasActiveChildren,
    AlreadyDeactivated,
    Forbidden(&'static str),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Sql(_) => ErrorKind::Internal,
            Self::InvalidInput(_) | Self::NameBlank | Self::NameTaken { .. } | Self::InvalidCostCode => {
                ErrorKind::Validation
            }
            Self::UnknownNode
            | Self::UnknownParent
            | Self::ParentCycle
            | Self::RootAlreadyExists
            | Self::RootImmovable => ErrorKind::Structural,
            Self::HasActiveChildren | Self::AlreadyDeactivated => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Authorization,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NameBlank => write!(f, "node name must not be blank"),
            Self::NameTaken { name } => write!(f, "node name already taken: {name}"),
            Self::InvalidCostCode => {
                write!(f, "cost code must be 'S' followed by exactly four digits")
            }
            Self::UnknownNode => write!(f, "unknown node"),
            Self::UnknownParent => write!(f, "unknown parent node"),
            Self::ParentCycle => {
                write!(f, "node cannot be moved under itself or one of its descendants")
            }
            Self::RootAlreadyExists => write!(f, "a root node already exists"),
            Self::RootImmovable => write!(f, "the root node cannot be moved or deactivated"),
            Self::HasActiveChildren => write!(f, "node still has active children"),
            Self::AlreadyDeactivated => write!(f, "node is already deactivated"),
            Self::Forbidden(action) => write!(f, "not authorized to {action}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
