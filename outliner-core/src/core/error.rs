//! Error types for the outliner persistence core.

use thiserror::Error;

/// All errors that can occur within the outliner core library.
#[derive(Debug, Error)]
pub enum OutlinerError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A file-system operation on a backing database file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A tenant database ID, name, or location was requested that is not in the registry.
    #[error("Tenant database not found: {0}")]
    TenantNotFound(String),

    /// A tenant database with the same name or storage location already exists.
    #[error("Tenant database already exists: {0}")]
    TenantAlreadyExists(String),

    /// A page ID was requested that does not exist in this tenant.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// A page with the same title already exists in this tenant.
    #[error("Page already exists: {0}")]
    PageAlreadyExists(String),

    /// A block ID was requested that does not exist in this tenant.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// A workspace ID was requested that does not exist in this tenant.
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    /// A block was given both a page and a parent-block reference, or another
    /// structurally illegal parent assignment was attempted.
    #[error("Invalid block parent: {0}")]
    InvalidBlockParent(String),

    /// A block was moved under itself or one of its own descendants.
    #[error("Moving block {0} here would make it its own ancestor")]
    BlockCycle(String),

    /// A workspace color string could not be parsed as `#RRGGBB`.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The reserved default workspace (ID 0) cannot be modified this way.
    #[error("The default workspace cannot be deleted")]
    DefaultWorkspaceProtected,
}

/// Convenience alias that pins the error type to [`OutlinerError`].
pub type Result<T> = std::result::Result<T, OutlinerError>;

/// Coarse error classification for transport layers.
///
/// An HTTP front-end maps each kind to a status code (`NotFound` → 404,
/// `AlreadyExists` → 409, `InvalidState` → 400) without matching on every
/// concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A lookup by ID, name, or location missed.
    NotFound,
    /// A uniqueness constraint (name, title, or location) was violated.
    AlreadyExists,
    /// A structurally illegal request, e.g. conflicting block parent references.
    InvalidState,
    /// A file rename or delete failed for a reason other than "file absent".
    Io,
    /// Any other storage-engine failure.
    Database,
}

impl OutlinerError {
    /// Returns the transport-facing classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TenantNotFound(_)
            | Self::PageNotFound(_)
            | Self::BlockNotFound(_)
            | Self::WorkspaceNotFound(_) => ErrorKind::NotFound,
            Self::TenantAlreadyExists(_) | Self::PageAlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidBlockParent(_)
            | Self::BlockCycle(_)
            | Self::InvalidColor(_)
            | Self::DefaultWorkspaceProtected => ErrorKind::InvalidState,
            Self::Io(_) => ErrorKind::Io,
            Self::Database(_) => ErrorKind::Database,
        }
    }
}
