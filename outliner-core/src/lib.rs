//! Persistence core for a multi-tenant hierarchical outliner.
//!
//! The crate has two independent file-backed layers: a [`Registry`] cataloging
//! isolated per-tenant databases under a root directory, and a per-tenant
//! [`ContentStore`] holding pages, nested content blocks, and workspaces with
//! a full-text [`SearchIndex`] kept in lockstep with every mutation. A
//! [`StoreProvider`] resolves tenant IDs to open stores.
//!
//! Every operation returns a typed [`OutlinerError`]; transport layers map
//! [`ErrorKind`] to their own status codes and never see a panic. Types are
//! re-exported from their respective sub-modules for convenience; consumers
//! should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    error::{ErrorKind, OutlinerError, Result},
    model::{Block, BlockParent, Color, DatabaseDescriptor, Page, Workspace, DEFAULT_BLOCK_KIND},
    provider::StoreProvider,
    registry::{Registry, REGISTRY_DB_NAME},
    sanitize::{sanitize_name, DB_FILE_SUFFIX},
    search::{literal_match_expr, SearchIndex},
    storage::Storage,
    store::{ContentStore, DEFAULT_WORKSPACE_COLOR, DEFAULT_WORKSPACE_NAME},
};
