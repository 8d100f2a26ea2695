//! Internal domain modules for the outliner persistence core.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod error;
pub mod model;
pub mod provider;
pub mod registry;
pub mod sanitize;
pub mod search;
pub mod storage;
pub mod store;

#[doc(inline)]
pub use error::{ErrorKind, OutlinerError, Result};
#[doc(inline)]
pub use model::{
    Block, BlockParent, Color, DatabaseDescriptor, Page, Workspace, DEFAULT_BLOCK_KIND,
};
#[doc(inline)]
pub use provider::StoreProvider;
#[doc(inline)]
pub use registry::{Registry, REGISTRY_DB_NAME};
#[doc(inline)]
pub use sanitize::{sanitize_name, DB_FILE_SUFFIX};
#[doc(inline)]
pub use search::{literal_match_expr, SearchIndex};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use store::{ContentStore, DEFAULT_WORKSPACE_COLOR, DEFAULT_WORKSPACE_NAME};
