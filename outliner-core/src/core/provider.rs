//! Resolves tenant IDs to open content stores.

use crate::{ContentStore, Registry, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Cache of open [`ContentStore`] handles, keyed by tenant ID.
///
/// A provider resolves an ID through the [`Registry`] to a storage location
/// and opens the store lazily; subsequent calls reuse the same handle instead
/// of reopening the file per operation. Providers are plain values, not
/// process-wide singletons — construct one per server (or per test) and pass
/// it explicitly.
///
/// The provider does not watch the registry: before renaming or deleting a
/// tenant, [`evict`](Self::evict) its store so the file handle is released
/// and no stale handle outlives the catalog entry.
#[derive(Default)]
pub struct StoreProvider {
    stores: HashMap<String, ContentStore>,
}

impl StoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open store for `tenant_id`, opening (and lazily creating)
    /// the backing database on first access.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`](crate::OutlinerError::TenantNotFound)
    /// if the registry has no such tenant.
    pub fn store(&mut self, registry: &Registry, tenant_id: &str) -> Result<&mut ContentStore> {
        match self.stores.entry(tenant_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let descriptor = registry.get_by_id(tenant_id)?;
                let store = ContentStore::open(registry.database_path(&descriptor))?;
                log::debug!("opened content store for tenant '{}'", descriptor.name);
                Ok(entry.insert(store))
            }
        }
    }

    /// Closes and drops the cached store for `tenant_id`, if any.
    pub fn evict(&mut self, tenant_id: &str) -> Result<()> {
        if let Some(store) = self.stores.remove(tenant_id) {
            store.close()?;
        }
        Ok(())
    }

    /// Closes every cached store.
    pub fn close_all(mut self) -> Result<()> {
        for (_, store) in self.stores.drain() {
            store.close()?;
        }
        Ok(())
    }
}
