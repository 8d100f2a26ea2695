//! Catalog of tenant databases and the lifecycle of their backing files.

use crate::core::sanitize::sanitize_name;
use crate::{DatabaseDescriptor, OutlinerError, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filename of the catalog database inside the root directory.
pub const REGISTRY_DB_NAME: &str = "registry.db";

const REGISTRY_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tenant_databases (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        location TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    );
";

/// The registry of tenant content databases.
///
/// Maps tenant identity to a sanitized, relative storage location under a
/// configured root directory, and owns the create/rename/delete lifecycle of
/// the backing files. The registry never looks inside tenant content.
///
/// Registries are explicitly constructed handles; open as many isolated
/// instances (e.g. in tests) as needed.
pub struct Registry {
    conn: Connection,
    root: PathBuf,
}

impl Registry {
    /// Opens (or creates) the registry under `root`, creating the directory
    /// and the catalog schema as needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join(REGISTRY_DB_NAME))?;
        conn.execute_batch(REGISTRY_SCHEMA)?;
        Ok(Self { conn, root })
    }

    /// The directory all tenant database files live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a tenant's backing file. `location` is always a
    /// sanitized relative filename, never a caller-supplied path.
    #[must_use]
    pub fn database_path(&self, descriptor: &DatabaseDescriptor) -> PathBuf {
        self.root.join(&descriptor.location)
    }

    /// Registers a new tenant database and returns its descriptor.
    ///
    /// The storage location is derived from `name` by
    /// [`sanitize_name`](crate::sanitize_name). The backing file is *not*
    /// created here; [`ContentStore::open`](crate::ContentStore::open)
    /// creates it lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantAlreadyExists`] if `name` or the
    /// derived location collides with an existing entry.
    pub fn create(&self, name: &str) -> Result<DatabaseDescriptor> {
        let location = sanitize_name(name);
        let clash: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM tenant_databases WHERE name = ?1 OR location = ?2",
                rusqlite::params![name, location],
                |row| row.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(OutlinerError::TenantAlreadyExists(name.to_string()));
        }

        let descriptor = DatabaseDescriptor {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            location,
            created_at: chrono::Utc::now().timestamp(),
        };
        self.conn.execute(
            "INSERT INTO tenant_databases (id, name, location, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                descriptor.id,
                descriptor.name,
                descriptor.location,
                descriptor.created_at
            ],
        )?;

        log::debug!("tenant '{}' registered at '{}'", descriptor.name, descriptor.location);
        Ok(descriptor)
    }

    /// Looks a tenant up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`] if absent.
    pub fn get_by_id(&self, id: &str) -> Result<DatabaseDescriptor> {
        self.conn
            .query_row(
                "SELECT id, name, location, created_at FROM tenant_databases WHERE id = ?1",
                [id],
                map_descriptor_row,
            )
            .optional()?
            .ok_or_else(|| OutlinerError::TenantNotFound(id.to_string()))
    }

    /// Looks a tenant up by display name.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`] if absent.
    pub fn get_by_name(&self, name: &str) -> Result<DatabaseDescriptor> {
        self.conn
            .query_row(
                "SELECT id, name, location, created_at FROM tenant_databases WHERE name = ?1",
                [name],
                map_descriptor_row,
            )
            .optional()?
            .ok_or_else(|| OutlinerError::TenantNotFound(name.to_string()))
    }

    /// Looks a tenant up by storage location.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`] if absent.
    pub fn get_by_location(&self, location: &str) -> Result<DatabaseDescriptor> {
        self.conn
            .query_row(
                "SELECT id, name, location, created_at FROM tenant_databases WHERE location = ?1",
                [location],
                map_descriptor_row,
            )
            .optional()?
            .ok_or_else(|| OutlinerError::TenantNotFound(location.to_string()))
    }

    /// Returns all registered tenants, newest first.
    pub fn list_all(&self) -> Result<Vec<DatabaseDescriptor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, location, created_at FROM tenant_databases
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let descriptors = stmt
            .query_map([], map_descriptor_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(descriptors)
    }

    /// Renames a tenant, recomputing its storage location and moving the
    /// backing file.
    ///
    /// This is a best-effort two-step operation: the catalog row is updated
    /// first and the file is moved afterwards, with no transaction spanning
    /// both. A crash between the steps leaves the catalog pointing at the
    /// new location while the file still sits at the old one; an operator-run
    /// consistency check is the recovery path. A backing file that was never
    /// created (lazy creation) is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`] if `id` is absent,
    /// [`OutlinerError::TenantAlreadyExists`] if `new_name` or its derived
    /// location collides with a *different* tenant, or [`OutlinerError::Io`]
    /// if moving an existing backing file fails.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<DatabaseDescriptor> {
        let current = self.get_by_id(id)?;
        let new_location = sanitize_name(new_name);

        let clash: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM tenant_databases
                 WHERE (name = ?1 OR location = ?2) AND id != ?3",
                rusqlite::params![new_name, new_location, id],
                |row| row.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(OutlinerError::TenantAlreadyExists(new_name.to_string()));
        }

        self.conn.execute(
            "UPDATE tenant_databases SET name = ?1, location = ?2 WHERE id = ?3",
            rusqlite::params![new_name, new_location, id],
        )?;

        if current.location != new_location {
            let old_path = self.root.join(&current.location);
            let new_path = self.root.join(&new_location);
            match fs::rename(&old_path, &new_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::warn!(
                        "backing file '{}' missing during rename of tenant '{}'; nothing to move",
                        current.location,
                        current.name
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::debug!("tenant {id} renamed to '{new_name}'");
        Ok(DatabaseDescriptor {
            id: current.id,
            name: new_name.to_string(),
            location: new_location,
            created_at: current.created_at,
        })
    }

    /// Deletes a tenant and its backing file.
    ///
    /// The file removal resolves *before* the catalog row goes away: an
    /// already-absent file is logged and treated as success (the catalog row
    /// is authoritative), while any other I/O failure aborts the whole
    /// operation so a file can never be orphaned without a catalog entry.
    /// Like [`rename`](Self::rename), the two steps are not atomic; a crash
    /// in between can leave a catalog row for an already-removed file.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::TenantNotFound`] if `id` is absent, or
    /// [`OutlinerError::Io`] if removing an existing backing file fails.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let descriptor = self.get_by_id(id)?;
        let path = self.root.join(&descriptor.location);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "backing file '{}' already absent while deleting tenant '{}'",
                    descriptor.location,
                    descriptor.name
                );
            }
            Err(e) => return Err(e.into()),
        }

        self.conn
            .execute("DELETE FROM tenant_databases WHERE id = ?1", [id])?;
        log::debug!("tenant '{}' deleted", descriptor.name);
        Ok(())
    }

    /// Closes the catalog connection, releasing its file handle.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

fn map_descriptor_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DatabaseDescriptor> {
    Ok(DatabaseDescriptor {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        created_at: row.get(3)?,
    })
}
