//! Per-tenant content store: pages, blocks, workspaces, and the search index
//! kept in lockstep with them.

use crate::core::search::SearchIndex;
use crate::{
    Block, BlockParent, Color, OutlinerError, Page, Result, Storage, Workspace,
    DEFAULT_BLOCK_KIND,
};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use uuid::Uuid;

/// Name of the workspace seeded at ID 0 on first initialization.
pub const DEFAULT_WORKSPACE_NAME: &str = "Default";

/// Color of the seeded default workspace.
pub const DEFAULT_WORKSPACE_COLOR: Color = Color([0x42, 0x85, 0xF4]);

/// One open tenant content database.
///
/// `ContentStore` owns all structural invariants on pages, blocks, and
/// workspaces, and drives the [`SearchIndex`] as an inseparable side effect
/// of every mutation: index updates happen inside the same transaction as
/// the primary-row change. A store never inspects the registry; it is handed
/// a file path and nothing else.
#[derive(Debug)]
pub struct ContentStore {
    storage: Storage,
    index: SearchIndex,
}

impl ContentStore {
    /// Opens the tenant database at `path`, creating the file, the schema,
    /// and the default workspace (ID 0) on first use.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::Database`] for any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = Storage::open(path)?;

        // Seed the reserved default workspace exactly once.
        let exists: bool = storage.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM workspaces WHERE workspace_id = 0)",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            storage.connection().execute(
                "INSERT INTO workspaces (workspace_id, name, color) VALUES (0, ?1, ?2)",
                rusqlite::params![DEFAULT_WORKSPACE_NAME, DEFAULT_WORKSPACE_COLOR.0.to_vec()],
            )?;
            log::debug!("seeded default workspace");
        }

        Ok(Self {
            storage,
            index: SearchIndex,
        })
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        self.storage.connection()
    }

    /// Closes the store, releasing its file handle.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    // Pages

    /// Creates a page and indexes its title. Returns the new page ID.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::PageAlreadyExists`] if a page with this title
    /// exists in this tenant.
    pub fn add_page(&mut self, title: &str) -> Result<String> {
        let existing: Option<String> = self
            .connection()
            .query_row(
                "SELECT page_id FROM pages WHERE title = ?1",
                [title],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(OutlinerError::PageAlreadyExists(title.to_string()));
        }

        let page_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "INSERT INTO pages (page_id, title, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![page_id, title, now],
        )?;
        self.index.index_page(&tx, &page_id, title)?;
        tx.commit()?;

        log::debug!("page '{title}' added with id {page_id}");
        Ok(page_id)
    }

    /// Fetches a single page by ID.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::PageNotFound`] if absent.
    pub fn get_page_by_id(&self, page_id: &str) -> Result<Page> {
        self.connection()
            .query_row(
                "SELECT page_id, title, created_at FROM pages WHERE page_id = ?1",
                [page_id],
                map_page_row,
            )
            .optional()?
            .ok_or_else(|| OutlinerError::PageNotFound(page_id.to_string()))
    }

    /// Returns all pages, newest first.
    pub fn get_all_pages(&self) -> Result<Vec<Page>> {
        let mut stmt = self.connection().prepare(
            "SELECT page_id, title, created_at FROM pages
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let pages = stmt
            .query_map([], map_page_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    /// Retitles a page and refreshes its index entry.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::PageAlreadyExists`] if a *different* page
    /// already holds `new_title`, or [`OutlinerError::PageNotFound`] if
    /// `page_id` is absent.
    pub fn rename_page(&mut self, page_id: &str, new_title: &str) -> Result<()> {
        let clash: Option<String> = self
            .connection()
            .query_row(
                "SELECT page_id FROM pages WHERE title = ?1 AND page_id != ?2",
                rusqlite::params![new_title, page_id],
                |row| row.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(OutlinerError::PageAlreadyExists(new_title.to_string()));
        }
        if !self.page_exists(page_id)? {
            return Err(OutlinerError::PageNotFound(page_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "UPDATE pages SET title = ?1 WHERE page_id = ?2",
            rusqlite::params![new_title, page_id],
        )?;
        self.index.remove_page(&tx, page_id)?;
        self.index.index_page(&tx, page_id, new_title)?;
        tx.commit()?;

        log::debug!("page {page_id} renamed to '{new_title}'");
        Ok(())
    }

    /// Deletes a page and every block transitively attached to it, removing
    /// all of their index entries in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::PageNotFound`] if absent.
    pub fn delete_page(&mut self, page_id: &str) -> Result<()> {
        if !self.page_exists(page_id)? {
            return Err(OutlinerError::PageNotFound(page_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        let direct_blocks: Vec<String> = {
            let mut stmt = tx.prepare("SELECT block_id FROM blocks WHERE page_id = ?1")?;
            let ids = stmt
                .query_map([page_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        for block_id in direct_blocks {
            Self::delete_block_subtree(&tx, &self.index, &block_id)?;
        }
        self.index.remove_page(&tx, page_id)?;
        tx.execute("DELETE FROM pages WHERE page_id = ?1", [page_id])?;
        tx.commit()?;

        log::debug!("page {page_id} and its blocks deleted");
        Ok(())
    }

    // Blocks

    /// Creates a block under the given parent. Returns the new block ID.
    ///
    /// The parent reference is already validated for exclusivity by
    /// [`BlockParent::from_refs`]; a [`BlockParent::Detached`] block is legal
    /// and expected to be attached promptly by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::PageNotFound`] /
    /// [`OutlinerError::BlockNotFound`] if the referenced parent row does not
    /// exist.
    pub fn add_block(
        &mut self,
        content: &str,
        position: i64,
        kind: Option<&str>,
        parent: BlockParent,
    ) -> Result<String> {
        self.check_parent_exists(&parent)?;

        let block_id = Uuid::new_v4().to_string();
        let kind = kind.unwrap_or(DEFAULT_BLOCK_KIND);
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "INSERT INTO blocks (block_id, content, page_id, parent_block_id, position, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                block_id,
                content,
                parent.page_id(),
                parent.parent_block_id(),
                position,
                kind,
                now
            ],
        )?;
        self.index.index_block(&tx, &block_id, content, &parent)?;
        tx.commit()?;

        log::debug!("block {block_id} added");
        Ok(block_id)
    }

    /// Fetches a single block by ID.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::BlockNotFound`] if absent.
    pub fn get_block_by_id(&self, block_id: &str) -> Result<Block> {
        let row = self
            .connection()
            .query_row(
                "SELECT block_id, content, page_id, parent_block_id, position, kind, created_at
                 FROM blocks WHERE block_id = ?1",
                [block_id],
                map_block_row,
            )
            .optional()?
            .ok_or_else(|| OutlinerError::BlockNotFound(block_id.to_string()))?;
        block_from_row(row)
    }

    /// Returns the blocks attached directly to `page_id`, ordered by position.
    pub fn get_blocks_by_page(&self, page_id: &str) -> Result<Vec<Block>> {
        let mut stmt = self.connection().prepare(
            "SELECT block_id, content, page_id, parent_block_id, position, kind, created_at
             FROM blocks WHERE page_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map([page_id], map_block_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(block_from_row).collect()
    }

    /// Replaces a block's content and refreshes its index entry.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::BlockNotFound`] if absent.
    pub fn update_block_content(&mut self, block_id: &str, new_content: &str) -> Result<()> {
        if !self.block_exists(block_id)? {
            return Err(OutlinerError::BlockNotFound(block_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "UPDATE blocks SET content = ?1 WHERE block_id = ?2",
            rusqlite::params![new_content, block_id],
        )?;
        self.index.reindex_block_content(&tx, block_id, new_content)?;
        tx.commit()?;

        log::debug!("block {block_id} content updated");
        Ok(())
    }

    /// Re-parents a block. A page reference clears the block-parent reference
    /// and vice versa; [`BlockParent::Detached`] clears both.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::BlockNotFound`] if `block_id` is absent, the
    /// typed NotFound for a parent reference that does not exist, or
    /// [`OutlinerError::BlockCycle`] if the new parent sits inside the block's
    /// own subtree.
    pub fn update_block_parent(&mut self, block_id: &str, new_parent: BlockParent) -> Result<()> {
        self.check_parent_exists(&new_parent)?;
        self.check_no_cycle(block_id, &new_parent)?;
        if !self.block_exists(block_id)? {
            return Err(OutlinerError::BlockNotFound(block_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "UPDATE blocks SET page_id = ?1, parent_block_id = ?2 WHERE block_id = ?3",
            rusqlite::params![new_parent.page_id(), new_parent.parent_block_id(), block_id],
        )?;
        self.index.reindex_block_parent(&tx, block_id, &new_parent)?;
        tx.commit()?;

        log::debug!("block {block_id} re-parented");
        Ok(())
    }

    /// Updates a block's sibling position and, optionally, re-parents it in
    /// the same call.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::BlockNotFound`] if `block_id` is absent, or
    /// [`OutlinerError::BlockCycle`] if the new parent sits inside the
    /// block's own subtree.
    pub fn update_block_position(
        &mut self,
        block_id: &str,
        new_position: i64,
        new_parent: Option<BlockParent>,
    ) -> Result<()> {
        if let Some(parent) = &new_parent {
            self.check_parent_exists(parent)?;
            self.check_no_cycle(block_id, parent)?;
        }
        if !self.block_exists(block_id)? {
            return Err(OutlinerError::BlockNotFound(block_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        match &new_parent {
            Some(parent) => {
                tx.execute(
                    "UPDATE blocks SET position = ?1, page_id = ?2, parent_block_id = ?3
                     WHERE block_id = ?4",
                    rusqlite::params![
                        new_position,
                        parent.page_id(),
                        parent.parent_block_id(),
                        block_id
                    ],
                )?;
                self.index.reindex_block_parent(&tx, block_id, parent)?;
            }
            None => {
                tx.execute(
                    "UPDATE blocks SET position = ?1 WHERE block_id = ?2",
                    rusqlite::params![new_position, block_id],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a block and every block whose parent chain includes it.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::BlockNotFound`] if absent.
    pub fn delete_block(&mut self, block_id: &str) -> Result<()> {
        if !self.block_exists(block_id)? {
            return Err(OutlinerError::BlockNotFound(block_id.to_string()));
        }

        let tx = self.storage.connection_mut().transaction()?;
        Self::delete_block_subtree(&tx, &self.index, block_id)?;
        tx.commit()?;

        log::debug!("block {block_id} and its descendants deleted");
        Ok(())
    }

    /// Recursively deletes `block_id` and all descendants within an existing
    /// transaction, removing each index entry alongside its row.
    ///
    /// Deletion proceeds leaves-first so the parent foreign key is never
    /// violated mid-operation. This helper must not open its own transaction;
    /// SQLite does not support nesting them.
    fn delete_block_subtree(tx: &Transaction, index: &SearchIndex, block_id: &str) -> Result<()> {
        let child_ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT block_id FROM blocks WHERE parent_block_id = ?1")?;
            let ids = stmt
                .query_map([block_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        for child_id in child_ids {
            Self::delete_block_subtree(tx, index, &child_id)?;
        }
        index.remove_block(tx, block_id)?;
        tx.execute("DELETE FROM blocks WHERE block_id = ?1", [block_id])?;
        Ok(())
    }

    // Workspaces

    /// Creates a workspace and returns its ID, always >= 1; ID 0 is reserved
    /// for the default workspace.
    pub fn add_workspace(&mut self, name: &str, color: Color) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO workspaces (name, color) VALUES (?1, ?2)",
            rusqlite::params![name, color.0.to_vec()],
        )?;
        let workspace_id = self.connection().last_insert_rowid();
        log::debug!("workspace '{name}' added with id {workspace_id}");
        Ok(workspace_id)
    }

    /// Fetches a single workspace by ID.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::WorkspaceNotFound`] if absent.
    pub fn get_workspace_by_id(&self, workspace_id: i64) -> Result<Workspace> {
        let row: Option<(i64, String, Vec<u8>)> = self
            .connection()
            .query_row(
                "SELECT workspace_id, name, color FROM workspaces WHERE workspace_id = ?1",
                [workspace_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (id, name, color) =
            row.ok_or_else(|| OutlinerError::WorkspaceNotFound(workspace_id.to_string()))?;
        Ok(Workspace {
            id,
            name,
            color: Color::from_bytes(&color)?,
        })
    }

    /// Returns all workspaces, the default one first.
    pub fn get_all_workspaces(&self) -> Result<Vec<Workspace>> {
        let mut stmt = self.connection().prepare(
            "SELECT workspace_id, name, color FROM workspaces ORDER BY workspace_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(id, name, color)| {
                Ok(Workspace {
                    id,
                    name,
                    color: Color::from_bytes(&color)?,
                })
            })
            .collect()
    }

    /// Renames and recolors a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::WorkspaceNotFound`] if absent.
    pub fn update_workspace(&mut self, workspace_id: i64, name: &str, color: Color) -> Result<()> {
        let changed = self.connection().execute(
            "UPDATE workspaces SET name = ?1, color = ?2 WHERE workspace_id = ?3",
            rusqlite::params![name, color.0.to_vec(), workspace_id],
        )?;
        if changed == 0 {
            return Err(OutlinerError::WorkspaceNotFound(workspace_id.to_string()));
        }
        Ok(())
    }

    /// Deletes a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::DefaultWorkspaceProtected`] for the reserved
    /// ID 0, or [`OutlinerError::WorkspaceNotFound`] if absent.
    pub fn delete_workspace(&mut self, workspace_id: i64) -> Result<()> {
        if workspace_id == 0 {
            return Err(OutlinerError::DefaultWorkspaceProtected);
        }
        let changed = self
            .connection()
            .execute("DELETE FROM workspaces WHERE workspace_id = ?1", [workspace_id])?;
        if changed == 0 {
            return Err(OutlinerError::WorkspaceNotFound(workspace_id.to_string()));
        }
        log::debug!("workspace {workspace_id} deleted");
        Ok(())
    }

    // Search

    /// Searches page titles. See [`SearchIndex::search_pages`].
    pub fn search_pages(&self, query: &str, limit: u32, literal: bool) -> Result<Vec<Page>> {
        self.index.search_pages(self.connection(), query, limit, literal)
    }

    /// Searches block content. See [`SearchIndex::search_blocks`].
    pub fn search_blocks(&self, query: &str, limit: u32, literal: bool) -> Result<Vec<Block>> {
        self.index.search_blocks(self.connection(), query, limit, literal)
    }

    /// Searches pages and blocks together. `limit` bounds each result list
    /// independently, not their sum.
    pub fn search_all(
        &self,
        query: &str,
        limit: u32,
        literal: bool,
    ) -> Result<(Vec<Page>, Vec<Block>)> {
        if query.trim().is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let pages = self.search_pages(query, limit, literal)?;
        let blocks = self.search_blocks(query, limit, literal)?;
        Ok((pages, blocks))
    }

    /// Fully regenerates the search index from the current page and block
    /// rows. See [`SearchIndex::rebuild`].
    pub fn rebuild_search_index(&mut self) -> Result<()> {
        let tx = self.storage.connection_mut().transaction()?;
        self.index.rebuild(&tx)?;
        tx.commit()?;
        Ok(())
    }

    // Internal lookups

    fn page_exists(&self, page_id: &str) -> Result<bool> {
        let exists: bool = self.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE page_id = ?1)",
            [page_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn block_exists(&self, block_id: &str) -> Result<bool> {
        let exists: bool = self.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM blocks WHERE block_id = ?1)",
            [block_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn check_parent_exists(&self, parent: &BlockParent) -> Result<()> {
        match parent {
            BlockParent::Page(page_id) => {
                if !self.page_exists(page_id)? {
                    return Err(OutlinerError::PageNotFound(page_id.clone()));
                }
            }
            BlockParent::Block(parent_block_id) => {
                if !self.block_exists(parent_block_id)? {
                    return Err(OutlinerError::BlockNotFound(parent_block_id.clone()));
                }
            }
            BlockParent::Detached => {}
        }
        Ok(())
    }

    /// Rejects re-parenting `block_id` under itself or one of its own
    /// descendants, which would orphan the subtree into an unreachable loop
    /// and break the leaves-first cascade.
    fn check_no_cycle(&self, block_id: &str, new_parent: &BlockParent) -> Result<()> {
        let BlockParent::Block(start) = new_parent else {
            return Ok(());
        };
        let mut current = Some(start.clone());
        while let Some(ancestor) = current {
            if ancestor == block_id {
                return Err(OutlinerError::BlockCycle(block_id.to_string()));
            }
            current = self
                .connection()
                .query_row(
                    "SELECT parent_block_id FROM blocks WHERE block_id = ?1",
                    [&ancestor],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
        }
        Ok(())
    }
}

pub(crate) fn map_page_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub(crate) type BlockRow = (String, String, Option<String>, Option<String>, i64, String, i64);

pub(crate) fn map_block_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

/// Converts a raw block row into a [`Block`], rebuilding the tagged parent
/// reference. The schema CHECK guarantees the both-set state cannot occur.
pub(crate) fn block_from_row(row: BlockRow) -> Result<Block> {
    let (id, content, page_id, parent_block_id, position, kind, created_at) = row;
    Ok(Block {
        id,
        content,
        parent: BlockParent::from_refs(page_id, parent_block_id)?,
        position,
        kind,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::NamedTempFile;

    fn open_store() -> (NamedTempFile, ContentStore) {
        let temp = NamedTempFile::new().unwrap();
        let store = ContentStore::open(temp.path()).unwrap();
        (temp, store)
    }

    #[test]
    fn test_open_seeds_default_workspace_exactly_once() {
        let temp = NamedTempFile::new().unwrap();
        {
            let store = ContentStore::open(temp.path()).unwrap();
            let ws = store.get_workspace_by_id(0).unwrap();
            assert_eq!(ws.name, DEFAULT_WORKSPACE_NAME);
            assert_eq!(ws.color, DEFAULT_WORKSPACE_COLOR);
            store.close().unwrap();
        }

        // Re-opening must not duplicate the seed.
        let store = ContentStore::open(temp.path()).unwrap();
        assert_eq!(store.get_all_workspaces().unwrap().len(), 1);
    }

    #[test]
    fn test_add_and_get_page() {
        let (_temp, mut store) = open_store();
        let id = store.add_page("Intro").unwrap();

        let page = store.get_page_by_id(&id).unwrap();
        assert_eq!(page.title, "Intro");
    }

    #[test]
    fn test_add_page_duplicate_title_fails() {
        let (_temp, mut store) = open_store();
        store.add_page("Intro").unwrap();

        let err = store.add_page("Intro").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.get_all_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_get_all_pages_newest_first() {
        let (_temp, mut store) = open_store();
        store.add_page("First").unwrap();
        store.add_page("Second").unwrap();
        let third = store.add_page("Third").unwrap();

        let pages = store.get_all_pages().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].id, third);
        assert_eq!(pages[2].title, "First");
    }

    #[test]
    fn test_rename_page_updates_title_and_index() {
        let (_temp, mut store) = open_store();
        let id = store.add_page("Old Title").unwrap();

        store.rename_page(&id, "New Title").unwrap();
        assert_eq!(store.get_page_by_id(&id).unwrap().title, "New Title");
        assert!(store.search_pages("Old", 10, true).unwrap().is_empty());
        assert_eq!(store.search_pages("New", 10, true).unwrap().len(), 1);
    }

    #[test]
    fn test_rename_page_collision_with_other_page_fails() {
        let (_temp, mut store) = open_store();
        let a = store.add_page("A").unwrap();
        store.add_page("B").unwrap();

        let err = store.rename_page(&a, "B").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        // Renaming to its own current title is not a collision.
        store.rename_page(&a, "A").unwrap();
    }

    #[test]
    fn test_rename_page_not_found() {
        let (_temp, mut store) = open_store();
        let err = store.rename_page("missing", "X").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_page_cascades_to_descendant_blocks() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("Tree").unwrap();
        let root = store
            .add_block("root", 0, None, BlockParent::Page(page.clone()))
            .unwrap();
        let child = store
            .add_block("child", 0, None, BlockParent::Block(root.clone()))
            .unwrap();
        let grandchild = store
            .add_block("grandchild", 0, None, BlockParent::Block(child.clone()))
            .unwrap();

        store.delete_page(&page).unwrap();

        for id in [&root, &child, &grandchild] {
            let err = store.get_block_by_id(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
        // Index entries went with the rows.
        assert!(store.search_blocks("grandchild", 10, true).unwrap().is_empty());
        assert_eq!(store.get_page_by_id(&page).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_add_block_detached_is_allowed() {
        let (_temp, mut store) = open_store();
        let id = store.add_block("floating", 0, None, BlockParent::Detached).unwrap();

        let block = store.get_block_by_id(&id).unwrap();
        assert_eq!(block.parent, BlockParent::Detached);
        assert_eq!(block.kind, DEFAULT_BLOCK_KIND);
    }

    #[test]
    fn test_add_block_conflicting_parent_refs_create_no_row() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let block = store
            .add_block("b", 0, None, BlockParent::Page(page.clone()))
            .unwrap();

        // The boundary constructor rejects the both-set state before a row
        // can be created.
        let err = BlockParent::from_refs(Some(page), Some(block)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_add_block_to_missing_page_fails() {
        let (_temp, mut store) = open_store();
        let err = store
            .add_block("x", 0, None, BlockParent::Page("missing".into()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_get_blocks_by_page_ordered_by_position() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let b2 = store.add_block("two", 2, None, BlockParent::Page(page.clone())).unwrap();
        let b0 = store.add_block("zero", 0, None, BlockParent::Page(page.clone())).unwrap();
        let b1 = store.add_block("one", 1, None, BlockParent::Page(page.clone())).unwrap();

        let blocks = store.get_blocks_by_page(&page).unwrap();
        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec![b0.as_str(), b1.as_str(), b2.as_str()]);
    }

    #[test]
    fn test_update_block_content_tracks_search_index() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let id = store
            .add_block("foo bar", 0, None, BlockParent::Page(page))
            .unwrap();

        let hits = store.search_blocks("foo", 10, true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);

        store.update_block_content(&id, "baz").unwrap();
        assert!(store.search_blocks("foo", 10, true).unwrap().is_empty());
        let hits = store.search_blocks("baz", 10, true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
    }

    #[test]
    fn test_update_block_content_not_found() {
        let (_temp, mut store) = open_store();
        let err = store.update_block_content("missing", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_block_parent_transitions() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let anchor = store
            .add_block("anchor", 0, None, BlockParent::Page(page.clone()))
            .unwrap();
        let id = store.add_block("mover", 1, None, BlockParent::Page(page.clone())).unwrap();

        // Page -> block: the page reference is cleared.
        store
            .update_block_parent(&id, BlockParent::Block(anchor.clone()))
            .unwrap();
        let block = store.get_block_by_id(&id).unwrap();
        assert_eq!(block.parent, BlockParent::Block(anchor.clone()));

        // Block -> page: the block reference is cleared.
        store
            .update_block_parent(&id, BlockParent::Page(page.clone()))
            .unwrap();
        assert_eq!(store.get_block_by_id(&id).unwrap().parent, BlockParent::Page(page));

        // Detach entirely.
        store.update_block_parent(&id, BlockParent::Detached).unwrap();
        assert_eq!(store.get_block_by_id(&id).unwrap().parent, BlockParent::Detached);
    }

    #[test]
    fn test_update_block_parent_not_found() {
        let (_temp, mut store) = open_store();
        let err = store
            .update_block_parent("missing", BlockParent::Detached)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_block_position_with_reparent() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let a = store.add_block("a", 0, None, BlockParent::Page(page.clone())).unwrap();
        let b = store.add_block("b", 1, None, BlockParent::Page(page.clone())).unwrap();

        store.update_block_position(&b, 5, None).unwrap();
        assert_eq!(store.get_block_by_id(&b).unwrap().position, 5);

        store
            .update_block_position(&b, 0, Some(BlockParent::Block(a.clone())))
            .unwrap();
        let moved = store.get_block_by_id(&b).unwrap();
        assert_eq!(moved.position, 0);
        assert_eq!(moved.parent, BlockParent::Block(a));
    }

    #[test]
    fn test_update_block_parent_under_itself_is_rejected() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let a = store.add_block("a", 0, None, BlockParent::Page(page)).unwrap();

        let err = store
            .update_block_parent(&a, BlockParent::Block(a.clone()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        // The block is untouched and its subtree still cascades cleanly.
        store.delete_block(&a).unwrap();
    }

    #[test]
    fn test_update_block_parent_under_descendant_is_rejected() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let a = store.add_block("a", 0, None, BlockParent::Page(page)).unwrap();
        let b = store.add_block("b", 0, None, BlockParent::Block(a.clone())).unwrap();
        let c = store.add_block("c", 0, None, BlockParent::Block(b)).unwrap();

        let err = store
            .update_block_parent(&a, BlockParent::Block(c.clone()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = store
            .update_block_position(&a, 3, Some(BlockParent::Block(c.clone())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        store.delete_block(&a).unwrap();
        assert_eq!(store.get_block_by_id(&c).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_block_cascades_to_descendants() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        let keeper = store
            .add_block("keeper", 0, None, BlockParent::Page(page.clone()))
            .unwrap();
        let root = store.add_block("root", 1, None, BlockParent::Page(page)).unwrap();
        let child = store.add_block("child", 0, None, BlockParent::Block(root.clone())).unwrap();

        store.delete_block(&root).unwrap();

        assert_eq!(store.get_block_by_id(&root).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.get_block_by_id(&child).unwrap_err().kind(), ErrorKind::NotFound);
        // Sibling outside the subtree survives, along with its index entry.
        assert!(store.get_block_by_id(&keeper).is_ok());
        assert_eq!(store.search_blocks("keeper", 10, true).unwrap().len(), 1);
    }

    #[test]
    fn test_add_workspace_never_returns_zero() {
        let (_temp, mut store) = open_store();
        let id = store.add_workspace("Work", Color([0xFF, 0x00, 0x00])).unwrap();
        assert!(id >= 1);

        let all = store.get_all_workspaces().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 0);
        assert_eq!(all[1].name, "Work");
        assert_eq!(all[1].color.to_hex(), "#FF0000");
    }

    #[test]
    fn test_update_workspace() {
        let (_temp, mut store) = open_store();
        let id = store.add_workspace("Work", Color([0xFF, 0x00, 0x00])).unwrap();

        store.update_workspace(id, "Play", Color([0x00, 0xFF, 0x00])).unwrap();
        let ws = store.get_workspace_by_id(id).unwrap();
        assert_eq!(ws.name, "Play");
        assert_eq!(ws.color.to_hex(), "#00FF00");

        let err = store.update_workspace(999, "X", Color([0, 0, 0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_workspace() {
        let (_temp, mut store) = open_store();
        let id = store.add_workspace("Work", Color([0xFF, 0x00, 0x00])).unwrap();

        store.delete_workspace(id).unwrap();
        assert_eq!(store.get_workspace_by_id(id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete_workspace(999).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_default_workspace_is_rejected() {
        let (_temp, mut store) = open_store();
        let err = store.delete_workspace(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(store.get_workspace_by_id(0).is_ok());
    }

    #[test]
    fn test_search_blocks_boolean_mode() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        store
            .add_block("alpha one", 0, None, BlockParent::Page(page.clone()))
            .unwrap();
        store.add_block("beta two", 1, None, BlockParent::Page(page)).unwrap();

        let hits = store.search_blocks("alpha OR beta", 10, false).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store.search_blocks("alpha NOT one", 10, false).unwrap().is_empty());
    }

    #[test]
    fn test_search_all_bounds_each_list_independently() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("shared term page").unwrap();
        store.add_page("shared term again").unwrap();
        store
            .add_block("shared term block", 0, None, BlockParent::Page(page.clone()))
            .unwrap();
        store
            .add_block("shared term block two", 1, None, BlockParent::Page(page))
            .unwrap();

        let (pages, blocks) = store.search_all("shared", 1, true).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(blocks.len(), 1);

        let (pages, blocks) = store.search_all("   ", 10, true).unwrap();
        assert!(pages.is_empty());
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_rebuild_search_index_recovers_from_drift() {
        let (_temp, mut store) = open_store();
        let page = store.add_page("P").unwrap();
        store.add_block("indexed", 0, None, BlockParent::Page(page.clone())).unwrap();

        // Simulate bulk external modification that bypasses the store.
        store
            .connection()
            .execute(
                "INSERT INTO blocks (block_id, content, page_id, position, created_at)
                 VALUES ('ext1', 'smuggled content', ?1, 9, 0)",
                [&page],
            )
            .unwrap();
        assert!(store.search_blocks("smuggled", 10, true).unwrap().is_empty());

        store.rebuild_search_index().unwrap();
        let hits = store.search_blocks("smuggled", 10, true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ext1");
        // Previously indexed rows are still present after the rebuild.
        assert_eq!(store.search_blocks("indexed", 10, true).unwrap().len(), 1);
    }
}
