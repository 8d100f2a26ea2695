//! Full-text search index over page titles and block content.
//!
//! [`SearchIndex`] is an explicit observer: every mutation performed through
//! [`ContentStore`](crate::ContentStore) calls into it synchronously, inside
//! the same transaction as the primary-row change, so the `pages_fts` /
//! `blocks_fts` tables can never drift from `pages` / `blocks` within a
//! committed transaction. It is never updated through triggers and the caller
//! cannot skip or batch it.

use crate::core::store::{block_from_row, map_block_row, map_page_row};
use crate::{Block, BlockParent, Page, Result};
use rusqlite::Connection;

/// Maintains one index entry per page and per block.
///
/// All methods take a plain `&Connection` so they run inside whatever
/// transaction the caller has open, and the index is testable against a raw
/// connection without a [`ContentStore`](crate::ContentStore).
#[derive(Debug, Default)]
pub struct SearchIndex;

impl SearchIndex {
    /// Adds the index entry for a newly created or retitled page.
    pub fn index_page(&self, conn: &Connection, page_id: &str, title: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO pages_fts (title, page_id) VALUES (?1, ?2)",
            rusqlite::params![title, page_id],
        )?;
        Ok(())
    }

    /// Drops the index entry for a page.
    pub fn remove_page(&self, conn: &Connection, page_id: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM pages_fts WHERE page_id = ?1",
            rusqlite::params![page_id],
        )?;
        Ok(())
    }

    /// Adds the index entry for a block, storing its owning keys unindexed.
    pub fn index_block(
        &self,
        conn: &Connection,
        block_id: &str,
        content: &str,
        parent: &BlockParent,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO blocks_fts (content, block_id, page_id, parent_block_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![content, block_id, parent.page_id(), parent.parent_block_id()],
        )?;
        Ok(())
    }

    /// Drops the index entry for a block.
    pub fn remove_block(&self, conn: &Connection, block_id: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM blocks_fts WHERE block_id = ?1",
            rusqlite::params![block_id],
        )?;
        Ok(())
    }

    /// Rewrites the indexed content of an existing block entry in place,
    /// leaving its stored owning keys untouched.
    pub fn reindex_block_content(
        &self,
        conn: &Connection,
        block_id: &str,
        content: &str,
    ) -> Result<()> {
        conn.execute(
            "UPDATE blocks_fts SET content = ?1 WHERE block_id = ?2",
            rusqlite::params![content, block_id],
        )?;
        Ok(())
    }

    /// Rewrites the stored (unindexed) owning keys after a block is re-parented.
    /// The indexed content is untouched.
    pub fn reindex_block_parent(
        &self,
        conn: &Connection,
        block_id: &str,
        parent: &BlockParent,
    ) -> Result<()> {
        conn.execute(
            "UPDATE blocks_fts SET page_id = ?1, parent_block_id = ?2 WHERE block_id = ?3",
            rusqlite::params![parent.page_id(), parent.parent_block_id(), block_id],
        )?;
        Ok(())
    }

    /// Discards both FTS tables and regenerates them from the current
    /// `pages` / `blocks` rows. Used for recovery when drift is suspected,
    /// e.g. after bulk external modification of the database file.
    pub fn rebuild(&self, conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM pages_fts", [])?;
        conn.execute(
            "INSERT INTO pages_fts (title, page_id) SELECT title, page_id FROM pages",
            [],
        )?;
        conn.execute("DELETE FROM blocks_fts", [])?;
        conn.execute(
            "INSERT INTO blocks_fts (content, block_id, page_id, parent_block_id)
             SELECT content, block_id, page_id, parent_block_id FROM blocks",
            [],
        )?;
        log::debug!("search index rebuilt from primary rows");
        Ok(())
    }

    /// Searches page titles, best match first.
    ///
    /// An empty or whitespace-only query returns no results without touching
    /// the index. See [`literal_match_expr`] for how `literal` mode treats
    /// the query text.
    pub fn search_pages(
        &self,
        conn: &Connection,
        query: &str,
        limit: u32,
        literal: bool,
    ) -> Result<Vec<Page>> {
        let Some(expr) = match_expr(query, literal) else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare(
            "SELECT p.page_id, p.title, p.created_at
             FROM pages p
             JOIN (
                 SELECT page_id, rank FROM pages_fts
                 WHERE pages_fts MATCH ?1
                 ORDER BY rank LIMIT ?2
             ) m ON m.page_id = p.page_id
             ORDER BY m.rank",
        )?;
        let pages = stmt
            .query_map(rusqlite::params![expr, limit], map_page_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    /// Searches block content, best match first.
    pub fn search_blocks(
        &self,
        conn: &Connection,
        query: &str,
        limit: u32,
        literal: bool,
    ) -> Result<Vec<Block>> {
        let Some(expr) = match_expr(query, literal) else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare(
            "SELECT b.block_id, b.content, b.page_id, b.parent_block_id,
                    b.position, b.kind, b.created_at
             FROM blocks b
             JOIN (
                 SELECT block_id, rank FROM blocks_fts
                 WHERE blocks_fts MATCH ?1
                 ORDER BY rank LIMIT ?2
             ) m ON m.block_id = b.block_id
             ORDER BY m.rank",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![expr, limit], map_block_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(block_from_row).collect()
    }
}

fn match_expr(query: &str, literal: bool) -> Option<String> {
    if query.trim().is_empty() {
        return None;
    }
    if literal {
        Some(literal_match_expr(query))
    } else {
        Some(query.to_string())
    }
}

/// Escapes a whole query into safe literal prefix-match terms.
///
/// The query is split on whitespace and every token is double-quoted (with
/// embedded quotes doubled) and suffixed with `*`, so user punctuation can
/// never be interpreted as FTS5 operator syntax. Splitting on whitespace
/// suits space-separated languages only; CJK text would need a real
/// tokenizer.
#[must_use]
pub fn literal_match_expr(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"*", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}
