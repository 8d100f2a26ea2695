//! Data model for the outliner persistence core.
//!
//! All types serialize with the wire field names used by the API layer:
//! a [`Block`]'s parent flattens to the nullable `page_id` /
//! `parent_block_id` pair, and a [`Color`] round-trips as `"#RRGGBB"`.

use crate::{OutlinerError, Result};
use serde::{Deserialize, Serialize};

/// The block kind assigned when a caller does not specify one.
pub const DEFAULT_BLOCK_KIND: &str = "text";

/// Catalog entry for one tenant database, owned by the
/// [`Registry`](crate::Registry).
///
/// `location` is the sanitized, relative filename of the backing SQLite file
/// under the registry's root directory. It is derived from `name` and the two
/// always change together on rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub id: String,
    pub name: String,
    pub location: String,
    pub created_at: i64,
}

/// Root node of a content tree. Titles are unique within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub created_at: i64,
}

/// The parent reference of a [`Block`].
///
/// A block belongs either directly to a page, to exactly one other block, or
/// to nothing at all. The both-set state is unrepresentable here; the
/// validating constructor [`BlockParent::from_refs`] rejects it at the API
/// boundary so it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockParent {
    /// Attached directly to a page.
    Page(String),
    /// Nested under another block.
    Block(String),
    /// Not attached anywhere. A valid transient state; callers are expected
    /// to attach the block promptly.
    Detached,
}

impl BlockParent {
    /// Builds a parent reference from the nullable pair used on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::InvalidBlockParent`] if both references are
    /// supplied.
    pub fn from_refs(page_id: Option<String>, parent_block_id: Option<String>) -> Result<Self> {
        match (page_id, parent_block_id) {
            (Some(_), Some(_)) => Err(OutlinerError::InvalidBlockParent(
                "a block belongs to either a page or a parent block, not both".to_string(),
            )),
            (Some(page_id), None) => Ok(Self::Page(page_id)),
            (None, Some(parent_block_id)) => Ok(Self::Block(parent_block_id)),
            (None, None) => Ok(Self::Detached),
        }
    }

    /// The page this block is attached to, if any.
    pub fn page_id(&self) -> Option<&str> {
        match self {
            Self::Page(id) => Some(id),
            _ => None,
        }
    }

    /// The block this block is nested under, if any.
    pub fn parent_block_id(&self) -> Option<&str> {
        match self {
            Self::Block(id) => Some(id),
            _ => None,
        }
    }
}

// Wire form of a parent reference: two nullable foreign keys.
#[derive(Serialize, Deserialize)]
struct ParentRefs {
    #[serde(default)]
    page_id: Option<String>,
    #[serde(default)]
    parent_block_id: Option<String>,
}

impl Serialize for BlockParent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ParentRefs {
            page_id: self.page_id().map(str::to_string),
            parent_block_id: self.parent_block_id().map(str::to_string),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockParent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let refs = ParentRefs::deserialize(deserializer)?;
        Self::from_refs(refs.page_id, refs.parent_block_id).map_err(serde::de::Error::custom)
    }
}

/// The atomic unit of outline content. Blocks form a forest anchored at pages.
///
/// `position` orders siblings; it is caller-supplied and never auto-compacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub content: String,
    #[serde(flatten)]
    pub parent: BlockParent,
    pub position: i64,
    pub kind: String,
    pub created_at: i64,
}

/// A 24-bit RGB color, stored as a 3-byte blob and exchanged as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    /// Parses `"#RRGGBB"` (the leading `#` is optional).
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::InvalidColor`] if the string is not six hex
    /// digits.
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(OutlinerError::InvalidColor(s.to_string()));
        }
        let mut bytes = [0u8; 3];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| OutlinerError::InvalidColor(s.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// Builds a color from the raw 3-byte blob stored in SQLite.
    ///
    /// # Errors
    ///
    /// Returns [`OutlinerError::InvalidColor`] if the blob is not exactly
    /// three bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 3] = bytes
            .try_into()
            .map_err(|_| OutlinerError::InvalidColor(format!("{} byte blob", bytes.len())))?;
        Ok(Self(bytes))
    }

    /// Renders the color as `"#RRGGBB"` with uppercase hex digits.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A named, colored grouping within a tenant.
///
/// Workspace ID 0 is reserved for the auto-created "Default" workspace; new
/// workspaces always receive IDs from 1 upwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub color: Color,
}
