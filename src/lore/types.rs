//! Lore entry definitions.
//!
//! [`LoreEntry`] is the record shape consumed by the catalog builder. It mirrors the
//! common lorebook export format (`uid`, `comment`, `content`, `key`, `keysecondary`,
//! `order`) plus the raw `[[wikilink]]` references found in the body.

use serde::{Deserialize, Serialize};

/// Default ranking weight for entries that don't declare one.
pub const DEFAULT_ORDER: i64 = 100;

/// A single lore entry (character, place, fact) inside one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreEntry {
    /// Identifier, unique within the owning scope.
    pub uid: u64,
    /// Entry title.
    #[serde(default)]
    pub comment: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Primary trigger phrases.
    #[serde(default)]
    pub key: Vec<String>,
    /// Secondary trigger phrases.
    #[serde(default)]
    pub keysecondary: Vec<String>,
    /// Ranking weight. Higher is more important.
    #[serde(default = "default_order")]
    pub order: i64,
    /// Raw reference strings (the inner text of `[[...]]` markup).
    #[serde(default)]
    pub wikilinks: Vec<String>,
}

fn default_order() -> i64 {
    DEFAULT_ORDER
}

impl LoreEntry {
    pub fn new(uid: u64, comment: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uid,
            comment: comment.into(),
            content: content.into(),
            key: Vec::new(),
            keysecondary: Vec::new(),
            order: DEFAULT_ORDER,
            wikilinks: Vec::new(),
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_secondary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keysecondary = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_wikilinks<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wikilinks = links.into_iter().map(Into::into).collect();
        self
    }
}

/// All entries belonging to one scope, as handed to the catalog builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntries {
    pub scope: String,
    pub entries: Vec<LoreEntry>,
}

impl ScopeEntries {
    pub fn new(scope: impl Into<String>, entries: Vec<LoreEntry>) -> Self {
        Self {
            scope: scope.into(),
            entries,
        }
    }
}
