//! `get_entry`: direct fetch of one entry with a bounded content excerpt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::catalog::{EntryKey, RetrievalToolCatalog};
use super::error::ToolResult;
use super::neighbors::EntryRef;
use super::resolve::{clamp_arg, lenient_int, resolve_entry};
use super::text::truncate_chars;

pub const DEFAULT_CONTENT_CHARS: i64 = 1200;
pub const MIN_CONTENT_CHARS: i64 = 120;
pub const MAX_CONTENT_CHARS: i64 = 5000;
const MAX_LISTED_NEIGHBORS: usize = 8;

/// Arguments for `get_entry`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetEntryArgs {
    #[schemars(description = "uid of the entry to fetch. Required.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub uid: Option<i64>,

    #[schemars(description = "Scope of the entry, to disambiguate uids shared across scopes.")]
    #[serde(default)]
    pub scope: Option<String>,

    #[schemars(description = "Maximum content characters to return (120-5000). Defaults to 1200.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub content_chars: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEntryOutput {
    pub uid: u64,
    pub scope: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub order: i64,
    pub content: String,
    pub content_truncated: bool,
    pub neighbors: Vec<EntryRef>,
    #[serde(skip)]
    pub keys: Vec<EntryKey>,
}

pub fn get_entry(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    args: &GetEntryArgs,
) -> ToolResult<GetEntryOutput> {
    let entry = resolve_entry(catalog, allowed, args.uid, args.scope.as_deref())?;
    let max_chars = clamp_arg(
        args.content_chars,
        DEFAULT_CONTENT_CHARS,
        MIN_CONTENT_CHARS,
        MAX_CONTENT_CHARS,
    );
    let (content, content_truncated) = truncate_chars(&entry.content, max_chars);

    let neighbors = entry
        .neighbors
        .iter()
        .filter_map(|key| catalog.get(key))
        .take(MAX_LISTED_NEIGHBORS)
        .map(|n| EntryRef {
            uid: n.uid(),
            scope: n.scope().to_string(),
            title: n.display_title(),
        })
        .collect();

    Ok(GetEntryOutput {
        uid: entry.uid(),
        scope: entry.scope().to_string(),
        title: entry.display_title(),
        keywords: entry.keywords.clone(),
        order: entry.order,
        content,
        content_truncated,
        neighbors,
        keys: vec![entry.key.clone()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lore::types::{LoreEntry, ScopeEntries};
    use crate::retrieval::catalog::build_catalog;

    #[test]
    fn excerpt_is_clamped_to_minimum() {
        let cat = build_catalog(&[ScopeEntries::new(
            "world",
            vec![LoreEntry::new(1, "Long", "z".repeat(500))],
        )]);
        let out = get_entry(
            &cat,
            &["world".to_string()],
            &GetEntryArgs {
                uid: Some(1),
                content_chars: Some(10),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out.content.len(), 120);
        assert!(out.content_truncated);
        assert_eq!(out.keys, vec![EntryKey::new("world", 1)]);
    }

    #[test]
    fn lists_at_most_eight_immediate_neighbors() {
        let mut entries: Vec<LoreEntry> = (2..=12)
            .map(|uid| LoreEntry::new(uid, format!("N{uid}"), ""))
            .collect();
        let links: Vec<String> = (2..=12).map(|uid| format!("N{uid}")).collect();
        entries.push(LoreEntry::new(1, "Hub", "short").with_wikilinks(links));
        let cat = build_catalog(&[ScopeEntries::new("world", entries)]);

        let out = get_entry(
            &cat,
            &["world".to_string()],
            &GetEntryArgs {
                uid: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out.neighbors.len(), 8);
        assert_eq!(out.neighbors[0].uid, 2);
        assert_eq!(out.content, "short");
        assert!(!out.content_truncated);
    }
}
