//! Catalog builder and per-scope link graph.
//!
//! [`build_catalog`] turns a snapshot of per-scope lore entries into an immutable
//! [`RetrievalToolCatalog`]. Neighbor edges come from `[[wikilink]]` references resolved
//! against titles and trigger keys in the same scope. Edges are stored as sorted lists of
//! [`EntryKey`]s, never as references between entries.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::text::{name_forms, normalize_text, reference_forms};
use crate::lore::normalize_scope;
use crate::lore::types::{LoreEntry, ScopeEntries};

/// Identity of a catalog entry: `(scope, uid)`. Orders by scope, then uid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryKey {
    pub scope: String,
    pub uid: u64,
}

impl EntryKey {
    pub fn new(scope: impl Into<String>, uid: u64) -> Self {
        Self {
            scope: scope.into(),
            uid,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope, self.uid)
    }
}

impl FromStr for EntryKey {
    type Err = String;

    /// Parses `scope#uid`. The scope is normalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, uid) = s
            .rsplit_once('#')
            .ok_or_else(|| format!("expected scope#uid, got: {s}"))?;
        let uid = uid
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid uid in key: {s}"))?;
        let scope = normalize_scope(scope);
        if scope.is_empty() {
            return Err(format!("empty scope in key: {s}"));
        }
        Ok(Self { scope, uid })
    }
}

/// An indexed lore entry. Immutable once the catalog is built.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub key: EntryKey,
    /// Title as written.
    pub title: String,
    /// Lowercased, whitespace-collapsed title.
    pub title_norm: String,
    /// Primary and secondary keys, normalized, deduplicated and sorted.
    pub keywords: Vec<String>,
    /// Body as written.
    pub content: String,
    /// Lowercased body.
    pub content_norm: String,
    pub order: i64,
    /// Resolved references, sorted by descending `order` then ascending uid.
    pub neighbors: Vec<EntryKey>,
}

impl CatalogEntry {
    pub fn scope(&self) -> &str {
        &self.key.scope
    }

    pub fn uid(&self) -> u64 {
        self.key.uid
    }

    /// Title for display, falling back to `Entry <uid>` when the entry has none.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Entry {}", self.key.uid)
        } else {
            self.title.trim().to_string()
        }
    }

    /// Human-readable label used in selection lists: `[scope] Title (#uid)`.
    pub fn label(&self) -> String {
        format!("[{}] {} (#{})", self.key.scope, self.display_title(), self.key.uid)
    }
}

/// Immutable lookup structures over every indexed entry.
#[derive(Debug, Clone, Default)]
pub struct RetrievalToolCatalog {
    entries: BTreeMap<EntryKey, CatalogEntry>,
    keys_by_scope: BTreeMap<String, Vec<EntryKey>>,
    keys_by_uid: BTreeMap<u64, Vec<EntryKey>>,
}

/// Per-scope counts for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeStats {
    pub scope: String,
    pub entries: usize,
    pub edges: usize,
}

impl RetrievalToolCatalog {
    pub fn get(&self, key: &EntryKey) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.keys_by_scope.contains_key(scope)
    }

    /// Known scopes, sorted.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.keys_by_scope.keys().map(String::as_str)
    }

    /// Keys in `scope`, sorted by uid. Empty for unknown scopes.
    pub fn keys_in_scope(&self, scope: &str) -> &[EntryKey] {
        self.keys_by_scope
            .get(scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Keys sharing `uid` across scopes, sorted by scope.
    pub fn keys_for_uid(&self, uid: u64) -> &[EntryKey] {
        self.keys_by_uid
            .get(&uid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn scope_stats(&self) -> Vec<ScopeStats> {
        self.keys_by_scope
            .iter()
            .map(|(scope, keys)| ScopeStats {
                scope: scope.clone(),
                entries: keys.len(),
                edges: keys
                    .iter()
                    .filter_map(|k| self.entries.get(k))
                    .map(|e| e.neighbors.len())
                    .sum(),
            })
            .collect()
    }
}

/// Build a catalog from a snapshot of per-scope entries.
///
/// Scopes are normalized and processed in sorted order, entries in ascending uid order,
/// so equal snapshots produce identical catalogs regardless of input order. Entries whose
/// scope normalizes to empty are dropped. When two inputs collide on `(scope, uid)` the
/// first in `(normalized scope, raw scope, uid)` order is kept.
pub fn build_catalog(snapshot: &[ScopeEntries]) -> RetrievalToolCatalog {
    let mut ordered: Vec<(String, &ScopeEntries)> = snapshot
        .iter()
        .map(|s| (normalize_scope(&s.scope), s))
        .filter(|(scope, _)| !scope.is_empty())
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.scope.cmp(&b.1.scope)));

    let mut grouped: BTreeMap<String, BTreeMap<u64, &LoreEntry>> = BTreeMap::new();
    for (scope, input) in &ordered {
        let bucket = grouped.entry(scope.clone()).or_default();
        let mut entries: Vec<&LoreEntry> = input.entries.iter().collect();
        entries.sort_by_key(|e| e.uid);
        for entry in entries {
            if bucket.contains_key(&entry.uid) {
                tracing::warn!(scope = %scope, uid = entry.uid, "duplicate lore entry ignored");
                continue;
            }
            bucket.insert(entry.uid, entry);
        }
    }

    let mut catalog = RetrievalToolCatalog::default();
    for (scope, bucket) in grouped {
        let mut scope_entries: Vec<(CatalogEntry, &LoreEntry)> = bucket
            .values()
            .map(|entry| (index_entry(&scope, entry), *entry))
            .collect();

        let targets = build_target_index(&scope_entries);
        let orders: BTreeMap<u64, i64> = scope_entries
            .iter()
            .map(|(e, _)| (e.key.uid, e.order))
            .collect();

        for (entry, raw) in &mut scope_entries {
            entry.neighbors = resolve_neighbors(&entry.key, &raw.wikilinks, &targets, &orders);
        }

        let keys: Vec<EntryKey> = scope_entries.iter().map(|(e, _)| e.key.clone()).collect();
        for (entry, _) in scope_entries {
            catalog
                .keys_by_uid
                .entry(entry.key.uid)
                .or_default()
                .push(entry.key.clone());
            catalog.entries.insert(entry.key.clone(), entry);
        }
        catalog.keys_by_scope.insert(scope, keys);
    }

    for keys in catalog.keys_by_uid.values_mut() {
        keys.sort();
    }

    tracing::debug!(
        scopes = catalog.keys_by_scope.len(),
        entries = catalog.entries.len(),
        "retrieval catalog built"
    );
    catalog
}

fn index_entry(scope: &str, entry: &LoreEntry) -> CatalogEntry {
    let keywords: BTreeSet<String> = entry
        .key
        .iter()
        .chain(entry.keysecondary.iter())
        .map(|k| normalize_text(k))
        .filter(|k| !k.is_empty())
        .collect();

    CatalogEntry {
        key: EntryKey::new(scope, entry.uid),
        title: entry.comment.clone(),
        title_norm: normalize_text(&entry.comment),
        keywords: keywords.into_iter().collect(),
        content: entry.content.clone(),
        content_norm: entry.content.to_lowercase(),
        order: entry.order,
        neighbors: Vec::new(),
    }
}

/// Map every name form (title, primary key, secondary key) to the entries carrying it.
fn build_target_index(
    scope_entries: &[(CatalogEntry, &LoreEntry)],
) -> BTreeMap<String, BTreeSet<EntryKey>> {
    let mut index: BTreeMap<String, BTreeSet<EntryKey>> = BTreeMap::new();
    for (entry, raw) in scope_entries {
        let names = std::iter::once(&raw.comment)
            .chain(raw.key.iter())
            .chain(raw.keysecondary.iter());
        for name in names {
            for form in name_forms(name) {
                index.entry(form).or_default().insert(entry.key.clone());
            }
        }
    }
    index
}

fn resolve_neighbors(
    source: &EntryKey,
    links: &[String],
    targets: &BTreeMap<String, BTreeSet<EntryKey>>,
    orders: &BTreeMap<u64, i64>,
) -> Vec<EntryKey> {
    let mut found: BTreeSet<EntryKey> = BTreeSet::new();
    for link in links {
        for form in reference_forms(link) {
            if let Some(keys) = targets.get(&form) {
                found.extend(keys.iter().filter(|k| *k != source).cloned());
            }
        }
    }

    let mut neighbors: Vec<EntryKey> = found.into_iter().collect();
    neighbors.sort_by(|a, b| {
        let order_a = orders.get(&a.uid).copied().unwrap_or_default();
        let order_b = orders.get(&b.uid).copied().unwrap_or_default();
        order_b.cmp(&order_a).then_with(|| a.uid.cmp(&b.uid))
    });
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(name: &str, entries: Vec<LoreEntry>) -> ScopeEntries {
        ScopeEntries::new(name, entries)
    }

    #[test]
    fn entry_key_display_roundtrips_through_parse() {
        let key: EntryKey = "world/north#12".parse().unwrap();
        assert_eq!(key, EntryKey::new("world/north", 12));
        assert_eq!(key.to_string(), "world/north#12");
        assert!("no-uid".parse::<EntryKey>().is_err());
        assert!("#3".parse::<EntryKey>().is_err());
    }

    #[test]
    fn keywords_are_normalized_sorted_and_deduplicated() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![LoreEntry::new(1, "Alice", "")
                .with_keys(["Zed", "alice", " ALICE "])
                .with_secondary_keys(["Knight", ""])],
        )]);
        let entry = catalog.get(&EntryKey::new("world", 1)).unwrap();
        assert_eq!(entry.keywords, vec!["alice", "knight", "zed"]);
        assert_eq!(entry.title_norm, "alice");
    }

    #[test]
    fn neighbors_sorted_by_order_desc_then_uid() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![
                LoreEntry::new(1, "Hub", "").with_wikilinks(["X", "Y", "Z"]),
                LoreEntry::new(2, "X", "").with_order(5),
                LoreEntry::new(3, "Y", "").with_order(10),
                LoreEntry::new(4, "Z", "").with_order(10),
            ],
        )]);
        let hub = catalog.get(&EntryKey::new("world", 1)).unwrap();
        let uids: Vec<u64> = hub.neighbors.iter().map(|k| k.uid).collect();
        assert_eq!(uids, vec![3, 4, 2]);
    }

    #[test]
    fn links_resolve_through_keys_and_separator_variants() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![
                LoreEntry::new(1, "Iron Keep", ""),
                LoreEntry::new(2, "Sir Bob", "").with_keys(["the-knight"]),
                LoreEntry::new(3, "Map", "")
                    .with_wikilinks(["places/iron_keep.md|keep", "The Knight#Arms"]),
            ],
        )]);
        let map = catalog.get(&EntryKey::new("world", 3)).unwrap();
        let uids: Vec<u64> = map.neighbors.iter().map(|k| k.uid).collect();
        assert_eq!(uids, vec![1, 2]);
    }

    #[test]
    fn self_and_unresolved_links_are_dropped() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![LoreEntry::new(1, "Alice", "").with_wikilinks(["Alice", "Nobody"])],
        )]);
        assert!(catalog.get(&EntryKey::new("world", 1)).unwrap().neighbors.is_empty());
    }

    #[test]
    fn links_never_cross_scopes() {
        let catalog = build_catalog(&[
            scope("a", vec![LoreEntry::new(1, "Alice", "")]),
            scope("b", vec![LoreEntry::new(2, "Bob", "").with_wikilinks(["Alice"])]),
        ]);
        assert!(catalog.get(&EntryKey::new("b", 2)).unwrap().neighbors.is_empty());
    }

    #[test]
    fn scopes_are_normalized_and_uid_index_sorted_by_scope() {
        let catalog = build_catalog(&[
            scope("/zeta/", vec![LoreEntry::new(7, "Z", "")]),
            scope(" alpha ", vec![LoreEntry::new(7, "A", "")]),
            scope(" / ", vec![LoreEntry::new(9, "Dropped", "")]),
        ]);
        let scopes: Vec<&str> = catalog.scopes().collect();
        assert_eq!(scopes, vec!["alpha", "zeta"]);
        assert_eq!(
            catalog.keys_for_uid(7),
            &[EntryKey::new("alpha", 7), EntryKey::new("zeta", 7)]
        );
        assert!(catalog.keys_for_uid(9).is_empty());
    }

    #[test]
    fn duplicate_uids_keep_first_occurrence() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![LoreEntry::new(1, "First", ""), LoreEntry::new(1, "Second", "")],
        )]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&EntryKey::new("world", 1)).unwrap().title, "First");
    }

    #[test]
    fn scope_stats_count_edges() {
        let catalog = build_catalog(&[scope(
            "world",
            vec![
                LoreEntry::new(1, "Alice", ""),
                LoreEntry::new(2, "Bob", "").with_wikilinks(["Alice"]),
            ],
        )]);
        let stats = catalog.scope_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].entries, 2);
        assert_eq!(stats[0].edges, 1);
    }
}
