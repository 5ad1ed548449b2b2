//! `expand_neighbors`: bounded breadth-first walk of the link graph.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::catalog::{CatalogEntry, EntryKey, RetrievalToolCatalog};
use super::error::ToolResult;
use super::resolve::{clamp_arg, lenient_int, resolve_entry};

pub const DEFAULT_DEPTH: i64 = 1;
pub const MAX_DEPTH: i64 = 3;
pub const DEFAULT_LIMIT: i64 = 8;
pub const MAX_LIMIT: i64 = 20;

/// Arguments for `expand_neighbors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandNeighborsArgs {
    #[schemars(description = "uid of the entry to expand from. Required.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub uid: Option<i64>,

    #[schemars(description = "Scope of the source entry, to disambiguate uids shared across scopes.")]
    #[serde(default)]
    pub scope: Option<String>,

    #[schemars(description = "How many link hops to follow (1-3). Defaults to 1.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub depth: Option<i64>,

    #[schemars(description = "Maximum number of neighbors to return (1-20). Defaults to 8.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryRef {
    pub uid: u64,
    pub scope: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NeighborPreview {
    pub uid: u64,
    pub scope: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub distance: usize,
    /// uids from the source to this entry, both ends included.
    pub path: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandNeighborsOutput {
    pub source: EntryRef,
    pub depth: usize,
    pub total_reached: usize,
    pub neighbors: Vec<NeighborPreview>,
    #[serde(skip)]
    pub keys: Vec<EntryKey>,
}

struct Reached {
    distance: usize,
    path: Vec<u64>,
}

/// Walk outgoing links from the resolved source up to `depth` hops.
///
/// Each node keeps the shallowest distance it was reached at and is expanded only once.
/// Results exclude the source and are ordered by ascending distance, descending `order`,
/// ascending scope, then ascending uid.
pub fn expand_neighbors(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    args: &ExpandNeighborsArgs,
) -> ToolResult<ExpandNeighborsOutput> {
    let source = resolve_entry(catalog, allowed, args.uid, args.scope.as_deref())?;
    let depth = clamp_arg(args.depth, DEFAULT_DEPTH, 1, MAX_DEPTH);
    let limit = clamp_arg(args.limit, DEFAULT_LIMIT, 1, MAX_LIMIT);

    let mut reached: BTreeMap<EntryKey, Reached> = BTreeMap::new();
    reached.insert(
        source.key.clone(),
        Reached {
            distance: 0,
            path: vec![source.uid()],
        },
    );
    let mut queue: VecDeque<EntryKey> = VecDeque::from([source.key.clone()]);

    while let Some(current) = queue.pop_front() {
        let Some(entry) = catalog.get(&current) else { continue };
        let (distance, path) = match reached.get(&current) {
            Some(r) => (r.distance, r.path.clone()),
            None => continue,
        };
        if distance >= depth {
            continue;
        }
        for next in &entry.neighbors {
            if !allowed.iter().any(|s| *s == next.scope) {
                continue;
            }
            let next_distance = distance + 1;
            if reached
                .get(next)
                .is_some_and(|r| r.distance <= next_distance)
            {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(next.uid);
            reached.insert(
                next.clone(),
                Reached {
                    distance: next_distance,
                    path: next_path,
                },
            );
            queue.push_back(next.clone());
        }
    }

    let mut found: Vec<(&CatalogEntry, Reached)> = reached
        .into_iter()
        .filter(|(key, _)| *key != source.key)
        .filter_map(|(key, r)| catalog.get(&key).map(|e| (e, r)))
        .collect();
    found.sort_by(|(a, ra), (b, rb)| {
        ra.distance
            .cmp(&rb.distance)
            .then_with(|| b.order.cmp(&a.order))
            .then_with(|| a.scope().cmp(b.scope()))
            .then_with(|| a.uid().cmp(&b.uid()))
    });
    let total_reached = found.len();
    found.truncate(limit);

    let keys = found.iter().map(|(e, _)| e.key.clone()).collect();
    let neighbors = found
        .into_iter()
        .map(|(entry, r)| NeighborPreview {
            uid: entry.uid(),
            scope: entry.scope().to_string(),
            title: entry.display_title(),
            keywords: entry.keywords.clone(),
            distance: r.distance,
            path: r.path,
        })
        .collect();

    Ok(ExpandNeighborsOutput {
        source: EntryRef {
            uid: source.uid(),
            scope: source.scope().to_string(),
            title: source.display_title(),
        },
        depth,
        total_reached,
        neighbors,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lore::types::{LoreEntry, ScopeEntries};
    use crate::retrieval::catalog::build_catalog;
    use crate::retrieval::error::ToolError;

    fn world() -> Vec<String> {
        vec!["world".to_string()]
    }

    fn args(uid: i64, depth: i64) -> ExpandNeighborsArgs {
        ExpandNeighborsArgs {
            uid: Some(uid),
            depth: Some(depth),
            ..Default::default()
        }
    }

    fn chain() -> RetrievalToolCatalog {
        // 1 -> 2 -> 3 -> 4, plus a shortcut 1 -> 3 and a back edge 3 -> 1
        build_catalog(&[ScopeEntries::new(
            "world",
            vec![
                LoreEntry::new(1, "One", "").with_wikilinks(["Two", "Three"]),
                LoreEntry::new(2, "Two", "").with_wikilinks(["Three"]),
                LoreEntry::new(3, "Three", "").with_wikilinks(["Four", "One"]),
                LoreEntry::new(4, "Four", ""),
            ],
        )])
    }

    #[test]
    fn depth_one_orders_by_weight() {
        let cat = build_catalog(&[ScopeEntries::new(
            "world",
            vec![
                LoreEntry::new(1, "Hub", "").with_wikilinks(["X", "Y"]),
                LoreEntry::new(2, "X", "").with_order(5),
                LoreEntry::new(3, "Y", "").with_order(10),
            ],
        )]);
        let out = expand_neighbors(&cat, &world(), &args(1, 1)).unwrap();
        let uids: Vec<u64> = out.neighbors.iter().map(|n| n.uid).collect();
        assert_eq!(uids, vec![3, 2]);
        assert!(out.neighbors.iter().all(|n| n.distance == 1));
    }

    #[test]
    fn shallowest_distance_wins_and_source_is_excluded() {
        let out = expand_neighbors(&chain(), &world(), &args(1, 3)).unwrap();
        let found: Vec<(u64, usize)> = out.neighbors.iter().map(|n| (n.uid, n.distance)).collect();
        assert_eq!(found, vec![(2, 1), (3, 1), (4, 2)]);
        let four = out.neighbors.iter().find(|n| n.uid == 4).unwrap();
        assert_eq!(four.path, vec![1, 3, 4]);
        assert_eq!(out.source.uid, 1);
    }

    #[test]
    fn depth_is_clamped_and_limit_truncates() {
        let mut a = args(2, 0);
        let out = expand_neighbors(&chain(), &world(), &a).unwrap();
        assert_eq!(out.depth, 1);
        assert_eq!(out.neighbors.len(), 1);

        a.depth = Some(10);
        a.limit = Some(1);
        let out = expand_neighbors(&chain(), &world(), &a).unwrap();
        assert_eq!(out.depth, 3);
        assert_eq!(out.total_reached, 3);
        assert_eq!(out.neighbors.len(), 1);
        assert_eq!(out.keys, vec![EntryKey::new("world", 3)]);
    }

    #[test]
    fn unresolvable_source_fails() {
        assert!(matches!(
            expand_neighbors(&chain(), &world(), &args(99, 1)),
            Err(ToolError::EntryNotFound(_))
        ));
        assert!(matches!(
            expand_neighbors(&chain(), &world(), &args(-3, 1)),
            Err(ToolError::InvalidArgument(_))
        ));
        assert!(matches!(
            expand_neighbors(&chain(), &[], &args(1, 1)),
            Err(ToolError::EntryNotFound(_))
        ));
    }
}
