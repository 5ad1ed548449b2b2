//! Lorebook loading from a directory of JSON exports.
//!
//! Every `*.json` file under the lore directory becomes one scope, named after its
//! relative path without extension (`world/north.json` → `world/north`).

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::types::{LoreEntry, ScopeEntries, DEFAULT_ORDER};
use super::{extract_wikilinks, normalize_scope};

/// Entry as it appears on disk. Tolerates missing fields and the `disable` flag.
#[derive(Debug, Deserialize)]
struct RawEntry {
    uid: Option<u64>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    key: Vec<String>,
    #[serde(default)]
    keysecondary: Vec<String>,
    order: Option<i64>,
    #[serde(default)]
    disable: bool,
    wikilinks: Option<Vec<String>>,
}

impl RawEntry {
    fn into_entry(self, fallback_uid: Option<u64>) -> Option<LoreEntry> {
        if self.disable {
            return None;
        }
        let uid = self.uid.or(fallback_uid)?;
        let wikilinks = self
            .wikilinks
            .unwrap_or_else(|| extract_wikilinks(&self.content));
        Some(LoreEntry {
            uid,
            comment: self.comment,
            content: self.content,
            key: self.key,
            keysecondary: self.keysecondary,
            order: self.order.unwrap_or(DEFAULT_ORDER),
            wikilinks,
        })
    }
}

/// Load every lorebook under `dir`, one [`ScopeEntries`] per file, sorted by scope.
///
/// A missing directory yields an empty snapshot.
pub fn load_lore_dir(dir: impl AsRef<Path>) -> Result<Vec<ScopeEntries>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        warn!(dir = %dir.display(), "lore directory does not exist, no entries loaded");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut scopes = Vec::with_capacity(files.len());
    for file in files {
        let scope = scope_for_file(dir, &file);
        if scope.is_empty() {
            warn!(file = %file.display(), "skipping lorebook with empty scope name");
            continue;
        }
        let entries = load_lorebook_file(&file)?;
        debug!(scope = %scope, entries = entries.len(), "lorebook loaded");
        scopes.push(ScopeEntries::new(scope, entries));
    }

    scopes.sort_by(|a, b| a.scope.cmp(&b.scope));
    Ok(scopes)
}

/// Parse a single lorebook file into its entries.
pub fn load_lorebook_file(path: impl AsRef<Path>) -> Result<Vec<LoreEntry>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read lorebook {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse lorebook JSON {}", path.display()))?;
    parse_lorebook(value).with_context(|| format!("invalid lorebook {}", path.display()))
}

/// Accepts `{"entries": {id: entry}}`, `{"entries": [entry]}`, or a bare `[entry]`.
pub fn parse_lorebook(value: Value) -> Result<Vec<LoreEntry>> {
    let raw: Vec<(Option<u64>, Value)> = match value {
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        Value::Object(mut obj) => match obj.remove("entries") {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(id, v)| (id.parse::<u64>().ok(), v))
                .collect(),
            Some(Value::Array(items)) => items.into_iter().map(|v| (None, v)).collect(),
            Some(_) => anyhow::bail!("\"entries\" must be an object or an array"),
            None => anyhow::bail!("missing \"entries\" field"),
        },
        _ => anyhow::bail!("lorebook must be a JSON object or array"),
    };

    let mut entries = Vec::with_capacity(raw.len());
    for (fallback_uid, item) in raw {
        let parsed: RawEntry =
            serde_json::from_value(item).context("failed to parse lore entry")?;
        match parsed.into_entry(fallback_uid) {
            Some(entry) => entries.push(entry),
            None => debug!("skipping disabled or uid-less lore entry"),
        }
    }
    entries.sort_by_key(|e| e.uid);
    Ok(entries)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let read = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    for item in read {
        let path = item
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            out.push(path);
        }
    }
    Ok(())
}

fn scope_for_file(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file).with_extension("");
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    normalize_scope(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keyed_entries_map() {
        let entries = parse_lorebook(json!({
            "entries": {
                "3": { "comment": "Bob", "content": "Friend of [[Alice]]", "key": ["Bob"] },
                "1": { "uid": 1, "comment": "Alice", "content": "A knight", "order": 50 }
            }
        }))
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].uid, 1);
        assert_eq!(entries[0].order, 50);
        assert_eq!(entries[1].uid, 3);
        assert_eq!(entries[1].order, DEFAULT_ORDER);
        assert_eq!(entries[1].wikilinks, vec!["Alice"]);
    }

    #[test]
    fn parse_skips_disabled_entries() {
        let entries = parse_lorebook(json!([
            { "uid": 1, "comment": "Kept" },
            { "uid": 2, "comment": "Gone", "disable": true }
        ]))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].comment, "Kept");
    }

    #[test]
    fn explicit_wikilinks_win_over_extraction() {
        let entries = parse_lorebook(json!([
            { "uid": 1, "content": "[[Ignored]]", "wikilinks": ["Explicit"] }
        ]))
        .unwrap();
        assert_eq!(entries[0].wikilinks, vec!["Explicit"]);
    }

    #[test]
    fn parse_rejects_scalar_root() {
        assert!(parse_lorebook(json!(42)).is_err());
        assert!(parse_lorebook(json!({ "name": "no entries" })).is_err());
    }

    #[test]
    fn scope_uses_relative_path_without_extension() {
        let root = Path::new("/lore");
        assert_eq!(
            scope_for_file(root, Path::new("/lore/world/north.json")),
            "world/north"
        );
    }
}
