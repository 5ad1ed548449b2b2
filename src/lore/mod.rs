//! Lore input snapshot: entry types, scope names, and lorebook loading.

pub mod load;
pub mod types;

use regex::Regex;
use std::sync::LazyLock;

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+?)\]\]").expect("valid wikilink pattern"));

/// Normalize a scope name: trim, unify separators, collapse repeated slashes,
/// and strip leading/trailing slashes.
///
/// `"  /world//north\\keep/ "` becomes `"world/north/keep"`.
pub fn normalize_scope(scope: &str) -> String {
    scope
        .trim()
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Extract the raw inner text of every `[[...]]` reference in `content`, in order of
/// appearance. Duplicates are kept; the resolver deduplicates edges.
pub fn extract_wikilinks(content: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|link| !link.is_empty())
        .collect()
}
