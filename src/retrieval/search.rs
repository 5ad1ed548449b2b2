//! `search_entries`: additive keyword/title/content scoring over the active scopes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::catalog::{CatalogEntry, EntryKey, RetrievalToolCatalog};
use super::error::{ToolError, ToolResult};
use super::resolve::{clamp_arg, lenient_int, resolve_scopes};
use super::text::{excerpt, find_first_char_index, normalize_text, tokenize};

pub const DEFAULT_LIMIT: i64 = 6;
pub const MAX_LIMIT: i64 = 20;

const TITLE_PHRASE_SCORE: i64 = 120;
const KEYWORD_TOKEN_SCORE: i64 = 80;
const KEYWORD_PHRASE_SCORE: i64 = 30;
const TITLE_TOKEN_SCORE: i64 = 30;
const CONTENT_TOKEN_SCORE: i64 = 8;
/// Shorter tokens only count toward exact keyword matches.
const MIN_SUBSTRING_TOKEN_CHARS: usize = 3;

const SNIPPET_LEAD_CHARS: usize = 80;
const SNIPPET_MAX_CHARS: usize = 260;

/// Arguments for `search_entries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntriesArgs {
    /// Free-text query. Required.
    #[schemars(description = "Free-text query matched against titles, keywords and content. Required.")]
    #[serde(default)]
    pub query: Option<String>,

    /// Restrict the search to one active scope. Empty searches every active scope.
    #[schemars(description = "Restrict the search to one active scope. Omit to search all active scopes.")]
    #[serde(default)]
    pub scope: Option<String>,

    /// Maximum number of matches (1-20). Defaults to 6.
    #[schemars(description = "Maximum number of matches to return (1-20). Defaults to 6.")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

/// One ranked match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub uid: u64,
    pub scope: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub score: i64,
    pub reasons: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntriesOutput {
    pub query: String,
    pub scopes: Vec<String>,
    pub total_matched: usize,
    pub matches: Vec<SearchMatch>,
    #[serde(skip)]
    pub keys: Vec<EntryKey>,
}

/// Rank entries in the resolved scopes against `args.query`.
///
/// Ordering is descending score, then descending `order`, then ascending scope, then
/// ascending uid.
pub fn search_entries(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    args: &SearchEntriesArgs,
) -> ToolResult<SearchEntriesOutput> {
    let query = args.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ToolError::InvalidArgument("query must not be empty".into()));
    }
    let scopes = resolve_scopes(catalog, allowed, args.scope.as_deref())?;
    let limit = clamp_arg(args.limit, DEFAULT_LIMIT, 1, MAX_LIMIT);

    let query_norm = normalize_text(query);
    let tokens = tokenize(query);

    let mut scored: Vec<(&CatalogEntry, i64, Vec<String>)> = Vec::new();
    for scope in &scopes {
        for key in catalog.keys_in_scope(scope) {
            let Some(entry) = catalog.get(key) else { continue };
            let (score, reasons) = score_entry(entry, &query_norm, &tokens);
            if score > 0 {
                scored.push((entry, score, reasons));
            }
        }
    }

    scored.sort_by(|a, b| compare_ranked(a.0, a.1, b.0, b.1));
    let total_matched = scored.len();
    scored.truncate(limit);

    let keys = scored.iter().map(|(e, _, _)| e.key.clone()).collect();
    let matches = scored
        .into_iter()
        .map(|(entry, score, reasons)| SearchMatch {
            uid: entry.uid(),
            scope: entry.scope().to_string(),
            title: entry.display_title(),
            keywords: entry.keywords.clone(),
            score,
            reasons: reasons.join(", "),
            snippet: snippet(entry, &tokens),
        })
        .collect();

    Ok(SearchEntriesOutput {
        query: query.to_string(),
        scopes,
        total_matched,
        matches,
        keys,
    })
}

fn compare_ranked(a: &CatalogEntry, score_a: i64, b: &CatalogEntry, score_b: i64) -> Ordering {
    score_b
        .cmp(&score_a)
        .then_with(|| b.order.cmp(&a.order))
        .then_with(|| a.scope().cmp(b.scope()))
        .then_with(|| a.uid().cmp(&b.uid()))
}

/// Additive relevance score and the reasons that produced it.
pub fn score_entry(entry: &CatalogEntry, query_norm: &str, tokens: &[String]) -> (i64, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if !entry.title_norm.is_empty() && query_norm.contains(entry.title_norm.as_str()) {
        score += TITLE_PHRASE_SCORE;
        reasons.push("title in query".to_string());
    }

    for keyword in &entry.keywords {
        if tokens.iter().any(|t| t == keyword) {
            score += KEYWORD_TOKEN_SCORE;
            reasons.push(format!("keyword \"{keyword}\""));
        } else if query_norm.contains(keyword.as_str()) {
            score += KEYWORD_PHRASE_SCORE;
            reasons.push(format!("keyword phrase \"{keyword}\""));
        }
    }

    for token in tokens {
        if token.chars().count() < MIN_SUBSTRING_TOKEN_CHARS {
            continue;
        }
        if entry.title_norm.contains(token.as_str()) {
            score += TITLE_TOKEN_SCORE;
            reasons.push(format!("title contains \"{token}\""));
        } else if entry.content_norm.contains(token.as_str()) {
            score += CONTENT_TOKEN_SCORE;
            reasons.push(format!("content contains \"{token}\""));
        }
    }

    (score, reasons)
}

/// Excerpt starting 80 characters before the earliest query token hit (or at the start),
/// capped at 260 characters with a trailing `...` when cut.
pub fn snippet(entry: &CatalogEntry, tokens: &[String]) -> String {
    let start = find_first_char_index(&entry.content, tokens)
        .map(|idx| idx.saturating_sub(SNIPPET_LEAD_CHARS))
        .unwrap_or(0);
    let tail: String = entry.content.chars().skip(start).collect();
    excerpt(&tail, SNIPPET_MAX_CHARS)
}
