//! Context assembly: render selected entries into one token-bounded markdown document.

use serde::Serialize;

use super::catalog::{CatalogEntry, EntryKey, RetrievalToolCatalog};
use super::text::estimate_tokens;

const DOCUMENT_HEADER: &str = "# Retrieved lore\n\n";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledContext {
    pub markdown: String,
    pub used_tokens: usize,
    /// `[scope] Title (#uid)` labels of the included entries, in document order.
    pub selected: Vec<String>,
    pub keys: Vec<EntryKey>,
}

/// Render one entry section.
pub fn render_section(entry: &CatalogEntry) -> String {
    let keywords = if entry.keywords.is_empty() {
        "(none)".to_string()
    } else {
        entry.keywords.join(", ")
    };
    format!(
        "## [{}] {}\n- uid: {}\n- keywords: {}\n\n{}\n\n",
        entry.scope(),
        entry.display_title(),
        entry.uid(),
        keywords,
        entry.content.trim(),
    )
}

/// Walk the first `max_entries` keys and keep every section that still fits the budget.
///
/// Sections that would overflow are skipped, not truncated, and later (smaller) ones may
/// still fit. The document header is charged with the first accepted section. Unknown
/// keys are ignored. When nothing fits the result is empty with zero usage.
pub fn assemble_context(
    catalog: &RetrievalToolCatalog,
    keys: &[EntryKey],
    max_entries: usize,
    token_budget: usize,
) -> AssembledContext {
    let header_tokens = estimate_tokens(DOCUMENT_HEADER);
    let mut out = AssembledContext::default();
    let mut sections = String::new();

    for key in keys.iter().take(max_entries) {
        let Some(entry) = catalog.get(key) else { continue };
        let section = render_section(entry);
        let mut cost = estimate_tokens(&section);
        if out.keys.is_empty() {
            cost += header_tokens;
        }
        if out.used_tokens + cost > token_budget {
            tracing::debug!(key = %key, cost, "context section skipped, over budget");
            continue;
        }
        out.used_tokens += cost;
        sections.push_str(&section);
        out.selected.push(entry.label());
        out.keys.push(key.clone());
    }

    if !out.keys.is_empty() {
        out.markdown = format!("{DOCUMENT_HEADER}{}", sections.trim_end());
    }
    out
}
