use anyhow::{anyhow, Result};

use loregraph::config::LoreConfig;
use loregraph::retrieval::context::assemble_context;
use loregraph::retrieval::EntryKey;

/// Assemble a context document from explicit `scope#uid` keys and print it.
pub fn context(
    config: &LoreConfig,
    keys: &[String],
    budget: Option<usize>,
    max_entries: Option<usize>,
) -> Result<()> {
    let (catalog, _) = super::load_catalog(config)?;

    let keys = keys
        .iter()
        .map(|raw| {
            raw.parse::<EntryKey>()
                .map_err(|e| anyhow!("invalid entry key {raw:?}: {e}"))
        })
        .collect::<Result<Vec<_>>>()?;

    for key in &keys {
        if catalog.get(key).is_none() {
            tracing::warn!(key = %key, "entry not in catalog, skipping");
        }
    }

    let budget = budget.unwrap_or(config.retrieval.context_token_budget);
    let max_entries = max_entries
        .unwrap_or(config.retrieval.max_injected_entries)
        .max(1);
    let assembled = assemble_context(&catalog, &keys, max_entries, budget);

    if assembled.markdown.is_empty() {
        eprintln!("Nothing fit within {budget} token(s).");
        return Ok(());
    }

    println!("{}", assembled.markdown);
    eprintln!(
        "\n{} entr(ies), ~{} of {} token(s)",
        assembled.selected.len(),
        assembled.used_tokens,
        budget
    );

    Ok(())
}
