use anyhow::Result;

use loregraph::config::LoreConfig;
use loregraph::retrieval::search::{search_entries, SearchEntriesArgs};

/// Run `search_entries` from the terminal.
pub fn search(
    config: &LoreConfig,
    query: &str,
    scope: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let (catalog, allowed) = super::load_catalog(config)?;

    let args = SearchEntriesArgs {
        query: Some(query.to_string()),
        scope,
        limit: Some(limit.unwrap_or(config.retrieval.default_search_limit)),
    };
    let response = search_entries(&catalog, &allowed, &args)?;

    if response.matches.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!(
        "Found {} match(es) in [{}], showing {}\n",
        response.total_matched,
        response.scopes.join(", "),
        response.matches.len()
    );

    for (i, m) in response.matches.iter().enumerate() {
        println!(
            "  {}. [{}] {} (#{}, score: {})",
            i + 1,
            m.scope,
            m.title,
            m.uid,
            m.score,
        );
        println!("     {}", m.reasons);
        if !m.snippet.is_empty() {
            println!("     {}", m.snippet);
        }
        println!();
    }

    Ok(())
}
