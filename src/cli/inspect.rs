//! CLI `inspect` command: display full details for a single entry.

use anyhow::Result;

use loregraph::config::LoreConfig;
use loregraph::retrieval::entry::{get_entry, GetEntryArgs};

/// Inspect a single entry by uid and display its details.
pub fn inspect(
    config: &LoreConfig,
    uid: i64,
    scope: Option<String>,
    chars: Option<i64>,
) -> Result<()> {
    let (catalog, allowed) = super::load_catalog(config)?;

    let args = GetEntryArgs {
        uid: Some(uid),
        scope,
        content_chars: chars,
    };
    let e = get_entry(&catalog, &allowed, &args)?;

    println!("Entry: {}#{}", e.scope, e.uid);
    println!("{}", "=".repeat(50));
    println!("  Title:          {}", e.title);
    if e.keywords.is_empty() {
        println!("  Keywords:       (none)");
    } else {
        println!("  Keywords:       {}", e.keywords.join(", "));
    }
    println!("  Order:          {}", e.order);
    println!();
    println!("Content:");
    println!("  {}", e.content);
    if e.content_truncated {
        println!("  [truncated]");
    }

    if !e.neighbors.is_empty() {
        println!();
        println!("Links:");
        for n in &e.neighbors {
            println!("  --> [{}] {} (#{})", n.scope, n.title, n.uid);
        }
    }

    Ok(())
}
