use anyhow::Result;

use loregraph::config::LoreConfig;

/// Display catalog statistics in the terminal.
pub fn stats(config: &LoreConfig) -> Result<()> {
    let (catalog, _) = super::load_catalog(config)?;
    let per_scope = catalog.scope_stats();
    let edges: usize = per_scope.iter().map(|s| s.edges).sum();

    println!("Catalog Statistics");
    println!("{}", "=".repeat(40));
    println!("  Lore directory:      {}", config.resolved_lore_dir().display());
    println!("  Scopes:              {}", per_scope.len());
    println!("  Entries:             {}", catalog.len());
    println!("  Link edges:          {edges}");
    println!();

    if !per_scope.is_empty() {
        println!("By Scope:");
        for s in &per_scope {
            println!("  {:<28} {:>5} entries  {:>5} links", s.scope, s.entries, s.edges);
        }
    }

    Ok(())
}
