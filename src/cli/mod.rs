//! Terminal commands that run the retrieval tools against the configured lore directory.

pub mod context;
pub mod inspect;
pub mod neighbors;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};

use loregraph::config::LoreConfig;
use loregraph::lore::load::load_lore_dir;
use loregraph::retrieval::orchestrator::resolve_active_scopes;
use loregraph::retrieval::{build_catalog, RetrievalToolCatalog};

/// Load the lore directory and build a catalog with every loaded scope active.
pub fn load_catalog(config: &LoreConfig) -> Result<(RetrievalToolCatalog, Vec<String>)> {
    let lore_dir = config.resolved_lore_dir();
    let snapshot = load_lore_dir(&lore_dir)
        .with_context(|| format!("failed to load lore from {}", lore_dir.display()))?;
    let catalog = build_catalog(&snapshot);
    let allowed = resolve_active_scopes(&catalog, &[]);
    tracing::debug!(entries = catalog.len(), scopes = allowed.len(), "catalog built");
    Ok((catalog, allowed))
}
