//! MCP surface for the retrieval tools.
//!
//! An MCP client acts as the planner: it calls `search_entries`, `expand_neighbors` and
//! `get_entry` directly. Every call reloads the lore directory and builds a fresh catalog,
//! with all loaded scopes active.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use std::sync::Arc;

use crate::config::LoreConfig;
use crate::lore::load::load_lore_dir;
use crate::retrieval::entry::{get_entry, GetEntryArgs};
use crate::retrieval::error::ToolResult;
use crate::retrieval::neighbors::{expand_neighbors, ExpandNeighborsArgs};
use crate::retrieval::orchestrator::resolve_active_scopes;
use crate::retrieval::search::{search_entries, SearchEntriesArgs};
use crate::retrieval::{build_catalog, RetrievalToolCatalog};

/// The loregraph MCP tool handler. Holds the config and exposes the retrieval tools via
/// the `#[tool_router]` macro.
#[derive(Clone)]
pub struct LoreTools {
    tool_router: ToolRouter<Self>,
    config: Arc<LoreConfig>,
}

#[tool_router]
impl LoreTools {
    pub fn new(config: Arc<LoreConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    /// Rank lore entries against a free-text query.
    #[tool(description = "Search lore entries by free-text query. Scores title, keyword and content matches; returns ranked previews with snippets.")]
    async fn search_entries(
        &self,
        Parameters(mut params): Parameters<SearchEntriesArgs>,
    ) -> Result<String, String> {
        tracing::info!(query = ?params.query, scope = ?params.scope, "search_entries called");
        if params.limit.is_none() {
            params.limit = Some(self.config.retrieval.default_search_limit);
        }
        let (catalog, allowed) = self.snapshot().await?;
        respond(search_entries(&catalog, &allowed, &params))
    }

    /// Walk links outward from one entry.
    #[tool(description = "List entries linked from an entry via [[wikilinks]], breadth-first up to 3 hops, with distance and path.")]
    async fn expand_neighbors(
        &self,
        Parameters(params): Parameters<ExpandNeighborsArgs>,
    ) -> Result<String, String> {
        tracing::info!(uid = ?params.uid, depth = ?params.depth, "expand_neighbors called");
        let (catalog, allowed) = self.snapshot().await?;
        respond(expand_neighbors(&catalog, &allowed, &params))
    }

    /// Fetch one entry with a content excerpt.
    #[tool(description = "Fetch one lore entry by uid: keywords, order weight, content excerpt and linked entries.")]
    async fn get_entry(
        &self,
        Parameters(params): Parameters<GetEntryArgs>,
    ) -> Result<String, String> {
        tracing::info!(uid = ?params.uid, scope = ?params.scope, "get_entry called");
        let (catalog, allowed) = self.snapshot().await?;
        respond(get_entry(&catalog, &allowed, &params))
    }
}

impl LoreTools {
    /// Load the lore directory (blocking I/O → spawn_blocking) and build a catalog.
    async fn snapshot(&self) -> Result<(RetrievalToolCatalog, Vec<String>), String> {
        let lore_dir = self.config.resolved_lore_dir();
        let snapshot = tokio::task::spawn_blocking(move || load_lore_dir(&lore_dir))
            .await
            .map_err(|e| format!("load task failed: {e}"))?
            .map_err(|e| format!("failed to load lore: {e:#}"))?;
        let catalog = build_catalog(&snapshot);
        let allowed = resolve_active_scopes(&catalog, &[]);
        Ok((catalog, allowed))
    }
}

fn respond<T: Serialize>(outcome: ToolResult<T>) -> Result<String, String> {
    let output = outcome.map_err(|e| e.to_string())?;
    serde_json::to_string(&output).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_handler]
impl ServerHandler for LoreTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "loregraph serves a lore catalog. Use search_entries to find entries, \
                 expand_neighbors to follow links, and get_entry to read one entry."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
