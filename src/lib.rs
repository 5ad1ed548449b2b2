//! Planner-driven retrieval over lore catalogs, served via MCP.
//!
//! loregraph loads lorebooks (JSON files of titled, keyworded entries) from a directory,
//! builds a deterministic catalog with a per-scope link graph from `[[wikilinks]]`, and
//! exposes three read-only tools over it. A planner (an LLM behind the [`retrieval::Planner`]
//! trait, or any MCP client) calls the tools to decide which entries belong in a prompt; the
//! orchestrator enforces call, token and time budgets and assembles the picks into a bounded
//! markdown context.
//!
//! | Tool | Purpose | Key limits |
//! |------|---------|------------|
//! | **search_entries** | Rank entries against a free-text query | limit 1-20, default 6 |
//! | **expand_neighbors** | Breadth-first walk over links | depth 1-3, limit 1-20 |
//! | **get_entry** | Fetch one entry with a content excerpt | 120-5000 chars |
//!
//! # Architecture
//!
//! - **Storage**: plain lorebook JSON files, reloaded per request; no database
//! - **Search**: lexical scoring over titles, keywords and content
//! - **Orchestration**: budgeted tool-calling loop with cooperative cancellation
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`lore`]: Lorebook types, directory loading and wikilink extraction
//! - [`retrieval`]: Catalog, tools, context assembler and orchestrator
//! - [`server`]: MCP server over stdio or HTTP
//! - [`tools`]: MCP tool handler wrapping the retrieval tools

pub mod config;
pub mod lore;
pub mod retrieval;
pub mod server;
pub mod tools;
