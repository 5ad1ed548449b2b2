//! Planner-driven retrieval over a per-request lore catalog.
//!
//! - [`catalog`] builds the immutable index and the per-scope link graph
//! - [`search`], [`neighbors`], [`entry`] are the three retrieval tools
//! - [`tools`] exposes their schema and dispatches planner calls
//! - [`context`] renders selected entries into a bounded markdown document
//! - [`orchestrator`] runs the budgeted planner loop

pub mod catalog;
pub mod context;
pub mod entry;
pub mod error;
pub mod neighbors;
pub mod orchestrator;
pub mod planner;
pub mod resolve;
pub mod search;
pub mod text;
pub mod tools;

pub use catalog::{build_catalog, CatalogEntry, EntryKey, RetrievalToolCatalog};
pub use error::ToolError;
pub use orchestrator::{
    run_retrieval, RetrievalLimits, RetrievalRequest, RetrievalToolRunResult, StopReason,
};
pub use planner::{CancellationToken, Planner, PlannerMessage, PlannerRequest, PlannerResponse, ToolCall};
pub use tools::{execute_tool_call, tool_definitions, ToolExecutionResult};
