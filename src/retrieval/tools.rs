//! Tool schema exposed to the planner and the dispatcher that executes its calls.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::catalog::{EntryKey, RetrievalToolCatalog};
use super::entry::{get_entry, GetEntryArgs};
use super::error::{ToolError, ToolErrorPayload, ToolResult};
use super::neighbors::{expand_neighbors, ExpandNeighborsArgs};
use super::planner::ToolCall;
use super::search::{search_entries, SearchEntriesArgs};

/// The retrieval tools a planner may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTool {
    SearchEntries,
    ExpandNeighbors,
    GetEntry,
}

impl RetrievalTool {
    pub const ALL: [RetrievalTool; 3] = [Self::SearchEntries, Self::ExpandNeighbors, Self::GetEntry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchEntries => "search_entries",
            Self::ExpandNeighbors => "expand_neighbors",
            Self::GetEntry => "get_entry",
        }
    }
}

impl std::fmt::Display for RetrievalTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RetrievalTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// Outcome of one tool call, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct ToolExecutionResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorPayload>,
    /// Catalog keys this call surfaced, for context selection.
    #[serde(skip)]
    pub keys: Vec<EntryKey>,
    /// One-line summary for the run trace.
    #[serde(skip)]
    pub trace: String,
}

impl ToolExecutionResult {
    fn success(result: Value, keys: Vec<EntryKey>, trace: String) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            keys,
            trace,
        }
    }

    fn failure(tool: &str, err: &ToolError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(err.payload()),
            keys: Vec::new(),
            trace: format!("{tool} failed: {err}"),
        }
    }

    /// JSON body of the tool turn handed back to the planner.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            json!({ "ok": false, "error": { "code": "internal", "message": e.to_string() } })
                .to_string()
        })
    }
}

/// JSON-schema definitions of the three retrieval tools, with their parameter bounds.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": RetrievalTool::SearchEntries.as_str(),
            "description": "Rank lore entries in the active scopes by title, keyword and content matches against a free-text query. Returns previews with snippets.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1, "description": "Free-text query." },
                    "scope": { "type": "string", "description": "Limit the search to one active scope. Omit to search all." },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 20, "default": 6 }
                },
                "required": ["query"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": RetrievalTool::ExpandNeighbors.as_str(),
            "description": "Follow [[links]] outward from an entry, breadth-first, and list the entries reached with their distance and path.",
            "parameters": {
                "type": "object",
                "properties": {
                    "uid": { "type": "integer", "minimum": 0, "description": "uid of the source entry." },
                    "scope": { "type": "string", "description": "Scope of the source entry when the uid is ambiguous." },
                    "depth": { "type": "integer", "minimum": 1, "maximum": 3, "default": 1 },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 20, "default": 8 }
                },
                "required": ["uid"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": RetrievalTool::GetEntry.as_str(),
            "description": "Fetch one entry: identity, keywords, order weight, a content excerpt and up to 8 linked entries.",
            "parameters": {
                "type": "object",
                "properties": {
                    "uid": { "type": "integer", "minimum": 0, "description": "uid of the entry." },
                    "scope": { "type": "string", "description": "Scope of the entry when the uid is ambiguous." },
                    "contentChars": { "type": "integer", "minimum": 120, "maximum": 5000, "default": 1200 }
                },
                "required": ["uid"],
                "additionalProperties": false
            }
        }),
    ]
}

/// Execute a planner tool call. Never fails: errors become failed results.
pub fn execute_tool_call(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    call: &ToolCall,
) -> ToolExecutionResult {
    execute_tool(catalog, allowed, &call.name, &call.arguments)
}

/// Execute `name` with a serialized JSON-object argument string.
pub fn execute_tool(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    name: &str,
    arguments: &str,
) -> ToolExecutionResult {
    let tool = match name.parse::<RetrievalTool>() {
        Ok(tool) => tool,
        Err(e) => return ToolExecutionResult::failure(name, &ToolError::InvalidArgument(e)),
    };

    let outcome = match tool {
        RetrievalTool::SearchEntries => parse_args::<SearchEntriesArgs>(arguments)
            .and_then(|args| search_entries(catalog, allowed, &args))
            .and_then(|out| {
                let trace = format!(
                    "search_entries \"{}\" [{}] -> {}/{} match(es)",
                    out.query,
                    out.scopes.join(", "),
                    out.matches.len(),
                    out.total_matched
                );
                let keys = out.keys.clone();
                Ok((to_value(&out)?, keys, trace))
            }),
        RetrievalTool::ExpandNeighbors => parse_args::<ExpandNeighborsArgs>(arguments)
            .and_then(|args| expand_neighbors(catalog, allowed, &args))
            .and_then(|out| {
                let trace = format!(
                    "expand_neighbors {}#{} depth={} -> {} neighbor(s)",
                    out.source.scope,
                    out.source.uid,
                    out.depth,
                    out.neighbors.len()
                );
                let keys = out.keys.clone();
                Ok((to_value(&out)?, keys, trace))
            }),
        RetrievalTool::GetEntry => parse_args::<GetEntryArgs>(arguments)
            .and_then(|args| get_entry(catalog, allowed, &args))
            .and_then(|out| {
                let trace = format!(
                    "get_entry {}#{} -> {} char(s){}",
                    out.scope,
                    out.uid,
                    out.content.chars().count(),
                    if out.content_truncated { ", truncated" } else { "" }
                );
                let keys = out.keys.clone();
                Ok((to_value(&out)?, keys, trace))
            }),
    };

    match outcome {
        Ok((result, keys, trace)) => ToolExecutionResult::success(result, keys, trace),
        Err(err) => ToolExecutionResult::failure(tool.as_str(), &err),
    }
}

/// Parse an argument string that must hold a JSON object.
pub fn parse_args<T: DeserializeOwned>(arguments: &str) -> ToolResult<T> {
    let value: Value = serde_json::from_str(arguments)
        .map_err(|e| ToolError::InvalidArgument(format!("arguments are not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ToolError::InvalidArgument(
            "arguments must be a JSON object".into(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArgument(e.to_string()))
}

fn to_value<T: Serialize>(out: &T) -> ToolResult<Value> {
    serde_json::to_value(out)
        .map_err(|e| ToolError::InvalidArgument(format!("unserializable result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lore::types::{LoreEntry, ScopeEntries};
    use crate::retrieval::catalog::build_catalog;

    fn catalog() -> RetrievalToolCatalog {
        build_catalog(&[ScopeEntries::new(
            "world",
            vec![
                LoreEntry::new(1, "Alice", "A knight.").with_keys(["Alice"]),
                LoreEntry::new(2, "Bob", "Squire to [[Alice]].").with_keys(["Bob"]).with_wikilinks(["Alice"]),
            ],
        )])
    }

    fn world() -> Vec<String> {
        vec!["world".to_string()]
    }

    #[test]
    fn definitions_cover_all_tools_with_bounds() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().filter_map(|d| d["name"].as_str()).collect();
        assert_eq!(names, vec!["search_entries", "expand_neighbors", "get_entry"]);
        assert_eq!(defs[0]["parameters"]["properties"]["limit"]["maximum"], 20);
        assert_eq!(defs[1]["parameters"]["properties"]["depth"]["maximum"], 3);
        assert_eq!(defs[2]["parameters"]["properties"]["contentChars"]["minimum"], 120);
        assert_eq!(RetrievalTool::ALL.len(), defs.len());
        for tool in RetrievalTool::ALL {
            assert_eq!(tool.as_str().parse::<RetrievalTool>(), Ok(tool));
        }
        assert!(" get_entry ".parse::<RetrievalTool>().is_ok());
    }

    #[test]
    fn successful_call_reports_keys_and_trace() {
        let result = execute_tool(&catalog(), &world(), "expand_neighbors", r#"{"uid": 2}"#);
        assert!(result.ok);
        assert_eq!(result.keys, vec![EntryKey::new("world", 1)]);
        assert_eq!(result.trace, "expand_neighbors world#2 depth=1 -> 1 neighbor(s)");
        let body: Value = serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["result"]["neighbors"][0]["uid"], 1);
    }

    #[test]
    fn non_object_arguments_are_invalid() {
        for args in ["[1, 2]", "\"uid\"", "not json", ""] {
            let result = execute_tool(&catalog(), &world(), "get_entry", args);
            assert!(!result.ok, "{args} should fail");
            assert_eq!(result.error.as_ref().unwrap().code, "invalid_argument");
            assert!(result.keys.is_empty());
        }
    }

    #[test]
    fn wrongly_typed_field_is_invalid() {
        let result = execute_tool(&catalog(), &world(), "search_entries", r#"{"query": 5}"#);
        assert_eq!(result.error.unwrap().code, "invalid_argument");
    }

    #[test]
    fn unknown_tool_is_invalid() {
        let result = execute_tool(&catalog(), &world(), "delete_everything", "{}");
        assert!(!result.ok);
        assert!(result.trace.starts_with("delete_everything failed"));
    }

    #[test]
    fn failure_body_carries_error_code() {
        let call = ToolCall::new("c1", "search_entries", r#"{"query": "alice", "scope": "mars"}"#);
        let result = execute_tool_call(&catalog(), &world(), &call);
        let body: Value = serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "scope_not_active");
        assert!(body.get("result").is_none());
    }
}
