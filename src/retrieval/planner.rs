//! The planner seam: transcript types, the [`Planner`] trait, and cooperative
//! cancellation.
//!
//! A planner is anything that reads a transcript plus tool definitions and answers with
//! text and/or tool calls, usually a language model behind an HTTP API. The orchestrator
//! only depends on this trait, so tests drive it with scripted fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag shared between the caller and the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A tool invocation requested by the planner. `arguments` is a serialized JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One turn of the planning transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum PlannerMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

/// Everything a planner gets for one round.
#[derive(Debug, Clone)]
pub struct PlannerRequest<'a> {
    pub messages: &'a [PlannerMessage],
    pub tool_definitions: &'a [Value],
    /// Remaining wall-clock budget. A hint; the orchestrator re-checks on return.
    pub timeout: Duration,
    pub cancellation: &'a CancellationToken,
}

/// A planner's answer for one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerResponse {
    pub assistant_text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

/// Decides which retrieval tools to call next.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: PlannerRequest<'_>) -> Result<PlannerResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn messages_serialize_with_role_tag() {
        let msg = PlannerMessage::Tool {
            call_id: "c1".into(),
            name: "get_entry".into(),
            content: "{}".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["call_id"], "c1");
    }
}
