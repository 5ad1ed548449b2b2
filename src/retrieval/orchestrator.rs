//! The budget-governed retrieval loop.
//!
//! Each round the planner sees the transcript so far and may request tool calls. Calls run
//! in order against the catalog; their results are appended as tool turns and the keys
//! they surface are collected in first-seen order. The loop stops when the planner asks
//! for nothing, a cap is hit, time runs out, the caller cancels, or the planner fails.
//! Whatever was collected is then assembled into the context document.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::catalog::{EntryKey, RetrievalToolCatalog};
use super::context::assemble_context;
use super::planner::{CancellationToken, Planner, PlannerMessage, PlannerRequest, ToolCall};
use super::text::estimate_tokens;
use super::tools::{execute_tool_call, tool_definitions, RetrievalTool};
use crate::config::RetrievalConfig;
use crate::lore::normalize_scope;

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The planner requested no (recognized) tool calls.
    Completed,
    CallLimit,
    ResultTokenLimit,
    TimeLimit,
    Aborted,
    PlannerError,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CallLimit => "call_limit",
            Self::ResultTokenLimit => "result_token_limit",
            Self::TimeLimit => "time_limit",
            Self::Aborted => "aborted",
            Self::PlannerError => "planner_error",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caps for one retrieval run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalLimits {
    pub max_calls: usize,
    pub max_result_tokens: usize,
    pub max_planning_time: Duration,
    pub max_injected_entries: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl RetrievalLimits {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            max_calls: config.max_calls,
            max_result_tokens: config.max_result_tokens,
            max_planning_time: Duration::from_millis(config.max_planning_time_ms),
            max_injected_entries: config.max_injected_entries,
        }
    }

    /// Count caps below 1 are raised to 1.
    pub fn normalized(self) -> Self {
        Self {
            max_calls: self.max_calls.max(1),
            max_result_tokens: self.max_result_tokens.max(1),
            max_planning_time: self.max_planning_time,
            max_injected_entries: self.max_injected_entries.max(1),
        }
    }
}

/// Inputs for [`run_retrieval`].
#[derive(Debug, Clone, Copy)]
pub struct RetrievalRequest<'a> {
    pub query: &'a str,
    /// Requested scopes. Empty means every scope in the catalog.
    pub scopes: &'a [String],
    pub context_token_budget: usize,
    pub catalog: &'a RetrievalToolCatalog,
    pub limits: RetrievalLimits,
}

/// Final output of a retrieval run. Always produced, whatever the stop reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalToolRunResult {
    pub markdown: String,
    pub used_tokens: usize,
    pub selected_items: Vec<String>,
    pub trace: Vec<String>,
    pub executed_calls: usize,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_planner_error: Option<String>,
}

/// Requested scopes that exist in the catalog, normalized, sorted and deduplicated.
/// An empty request selects every catalog scope.
pub fn resolve_active_scopes(catalog: &RetrievalToolCatalog, requested: &[String]) -> Vec<String> {
    let mut scopes: Vec<String> = if requested.is_empty() {
        catalog.scopes().map(str::to_string).collect()
    } else {
        requested
            .iter()
            .map(|s| normalize_scope(s))
            .filter(|s| catalog.has_scope(s))
            .collect()
    };
    scopes.sort();
    scopes.dedup();
    scopes
}

/// Drive `planner` until a stop condition, then assemble the gathered entries.
///
/// Never fails: planner errors, caps, timeouts and cancellation are reported through
/// [`RetrievalToolRunResult::stop_reason`] and the partial selection is still assembled.
pub async fn run_retrieval(
    request: RetrievalRequest<'_>,
    planner: &dyn Planner,
    cancellation: Option<&CancellationToken>,
) -> RetrievalToolRunResult {
    let limits = request.limits.normalized();
    let catalog = request.catalog;
    let started = Instant::now();
    let idle_token = CancellationToken::new();
    let cancel = cancellation.unwrap_or(&idle_token);

    let mut state = RunState::default();
    let allowed = resolve_active_scopes(catalog, request.scopes);
    if allowed.is_empty() {
        state.trace.push("no active scopes, planner not invoked".to_string());
        return state.finish(catalog, StopReason::Completed, &limits, request.context_token_budget);
    }

    info!(
        query_len = request.query.len(),
        scopes = allowed.len(),
        max_calls = limits.max_calls,
        "retrieval started"
    );

    let tool_defs = tool_definitions();
    let mut messages = vec![
        PlannerMessage::System {
            content: system_prompt(&limits),
        },
        PlannerMessage::User {
            content: user_prompt(request.query, &allowed),
        },
    ];

    let mut round = 0usize;
    let stop = loop {
        round += 1;

        if cancel.is_cancelled() {
            break StopReason::Aborted;
        }
        let remaining = limits.max_planning_time.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break StopReason::TimeLimit;
        }

        let planned = planner
            .plan(PlannerRequest {
                messages: &messages,
                tool_definitions: &tool_defs,
                timeout: remaining,
                cancellation: cancel,
            })
            .await;
        let response = match planned {
            Ok(response) => response,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(round, error = %message, "planner failed");
                state.trace.push(format!("round {round}: planner error: {message}"));
                state.last_planner_error = Some(message);
                break StopReason::PlannerError;
            }
        };

        if cancel.is_cancelled() {
            break StopReason::Aborted;
        }
        if started.elapsed() >= limits.max_planning_time {
            state.trace.push(format!("round {round}: planner returned after the time budget"));
            break StopReason::TimeLimit;
        }

        let calls: Vec<ToolCall> = response
            .tool_calls
            .into_iter()
            .filter(|call| call.name.parse::<RetrievalTool>().is_ok())
            .collect();
        if calls.is_empty() {
            state.trace.push(format!("round {round}: planner requested no tool calls"));
            break StopReason::Completed;
        }

        debug!(round, calls = calls.len(), "planner proposed tool calls");
        state.trace.push(format!("round {round}: planner requested {} call(s)", calls.len()));
        messages.push(PlannerMessage::Assistant {
            content: response.assistant_text,
            tool_calls: calls.clone(),
        });

        if let Some(reason) = state.execute_round(catalog, &allowed, &calls, &limits, &mut messages) {
            break reason;
        }
    };

    info!(
        stop_reason = %stop,
        executed_calls = state.executed_calls,
        selected = state.selected.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "retrieval finished"
    );
    state.finish(catalog, stop, &limits, request.context_token_budget)
}

#[derive(Default)]
struct RunState {
    executed_calls: usize,
    result_tokens: usize,
    selected: Vec<EntryKey>,
    seen: HashSet<EntryKey>,
    trace: Vec<String>,
    last_planner_error: Option<String>,
}

impl RunState {
    /// Run one round of calls. Returns the stop reason if a cap was hit.
    ///
    /// The call cap is checked before executing a call. The result-token cap is checked
    /// after executing but before committing; an offending result is discarded and does
    /// not count as executed.
    fn execute_round(
        &mut self,
        catalog: &RetrievalToolCatalog,
        allowed: &[String],
        calls: &[ToolCall],
        limits: &RetrievalLimits,
        messages: &mut Vec<PlannerMessage>,
    ) -> Option<StopReason> {
        for call in calls {
            if self.executed_calls >= limits.max_calls {
                self.trace
                    .push(format!("{} skipped: call limit {} reached", call.name, limits.max_calls));
                return Some(StopReason::CallLimit);
            }

            let result = execute_tool_call(catalog, allowed, call);
            let content = result.to_message_content();
            let tokens = estimate_tokens(&content);
            if self.result_tokens + tokens > limits.max_result_tokens {
                self.trace.push(format!(
                    "{} discarded: {tokens} result token(s) would exceed budget {}",
                    call.name, limits.max_result_tokens
                ));
                return Some(StopReason::ResultTokenLimit);
            }

            self.executed_calls += 1;
            self.result_tokens += tokens;
            debug!(tool = %call.name, ok = result.ok, tokens, "tool call executed");
            self.trace
                .push(format!("call {}: {}", self.executed_calls, result.trace));
            for key in result.keys {
                if self.seen.insert(key.clone()) {
                    self.selected.push(key);
                }
            }
            messages.push(PlannerMessage::Tool {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            });
        }
        None
    }

    fn finish(
        mut self,
        catalog: &RetrievalToolCatalog,
        stop: StopReason,
        limits: &RetrievalLimits,
        token_budget: usize,
    ) -> RetrievalToolRunResult {
        let context = assemble_context(
            catalog,
            &self.selected,
            limits.max_injected_entries,
            token_budget,
        );
        self.trace.push(format!(
            "stop: {stop} after {} call(s), {} of {} candidate(s) injected",
            self.executed_calls,
            context.keys.len(),
            self.selected.len()
        ));
        RetrievalToolRunResult {
            markdown: context.markdown,
            used_tokens: context.used_tokens,
            selected_items: context.selected,
            trace: self.trace,
            executed_calls: self.executed_calls,
            stop_reason: stop,
            last_planner_error: self.last_planner_error,
        }
    }
}

fn system_prompt(limits: &RetrievalLimits) -> String {
    format!(
        "You select lore entries to use as context for a writing task. \
         Use search_entries to find candidates, expand_neighbors to follow links between \
         entries, and get_entry to read one entry in full. Every entry a tool returns becomes \
         a context candidate, so prefer precise calls. You may make at most {} tool call(s) \
         in total. Reply without tool calls once you have enough material.",
        limits.max_calls
    )
}

fn user_prompt(query: &str, scopes: &[String]) -> String {
    format!(
        "Query:\n{}\n\nActive scopes: {}",
        query.trim(),
        scopes.join(", ")
    )
}
