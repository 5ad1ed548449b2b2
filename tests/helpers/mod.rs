#![allow(dead_code)]

use async_trait::async_trait;
use loregraph::lore::types::{LoreEntry, ScopeEntries};
use loregraph::retrieval::{
    build_catalog, Planner, PlannerMessage, PlannerRequest, PlannerResponse, RetrievalLimits,
    RetrievalToolCatalog, ToolCall,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// The two-entry world used across tests: Bob links to Alice.
pub fn alice_bob() -> Vec<LoreEntry> {
    vec![
        LoreEntry::new(1, "Alice", "Alice is a knight of the northern keep.").with_keys(["Alice"]),
        LoreEntry::new(2, "Bob", "Bob serves as squire to [[Alice]].")
            .with_keys(["Bob"])
            .with_wikilinks(["Alice"]),
    ]
}

/// Catalog with a single `world` scope holding [`alice_bob`].
pub fn world_catalog() -> RetrievalToolCatalog {
    build_catalog(&[ScopeEntries::new("world", alice_bob())])
}

/// Catalog with `count` link-free entries whose content is `chars` characters long.
pub fn padded_catalog(count: u64, chars: usize) -> RetrievalToolCatalog {
    let entries = (1..=count)
        .map(|uid| {
            LoreEntry::new(uid, format!("Entry {uid}"), "x".repeat(chars))
                .with_keys([format!("k{uid}")])
        })
        .collect();
    build_catalog(&[ScopeEntries::new("world", entries)])
}

pub fn world() -> Vec<String> {
    vec!["world".to_string()]
}

pub fn limits(max_calls: usize, max_result_tokens: usize) -> RetrievalLimits {
    RetrievalLimits {
        max_calls,
        max_result_tokens,
        max_planning_time: Duration::from_secs(10),
        max_injected_entries: 12,
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall::new(id, name, arguments)
}

/// Returns one scripted round per `plan` call, then an empty response.
pub struct ScriptedPlanner {
    rounds: Mutex<VecDeque<Vec<ToolCall>>>,
    pub calls: AtomicUsize,
}

impl ScriptedPlanner {
    pub fn new(rounds: Vec<Vec<ToolCall>>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn times_called(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, _request: PlannerRequest<'_>) -> anyhow::Result<PlannerResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
        Ok(PlannerResponse {
            assistant_text: String::new(),
            tool_calls: next,
            finish_reason: None,
        })
    }
}

/// Plans `rounds_before_failure` scripted rounds, then errors.
pub struct FailingPlanner {
    pub script: ScriptedPlanner,
    pub rounds_before_failure: usize,
}

#[async_trait]
impl Planner for FailingPlanner {
    async fn plan(&self, request: PlannerRequest<'_>) -> anyhow::Result<PlannerResponse> {
        if self.script.times_called() >= self.rounds_before_failure {
            anyhow::bail!("upstream model unavailable");
        }
        self.script.plan(request).await
    }
}

/// Sleeps before answering with the wrapped script.
pub struct SlowPlanner {
    pub delay: Duration,
    pub script: ScriptedPlanner,
}

#[async_trait]
impl Planner for SlowPlanner {
    async fn plan(&self, request: PlannerRequest<'_>) -> anyhow::Result<PlannerResponse> {
        tokio::time::sleep(self.delay).await;
        self.script.plan(request).await
    }
}

/// Cancels the run's token from inside `plan`, then returns the wrapped script.
pub struct CancellingPlanner {
    pub script: ScriptedPlanner,
}

#[async_trait]
impl Planner for CancellingPlanner {
    async fn plan(&self, request: PlannerRequest<'_>) -> anyhow::Result<PlannerResponse> {
        request.cancellation.cancel();
        self.script.plan(request).await
    }
}

/// Keeps a copy of the transcript it was shown on every round.
pub struct RecordingPlanner {
    pub script: ScriptedPlanner,
    pub seen: Mutex<Vec<Vec<PlannerMessage>>>,
}

impl RecordingPlanner {
    pub fn new(rounds: Vec<Vec<ToolCall>>) -> Self {
        Self {
            script: ScriptedPlanner::new(rounds),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn transcripts(&self) -> Vec<Vec<PlannerMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for RecordingPlanner {
    async fn plan(&self, request: PlannerRequest<'_>) -> anyhow::Result<PlannerResponse> {
        self.seen.lock().unwrap().push(request.messages.to_vec());
        self.script.plan(request).await
    }
}
