//! The research orchestration loop.
//!
//! One `run()` is one session: seed the conversation with the task, then
//! iterate — compress history on schedule, call the engine, execute whatever
//! tools it asks for, feed results back — until the engine finishes, the
//! iteration cap trips, or a cancellation lands. At termination the session
//! record is assembled, persisted, costed, and exported best-effort.
//!
//! Failure discipline:
//! - engine rate limiting retries with linear capped backoff, bounded;
//! - any other engine failure is fatal and the session is NOT persisted;
//! - a failing tool call becomes an error-flagged result in the conversation
//!   and never aborts the iteration;
//! - memory-write and export failures are logged and absorbed — the answer
//!   the user already paid for is never discarded.

use prospector_core::criteria::CriteriaSet;
use prospector_core::engine::{EngineRequest, EngineResponse, ReasoningEngine};
use prospector_core::error::{EngineError, Error};
use prospector_core::message::Message;
use prospector_core::session::{CostEstimate, Session, SessionState, SessionStatus};
use prospector_core::text::{truncate, truncate_with_notice};
use prospector_core::tool::ToolRequest;
use prospector_core::collab::ExportSink;
use prospector_memory::ResearchMemory;
use prospector_telemetry::{PricingTable, UsageTotals};
use prospector_tools::ToolGateway;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::compressor::HistoryCompressor;

/// Tunables for one runner instance.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub model: String,
    pub max_iterations: u32,
    pub compress_every: u32,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
    pub retry_backoff_cap_secs: u64,
    pub tool_output_cap: usize,
    pub conclusion_cap: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub context_sessions: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_iterations: 10,
            compress_every: 3,
            max_retries: 5,
            retry_backoff_secs: 3,
            retry_backoff_cap_secs: 30,
            tool_output_cap: 6000,
            conclusion_cap: 2000,
            max_tokens: 4096,
            temperature: 0.3,
            context_sessions: 5,
        }
    }
}

/// External stop signal, checked between iterations and before finalization.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one session produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: String,
    pub iterations: u32,
    pub tool_calls: u32,
    pub candidates_evaluated: usize,
    pub cost: Option<CostEstimate>,
    pub export_ref: Option<String>,
}

/// The orchestration loop, wired to its injected collaborators.
pub struct ResearchRunner {
    engine: Arc<dyn ReasoningEngine>,
    gateway: ToolGateway,
    memory: ResearchMemory,
    compressor: HistoryCompressor,
    export: Option<Arc<dyn ExportSink>>,
    pricing: PricingTable,
    settings: RunnerSettings,
    cancel: CancelHandle,
}

impl ResearchRunner {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        gateway: ToolGateway,
        memory: ResearchMemory,
        compressor: HistoryCompressor,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            engine,
            gateway,
            memory,
            compressor,
            export: None,
            pricing: PricingTable::with_defaults(),
            settings,
            cancel: CancelHandle::new(),
        }
    }

    /// Attach the best-effort export sink.
    pub fn with_export(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.export = Some(sink);
        self
    }

    /// Replace the pricing table (config overrides).
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Share an externally created cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle the front end uses to stop this runner between iterations.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one research session to completion.
    pub async fn run(&self, task: &str, criteria: CriteriaSet) -> Result<RunReport, Error> {
        criteria.validate()?;

        info!(task = %truncate(task, 120), "Starting research session");

        let memory_context = self
            .memory
            .recall(task, self.settings.context_sessions);
        let instructions = build_instructions(&criteria, &memory_context);
        let tools = ToolRequest::definitions();

        let mut conversation = vec![Message::user(task)];
        let mut state = SessionState::default();
        let mut usage = UsageTotals::default();
        let mut tool_calls: u32 = 0;
        let mut iterations: u32 = 0;
        let mut finished: Option<String> = None;

        for iteration in 1..=self.settings.max_iterations {
            if self.cancel.is_cancelled() {
                info!(iteration, "Session cancelled before iteration");
                break;
            }
            iterations = iteration;

            // Compression boundary: every `compress_every` iterations, never
            // on the first.
            if iteration > 1 && (iteration - 1) % self.settings.compress_every == 0 {
                conversation = self.compressor.compress(&conversation).await;
            }

            let request = EngineRequest {
                model: self.settings.model.clone(),
                instructions: instructions.clone(),
                messages: conversation.clone(),
                tools: tools.clone(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };

            let response = self.complete_with_retry(request).await?;
            if let Some(u) = &response.usage {
                usage.record(u);
            }

            if !response.message.wants_tools() {
                // finish intent — terminal text is the answer
                finished = Some(response.message.content.clone());
                conversation.push(response.message);
                break;
            }

            debug!(
                iteration,
                requested = response.message.tool_calls.len(),
                "Executing tool calls"
            );

            let calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            // Strictly sequential, in request order: the engine correlates
            // results by call id, and ordering keeps that unambiguous.
            for call in &calls {
                tool_calls += 1;
                let result = match ToolRequest::parse(&call.name, &call.arguments) {
                    Ok(request) => match self.gateway.invoke(&request, &mut state).await {
                        Ok(text) => {
                            truncate_with_notice(&text, self.settings.tool_output_cap)
                        }
                        Err(e) => {
                            warn!(tool = %call.name, error = %e, "Tool execution failed");
                            format!("Error: {e}")
                        }
                    },
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool call rejected");
                        format!("Error: {e}")
                    }
                };
                conversation.push(Message::tool_result(&call.id, result));
            }
        }

        let (conclusion, status) = match finished {
            Some(answer) => (answer, SessionStatus::Completed),
            None if self.cancel.is_cancelled() => (
                format!(
                    "Research was stopped early after {iterations} iteration(s); {} candidate(s) \
                     evaluated so far.",
                    state.candidates.len()
                ),
                SessionStatus::Cancelled,
            ),
            None => (
                format!(
                    "Reached the iteration cap ({}) without a final answer; {} candidate(s) \
                     evaluated so far.",
                    self.settings.max_iterations,
                    state.candidates.len()
                ),
                SessionStatus::Exhausted,
            ),
        };

        let cost = self.pricing.estimate(&self.settings.model, &usage);

        // A cancelled session with no work leaves no trace; anything else is
        // persisted exactly once, under its true status.
        let persist = status != SessionStatus::Cancelled || state.has_work();
        let mut export_ref = None;
        let candidates_evaluated;

        if persist {
            let session = Session::assemble(
                task,
                criteria,
                state,
                truncate(&conclusion, self.settings.conclusion_cap),
                status,
            );
            candidates_evaluated = session.candidates.len();

            if let Err(e) = self.memory.save_session(&session) {
                error!(error = %e, "Failed to persist session; continuing with the answer");
            }

            if status != SessionStatus::Cancelled {
                export_ref = self.try_export(&session, &cost).await;
            }
        } else {
            candidates_evaluated = 0;
        }

        info!(
            iterations,
            tool_calls,
            candidates_evaluated,
            status = ?status,
            usd = cost.usd,
            "Research session finished"
        );

        Ok(RunReport {
            answer: conclusion,
            iterations,
            tool_calls,
            candidates_evaluated,
            cost: Some(cost),
            export_ref,
        })
    }

    /// Engine call with bounded retry on rate limiting only.
    async fn complete_with_retry(
        &self,
        request: EngineRequest,
    ) -> Result<EngineResponse, Error> {
        let mut attempt: u32 = 0;
        loop {
            match self.engine.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(EngineError::RateLimited { retry_after_secs }) => {
                    attempt += 1;
                    if attempt > self.settings.max_retries {
                        return Err(Error::Engine(EngineError::RateLimited {
                            retry_after_secs,
                        }));
                    }
                    let backoff = (self.settings.retry_backoff_secs * u64::from(attempt))
                        .max(retry_after_secs)
                        .min(self.settings.retry_backoff_cap_secs);
                    warn!(attempt, backoff_secs = backoff, "Engine rate limited, backing off");
                    tokio::time::sleep(std::time::Duration::from_secs(backoff)).await;
                }
                Err(e) => return Err(Error::Engine(e)),
            }
        }
    }

    /// Best-effort export: failure is logged, never surfaced.
    async fn try_export(&self, session: &Session, cost: &CostEstimate) -> Option<String> {
        let sink = self.export.as_ref()?;
        match sink.export(session, Some(cost)).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(error = %e, "Export failed; session result is unaffected");
                None
            }
        }
    }
}

/// The fixed instruction context for one session.
fn build_instructions(criteria: &CriteriaSet, memory_context: &str) -> String {
    format!(
        "You are an autonomous research agent. Work the task iteratively: search for \
         candidates, read and extract evidence from their pages, and evaluate each \
         concrete candidate against the checklist below. Call the evaluate tool exactly \
         once per candidate when you have enough evidence, then finish with a clear \
         recommendation naming the best candidate and why.\n\n\
         {checklist}\n\
         Context from previous research:\n{memory_context}\n\n\
         Rules:\n\
         - Verify hard criteria with evidence from pages, not search snippets alone.\n\
         - Prefer extract_page over read_page unless exact wording matters.\n\
         - If a tool fails or a backend is unavailable, adapt and continue with the rest.",
        checklist = criteria.render_checklist(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prospector_core::collab::{SearchProvider, Summarizer};
    use prospector_core::criteria::{HardCriterion, SoftCriterion};
    use prospector_core::engine::Usage;
    use prospector_core::error::{ExportError, ToolError};
    use prospector_core::message::ToolCall;
    use prospector_core::session::Verdict;
    use std::sync::Mutex;

    // ── Scripted collaborators ─────────────────────────────────────────

    type Step = Result<EngineResponse, EngineError>;

    /// Plays back a fixed script of engine responses and records every
    /// request it saw.
    struct ScriptedEngine {
        script: Mutex<Vec<Step>>,
        requests: Mutex<Vec<EngineRequest>>,
        on_call: Option<CancelHandle>,
    }

    impl ScriptedEngine {
        fn new(mut steps: Vec<Step>) -> Self {
            steps.reverse();
            Self {
                script: Mutex::new(steps),
                requests: Mutex::new(Vec::new()),
                on_call: None,
            }
        }

        /// Cancel the given handle after serving each response.
        fn cancelling(mut self, handle: CancelHandle) -> Self {
            self.on_call = Some(handle);
            self
        }

        fn seen(&self) -> Vec<EngineRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReasoningEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, request: EngineRequest) -> Result<EngineResponse, EngineError> {
            self.requests.lock().unwrap().push(request);
            let step = self
                .script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(finish_response("script exhausted")));
            if let Some(handle) = &self.on_call {
                handle.cancel();
            }
            step
        }
    }

    fn usage() -> Option<Usage> {
        Some(Usage {
            input_tokens: 100,
            output_tokens: 10,
        })
    }

    fn finish_response(text: &str) -> EngineResponse {
        EngineResponse {
            message: Message::assistant(text),
            usage: usage(),
            model: "claude-sonnet-4-20250514".into(),
        }
    }

    fn tool_response(calls: Vec<(&str, &str, serde_json::Value)>) -> EngineResponse {
        let mut message = Message::assistant("");
        for (id, name, arguments) in calls {
            message.tool_calls.push(ToolCall {
                id: id.into(),
                name: name.into(),
                arguments,
            });
        }
        EngineResponse {
            message,
            usage: usage(),
            model: "claude-sonnet-4-20250514".into(),
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl SearchProvider for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn search(&self, _query: &str) -> Result<String, ToolError> {
            Ok("### Acme SMS\nDirect routes to Argentina\nSource: https://acme.example".into())
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, _instruction: &str, text: &str) -> Result<String, EngineError> {
            Ok(text.to_string())
        }
    }

    struct RecordingSink {
        calls: Mutex<u32>,
        fail: bool,
    }

    #[async_trait]
    impl ExportSink for RecordingSink {
        async fn export(
            &self,
            session: &Session,
            _cost: Option<&CostEstimate>,
        ) -> Result<String, ExportError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                Err(ExportError::Sink("sheet service down".into()))
            } else {
                Ok(format!("export://{}", session.id))
            }
        }
    }

    // ── Fixtures ───────────────────────────────────────────────────────

    fn criteria() -> CriteriaSet {
        CriteriaSet {
            hard: vec![
                HardCriterion {
                    field: "coverage".into(),
                    description: "Direct routes to Argentina".into(),
                },
                HardCriterion {
                    field: "price".into(),
                    description: "Under $0.05/SMS".into(),
                },
            ],
            soft: vec![SoftCriterion::new("Support quality", 3)],
        }
    }

    fn evaluate_acme_args() -> serde_json::Value {
        serde_json::json!({
            "name": "Acme SMS",
            "url": "https://acme.example",
            "hard_criteria": [
                {"criterion": "coverage", "passed": true, "evidence": "direct routes listed"},
                {"criterion": "price", "passed": true, "evidence": "$0.04/SMS"}
            ],
            "soft_criteria": [
                {"criterion": "support", "score": 8, "reasoning": "24/7 chat"}
            ],
            "verdict": "pass"
        })
    }

    struct Fixture {
        engine: Arc<ScriptedEngine>,
        memory_path: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn runner_with(
        script: Vec<Step>,
        settings: RunnerSettings,
    ) -> (ResearchRunner, Fixture) {
        let dir = tempfile::tempdir().unwrap();
        let memory_path = dir.path().join("memory.json");
        let engine = Arc::new(ScriptedEngine::new(script));
        let runner = ResearchRunner::new(
            engine.clone(),
            ToolGateway::new(Some(Arc::new(FixedSearch)), None, None, None),
            ResearchMemory::new(memory_path.clone()),
            HistoryCompressor::new(Arc::new(EchoSummarizer), 2),
            settings,
        );
        (
            runner,
            Fixture {
                engine,
                memory_path,
                _dir: dir,
            },
        )
    }

    // ── Tests ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn acme_sms_scenario_end_to_end() {
        let script = vec![
            Ok(tool_response(vec![(
                "call_1",
                "precise_search",
                serde_json::json!({"query": "sms provider argentina rest api"}),
            )])),
            Ok(tool_response(vec![(
                "call_2",
                "evaluate",
                evaluate_acme_args(),
            )])),
            Ok(finish_response(
                "Acme SMS is the best match: both hard criteria pass at $0.04/SMS.",
            )),
        ];
        let (runner, fixture) = runner_with(script, RunnerSettings::default());

        let report = runner
            .run(
                "find an SMS provider with direct routes to Argentina, REST API, under $0.05/SMS",
                criteria(),
            )
            .await
            .unwrap();

        assert!(report.answer.contains("Acme SMS"));
        assert_eq!(report.iterations, 3);
        assert_eq!(report.tool_calls, 2);
        assert_eq!(report.candidates_evaluated, 1);

        // cost is a pure function of the 3 engine calls' usage
        let cost = report.cost.unwrap();
        assert_eq!(cost.input_tokens, 300);
        assert_eq!(cost.output_tokens, 30);
        assert!(cost.usd > 0.0);

        // persisted exactly once, with best_match and known-service facts
        let store = ResearchMemory::new(fixture.memory_path.clone()).load();
        assert_eq!(store.sessions.len(), 1);
        let session = &store.sessions[0];
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.best_match.as_deref(), Some("Acme SMS"));
        assert_eq!(session.search_queries.len(), 1);

        let svc = &store.known_services["acme sms"];
        assert!(svc.facts.contains_key("hard:coverage"));
        assert!(svc.facts.contains_key("hard:price"));
        assert_eq!(svc.verdict, Some(Verdict::Pass));
    }

    #[tokio::test]
    async fn iteration_cap_exhausts_with_synthesized_conclusion() {
        let settings = RunnerSettings {
            max_iterations: 3,
            ..RunnerSettings::default()
        };
        // the engine never finishes
        let script = (0..5)
            .map(|i| {
                Ok(tool_response(vec![(
                    "call_n",
                    "precise_search",
                    serde_json::json!({"query": format!("query {i}")}),
                )]))
            })
            .collect();
        let (runner, fixture) = runner_with(script, settings);

        let report = runner.run("some research task", criteria()).await.unwrap();

        assert_eq!(report.iterations, 3);
        assert!(report.answer.contains("iteration cap (3)"));
        let store = ResearchMemory::new(fixture.memory_path.clone()).load();
        assert_eq!(store.sessions[0].status, SessionStatus::Exhausted);
        assert_eq!(store.sessions[0].search_queries.len(), 3);
    }

    #[tokio::test]
    async fn tool_failure_never_aborts_the_session() {
        // first call is malformed (missing query), engine then finishes
        let script = vec![
            Ok(tool_response(vec![(
                "call_bad",
                "precise_search",
                serde_json::json!({}),
            )])),
            Ok(finish_response("Finished despite the failed call.")),
        ];
        let (runner, fixture) = runner_with(script, RunnerSettings::default());

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert!(report.answer.contains("Finished despite"));
        assert_eq!(report.tool_calls, 1);

        // the error-flagged result was fed back to the engine
        let requests = fixture.engine.seen();
        let followup = &requests[1];
        let flagged = followup
            .messages
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("call_bad"))
            .unwrap();
        assert!(flagged.content.starts_with("Error:"));
        assert!(flagged.content.contains("query"));

        let store = ResearchMemory::new(fixture.memory_path.clone()).load();
        assert_eq!(store.sessions[0].status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn rate_limit_retries_then_succeeds() {
        let settings = RunnerSettings {
            retry_backoff_secs: 0,
            retry_backoff_cap_secs: 0,
            ..RunnerSettings::default()
        };
        let script = vec![
            Err(EngineError::RateLimited { retry_after_secs: 0 }),
            Err(EngineError::RateLimited { retry_after_secs: 0 }),
            Ok(finish_response("made it through")),
        ];
        let (runner, _fixture) = runner_with(script, settings);

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert_eq!(report.answer, "made it through");
        // retries happen within one iteration
        assert_eq!(report.iterations, 1);
    }

    #[tokio::test]
    async fn non_rate_limit_engine_failure_is_fatal_and_unpersisted() {
        let script = vec![Err(EngineError::Api {
            status_code: 500,
            message: "internal error".into(),
        })];
        let (runner, fixture) = runner_with(script, RunnerSettings::default());

        let err = runner.run("task text here", criteria()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(!fixture.memory_path.exists(), "failed session must not persist");
    }

    #[tokio::test]
    async fn invalid_criteria_rejected_before_any_engine_call() {
        let (runner, fixture) = runner_with(vec![], RunnerSettings::default());
        let bad = CriteriaSet {
            hard: vec![],
            soft: vec![SoftCriterion::new("x", 3)],
        };
        assert!(runner.run("task", bad).await.is_err());
        assert!(fixture.engine.seen().is_empty());
    }

    #[tokio::test]
    async fn cancellation_persists_partial_work_as_cancelled() {
        let script = vec![Ok(tool_response(vec![(
            "call_1",
            "precise_search",
            serde_json::json!({"query": "partial work"}),
        )]))];
        let dir = tempfile::tempdir().unwrap();
        let memory_path = dir.path().join("memory.json");
        // the engine trips the cancel flag after serving its one response,
        // so the loop stops at the next iteration boundary
        let handle = CancelHandle::new();
        let engine = Arc::new(ScriptedEngine::new(script).cancelling(handle.clone()));
        let runner = ResearchRunner::new(
            engine,
            ToolGateway::new(Some(Arc::new(FixedSearch)), None, None, None),
            ResearchMemory::new(memory_path.clone()),
            HistoryCompressor::new(Arc::new(EchoSummarizer), 2),
            RunnerSettings::default(),
        )
        .with_cancel(handle);

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert!(report.answer.contains("stopped early"));
        assert_eq!(report.iterations, 1);

        let store = ResearchMemory::new(memory_path).load();
        assert_eq!(store.sessions.len(), 1);
        assert_eq!(store.sessions[0].status, SessionStatus::Cancelled);
        assert_eq!(store.sessions[0].search_queries.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_with_no_work_leaves_no_trace() {
        let (runner, fixture) = runner_with(vec![], RunnerSettings::default());
        runner.cancel_handle().cancel();

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.candidates_evaluated, 0);
        assert!(!fixture.memory_path.exists());
    }

    #[tokio::test]
    async fn export_reference_returned_on_success() {
        let script = vec![Ok(finish_response("done"))];
        let (runner, _fixture) = runner_with(script, RunnerSettings::default());
        let sink = Arc::new(RecordingSink {
            calls: Mutex::new(0),
            fail: false,
        });
        let runner = runner.with_export(sink.clone());

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert!(report.export_ref.unwrap().starts_with("export://"));
        assert_eq!(*sink.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn export_failure_is_best_effort() {
        let script = vec![Ok(finish_response("done"))];
        let (runner, fixture) = runner_with(script, RunnerSettings::default());
        let runner = runner.with_export(Arc::new(RecordingSink {
            calls: Mutex::new(0),
            fail: true,
        }));

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert_eq!(report.answer, "done");
        assert!(report.export_ref.is_none());
        // the session itself still persisted
        let store = ResearchMemory::new(fixture.memory_path.clone()).load();
        assert_eq!(store.sessions.len(), 1);
    }

    #[tokio::test]
    async fn compression_fires_on_schedule() {
        // compress_every = 3 → first boundary at iteration 4, where the
        // conversation holds the task plus three full exchanges
        let settings = RunnerSettings {
            max_iterations: 5,
            compress_every: 3,
            ..RunnerSettings::default()
        };
        let script = vec![
            Ok(tool_response(vec![(
                "c1",
                "precise_search",
                serde_json::json!({"query": "one"}),
            )])),
            Ok(tool_response(vec![(
                "c2",
                "precise_search",
                serde_json::json!({"query": "two"}),
            )])),
            Ok(tool_response(vec![(
                "c3",
                "precise_search",
                serde_json::json!({"query": "three"}),
            )])),
            Ok(finish_response("done")),
        ];
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::new(script));
        let runner = ResearchRunner::new(
            engine.clone(),
            ToolGateway::new(Some(Arc::new(FixedSearch)), None, None, None),
            ResearchMemory::new(dir.path().join("memory.json")),
            // min_turns lowered so the short scripted history qualifies
            HistoryCompressor::new(Arc::new(EchoSummarizer), 1).with_min_turns(4),
            settings,
        );

        let report = runner.run("task text here", criteria()).await.unwrap();
        assert_eq!(report.answer, "done");

        // the iteration-4 request must carry the spliced summary turn
        let requests = engine.seen();
        assert!(
            requests[3]
                .messages
                .iter()
                .any(|m| m.content.starts_with("Summary of the research so far:")),
            "conversation at the compression boundary should contain the summary turn"
        );
    }

    #[tokio::test]
    async fn instructions_embed_criteria_and_memory_context() {
        let script = vec![Ok(finish_response("done"))];
        let (runner, fixture) = runner_with(script, RunnerSettings::default());
        runner.run("task text here", criteria()).await.unwrap();

        let requests = fixture.engine.seen();
        let instructions = &requests[0].instructions;
        assert!(instructions.contains("[coverage]"));
        assert!(instructions.contains("Under $0.05/SMS"));
        assert!(instructions.contains("No prior research on record."));
        // the five tools are declared
        assert_eq!(requests[0].tools.len(), 5);
    }
}
