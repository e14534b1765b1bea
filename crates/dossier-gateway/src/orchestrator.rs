use crate::settings::StreamSettings;
use crate::writer::StreamWriter;
use bytes::Bytes;
use dossier_agent::{build_task, result_preview, AgentEvent, AgentHandle, Intent, QueryPolicy};
use dossier_core::{is_auth_failure_text, now_millis, StreamEvent, ToolInvocation};
use dossier_text::{
    build_tool_display_with_detail, simplify_tool_error, tool_display_name, SentenceBuffer,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

const AUTH_FAILURE_MESSAGE: &str =
    "Authentication with the research service failed. Please check the API key configuration.";
const UPSTREAM_FAILURE_MESSAGE: &str = "The research service ran into a problem. Please try again.";
const UNREACHABLE_MESSAGE: &str = "Could not reach the research service. Please try again.";
const STALL_MESSAGE: &str = "Still working. The research service is taking longer than usual...";

/// Lifecycle of one outbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Streaming,
    Complete,
    Error,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }
}

/// Turns one query into one normalized outbound event stream.
///
/// Shared across requests; all per-request state lives in the task spawned
/// by [`StreamOrchestrator::spawn`].
pub struct StreamOrchestrator {
    agent: AgentHandle,
    policy: Arc<dyn QueryPolicy>,
    settings: StreamSettings,
    model_id: String,
}

impl StreamOrchestrator {
    pub fn new(
        agent: AgentHandle,
        policy: Arc<dyn QueryPolicy>,
        settings: StreamSettings,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            policy,
            settings,
            model_id: model_id.into(),
        }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Starts streaming `query` in a background task and returns the frame
    /// receiver that feeds the response body.
    pub fn spawn(self: &Arc<Self>, query: String) -> mpsc::Receiver<Bytes> {
        let (writer, rx) = StreamWriter::channel(self.settings.channel_capacity);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(&query, writer).await;
        });
        rx
    }

    /// Drives one stream to its terminal phase. Emits exactly one `complete`
    /// or `error` event (unless the client is already gone).
    pub async fn run(&self, query: &str, writer: StreamWriter) -> Phase {
        let intent = self.policy.classify(query);
        let task = build_task(query, intent, &self.model_id);
        let mut run = ResearchRun::new(writer, task.tools_enabled);
        let timeout = self.settings.timeout_for(intent);

        info!(
            request_id = %run.request_id,
            intent = %intent,
            timeout_secs = timeout.as_secs(),
            "Research stream opened"
        );
        run.transition(Phase::Streaming);
        let deadline_at = Instant::now() + timeout;
        run.writer.set_deadline(deadline_at);

        if intent == Intent::Research {
            run.emit(StreamEvent::status(format!("Researching {}...", query.trim())))
                .await;
        }

        let deadline = tokio::time::sleep_until(deadline_at);
        tokio::pin!(deadline);
        let period = self.settings.keepalive;
        let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let start = self.agent.run_task(task);
        tokio::pin!(start);
        let mut events = loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    run.fail_timeout(timeout).await;
                    return run.phase;
                }
                started = &mut start => match started {
                    Ok(rx) => break rx,
                    Err(e) => {
                        let raw = e.to_string();
                        warn!(request_id = %run.request_id, error = %raw, "Agent task failed to start");
                        let message = if e.is_auth_failure() {
                            AUTH_FAILURE_MESSAGE
                        } else {
                            UNREACHABLE_MESSAGE
                        };
                        run.finish_error(message).await;
                        return run.phase;
                    }
                },
                _ = keepalive.tick() => {
                    run.writer.keepalive().await;
                }
            }
        };

        let stall = tokio::time::sleep(self.settings.stall);
        tokio::pin!(stall);

        while !run.phase.is_terminal() {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    run.fail_timeout(timeout).await;
                }
                next = events.recv() => match next {
                    Some(event) => {
                        stall.as_mut().reset(Instant::now() + self.settings.stall);
                        run.handle(event).await;
                    }
                    None => {
                        debug!(request_id = %run.request_id, "Agent stream ended without a completion event");
                        run.finish_complete().await;
                    }
                },
                _ = &mut stall => {
                    warn!(
                        request_id = %run.request_id,
                        stall_secs = self.settings.stall.as_secs(),
                        "Agent stream stalled"
                    );
                    run.emit(StreamEvent::status(STALL_MESSAGE)).await;
                    stall.as_mut().reset(Instant::now() + self.settings.stall);
                }
                _ = keepalive.tick() => {
                    run.writer.keepalive().await;
                }
            }
            if run.writer.take_activity() {
                keepalive.reset();
            }
        }

        run.phase
    }
}

struct ActiveTool {
    invocation: ToolInvocation,
    announced: bool,
}

/// Per-request state: owned by exactly one orchestrator task.
struct ResearchRun {
    request_id: Uuid,
    writer: StreamWriter,
    buffer: SentenceBuffer,
    tools: HashMap<String, ActiveTool>,
    tool_count: usize,
    tools_enabled: bool,
    started: Instant,
    phase: Phase,
}

impl ResearchRun {
    fn new(writer: StreamWriter, tools_enabled: bool) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            writer,
            buffer: SentenceBuffer::new(),
            tools: HashMap::new(),
            tool_count: 0,
            tools_enabled,
            started: Instant::now(),
            phase: Phase::Init,
        }
    }

    fn transition(&mut self, next: Phase) {
        debug!(request_id = %self.request_id, from = ?self.phase, to = ?next, "Stream phase");
        self.phase = next;
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    async fn emit(&mut self, event: StreamEvent) {
        self.writer.send_event(event).await;
    }

    async fn handle(&mut self, event: AgentEvent) {
        if event.tool_id().is_some() && !self.tools_enabled {
            debug!(request_id = %self.request_id, "Ignoring tool event for a tool-less task");
            return;
        }

        match event {
            AgentEvent::Text { text } => {
                for chunk in self.buffer.add(&text) {
                    self.emit(StreamEvent::assistant_text(chunk.into_wire()))
                        .await;
                }
            }

            AgentEvent::ToolUse { id, name } => {
                let mut invocation = ToolInvocation::new(id.clone(), name.clone());
                invocation.display_name = tool_display_name(&name);
                debug!(request_id = %self.request_id, tool_id = %id, tool = %name, "Tool requested");
                self.tools.insert(
                    id,
                    ActiveTool {
                        invocation,
                        announced: false,
                    },
                );
            }

            AgentEvent::ToolUseInput { id, partial_json } => match self.tools.get_mut(&id) {
                Some(active) => active.invocation.push_input(&partial_json),
                None => debug!(request_id = %self.request_id, tool_id = %id, "Input for unknown tool"),
            },

            AgentEvent::ToolUseApproved { id } => {
                let Some(active) = self.tools.get_mut(&id) else {
                    debug!(request_id = %self.request_id, tool_id = %id, "Approval for unknown tool");
                    return;
                };
                if active.announced {
                    return;
                }
                let event = announce(active);
                self.tool_count += 1;
                self.emit(event).await;
            }

            AgentEvent::ToolUseResult { id, result } => {
                let Some(mut active) = self.tools.remove(&id) else {
                    debug!(request_id = %self.request_id, tool_id = %id, "Result for unknown tool");
                    return;
                };
                if !active.announced {
                    let event = announce(&mut active);
                    self.tool_count += 1;
                    self.emit(event).await;
                }
                let invocation = &mut active.invocation;
                invocation.complete(Some(result_preview(result.as_ref(), 120)));
                info!(
                    request_id = %self.request_id,
                    tool_id = %id,
                    tool = %invocation.name,
                    elapsed_ms = invocation.elapsed_ms(),
                    "Tool complete"
                );
                let event = StreamEvent::ToolComplete {
                    tool_id: invocation.id.clone(),
                    tool_name: invocation.name.clone(),
                    display_name: invocation.display_name.clone(),
                    duration_ms: invocation.elapsed_ms(),
                    timestamp: now_millis(),
                };
                self.emit(event).await;
            }

            AgentEvent::ToolUseError { id, error } => {
                let Some(mut active) = self.tools.remove(&id) else {
                    debug!(request_id = %self.request_id, tool_id = %id, "Error for unknown tool");
                    return;
                };
                if !active.announced {
                    let event = announce(&mut active);
                    self.tool_count += 1;
                    self.emit(event).await;
                }
                let friendly = simplify_tool_error(&error);
                let invocation = &mut active.invocation;
                invocation.fail(friendly.clone());
                warn!(
                    request_id = %self.request_id,
                    tool_id = %id,
                    tool = %invocation.name,
                    error = %error,
                    "Tool failed"
                );
                let event = StreamEvent::ToolError {
                    tool_id: invocation.id.clone(),
                    tool_name: invocation.name.clone(),
                    display_name: invocation.display_name.clone(),
                    error: friendly,
                    timestamp: now_millis(),
                };
                self.emit(event).await;
            }

            AgentEvent::Completed { .. } => self.finish_complete().await,

            AgentEvent::Error { message } => {
                warn!(request_id = %self.request_id, error = %message, "Agent reported an error");
                let friendly = if is_auth_failure_text(&message) {
                    AUTH_FAILURE_MESSAGE
                } else {
                    UPSTREAM_FAILURE_MESSAGE
                };
                self.finish_error(friendly).await;
            }

            AgentEvent::Unknown { kind } => {
                debug!(request_id = %self.request_id, kind = %kind, "Ignoring agent event");
            }
        }
    }

    async fn flush_text(&mut self) {
        if let Some(chunk) = self.buffer.flush() {
            self.emit(StreamEvent::assistant_text(chunk.into_wire()))
                .await;
        }
    }

    fn log_abandoned_tools(&self) {
        if !self.tools.is_empty() {
            debug!(
                request_id = %self.request_id,
                count = self.tools.len(),
                "Stream ended with unfinished tools"
            );
        }
    }

    async fn finish_complete(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.flush_text().await;
        self.log_abandoned_tools();
        let duration_ms = self.elapsed_ms();
        info!(
            request_id = %self.request_id,
            elapsed_ms = duration_ms,
            tool_count = self.tool_count,
            "Research stream complete"
        );
        self.emit(StreamEvent::Complete {
            duration_ms,
            tool_count: self.tool_count,
            timestamp: now_millis(),
        })
        .await;
        self.transition(Phase::Complete);
    }

    async fn finish_error(&mut self, message: &str) {
        if self.phase.is_terminal() {
            return;
        }
        self.flush_text().await;
        self.log_abandoned_tools();
        self.emit(StreamEvent::error(message)).await;
        self.transition(Phase::Error);
    }

    async fn fail_timeout(&mut self, timeout: Duration) {
        warn!(
            request_id = %self.request_id,
            timeout_secs = timeout.as_secs(),
            "Research stream timed out"
        );
        self.finish_error("The research took too long and was stopped. Please try again.")
            .await;
    }
}

/// Builds the `tool_start` event and marks the tool as announced. The display
/// name gains its detail here, once the input has fully arrived.
fn announce(active: &mut ActiveTool) -> StreamEvent {
    let invocation = &mut active.invocation;
    invocation.display_name = build_tool_display_with_detail(&invocation.name, &invocation.input);
    active.announced = true;
    StreamEvent::ToolStart {
        tool_id: invocation.id.clone(),
        tool_name: invocation.name.clone(),
        display_name: invocation.display_name.clone(),
        timestamp: now_millis(),
    }
}
