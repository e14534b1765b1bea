use super::{AgentBackend, AgentEventStream};
use crate::prompt::TaskRequest;
use crate::stream::AgentEvent;
use async_trait::async_trait;
use dossier_core::{DossierError, DossierResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One step of a scripted upstream run.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver this event.
    Event(AgentEvent),
    /// Sleep before the next step.
    Pause(Duration),
    /// Keep the stream open without producing anything else.
    Hang,
}

impl From<AgentEvent> for ScriptStep {
    fn from(event: AgentEvent) -> Self {
        ScriptStep::Event(event)
    }
}

/// In-process backend that replays a fixed script for every task.
///
/// Used by tests and local demos. Records every task it receives and counts
/// `initialize` calls.
#[derive(Clone)]
pub struct ScriptedBackend {
    steps: Arc<Vec<ScriptStep>>,
    start_error: Option<String>,
    init_delay: Duration,
    init_calls: Arc<AtomicUsize>,
    tasks: Arc<Mutex<Vec<TaskRequest>>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Arc::new(steps),
            start_error: None,
            init_delay: Duration::ZERO,
            init_calls: Arc::new(AtomicUsize::new(0)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script made only of events.
    pub fn from_events(events: Vec<AgentEvent>) -> Self {
        Self::new(events.into_iter().map(ScriptStep::from).collect())
    }

    /// Every `run_task` call fails with this message before streaming.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut backend = Self::new(Vec::new());
        backend.start_error = Some(message.into());
        backend
    }

    /// Makes `initialize` sleep, to widen race windows in tests.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Tasks received so far, in call order.
    pub fn tasks(&self) -> Vec<TaskRequest> {
        self.tasks
            .lock()
            .map(|tasks| tasks.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn initialize(&self) -> DossierResult<()> {
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn run_task(&self, task: TaskRequest) -> DossierResult<AgentEventStream> {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(task);
        }
        if let Some(message) = &self.start_error {
            return Err(DossierError::Agent(message.clone()));
        }

        let (tx, rx) = mpsc::channel(32);
        let steps = Arc::clone(&self.steps);
        tokio::spawn(async move {
            for step in steps.iter() {
                match step {
                    ScriptStep::Event(event) => {
                        if tx.send(event.clone()).await.is_err() {
                            return;
                        }
                    }
                    ScriptStep::Pause(d) => tokio::time::sleep(*d).await,
                    ScriptStep::Hang => {
                        tx.closed().await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}
