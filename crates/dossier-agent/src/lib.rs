//! Upstream agent access for Dossier.
//!
//! Wraps the hosted agent service behind the [`AgentBackend`] trait, decodes
//! its raw lifecycle events into [`AgentEvent`], classifies incoming queries
//! ([`QueryPolicy`]) and builds the task prompt for each intent.

pub mod backends;
pub mod config;
pub mod handle;
pub mod intent;
pub mod prompt;
pub mod stream;

pub use backends::{AgentBackend, AgentEventStream, HttpAgentBackend, ScriptStep, ScriptedBackend};
pub use config::AgentConfig;
pub use handle::AgentHandle;
pub use intent::{HeuristicPolicy, Intent, QueryPolicy};
pub use prompt::{build_task, TaskRequest};
pub use stream::{result_preview, AgentEvent};
