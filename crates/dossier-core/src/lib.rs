//! Core types and error definitions for Dossier.
//!
//! This crate provides the foundational types shared across all Dossier crates.
//!
//! # Main types
//!
//! - [`DossierError`]: Unified error enum for all Dossier subsystems.
//! - [`DossierResult`]: Convenience alias for `Result<T, DossierError>`.
//! - [`StreamEvent`]: Normalized event sent to the browser over SSE.
//! - [`ToolInvocation`]: One upstream tool call and its lifecycle.
//! - [`Message`]: A chat turn as held by the client.

/// Error types.
pub mod error;
/// Outbound stream events and SSE framing.
pub mod event;
/// Client-side chat messages.
pub mod message;
/// Tool invocation lifecycle.
pub mod tool;

pub use error::{is_auth_failure_text, DossierError, DossierResult};
pub use event::{now_millis, StreamEvent, KEEPALIVE_FRAME};
pub use message::{Message, Role};
pub use tool::{ToolInvocation, ToolStatus};
