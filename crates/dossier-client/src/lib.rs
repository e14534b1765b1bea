//! Client side of the Dossier stream.
//!
//! Parses the gateway's SSE body ([`SseLineParser`]), folds events into
//! conversation state ([`ChatState`]) and, for older gateways that re-send
//! overlapping fragments, deduplicates and repairs text ([`LegacyMerger`],
//! [`repair_word_boundaries`]).

pub mod client;
pub mod merge;
pub mod parser;
pub mod repair;
pub mod state;

pub use client::ResearchClient;
pub use merge::LegacyMerger;
pub use parser::SseLineParser;
pub use repair::repair_word_boundaries;
pub use state::{ChatState, ToolStatusEntry, ERROR_MARKER};
