//! Text normalization for streamed agent output.
//!
//! - [`classifier`] decides whether a fragment is process narration or the
//!   start of a Markdown block.
//! - [`sentence`] turns arbitrary deltas into whole sentences or raw Markdown
//!   chunks.
//! - [`tool_display`] turns raw tool names, inputs and errors into short
//!   user-facing strings.

/// Transition-phrase and Markdown detection.
pub mod classifier;
/// Sentence-boundary buffering.
pub mod sentence;
/// Tool display names, input summaries and error simplification.
pub mod tool_display;

pub use classifier::{find_markdown_marker, is_markdown_start, is_transition_only_text};
pub use sentence::{Chunk, SentenceBuffer};
pub use tool_display::{
    build_tool_display_with_detail, extract_tool_detail, simplify_tool_error, tool_display_name,
};
