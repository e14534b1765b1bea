#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Behavioural tests for the sentence buffer across arbitrary delta splits.

use dossier_text::{is_transition_only_text, Chunk, SentenceBuffer};

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Feeds `text` in fixed-size char slices, then flushes.
fn run_in_slices(text: &str, slice: usize) -> Vec<Chunk> {
    let mut buf = SentenceBuffer::new();
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    for piece in chars.chunks(slice) {
        let delta: String = piece.iter().collect();
        out.extend(buf.add(&delta));
    }
    out.extend(buf.flush());
    out
}

// ---------------------------------------------------------------------------
// 1. Without Markdown, output reconstructs the input minus narration
// ---------------------------------------------------------------------------

#[test]
fn prose_reconstructs_input_minus_transitions() {
    let sentences = [
        "Jane Q. Public is a structural engineer based in Columbus.",
        "Let me check her employment history.",
        "She joined Dr. Smith's firm in 2014!",
        "Was she a partner?",
        "Now let me look for press coverage.",
        "Her bridge design won a state award in 2019.",
        "She also teaches part time",
    ];
    let input = sentences.join(" ");
    let expected: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|s| !is_transition_only_text(s))
        .collect();

    for slice in [1, 2, 3, 7, 16, 64, input.len()] {
        let chunks = run_in_slices(&input, slice);
        assert!(chunks.iter().all(|c| matches!(c, Chunk::Sentence(_))));
        let joined: Vec<&str> = chunks.iter().map(Chunk::text).collect();
        assert_eq!(
            normalize_ws(&joined.join(" ")),
            normalize_ws(&expected.join(" ")),
            "slice size {slice}"
        );
    }
}

// ---------------------------------------------------------------------------
// 2. Once Markdown starts, every later emission is raw passthrough
// ---------------------------------------------------------------------------

#[test]
fn markdown_passthrough_is_sticky() {
    let input = "Jane is an engineer. ## Summary\n- Born 1990. Moved twice.\n**Employer:** Acme Inc. Since 2014.";
    for slice in [1, 4, 9, 200] {
        let chunks = run_in_slices(input, slice);
        let first_md = chunks
            .iter()
            .position(|c| matches!(c, Chunk::Markdown(_)))
            .expect("markdown chunk");
        assert!(chunks[first_md..]
            .iter()
            .all(|c| matches!(c, Chunk::Markdown(_))));
        let md: String = chunks[first_md..].iter().map(Chunk::text).collect();
        assert!(md.contains("- Born 1990. Moved twice."), "slice {slice}: {md:?}");
    }
}

// ---------------------------------------------------------------------------
// 3. Wire form concatenates cleanly on the client
// ---------------------------------------------------------------------------

#[test]
fn wire_chunks_concatenate_to_readable_text() {
    let chunks = run_in_slices("Jane is a pilot. She flies cargo. ", 5);
    let rendered: String = chunks.into_iter().map(Chunk::into_wire).collect();
    assert_eq!(rendered, "Jane is a pilot. She flies cargo. ");
}

// ---------------------------------------------------------------------------
// 4. Buffer reuse across tasks
// ---------------------------------------------------------------------------

#[test]
fn reused_buffer_starts_clean_after_flush() {
    let mut buf = SentenceBuffer::new();
    buf.add("# Report\nbody");
    assert!(buf.is_markdown_mode());
    let last = buf.flush();
    assert_eq!(last, None);

    let out = buf.add("Second task. ");
    assert_eq!(out, vec![Chunk::Sentence("Second task.".into())]);
}
