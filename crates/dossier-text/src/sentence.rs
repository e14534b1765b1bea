use crate::classifier::{find_markdown_marker, is_markdown_start, is_transition_only_text};

/// Words that end in a period without ending the sentence. Compared
/// case-insensitively with the token preceding the period.
/// Never end a sentence: a name or phrase always follows.
const TITLES: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "mt", "vs", "gen", "col", "lt", "sgt", "rev", "hon", "e.g",
    "i.e",
];

/// End a sentence only when the next word is capitalized.
const TRAILING_ABBREVIATIONS: &[&str] = &[
    "st", "jr", "sr", "etc", "inc", "ltd", "co", "corp", "u.s",
];

const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

/// One unit of output from a [`SentenceBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A complete, trimmed prose sentence.
    Sentence(String),
    /// Raw Markdown, passed through verbatim.
    Markdown(String),
}

impl Chunk {
    /// The chunk's text as emitted by the buffer.
    pub fn text(&self) -> &str {
        match self {
            Chunk::Sentence(s) | Chunk::Markdown(s) => s,
        }
    }

    /// Text ready for plain concatenation on the client. Sentences are
    /// trimmed by the buffer, so they carry their own trailing separator.
    pub fn into_wire(self) -> String {
        match self {
            Chunk::Sentence(mut s) => {
                s.push(' ');
                s
            }
            Chunk::Markdown(s) => s,
        }
    }
}

/// Accumulates streamed text deltas and releases whole sentences, or raw
/// Markdown once the model starts producing structured blocks.
///
/// Prose is split at sentence boundaries and filtered through
/// [`is_transition_only_text`]. The first Markdown marker switches the buffer
/// into passthrough mode for the rest of the task; only [`flush`] or
/// [`reset`] switch it back.
///
/// [`flush`]: SentenceBuffer::flush
/// [`reset`]: SentenceBuffer::reset
#[derive(Debug, Default)]
pub struct SentenceBuffer {
    buffer: String,
    markdown: bool,
    emitted_prose: bool,
}

impl SentenceBuffer {
    /// Creates an empty buffer in prose mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether passthrough mode is active.
    pub fn is_markdown_mode(&self) -> bool {
        self.markdown
    }

    /// Raw text not yet emitted.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Appends a delta and returns everything it completed, in order.
    pub fn add(&mut self, text: &str) -> Vec<Chunk> {
        let mut out = Vec::new();
        self.buffer.push_str(text);

        if !self.markdown {
            if is_markdown_start(&self.buffer) {
                self.enter_markdown();
            } else if let Some(idx) = find_markdown_marker(&self.buffer) {
                let tail = self.buffer.split_off(idx);
                self.extract_sentences(&mut out);

                if !self.markdown {
                    // Prose cut short by the marker has no terminator but is
                    // still complete.
                    let head = std::mem::take(&mut self.buffer);
                    self.push_sentence(head.trim(), &mut out);
                }
                self.buffer.push_str(&tail);
                if !self.markdown {
                    self.enter_markdown();
                }
            } else {
                self.extract_sentences(&mut out);
            }
        }

        if self.markdown {
            self.drain_markdown(&mut out);
        }
        out
    }

    /// Emits whatever is left, then returns to prose mode. Call once per
    /// finished or failed task.
    pub fn flush(&mut self) -> Option<Chunk> {
        let rest = std::mem::take(&mut self.buffer);
        let trimmed = rest.trim();
        let chunk = if trimmed.is_empty() {
            None
        } else if self.markdown {
            Some(Chunk::Markdown(trimmed.to_string()))
        } else if is_transition_only_text(trimmed) {
            None
        } else {
            Some(Chunk::Sentence(trimmed.to_string()))
        };
        self.markdown = false;
        self.emitted_prose = false;
        chunk
    }

    /// Discards pending text and returns to prose mode without emitting.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.markdown = false;
        self.emitted_prose = false;
    }

    fn enter_markdown(&mut self) {
        self.markdown = true;
        // Keep the first block off the tail of the preceding sentence.
        if self.emitted_prose && !self.buffer.starts_with('\n') {
            self.buffer.insert_str(0, "\n\n");
        }
    }

    fn drain_markdown(&mut self, out: &mut Vec<Chunk>) {
        if !self.buffer.is_empty() {
            out.push(Chunk::Markdown(std::mem::take(&mut self.buffer)));
        }
    }

    fn extract_sentences(&mut self, out: &mut Vec<Chunk>) {
        while let Some((end, rest)) = sentence_boundary(&self.buffer) {
            let sentence = self.buffer[..end].trim().to_string();
            self.buffer.drain(..rest);
            self.push_sentence(&sentence, out);
            if is_markdown_start(&self.buffer) {
                self.enter_markdown();
                return;
            }
        }
    }

    fn push_sentence(&mut self, sentence: &str, out: &mut Vec<Chunk>) {
        if !is_transition_only_text(sentence) {
            self.emitted_prose = true;
            out.push(Chunk::Sentence(sentence.to_string()));
        }
    }
}

/// Finds the first sentence end in `text`.
///
/// Returns `(end, rest)`: `text[..end]` is the sentence including its
/// terminal punctuation and closing quotes, `text[rest..]` is what follows
/// after the separating whitespace. A boundary requires at least one
/// whitespace character after the terminator, so a sentence at the very end
/// of the buffer waits for more input or for `flush`.
fn sentence_boundary(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'.' | b'!' | b'?') {
            // Swallow runs such as "?!" or "...".
            let mut end = i + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
                end += 1;
            }
            let after_punct = end;
            let mut tail = text[end..].chars();
            let mut next = tail.next();
            while let Some(c) = next.filter(|c| CLOSERS.contains(c)) {
                end += c.len_utf8();
                next = tail.next();
            }
            let ends_sentence = match next {
                Some(c) if c.is_whitespace() => {
                    !(b == b'.'
                        && after_punct == i + 1
                        && is_abbreviation(&text[..i], &text[end..]))
                }
                _ => false,
            };
            if ends_sentence {
                let rest = text[end..]
                    .char_indices()
                    .find(|(_, c)| !c.is_whitespace())
                    .map_or(text.len(), |(j, _)| end + j);
                return Some((end, rest));
            }
            i = after_punct;
        } else {
            i += 1;
        }
    }
    None
}

/// True when the word right before a period is an initial ("Q"), a title
/// ("Dr"), or a trailing abbreviation ("Inc") followed by a word that does not
/// start a new sentence. `after` is the text following the period.
fn is_abbreviation(before: &str, after: &str) -> bool {
    let word = before
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'', '[', '\u{201c}']);

    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_uppercase();
    }

    let lower = word.to_lowercase();
    if TITLES.contains(&lower.as_str()) {
        return true;
    }
    if TRAILING_ABBREVIATIONS.contains(&lower.as_str()) {
        // Undecided until the next word arrives.
        return after
            .trim_start()
            .chars()
            .next()
            .map_or(true, |c| !c.is_uppercase());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(Chunk::text).collect()
    }

    #[test]
    fn test_emits_sentences_as_they_complete() {
        let mut buf = SentenceBuffer::new();
        assert!(buf.add("Jane was born ").is_empty());
        assert!(buf.add("in Ohio").is_empty());
        let out = buf.add(". She studied law");
        assert_eq!(texts(&out), vec!["Jane was born in Ohio."]);
        assert_eq!(buf.pending(), "She studied law");
        assert_eq!(buf.flush(), Some(Chunk::Sentence("She studied law".into())));
    }

    #[test]
    fn test_waits_for_whitespace_after_terminator() {
        let mut buf = SentenceBuffer::new();
        assert!(buf.add("Revenue grew 3.5").is_empty());
        assert!(buf.add("% last year.").is_empty());
        let out = buf.add(" Margins fell.");
        assert_eq!(texts(&out), vec!["Revenue grew 3.5% last year."]);
    }

    #[test]
    fn test_trailing_abbreviation_ends_before_capital() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("She joined Acme Inc. She later left. ");
        assert_eq!(texts(&out), vec!["She joined Acme Inc.", "She later left."]);

        let out = buf.add("Books, maps, etc. are kept here. ");
        assert_eq!(texts(&out), vec!["Books, maps, etc. are kept here."]);
    }

    #[test]
    fn test_trailing_abbreviation_waits_for_next_word() {
        let mut buf = SentenceBuffer::new();
        assert!(buf.add("He lives on Main St. ").is_empty());
        let out = buf.add("He moved in 2019. ");
        assert_eq!(texts(&out), vec!["He lives on Main St.", "He moved in 2019."]);
    }

    #[test]
    fn test_does_not_split_title_abbreviation() {
        let mut buf = SentenceBuffer::new();
        let mut out = buf.add("Dr. Smith arrived. ");
        out.extend(buf.flush());
        assert_eq!(texts(&out), vec!["Dr. Smith arrived."]);
    }

    #[test]
    fn test_does_not_split_middle_initial() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("Jane Q. Public is an engineer. ");
        assert_eq!(texts(&out), vec!["Jane Q. Public is an engineer."]);
    }

    #[test]
    fn test_drops_transition_sentences() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("Let me search for that. Jane is a pilot. Now let me check her career. ");
        assert_eq!(texts(&out), vec!["Jane is a pilot."]);
        assert_eq!(buf.flush(), None);
    }

    #[test]
    fn test_flush_filters_transition_remainder() {
        let mut buf = SentenceBuffer::new();
        buf.add("I'll search a few more sources");
        assert_eq!(buf.flush(), None);
    }

    #[test]
    fn test_question_and_exclamation() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("Who is she? A founder! Really?! Yes. ");
        assert_eq!(texts(&out), vec!["Who is she?", "A founder!", "Really?!", "Yes."]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("She said \"no.\" Then she left. ");
        assert_eq!(texts(&out), vec!["She said \"no.\"", "Then she left."]);
    }

    #[test]
    fn test_markdown_start_passes_through() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("## Overview\nJane. Q");
        assert_eq!(out, vec![Chunk::Markdown("## Overview\nJane. Q".into())]);
        assert!(buf.is_markdown_mode());

        let out = buf.add(". Public works. Here");
        assert_eq!(out, vec![Chunk::Markdown(". Public works. Here".into())]);
        assert!(buf.pending().is_empty());
    }

    #[test]
    fn test_transition_into_markdown_mid_buffer() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("Jane is an engineer. Key facts\n- Born 1990\n");
        assert_eq!(
            out,
            vec![
                Chunk::Sentence("Jane is an engineer.".into()),
                Chunk::Sentence("Key facts".into()),
                Chunk::Markdown("\n\n- Born 1990\n".into()),
            ]
        );
        assert!(buf.is_markdown_mode());
    }

    #[test]
    fn test_markdown_mode_persists_until_flush() {
        let mut buf = SentenceBuffer::new();
        buf.add("**Name:** Jane\n");
        let out = buf.add("She moved. Then she left. ");
        assert_eq!(out, vec![Chunk::Markdown("She moved. Then she left. ".into())]);
        assert_eq!(buf.flush(), None);
        assert!(!buf.is_markdown_mode());

        let out = buf.add("Back to prose. ");
        assert_eq!(out, vec![Chunk::Sentence("Back to prose.".into())]);
    }

    #[test]
    fn test_reset_discards_without_emitting() {
        let mut buf = SentenceBuffer::new();
        buf.add("# Heading");
        buf.add("partial");
        buf.reset();
        assert!(!buf.is_markdown_mode());
        assert!(buf.pending().is_empty());
        assert_eq!(buf.flush(), None);
    }

    #[test]
    fn test_wire_text_separates_sentences() {
        assert_eq!(Chunk::Sentence("Hi.".into()).into_wire(), "Hi. ");
        assert_eq!(Chunk::Markdown("- a\n".into()).into_wire(), "- a\n");
    }

    #[test]
    fn test_multibyte_text() {
        let mut buf = SentenceBuffer::new();
        let out = buf.add("Zoë moved to Zürich. She works at CERN… ");
        assert_eq!(texts(&out), vec!["Zoë moved to Zürich."]);
        assert_eq!(
            buf.flush(),
            Some(Chunk::Sentence("She works at CERN…".into()))
        );
    }
}
