use crate::repair::repair_word_boundaries;

/// Fraction of an incoming chunk's normalized length that must already be
/// present for the chunk to count as a duplicate.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.8;

/// Chunks shorter than this (after normalization) are always appended;
/// short words repeat legitimately.
pub const DEFAULT_MIN_DUPLICATE_CHARS: usize = 16;

/// Merge path for older gateways that re-send overlapping text fragments.
///
/// An incoming chunk is dropped when at least `threshold` of its normalized
/// text already appears as one contiguous run in the accumulated content.
/// Whatever is appended then goes through [`repair_word_boundaries`].
#[derive(Debug, Clone, Copy)]
pub struct LegacyMerger {
    threshold: f64,
    min_chars: usize,
}

impl Default for LegacyMerger {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
            min_chars: DEFAULT_MIN_DUPLICATE_CHARS,
        }
    }
}

impl LegacyMerger {
    pub fn new(threshold: f64, min_chars: usize) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            min_chars,
        }
    }

    /// Whether `incoming` repeats text already in `existing`.
    pub fn is_near_duplicate(&self, existing: &str, incoming: &str) -> bool {
        let incoming = normalize(incoming);
        if incoming.len() < self.min_chars.max(1) {
            return false;
        }
        let existing = normalize(existing);
        if existing.is_empty() {
            return false;
        }
        let overlap = longest_common_run(&existing, &incoming);
        overlap as f64 >= self.threshold * incoming.len() as f64
    }

    /// Appends `incoming` to `existing` unless it is a near-duplicate, then
    /// repairs glued word boundaries. Returns the merged content.
    pub fn merge(&self, existing: &str, incoming: &str) -> String {
        if self.is_near_duplicate(existing, incoming) {
            return existing.to_string();
        }
        repair_word_boundaries(&format!("{existing}{incoming}"))
    }
}

/// Lowercases and keeps only alphanumerics: whitespace and punctuation
/// differences never hide a duplicate.
pub fn normalize(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Length of the longest run of `needle` that appears contiguously in
/// `haystack`.
fn longest_common_run(haystack: &[char], needle: &[char]) -> usize {
    let mut prev = vec![0usize; needle.len() + 1];
    let mut curr = vec![0usize; needle.len() + 1];
    let mut best = 0;
    for h in haystack {
        for (j, n) in needle.iter().enumerate() {
            curr[j + 1] = if h == n { prev[j] + 1 } else { 0 };
            best = best.max(curr[j + 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let n: String = normalize("Hello, World! 42").into_iter().collect();
        assert_eq!(n, "helloworld42");
    }

    #[test]
    fn test_plain_fragments_append() {
        let merger = LegacyMerger::default();
        let merged = merger.merge("Hello", " world.");
        assert_eq!(merged, "Hello world.");
    }

    #[test]
    fn test_resent_sentence_is_dropped() {
        let merger = LegacyMerger::default();
        let existing = "Jane Q. Public is a structural engineer based in Columbus. ";
        let incoming = "Jane Q Public is a structural engineer based in Columbus.";
        assert!(merger.is_near_duplicate(existing, incoming));
        assert_eq!(merger.merge(existing, incoming), existing);
    }

    #[test]
    fn test_partial_overlap_below_threshold_appends() {
        let merger = LegacyMerger::default();
        let existing = "She joined Acme Corporation in 2014.";
        let incoming = " She left Acme Corporation in 2019 for a startup in Denver.";
        assert!(!merger.is_near_duplicate(existing, incoming));
        assert!(merger.merge(existing, incoming).ends_with("Denver."));
    }

    #[test]
    fn test_short_chunks_never_deduplicated() {
        let merger = LegacyMerger::default();
        assert!(!merger.is_near_duplicate("the the the", " the"));
    }

    #[test]
    fn test_merge_repairs_glued_words() {
        let merger = LegacyMerger::default();
        assert_eq!(
            merger.merge("She lives in Ohio.", "She works inthe city."),
            "She lives in Ohio. She works in the city."
        );
    }
}
