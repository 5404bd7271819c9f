//! Frame stream reconciliation.
//!
//! A generation backend's reply stream makes no promise about how each frame
//! relates to the ones before it: a frame may be a cumulative snapshot of the
//! whole reply so far, only the newly added fragment, or a snapshot with a
//! small retroactive edit near its tail. A single stream may mix all three.
//! The reconciler detects the mode per frame and turns the stream into a
//! monotone displayed text plus append-style increments.

use unicode_segmentation::UnicodeSegmentation;

/// Reconciles one turn's frame stream into displayed text and increments.
///
/// Holds only the text displayed so far; construct a fresh reconciler per
/// turn. Identical frame sequences always yield identical increments.
#[derive(Debug, Default)]
pub struct StreamReconciler {
    displayed: String,
}

impl StreamReconciler {
    /// Create a reconciler with empty displayed text.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full text reconciled so far. Authoritative for rendering.
    pub fn display(&self) -> &str {
        &self.displayed
    }

    /// Consume one frame and return the resulting increment.
    ///
    /// The increment is the text a pure-append renderer would add; an empty
    /// return means the frame carried nothing new and must not be emitted
    /// downstream. For streams of well-formed cumulative snapshots or pure
    /// deltas, concatenating all increments equals the final displayed text.
    /// A frame that retroactively edits earlier text replaces the displayed
    /// text wholesale; `display()` remains the source of truth.
    pub fn push(&mut self, frame: &str) -> String {
        if frame.is_empty() {
            return String::new();
        }

        // First frame: everything is new.
        if self.displayed.is_empty() {
            self.displayed = frame.to_string();
            return self.displayed.clone();
        }

        // Cumulative snapshot extending the displayed text.
        if let Some(rest) = frame.strip_prefix(self.displayed.as_str()) {
            let increment = rest.to_string();
            if !increment.is_empty() {
                self.displayed = frame.to_string();
            }
            return increment;
        }

        // Stale snapshot: a re-sent prefix carries nothing new, and the
        // display never regresses.
        if self.displayed.starts_with(frame) {
            return String::new();
        }

        let shared = common_grapheme_prefix_len(&self.displayed, frame);
        if shared * 2 > self.displayed.len() {
            // Cumulative snapshot with a retroactive edit near the tail:
            // replace the display, emit only the text beyond the shared
            // prefix so nothing already shown is duplicated.
            let increment = frame[shared..].to_string();
            self.displayed = frame.to_string();
            increment
        } else {
            // Delta fragment: append verbatim.
            self.displayed.push_str(frame);
            frame.to_string()
        }
    }
}

/// Length in bytes of the longest common prefix of `a` and `b` that ends on
/// a grapheme-cluster boundary in both strings.
fn common_grapheme_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    let mut left = a.graphemes(true);
    let mut right = b.graphemes(true);
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x == y => len += x.len(),
            _ => return len,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(frames: &[&str]) -> (Vec<String>, String) {
        let mut reconciler = StreamReconciler::new();
        let mut increments = Vec::new();
        for frame in frames {
            let inc = reconciler.push(frame);
            if !inc.is_empty() {
                increments.push(inc);
            }
        }
        (increments, reconciler.display().to_string())
    }

    // ---- Cumulative streams ----

    #[test]
    fn test_cumulative_extension_concatenates_to_final() {
        let frames = ["Hel", "Hello", "Hello, wor", "Hello, world!"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "Hello, world!");
        assert_eq!(increments.concat(), "Hello, world!");
        assert_eq!(increments, vec!["Hel", "lo", ", wor", "ld!"]);
    }

    #[test]
    fn test_first_frame_is_whole_increment() {
        let mut reconciler = StreamReconciler::new();
        assert_eq!(reconciler.push("Hello"), "Hello");
        assert_eq!(reconciler.display(), "Hello");
    }

    #[test]
    fn test_repeated_snapshot_emits_nothing() {
        let (increments, display) = run(&["Hello", "Hello", "Hello"]);
        assert_eq!(display, "Hello");
        assert_eq!(increments, vec!["Hello"]);
    }

    #[test]
    fn test_stale_shorter_snapshot_does_not_regress() {
        let mut reconciler = StreamReconciler::new();
        reconciler.push("Hello world");
        assert_eq!(reconciler.push("Hello"), "");
        assert_eq!(reconciler.display(), "Hello world");
    }

    // ---- Delta streams ----

    #[test]
    fn test_pure_delta_concatenates_all_frames() {
        let frames = ["One", " two", " three", " four"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "One two three four");
        assert_eq!(increments.concat(), frames.concat());
    }

    // ---- Mode switching ----

    #[test]
    fn test_cumulative_then_delta_no_duplicates() {
        // Backend switches from snapshots to fragments mid-stream.
        let frames = ["Hel", "Hello", " wor", "ld"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "Hello world");
        assert_eq!(increments.concat(), "Hello world");
    }

    #[test]
    fn test_delta_then_cumulative_no_duplicates() {
        let frames = ["Hel", "lo", "Hello world"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "Hello world");
        assert_eq!(increments.concat(), "Hello world");
    }

    // ---- Retroactive edits ----

    #[test]
    fn test_minor_edit_deduplicates_increment() {
        let mut reconciler = StreamReconciler::new();
        reconciler.push("The answer is forty");
        // Not a superset of the display: the tail was rewritten.
        let inc = reconciler.push("The answer is 42.");
        assert_eq!(reconciler.display(), "The answer is 42.");
        assert_eq!(inc, "42.");
        assert!(!inc.contains("The answer"));
    }

    #[test]
    fn test_short_shared_prefix_is_treated_as_delta() {
        let mut reconciler = StreamReconciler::new();
        reconciler.push("Therefore we conclude");
        // Shares only "The", far less than half the display: a fragment.
        let inc = reconciler.push("The end");
        assert_eq!(inc, "The end");
        assert_eq!(reconciler.display(), "Therefore we concludeThe end");
    }

    // ---- Grapheme safety ----

    #[test]
    fn test_multibyte_text_never_split() {
        let frames = ["こん", "こんにちは", "こんにちは世界"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "こんにちは世界");
        assert_eq!(increments.concat(), "こんにちは世界");
    }

    #[test]
    fn test_combining_mark_edit_lands_on_grapheme_boundary() {
        let mut reconciler = StreamReconciler::new();
        // Final accent differs between the frames: o + U+0301 vs o + U+0300.
        // A byte-level prefix diff would cut between the 'o' and its mark's
        // two UTF-8 bytes; the grapheme diff must stop before the whole
        // cluster that differs.
        reconciler.push("El nin\u{303}o comio\u{301}");
        let inc = reconciler.push("El nin\u{303}o comio\u{300} bien");
        assert_eq!(inc, "o\u{300} bien");
        assert_eq!(reconciler.display(), "El nin\u{303}o comio\u{300} bien");
    }

    #[test]
    fn test_emoji_cumulative_stream() {
        let frames = ["🎉", "🎉 party", "🎉 party 🎊"];
        let (increments, display) = run(&frames);
        assert_eq!(display, "🎉 party 🎊");
        assert_eq!(increments.concat(), "🎉 party 🎊");
    }

    // ---- Edge cases ----

    #[test]
    fn test_empty_frame_is_noop() {
        let mut reconciler = StreamReconciler::new();
        assert_eq!(reconciler.push(""), "");
        reconciler.push("Hello");
        assert_eq!(reconciler.push(""), "");
        assert_eq!(reconciler.display(), "Hello");
    }

    #[test]
    fn test_zero_frames_leaves_display_empty() {
        let reconciler = StreamReconciler::new();
        assert_eq!(reconciler.display(), "");
    }

    #[test]
    fn test_idempotent_across_runs() {
        let frames = ["Hel", "Hello", " wor", "Hello world!"];
        let first = run(&frames);
        let second = run(&frames);
        assert_eq!(first, second);
    }

    // ---- Helper ----

    #[test]
    fn test_common_grapheme_prefix_len() {
        assert_eq!(common_grapheme_prefix_len("hello", "help"), 3);
        assert_eq!(common_grapheme_prefix_len("", "anything"), 0);
        assert_eq!(common_grapheme_prefix_len("abc", "abc"), 3);
        // é as a single codepoint vs e + combining mark share nothing.
        assert_eq!(common_grapheme_prefix_len("\u{e9}x", "e\u{301}x"), 0);
    }
}
