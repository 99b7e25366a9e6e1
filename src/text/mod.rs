//! # Text Layout
//!
//! Greedy line breaking over whitespace-separated words.
//!
//! Widths come from a fixed-pitch estimate (`font_size × 0.6` per character)
//! rather than real glyph metrics. That is close enough for 12pt Helvetica
//! body text and keeps layout independent of any font file. Lines are never
//! split inside a word: a word wider than the line sits alone and overflows.
//!
//! Embedded newlines are not honoured here. Callers that need hard breaks
//! wrap each paragraph separately (see `layout::LayoutEngine::place_paragraph`).

/// Average advance of one character, as a fraction of the font size.
pub const CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Estimated rendered width of `char_count` characters.
pub fn estimate_width_chars(char_count: usize, font_size: f64) -> f64 {
    font_size * CHAR_WIDTH_FACTOR * char_count as f64
}

/// Estimated rendered width of a string.
pub fn estimate_width(text: &str, font_size: f64) -> f64 {
    estimate_width_chars(text.chars().count(), font_size)
}

/// Break `text` into lines that fit within `max_width`.
///
/// A candidate line is measured with a trailing space, so a line closes when
/// `line + " " + word + " "` would exceed `max_width` and the line already
/// holds at least one word. The last line is always emitted.
///
/// Empty or whitespace-only input yields exactly one empty line, the same
/// way the trailing flush of an empty accumulator does.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if line.is_empty() {
            line.push_str(word);
            line_chars = word_chars;
            continue;
        }

        // line + ' ' + word + ' '
        let candidate_chars = line_chars + 1 + word_chars + 1;
        if estimate_width_chars(candidate_chars, font_size) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_chars = word_chars;
        } else {
            line.push(' ');
            line.push_str(word);
            line_chars += 1 + word_chars;
        }
    }

    lines.push(line);
    lines
}
