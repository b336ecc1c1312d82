//! Reply clean-up.

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Drop a trailing partial sentence left by a token-limit cutoff.
///
/// If `text` does not already end in `.`, `!` or `?`, it is cut right after
/// the last such character. Text with no terminator, or whose only
/// terminator is the first character, is returned unchanged.
pub fn trim_incomplete_sentence(text: &str) -> &str {
    match text.chars().last() {
        None => text,
        Some(c) if is_terminator(c) => text,
        Some(_) => match text.rfind(is_terminator) {
            // Terminators are ASCII, so `pos + 1` is a char boundary
            Some(pos) if pos > 0 => &text[..=pos],
            _ => text,
        },
    }
}
