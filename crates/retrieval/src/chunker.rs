//! Fixed-window text chunking.

/// Split `text` into windows of `size` characters, starting a new window
/// every `stride` characters.
///
/// With `stride < size` consecutive windows overlap by `size - stride`
/// characters. Windows start at 0, stride, 2*stride, ... while the start is
/// inside the text, so the tail windows may be shorter than `size`.
/// Windows are measured in `char`s, never splitting a code point.
/// Returns an empty list for empty text or a zero size/stride.
pub fn chunk_text(text: &str, size: usize, stride: usize) -> Vec<String> {
    if text.is_empty() || size == 0 || stride == 0 {
        return Vec::new();
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    (0..char_count)
        .step_by(stride)
        .map(|start| {
            let end = (start + size).min(char_count);
            text[boundaries[start]..boundaries[end]].to_string()
        })
        .collect()
}
