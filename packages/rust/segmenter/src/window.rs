//! Length-bounded chunking for transcripts without timestamps.

/// Cut `text` into trimmed, non-empty chunks of at most `max_len` characters.
///
/// Each window ends at its last newline when that newline sits at least
/// `min_len / 2` characters in; otherwise the window is cut hard. The newline
/// itself starts the next window and is trimmed away there.
pub fn chunk_by_chars(text: &str, max_len: usize, min_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let max_len = max_len.max(1);
    let min_break = min_len / 2;

    let mut chunks = Vec::new();
    let mut cur = 0;

    while cur < chars.len() {
        let mut end = (cur + max_len).min(chars.len());

        let newline = chars[cur..end]
            .iter()
            .rposition(|&c| c == '\n')
            .filter(|&br| br > 0 && br >= min_break);
        if let Some(br) = newline {
            end = cur + br;
        }

        let chunk: String = chars[cur..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        cur = end;
    }

    chunks
}
