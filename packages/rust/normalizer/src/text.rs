//! Body text normalization passes.

/// Decode raw placeholder bytes, dropping any invalid UTF-8 sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Normalize a transcript body.
///
/// Line endings become `\n`, trailing whitespace is removed per line, leading
/// and trailing blank lines are dropped, and exactly one `\n` terminates the text.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let joined = unified
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n", joined.trim_matches('\n'))
}
