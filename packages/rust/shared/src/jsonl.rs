//! Newline-delimited JSON reading and writing.
//!
//! Readers are lenient: blank lines are ignored and lines that do not decode
//! as the expected record are skipped, never surfaced as errors.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{QbankError, Result};

/// Records decoded from a JSONL source plus the count of skipped lines.
#[derive(Debug, Clone)]
pub struct JsonlRecords<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

/// Decode every well-formed line of `content`.
pub fn parse_jsonl<T: DeserializeOwned>(content: &str) -> JsonlRecords<T> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!(line = lineno + 1, error = %e, "skipping malformed JSONL line");
            }
        }
    }

    JsonlRecords { records, skipped }
}

/// Read a JSONL file. A missing file is a [`QbankError::MissingInput`].
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| QbankError::io(path, e))?;
    let parsed = parse_jsonl(&content);

    if parsed.skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = parsed.skipped,
            kept = parsed.records.len(),
            "skipped malformed records"
        );
    }

    Ok(parsed.records)
}

/// Serialize records as one compact JSON object per line.
pub fn to_jsonl<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| QbankError::Serialization(format!("JSONL encode failed: {e}")))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Write records to `path`, creating parent directories and overwriting
/// any existing file.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| QbankError::io(parent, e))?;
    }
    let content = to_jsonl(records)?;
    std::fs::write(path, content).map_err(|e| QbankError::io(path, e))?;
    debug!(path = %path.display(), records = records.len(), "wrote JSONL file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    #[test]
    fn parse_skips_blank_and_malformed_lines() {
        let content = concat!(
            r#"{"video_id":"a","module":6,"start":null,"end":null,"text":"one"}"#,
            "\n\n",
            "{not json\n",
            r#"{"video_id":"a"}"#,
            "\n",
            r#"{"video_id":"a","module":6,"start":3,"end":9,"text":"two"}"#,
            "\n",
        );
        let parsed: JsonlRecords<Segment> = parse_jsonl(content);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records[1].start, Some(3));
    }

    #[test]
    fn write_then_read_file() {
        let dir = std::env::temp_dir().join(format!("qbank-jsonl-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("segments.jsonl");
        let segs = vec![Segment {
            video_id: "lec01".into(),
            module: 8,
            start: None,
            end: None,
            text: "P(A|B)".into(),
        }];

        write_jsonl(&path, &segs).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        assert_eq!(content.lines().count(), 1);

        let back: Vec<Segment> = read_jsonl(&path).unwrap();
        assert_eq!(back, segs);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_missing_file_is_missing_input() {
        let path =
            std::env::temp_dir().join(format!("qbank-absent-{}.jsonl", uuid::Uuid::now_v7()));
        let err = read_jsonl::<Segment>(&path).unwrap_err();
        assert!(matches!(err, QbankError::MissingInput { .. }));
    }
}
